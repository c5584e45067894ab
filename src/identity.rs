use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use log::{debug, warn};
use mac_address::MacAddress;

/// Reachable on any routed network; nothing is ever sent to it.
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Network identity attached to every telemetry payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub ip: Ipv4Addr,
    pub mac: String,
}

impl DeviceIdentity {
    pub fn detect() -> Self {
        let identity = DeviceIdentity {
            ip: outbound_ipv4().unwrap_or(Ipv4Addr::UNSPECIFIED),
            mac: primary_mac()
                .map(|mac| format_mac(&mac))
                .unwrap_or_else(|| format_mac(&MacAddress::new([0; 6]))),
        };
        debug!("Detected device identity: {:?}", identity);
        identity
    }

    #[cfg(test)]
    pub fn unknown() -> Self {
        DeviceIdentity {
            ip: Ipv4Addr::UNSPECIFIED,
            mac: "00-00-00-00-00-00".to_string(),
        }
    }
}

fn outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    if let Err(err) = socket.connect(PROBE_ADDR) {
        warn!("Unable to determine outbound IP address: {}", err);
        return None;
    }
    match socket.local_addr().ok()? {
        SocketAddr::V4(addr) => Some(*addr.ip()),
        SocketAddr::V6(_) => None,
    }
}

fn primary_mac() -> Option<MacAddress> {
    match mac_address::get_mac_address() {
        Ok(mac) => mac,
        Err(err) => {
            warn!("Unable to determine MAC address: {}", err);
            None
        }
    }
}

fn format_mac(mac: &MacAddress) -> String {
    mac.bytes()
        .iter()
        .map(|octet| format!("{:02X}", octet))
        .collect::<Vec<_>>()
        .join("-")
}
