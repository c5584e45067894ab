use serde_derive::{Deserialize, Serialize};

use crate::identity::DeviceIdentity;

/// One tag sighting pulled out of the reader's byte stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagReading {
    /// Uppercase hex EPC, marker included.
    pub epc: String,
    /// Signal strength in dBm, absent when the frame was cut short.
    pub rssi: Option<i8>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetryPayload {
    pub epc: String,
    pub rssi: Option<i8>,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    #[serde(rename = "macaddress")]
    pub mac_address: String,
}

impl TelemetryPayload {
    pub fn new(reading: &TagReading, identity: &DeviceIdentity) -> Self {
        TelemetryPayload {
            epc: reading.epc.clone(),
            rssi: reading.rssi,
            ip_address: identity.ip.to_string(),
            mac_address: identity.mac.clone(),
        }
    }
}
