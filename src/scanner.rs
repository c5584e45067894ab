use crate::error::{Error, Result};
use crate::messages::TagReading;

/// EPC Gen2 tags from the supported reader family all start with this.
pub const DEFAULT_MARKER: &str = "E280";

/// Bytes in an EPC, marker included.
pub const EPC_LEN: usize = 12;

const EPC_HEX_LEN: usize = EPC_LEN * 2;
const RSSI_HEX_LEN: usize = 2;

/// Pulls tag records out of a hex dump of the reader output.
///
/// A record is the marker, the remainder of the 12-byte EPC, then one
/// optional RSSI byte (two's complement dBm). The marker is searched for at
/// any hex digit, not only on byte boundaries, and anything between records
/// is skipped.
#[derive(Clone, Debug)]
pub struct FrameScanner {
    marker: String,
}

impl Default for FrameScanner {
    fn default() -> Self {
        FrameScanner {
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl FrameScanner {
    pub fn new(marker: &str) -> Result<Self> {
        if marker.is_empty()
            || marker.len() > EPC_HEX_LEN
            || !marker.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::Config(format!(
                "tag marker must be 1 to {} hex digits, got `{}`",
                EPC_HEX_LEN, marker
            )));
        }
        Ok(FrameScanner {
            marker: marker.to_ascii_uppercase(),
        })
    }

    pub fn scan(&self, hex_data: &str) -> TagRecords<'_> {
        TagRecords {
            marker: &self.marker,
            hex: hex_data.trim().to_ascii_uppercase(),
            cursor: 0,
        }
    }
}

pub struct TagRecords<'a> {
    marker: &'a str,
    hex: String,
    cursor: usize,
}

impl Iterator for TagRecords<'_> {
    type Item = TagReading;

    fn next(&mut self) -> Option<TagReading> {
        let rest = self.hex.get(self.cursor..)?;
        let start = self.cursor + rest.find(self.marker)?;
        let end = start + EPC_HEX_LEN;
        let Some(epc) = self.hex.get(start..end) else {
            // Truncated record; the rest of it shows up in the next read.
            self.cursor = self.hex.len();
            return None;
        };
        let epc = epc.to_string();

        let rssi = self
            .hex
            .get(end..end + RSSI_HEX_LEN)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .map(|byte| byte as i8);
        self.cursor = if rssi.is_some() {
            end + RSSI_HEX_LEN
        } else {
            end
        };

        Some(TagReading { epc, rssi })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPC: [u8; EPC_LEN] = [
        0xE2, 0x80, 0xAB, 0xCD, 0x12, 0x34, 0x56, 0x78, 0x90, 0xAB, 0xCD, 0xEF,
    ];

    fn record(last: u8, rssi: u8) -> Vec<u8> {
        let mut bytes = EPC.to_vec();
        bytes[EPC_LEN - 1] = last;
        bytes.push(rssi);
        bytes
    }

    fn scan_bytes(scanner: &FrameScanner, bytes: &[u8]) -> Vec<TagReading> {
        scanner.scan(&hex::encode_upper(bytes)).collect()
    }

    #[test]
    fn test_empty_buffer() {
        let scanner = FrameScanner::default();
        assert_eq!(scanner.scan("").count(), 0);
    }

    #[test]
    fn test_hex_stream() {
        let scanner = FrameScanner::default();
        let readings: Vec<_> = scanner.scan("E280ABCD1234567890ABCDEF1005").collect();
        assert_eq!(
            readings,
            vec![TagReading {
                epc: "E280ABCD1234567890ABCDEF".to_string(),
                rssi: Some(16),
            }]
        );
    }

    #[test]
    fn test_marker_at_odd_digit_offset() {
        let scanner = FrameScanner::default();
        let readings: Vec<_> = scanner.scan("0E280ABCD1234567890ABCDEF1F000").collect();
        assert_eq!(
            readings,
            vec![TagReading {
                epc: "E280ABCD1234567890ABCDEF".to_string(),
                rssi: Some(31),
            }]
        );

        let readings = scan_bytes(
            &scanner,
            &[0x0E, 0x28, 0x0A, 0xBC, 0xD1, 0x23, 0x45, 0x67, 0x89, 0x0A, 0xBC, 0xDE, 0xFF, 0x00],
        );
        assert_eq!(readings[0].epc, "E280ABCD1234567890ABCDEF");
        assert_eq!(readings[0].rssi, Some(-16));
    }

    #[test]
    fn test_lowercase_input() {
        let scanner = FrameScanner::default();
        let readings: Vec<_> = scanner.scan("e280abcd1234567890abcdef05").collect();
        assert_eq!(readings[0].epc, "E280ABCD1234567890ABCDEF");
        assert_eq!(readings[0].rssi, Some(5));
    }

    #[test]
    fn test_rssi_is_twos_complement() {
        let scanner = FrameScanner::default();

        let readings = scan_bytes(&scanner, &record(0x01, 0xF0));
        assert_eq!(readings[0].rssi, Some(-16));

        let readings = scan_bytes(&scanner, &record(0x01, 0x05));
        assert_eq!(readings[0].rssi, Some(5));
    }

    #[test]
    fn test_contiguous_records_in_order() {
        let scanner = FrameScanner::default();
        let mut buf = vec![0x13, 0x00, 0xEE, 0x01];
        for i in 0..4u8 {
            buf.extend(record(i, 0xC0 + i));
        }

        let readings = scan_bytes(&scanner, &buf);
        assert_eq!(readings.len(), 4);
        for (i, reading) in readings.iter().enumerate() {
            assert!(reading.epc.starts_with("E280"));
            assert!(reading.epc.ends_with(&format!("{:02X}", i)));
            assert_eq!(reading.epc.len(), EPC_LEN * 2);
            assert_eq!(reading.rssi, Some((0xC0 + i as u8) as i8));
        }
    }

    #[test]
    fn test_missing_rssi_is_absent() {
        let scanner = FrameScanner::default();
        let readings = scan_bytes(&scanner, &EPC);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].rssi, None);
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        let scanner = FrameScanner::default();
        let mut buf = record(0x01, 0xD0);
        buf.extend_from_slice(&EPC[..7]);

        let readings = scan_bytes(&scanner, &buf);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].rssi, Some(-48));

        assert!(scan_bytes(&scanner, &[0xE2, 0x80, 0x11]).is_empty());
    }

    #[test]
    fn test_marker_inside_epc_is_consumed() {
        let scanner = FrameScanner::default();
        let mut buf = EPC.to_vec();
        buf[4] = 0xE2;
        buf[5] = 0x80;
        buf.push(0xB0);

        let readings = scan_bytes(&scanner, &buf);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].epc, "E280ABCDE280567890ABCDEF");
    }

    #[test]
    fn test_custom_marker() {
        let scanner = FrameScanner::new("3000").unwrap();
        let mut buf = vec![0x30, 0x00];
        buf.extend_from_slice(&[0x11; 10]);
        buf.push(0xBA);

        let readings = scan_bytes(&scanner, &buf);
        assert_eq!(readings[0].epc, format!("3000{}", "11".repeat(10)));
        assert_eq!(readings[0].rssi, Some(-70));

        assert!(FrameScanner::new("").is_err());
        assert!(FrameScanner::new("E2X0").is_err());
        assert!(FrameScanner::new(&"0".repeat(EPC_HEX_LEN + 1)).is_err());
    }
}
