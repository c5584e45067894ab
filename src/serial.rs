use std::io::{Read as _, Write as _};

use log::info;
use serialport::SerialPort;

use crate::config::SerialConfig;
use crate::error::Result;

/// Where raw reader output comes from.
pub trait TagSource {
    /// Bytes waiting to be read, without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    fn read_available(&mut self, count: usize) -> Result<Vec<u8>>;

    fn write_command(&mut self, command: &[u8]) -> Result<()>;
}

pub struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl SerialSource {
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(config.port(), config.baud_rate())
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .timeout(config.timeout())
            .open()?;
        info!(
            "Opened serial port {} at {} baud",
            config.port(),
            config.baud_rate()
        );
        Ok(SerialSource { port })
    }
}

impl TagSource for SerialSource {
    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_available(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; count];
        let read = self.port.read(&mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    fn write_command(&mut self, command: &[u8]) -> Result<()> {
        self.port.write_all(command)?;
        self.port.flush()?;
        Ok(())
    }
}
