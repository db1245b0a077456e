//! TCP transport for the chassis SCPI port

use super::Transport;
use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// TCP transport holding one exclusive connection to the chassis
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to the chassis SCPI port
    ///
    /// # Arguments
    /// * `addr` - Socket address (e.g., "192.168.10.78:5025")
    /// * `timeout` - Connect timeout, also installed as the initial read timeout
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let sock_addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| Error::InvalidResponse(format!("Invalid address {addr:?}: {e}")))?;

        let stream = TcpStream::connect_timeout(&sock_addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        log::info!("Connected to chassis at {addr}");

        Ok(TcpTransport { stream })
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.stream.read(buffer) {
            Ok(n) => Ok(n),
            // Read timeout surfaces as WouldBlock on Unix, TimedOut on Windows
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Err(Error::Timeout)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }
}
