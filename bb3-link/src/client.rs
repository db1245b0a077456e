//! Line-oriented SCPI client over a transport
//!
//! Commands and queries are LF-terminated text; binary replies use the
//! definite-length block format from [`crate::block`]. The client keeps
//! an internal receive buffer so a read that straddles a frame boundary
//! leaves the surplus for the next exchange.

use crate::block;
use crate::error::{Error, Result};
use crate::transport::Transport;

const READ_CHUNK: usize = 4096;

/// SCPI client holding the transport and the receive buffer
pub struct ScpiClient<T: Transport> {
    transport: T,
    buf: Vec<u8>,
}

impl<T: Transport> ScpiClient<T> {
    /// Create a client over the given transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            buf: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Access the underlying transport (timeout adjustments)
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send one command line
    pub fn send(&mut self, cmd: &str) -> Result<()> {
        log::trace!("-> {cmd}");
        self.transport.write_all(cmd.as_bytes())?;
        self.transport.write_all(b"\n")?;
        self.transport.flush()
    }

    /// Send a query and read one reply line
    ///
    /// The reply is trimmed of CR/LF and of one pair of surrounding
    /// double quotes (the chassis quotes string replies).
    pub fn query(&mut self, cmd: &str) -> Result<String> {
        self.send(cmd)?;
        let line = self.read_line()?;
        log::trace!("<- {line}");
        Ok(unquote(&line).to_string())
    }

    /// Send a query and parse the reply as a number
    pub fn query_f64(&mut self, cmd: &str) -> Result<f64> {
        let reply = self.query(cmd)?;
        reply
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidNumber(reply))
    }

    /// Send a query and read one definite-length binary block reply
    ///
    /// Framing follows the declared length, never the payload content;
    /// one trailing LF after the payload is consumed if present.
    pub fn query_block(&mut self, cmd: &str) -> Result<Vec<u8>> {
        self.send(cmd)?;

        let header = self.read_exact(2)?;
        if header[0] != block::MARKER {
            return Err(Error::InvalidResponse(format!(
                "Expected block marker '#', got 0x{:02X}",
                header[0]
            )));
        }
        let digits = block::len_of_len(header[1])?;
        let len_field = self.read_exact(digits)?;
        let payload_len = block::declared_len(&len_field)?;
        let payload = self.read_exact(payload_len)?;

        // Optional trailing delimiter; only consumed from already
        // buffered data, never waited for.
        if self.buf.first() == Some(&b'\n') {
            self.buf.remove(0);
        }

        log::debug!("Block reply: {payload_len} bytes");
        Ok(payload)
    }

    /// Read one LF-terminated line, excluding the terminator
    fn read_line(&mut self) -> Result<String> {
        let mut search_from = 0;
        loop {
            if let Some(pos) = self.buf[search_from..].iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..search_from + pos + 1).collect();
                line.pop(); // LF
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            search_from = self.buf.len();
            self.fill()?;
        }
    }

    /// Read exactly `n` bytes, however the transport chunks them
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        while self.buf.len() < n {
            self.fill()?;
        }
        Ok(self.buf.drain(..n).collect())
    }

    /// Pull one chunk from the transport into the buffer
    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.transport.read(&mut chunk)?;
        if n == 0 {
            return Err(Error::Disconnected);
        }
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}

/// Strip one pair of surrounding double quotes, if present
fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_query_reads_one_line() {
        let mock = MockTransport::new();
        mock.inject_line("DCP405");
        let mut client = ScpiClient::new(mock.clone());

        let reply = client.query("SYST:CHAN:MODel?").unwrap();
        assert_eq!(reply, "DCP405");
        assert_eq!(mock.take_written(), b"SYST:CHAN:MODel?\n");
    }

    #[test]
    fn test_query_strips_quotes_and_crlf() {
        let mock = MockTransport::new();
        mock.inject_read(b"\"start_control\"\r\n");
        let mut client = ScpiClient::new(mock);

        assert_eq!(client.query("DISP:DIALog:ACTIon? 10ms").unwrap(), "start_control");
    }

    #[test]
    fn test_query_f64() {
        let mock = MockTransport::new();
        mock.inject_line("3.141");
        let mut client = ScpiClient::new(mock);

        let v = client.query_f64("MEAS:VOLT?").unwrap();
        assert!((v - 3.141).abs() < 1e-9);
    }

    #[test]
    fn test_query_f64_rejects_garbage() {
        let mock = MockTransport::new();
        mock.inject_line("whoops");
        let mut client = ScpiClient::new(mock);

        assert!(matches!(
            client.query_f64("MEAS:VOLT?").unwrap_err(),
            Error::InvalidNumber(_)
        ));
    }

    #[test]
    fn test_query_block_by_declared_length() {
        // Payload contains LF bytes; framing must come from the header
        let payload = b"JPEG\nDATA\n";
        let mock = MockTransport::new();
        mock.inject_read(b"#210");
        mock.inject_read(payload);
        mock.inject_read(b"\n");
        let mut client = ScpiClient::new(mock);

        let data = client.query_block("DISPlay:DATA?").unwrap();
        assert_eq!(data, payload);
    }

    #[test]
    fn test_query_block_timeout_on_under_read() {
        // Declares 123 bytes, delivers 10: the mock then times out,
        // which must surface as an error rather than truncated data.
        let mock = MockTransport::new();
        mock.inject_read(b"#3123");
        mock.inject_read(&[0u8; 10]);
        let mut client = ScpiClient::new(mock);

        assert!(matches!(
            client.query_block("DISPlay:DATA?").unwrap_err(),
            Error::Timeout
        ));
    }

    #[test]
    fn test_query_block_rejects_text_reply() {
        let mock = MockTransport::new();
        mock.inject_line("**ERROR: -100");
        let mut client = ScpiClient::new(mock);

        assert!(matches!(
            client.query_block("DISPlay:DATA?").unwrap_err(),
            Error::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_back_to_back_replies_stay_framed() {
        let mock = MockTransport::new();
        mock.inject_read(b"1.000\n2.000\n");
        let mut client = ScpiClient::new(mock);

        assert_eq!(client.query_f64("MEAS:VOLT?").unwrap(), 1.0);
        assert_eq!(client.query_f64("MEAS:VOLT?").unwrap(), 2.0);
    }
}
