//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock transport for unit and integration testing
///
/// Reads come from an injectable FIFO; writes are captured. A `read` on
/// an empty FIFO behaves like a timeout so a mis-scripted test fails
/// fast instead of hanging.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                write_buffer: Vec::new(),
            })),
        }
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.extend(data);
    }

    /// Inject one reply line (appends the LF terminator)
    pub fn inject_line(&self, line: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.extend(line.as_bytes());
        inner.read_buffer.push_back(b'\n');
    }

    /// Take everything written so far, clearing the capture
    pub fn take_written(&self) -> Vec<u8> {
        let mut inner = self.inner.lock().unwrap();
        std::mem::take(&mut inner.write_buffer)
    }

    /// Written bytes split into lines, for command-sequence assertions
    pub fn written_lines(&self) -> Vec<String> {
        let written = {
            let inner = self.inner.lock().unwrap();
            inner.write_buffer.clone()
        };
        String::from_utf8_lossy(&written)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let available = inner.read_buffer.len().min(buffer.len());

        if available == 0 {
            return Err(Error::Timeout);
        }

        for item in buffer.iter_mut().take(available) {
            *item = inner.read_buffer.pop_front().unwrap();
        }

        Ok(available)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.write_buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_timeout(&mut self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
