//! Browser capability interface
//!
//! The capture logic only needs these six operations, so the real
//! WebDriver session stays behind this trait and the logic is testable
//! against a scripted mock.

use crate::error::Result;
use std::time::Duration;

/// What the capture logic requires from a driven browser
pub trait Browser {
    /// Load the given URL
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Block until the element with the given id is present
    fn wait_for(&mut self, element_id: &str, timeout: Duration) -> Result<()>;

    /// Resize the browser window
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Rendered bitmap of the element with the given id, as PNG bytes
    fn capture_element(&mut self, element_id: &str) -> Result<Vec<u8>>;

    /// Rendered bitmap of the whole page, as PNG bytes
    fn capture_page(&mut self) -> Result<Vec<u8>>;

    /// Run a script in the page and return its result as a string
    fn eval_script(&mut self, js: &str) -> Result<String>;
}
