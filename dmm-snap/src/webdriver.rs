//! W3C WebDriver client over blocking HTTP
//!
//! Speaks the WebDriver REST protocol to a driver process
//! (chromedriver, geckodriver, or msedgedriver). The driver is spawned
//! on demand unless an already-running one is pointed at via URL; the
//! session and any spawned child are torn down on drop.

use crate::browser::Browser;
use crate::error::{Result, SnapError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// W3C element identifier key in find-element responses
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How long to wait for a freshly spawned driver to answer `/status`
const DRIVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval for element waits and driver startup
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Supported browsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Edge,
}

impl BrowserKind {
    /// Platform default: Edge on Windows, Chrome elsewhere
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            BrowserKind::Edge
        } else {
            BrowserKind::Chrome
        }
    }

    fn driver_command(self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chromedriver",
            BrowserKind::Firefox => "geckodriver",
            BrowserKind::Edge => "msedgedriver",
        }
    }

    fn driver_port(self) -> u16 {
        match self {
            BrowserKind::Chrome => 9515,
            BrowserKind::Firefox => 4444,
            BrowserKind::Edge => 9515,
        }
    }

    /// Session capabilities, with the browser running headless on request
    fn capabilities(self, headless: bool) -> Value {
        match self {
            BrowserKind::Chrome => {
                let mut args = vec!["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"];
                if headless {
                    args.insert(0, "--headless=new");
                }
                json!({
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                })
            }
            BrowserKind::Firefox => {
                let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
                json!({
                    "browserName": "firefox",
                    "moz:firefoxOptions": { "args": args }
                })
            }
            BrowserKind::Edge => {
                let args: Vec<&str> = if headless { vec!["--headless=new"] } else { vec![] };
                json!({
                    "browserName": "MicrosoftEdge",
                    "ms:edgeOptions": { "args": args }
                })
            }
        }
    }
}

/// One WebDriver session, plus the driver process when spawned here
pub struct WebDriverSession {
    http: reqwest::blocking::Client,
    base_url: String,
    session_id: String,
    driver: Option<Child>,
}

impl WebDriverSession {
    /// Spawn (or attach to) a driver and open a browser session
    ///
    /// With `webdriver_url` given, attaches to a driver that is already
    /// running; otherwise spawns the browser's driver binary on its
    /// conventional port.
    pub fn start(kind: BrowserKind, headless: bool, webdriver_url: Option<&str>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let (base_url, driver) = match webdriver_url {
            Some(url) => (url.trim_end_matches('/').to_string(), None),
            None => {
                let command = kind.driver_command();
                let port = kind.driver_port();
                info!("Starting {command} on port {port}...");
                let child = Command::new(command)
                    .arg(format!("--port={port}"))
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                    .map_err(|e| {
                        SnapError::WebDriver(format!(
                            "Could not start {command}: {e}. Make sure it is installed and in PATH"
                        ))
                    })?;
                (format!("http://127.0.0.1:{port}"), Some(child))
            }
        };

        wait_for_driver(&http, &base_url)?;

        let body = json!({
            "capabilities": { "alwaysMatch": kind.capabilities(headless) }
        });
        let reply = check(http.post(format!("{base_url}/session")).json(&body).send()?)?;
        let session_id = reply["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| SnapError::WebDriver("No session id in driver reply".into()))?
            .to_string();

        debug!("WebDriver session {session_id} created");

        Ok(Self {
            http,
            base_url,
            session_id,
            driver,
        })
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{path}", self.base_url, self.session_id)
    }

    /// Locate an element by CSS selector, returning its W3C reference
    fn find_element(&self, css: &str) -> Result<String> {
        let body = json!({ "using": "css selector", "value": css });
        let reply = check(
            self.http
                .post(self.session_url("/element"))
                .json(&body)
                .send()?,
        )?;
        reply["value"][ELEMENT_KEY]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SnapError::WebDriver(format!("Element not found: {css}")))
    }

    fn screenshot_from(&self, url: String) -> Result<Vec<u8>> {
        let reply = check(self.http.get(url).send()?)?;
        let encoded = reply["value"]
            .as_str()
            .ok_or_else(|| SnapError::WebDriver("Screenshot reply carried no data".into()))?;
        Ok(BASE64.decode(encoded)?)
    }
}

impl Browser for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        check(
            self.http
                .post(self.session_url("/url"))
                .json(&json!({ "url": url }))
                .send()?,
        )?;
        Ok(())
    }

    fn wait_for(&mut self, element_id: &str, timeout: Duration) -> Result<()> {
        let css = format!("#{element_id}");
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_element(&css) {
                Ok(_) => return Ok(()),
                Err(_) if Instant::now() < deadline => std::thread::sleep(POLL_INTERVAL),
                Err(_) => {
                    return Err(SnapError::Timeout(format!(
                        "Element {element_id:?} did not appear within {timeout:?}"
                    )));
                }
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        check(
            self.http
                .post(self.session_url("/window/rect"))
                .json(&json!({ "width": width, "height": height }))
                .send()?,
        )?;
        Ok(())
    }

    fn capture_element(&mut self, element_id: &str) -> Result<Vec<u8>> {
        let element = self.find_element(&format!("#{element_id}"))?;
        self.screenshot_from(self.session_url(&format!("/element/{element}/screenshot")))
    }

    fn capture_page(&mut self) -> Result<Vec<u8>> {
        self.screenshot_from(self.session_url("/screenshot"))
    }

    fn eval_script(&mut self, js: &str) -> Result<String> {
        let body = json!({ "script": js, "args": [] });
        let reply = check(
            self.http
                .post(self.session_url("/execute/sync"))
                .json(&body)
                .send()?,
        )?;
        match &reply["value"] {
            Value::String(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        let _ = self.http.delete(self.session_url("")).send();
        if let Some(child) = self.driver.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Poll the driver's `/status` endpoint until it is ready
fn wait_for_driver(http: &reqwest::blocking::Client, base_url: &str) -> Result<()> {
    let deadline = Instant::now() + DRIVER_STARTUP_TIMEOUT;
    loop {
        match http.get(format!("{base_url}/status")).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ if Instant::now() < deadline => std::thread::sleep(POLL_INTERVAL),
            Ok(resp) => {
                return Err(SnapError::WebDriver(format!(
                    "Driver at {base_url} not ready: HTTP {}",
                    resp.status()
                )));
            }
            Err(e) => {
                return Err(SnapError::WebDriver(format!(
                    "Driver at {base_url} not reachable: {e}"
                )));
            }
        }
    }
}

/// Unwrap a WebDriver reply, turning protocol errors into `SnapError`
fn check(resp: reqwest::blocking::Response) -> Result<Value> {
    let status = resp.status();
    let body: Value = resp.json().unwrap_or(Value::Null);
    if status.is_success() {
        return Ok(body);
    }
    let message = body["value"]["message"]
        .as_str()
        .or_else(|| body["value"]["error"].as_str())
        .unwrap_or("unknown driver error");
    warn!("WebDriver request failed: HTTP {status}: {message}");
    Err(SnapError::WebDriver(format!("HTTP {status}: {message}")))
}
