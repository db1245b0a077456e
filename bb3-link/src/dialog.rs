//! Dialog surface of the chassis front panel
//!
//! Scripts running against the chassis can open a dialog resource and
//! exchange data with it: push named display fields, poll for button
//! actions with a bounded wait, and prompt the operator for a bounded
//! numeric value. The action poll doubles as the control loop's timing
//! source, so its device-side timeout is part of the protocol.

use crate::chassis::Chassis;
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::fmt;
use std::time::Duration;

/// Extra socket-level allowance on top of the device-side poll timeout
const POLL_MARGIN: Duration = Duration::from_secs(2);

/// Measurement unit tags understood by the dialog system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Volt,
    Amper,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The chassis firmware spells it AMPER
        match self {
            Unit::Volt => write!(f, "VOLT"),
            Unit::Amper => write!(f, "AMPER"),
        }
    }
}

impl<T: Transport> Chassis<T> {
    /// Open a dialog resource stored on the chassis
    pub fn dialog_open(&mut self, resource: &str) -> Result<()> {
        self.client_mut()
            .send(&format!("DISP:DIAL:OPEN \"{resource}\""))
    }

    /// Close the currently open dialog
    pub fn dialog_close(&mut self) -> Result<()> {
        self.client_mut().send("DISP:DIALog:CLOSe")
    }

    /// Push a float value into a named dialog field
    pub fn dialog_data_float(&mut self, name: &str, unit: Unit, value: f64) -> Result<()> {
        self.client_mut()
            .send(&format!("DISP:DIAL:DATA \"{name}\",FLOAT,{unit},{value:.3}"))
    }

    /// Push a string value into a named dialog field
    pub fn dialog_data_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.client_mut()
            .send(&format!("DISP:DIAL:DATA \"{name}\",STRING,\"{value}\""))
    }

    /// Wait up to `timeout` for a dialog button action
    ///
    /// Returns `None` when the poll expires without an action. The
    /// device blocks for the requested time, so the socket timeout is
    /// widened for this exchange and restored afterwards.
    pub fn dialog_action(&mut self, timeout: Duration) -> Result<Option<String>> {
        let ms = timeout.as_millis();
        let restore = self.io_timeout();

        self.client_mut()
            .transport_mut()
            .set_timeout(Some(timeout + POLL_MARGIN))?;
        let reply = self.client_mut().query(&format!("DISP:DIALog:ACTIon? {ms}ms"));
        self.client_mut().transport_mut().set_timeout(Some(restore))?;

        let reply = reply?;
        if reply.is_empty() || reply == "0" {
            Ok(None)
        } else {
            Ok(Some(reply))
        }
    }

    /// Prompt the operator for a bounded numeric value
    ///
    /// Blocks until the operator confirms or cancels; the read timeout
    /// is suspended for the exchange. Cancellation returns `None` and is
    /// not an error.
    pub fn dialog_input(
        &mut self,
        label: &str,
        unit: Unit,
        min: f64,
        max: f64,
        default: f64,
    ) -> Result<Option<f64>> {
        let restore = self.io_timeout();

        self.client_mut().transport_mut().set_timeout(None)?;
        let reply = self.client_mut().query(&format!(
            "DISP:INPUT? \"{label}\",NUMBER,{unit},{min:.3},{max:.3},{default:.3}"
        ));
        self.client_mut().transport_mut().set_timeout(Some(restore))?;

        let reply = reply?;
        if reply.is_empty() {
            return Ok(None);
        }
        reply
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| Error::InvalidNumber(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_action_poll_none_on_empty_reply() {
        let mock = MockTransport::new();
        mock.inject_line("\"\"");
        let mut chassis = Chassis::new(mock.clone());

        let action = chassis.dialog_action(Duration::from_millis(500)).unwrap();
        assert_eq!(action, None);
        assert_eq!(mock.written_lines(), vec!["DISP:DIALog:ACTIon? 500ms"]);
    }

    #[test]
    fn test_action_poll_returns_token() {
        let mock = MockTransport::new();
        mock.inject_line("\"start_control\"");
        let mut chassis = Chassis::new(mock);

        let action = chassis.dialog_action(Duration::from_millis(10)).unwrap();
        assert_eq!(action.as_deref(), Some("start_control"));
    }

    #[test]
    fn test_input_cancelled_is_none() {
        let mock = MockTransport::new();
        mock.inject_line("\"\"");
        let mut chassis = Chassis::new(mock);

        let value = chassis
            .dialog_input("Voltage Offset", Unit::Volt, -1.0, 39.0, 0.0)
            .unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_input_value_and_bounds_on_wire() {
        let mock = MockTransport::new();
        mock.inject_line("2.5");
        let mut chassis = Chassis::new(mock.clone());

        let value = chassis
            .dialog_input("Voltage Offset", Unit::Volt, -1.25, 38.75, 0.0)
            .unwrap();
        assert_eq!(value, Some(2.5));
        assert_eq!(
            mock.written_lines(),
            vec!["DISP:INPUT? \"Voltage Offset\",NUMBER,VOLT,-1.250,38.750,0.000"]
        );
    }

    #[test]
    fn test_data_push_formatting() {
        let mock = MockTransport::new();
        let mut chassis = Chassis::new(mock.clone());

        chassis
            .dialog_data_float("voltage_offset", Unit::Volt, 0.5)
            .unwrap();
        chassis.dialog_data_string("status", "RUNNING").unwrap();

        assert_eq!(
            mock.written_lines(),
            vec![
                "DISP:DIAL:DATA \"voltage_offset\",FLOAT,VOLT,0.500",
                "DISP:DIAL:DATA \"status\",STRING,\"RUNNING\"",
            ]
        );
    }
}
