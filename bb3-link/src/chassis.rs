//! Channel and display operations on the chassis
//!
//! Channel-addressed commands operate on the currently selected channel
//! (`INST:NSEL`), matching how the front panel firmware scopes them.

use crate::client::ScpiClient;
use crate::error::Result;
use crate::transport::Transport;

/// Timeout applied to ordinary query replies unless overridden
pub const DEFAULT_IO_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(2500);

/// Typed command surface over one chassis connection
pub struct Chassis<T: Transport> {
    client: ScpiClient<T>,
    io_timeout: std::time::Duration,
}

impl<T: Transport> Chassis<T> {
    /// Wrap a transport in the chassis command surface
    pub fn new(transport: T) -> Self {
        Self {
            client: ScpiClient::new(transport),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Set the reply timeout for ordinary exchanges
    ///
    /// The dialog operations widen or suspend the transport timeout for
    /// their own exchange and restore this value afterwards.
    pub fn set_io_timeout(&mut self, timeout: std::time::Duration) -> Result<()> {
        self.io_timeout = timeout;
        self.client.transport_mut().set_timeout(Some(timeout))
    }

    pub(crate) fn io_timeout(&self) -> std::time::Duration {
        self.io_timeout
    }

    /// Access the underlying SCPI client
    pub fn client_mut(&mut self) -> &mut ScpiClient<T> {
        &mut self.client
    }

    /// Select the active channel (1-based slot number)
    pub fn select_channel(&mut self, channel: u8) -> Result<()> {
        self.client.send(&format!("INST:NSEL {channel}"))
    }

    /// Module model installed in the selected channel's slot
    pub fn channel_model(&mut self) -> Result<String> {
        self.client.query("SYST:CHAN:MODel?")
    }

    /// Measured output voltage of the selected channel, volts
    pub fn measure_voltage(&mut self) -> Result<f64> {
        self.client.query_f64("MEAS:VOLT?")
    }

    /// Measured output current of the selected channel, amperes
    pub fn measure_current(&mut self) -> Result<f64> {
        self.client.query_f64("MEAS:CURR?")
    }

    /// Program the selected channel's voltage setpoint
    pub fn set_voltage(&mut self, volts: f64) -> Result<()> {
        self.client.send(&format!("VOLT {volts:.3}"))
    }

    /// Program the selected channel's current limit
    pub fn set_current(&mut self, amperes: f64) -> Result<()> {
        self.client.send(&format!("CURR {amperes:.3}"))
    }

    /// Enable or disable the selected channel's output
    pub fn set_output(&mut self, enabled: bool) -> Result<()> {
        self.client
            .send(if enabled { "OUTP 1" } else { "OUTP 0" })
    }

    /// Enable or disable over-voltage protection on the selected channel
    pub fn set_ovp(&mut self, enabled: bool) -> Result<()> {
        self.client.send(if enabled {
            "VOLT:PROT:STAT 1"
        } else {
            "VOLT:PROT:STAT 0"
        })
    }

    /// Fetch the front-panel framebuffer as encoded image bytes
    pub fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.client.query_block("DISPlay:DATA?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_channel_command_sequence() {
        let mock = MockTransport::new();
        mock.inject_line("12.345");
        let mut chassis = Chassis::new(mock.clone());

        chassis.select_channel(2).unwrap();
        chassis.set_current(0.1).unwrap();
        let v = chassis.measure_voltage().unwrap();
        chassis.set_voltage(v + 1.0).unwrap();
        chassis.set_output(true).unwrap();

        assert_eq!(
            mock.written_lines(),
            vec![
                "INST:NSEL 2",
                "CURR 0.100",
                "MEAS:VOLT?",
                "VOLT 13.345",
                "OUTP 1",
            ]
        );
    }

    #[test]
    fn test_ovp_disable() {
        let mock = MockTransport::new();
        let mut chassis = Chassis::new(mock.clone());

        chassis.set_ovp(false).unwrap();
        assert_eq!(mock.written_lines(), vec!["VOLT:PROT:STAT 0"]);
    }
}
