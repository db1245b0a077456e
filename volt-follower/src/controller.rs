//! The polling control loop
//!
//! Single-threaded and synchronous: each iteration waits (bounded) for
//! a dialog action, dispatches it, refreshes measurements and the
//! dialog telemetry, and commands the output channel when RUNNING. The
//! bounded wait is the loop's only suspension point. Any I/O error
//! terminates the loop; the caller is responsible for the unconditional
//! output shutdown afterwards.

use crate::config::ControlConfig;
use crate::error::{FollowerError, Result};
use crate::pacing::Pacer;
use crate::session::{Session, compute_target, offset_bounds};
use bb3_link::{Chassis, Transport, Unit};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Dialog button actions the loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    ConfigureOffset,
    ConfigureLimit,
    Close,
}

impl Action {
    /// Parse an action token from the dialog resource
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "start_control" => Some(Action::Start),
            "stop_control" => Some(Action::Stop),
            "config_voltage_offset" => Some(Action::ConfigureOffset),
            "config_current_limit" => Some(Action::ConfigureLimit),
            "close_dialog" => Some(Action::Close),
            _ => None,
        }
    }
}

/// One set of fresh measurements
struct Reading {
    source_voltage: f64,
    output_voltage: f64,
    output_current: f64,
}

/// Control loop state and logic
pub struct Controller<T: Transport> {
    chassis: Chassis<T>,
    cfg: ControlConfig,
    session: Session,
    iterations: u64,
}

impl<T: Transport> Controller<T> {
    /// Create a controller in the STOPPED state
    pub fn new(chassis: Chassis<T>, cfg: ControlConfig) -> Self {
        let session = Session::new(cfg.current_limit);
        Self {
            chassis,
            cfg,
            session,
            iterations: 0,
        }
    }

    /// Session state, for assertions in tests
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Verify both configured slots hold the required module
    ///
    /// Runs before the loop; a mismatch aborts the tool.
    pub fn check_modules(&mut self) -> Result<()> {
        for channel in [self.cfg.source_channel, self.cfg.output_channel] {
            self.chassis.select_channel(channel)?;
            let model = self.chassis.channel_model()?;
            if !model.contains(&self.cfg.required_model) {
                return Err(FollowerError::IncompatibleModule {
                    channel,
                    model,
                    required: self.cfg.required_model.clone(),
                });
            }
            info!("Ch{channel} model: {model}");
        }
        Ok(())
    }

    /// Disable OVP on the output channel, open the dialog, seed telemetry
    pub fn setup(&mut self) -> Result<()> {
        // The offset may push the output above the source's nominal
        // level; OVP on the output channel would trip on that.
        self.chassis.select_channel(self.cfg.output_channel)?;
        self.chassis.set_ovp(false)?;
        info!("OVP disabled on Ch{}", self.cfg.output_channel);

        self.chassis.dialog_open(&self.cfg.dialog_resource)?;
        self.chassis.dialog_data_string("status", "STOPPED")?;
        self.chassis
            .dialog_data_float("voltage_offset", Unit::Volt, self.session.offset)?;
        self.chassis
            .dialog_data_float("current_limit", Unit::Amper, self.session.current_limit)?;
        self.refresh_telemetry()?;
        Ok(())
    }

    /// Run until a close action, a shutdown signal, or an I/O error
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        info!("Voltage follower mode: output = input + offset");

        let period = Duration::from_millis(self.cfg.period_ms);
        let floor = Duration::from_millis(self.cfg.min_poll_ms);
        let mut pacer = Pacer::new(Instant::now(), period, floor);

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("Shutdown requested");
                break;
            }

            let timeout = pacer.next_timeout(Instant::now());
            if let Some(token) = self.chassis.dialog_action(timeout)? {
                match Action::from_token(&token) {
                    Some(Action::Start) => self.on_start()?,
                    Some(Action::Stop) => self.on_stop()?,
                    Some(Action::ConfigureOffset) => self.on_configure_offset()?,
                    Some(Action::ConfigureLimit) => self.on_configure_limit()?,
                    Some(Action::Close) => {
                        info!("Close requested by user");
                        break;
                    }
                    None => warn!("Unknown dialog action: {token:?}"),
                }
            }

            let reading = self.refresh_telemetry()?;

            if self.session.running {
                let target =
                    compute_target(reading.source_voltage, self.session.offset, self.cfg.full_scale);
                self.session.last_target = target;
                self.chassis.select_channel(self.cfg.output_channel)?;
                self.chassis.set_voltage(target)?;
            }

            self.iterations += 1;
            if self.iterations % self.cfg.status_every == 0 {
                let state = if self.session.running { "RUNNING" } else { "READY" };
                info!(
                    "{} | Offset: {:+.3}V | Ch{}: {:.3}V | Ch{}: {:.3}V {:.3}A",
                    state,
                    self.session.offset,
                    self.cfg.source_channel,
                    reading.source_voltage,
                    self.cfg.output_channel,
                    reading.output_voltage,
                    reading.output_current,
                );
            }
        }

        Ok(())
    }

    /// Disable the output and close the dialog, swallowing errors
    ///
    /// Runs on every exit path, including error paths where the
    /// connection may already be gone.
    pub fn shutdown_output(&mut self) {
        let result = self
            .chassis
            .select_channel(self.cfg.output_channel)
            .and_then(|_| self.chassis.set_output(false))
            .and_then(|_| self.chassis.dialog_close());
        match result {
            Ok(()) => info!("Output disabled, dialog closed"),
            Err(e) => warn!("Cleanup incomplete: {e}"),
        }
    }

    fn on_start(&mut self) -> Result<()> {
        // Re-issuing the limit and enable on a duplicate start is harmless
        self.chassis.select_channel(self.cfg.output_channel)?;
        self.chassis.set_current(self.session.current_limit)?;
        self.chassis.set_output(true)?;
        if self.session.start() {
            info!("Output enabled");
        }
        self.chassis.dialog_data_string("status", "RUNNING")?;
        Ok(())
    }

    fn on_stop(&mut self) -> Result<()> {
        self.chassis.select_channel(self.cfg.output_channel)?;
        self.chassis.set_output(false)?;
        if self.session.stop() {
            info!("Output disabled");
        }
        self.chassis.dialog_data_string("status", "STOPPED")?;
        Ok(())
    }

    fn on_configure_offset(&mut self) -> Result<()> {
        // Bounds depend on the live source reading: the offset may pull
        // the output to 0 V or push it to full scale, never beyond.
        self.chassis.select_channel(self.cfg.source_channel)?;
        let source = self.chassis.measure_voltage()?;
        let (min, max) = offset_bounds(source, self.cfg.full_scale);

        match self
            .chassis
            .dialog_input("Voltage Offset", Unit::Volt, min, max, self.session.offset)?
        {
            Some(value) => {
                if self.session.set_offset_checked(value, source, self.cfg.full_scale) {
                    info!("Offset: {:+.3} V (range {:.3} to {:.3} V)", value, min, max);
                } else {
                    warn!("Offset {value:.3} V outside [{min:.3}, {max:.3}], keeping previous");
                }
            }
            None => debug!("Offset input cancelled"),
        }
        Ok(())
    }

    fn on_configure_limit(&mut self) -> Result<()> {
        match self.chassis.dialog_input(
            "Current Limit",
            Unit::Amper,
            self.cfg.limit_min,
            self.cfg.limit_max,
            self.session.current_limit,
        )? {
            Some(value) => {
                if self
                    .session
                    .set_limit_checked(value, self.cfg.limit_min, self.cfg.limit_max)
                {
                    self.chassis.select_channel(self.cfg.output_channel)?;
                    self.chassis.set_current(value)?;
                    info!("Current limit set to {value:.3} A");
                } else {
                    warn!(
                        "Current limit {value:.3} A outside [{:.3}, {:.3}], keeping previous",
                        self.cfg.limit_min, self.cfg.limit_max
                    );
                }
            }
            None => debug!("Current limit input cancelled"),
        }
        Ok(())
    }

    /// Read both channels and push fresh values to the dialog
    fn refresh_telemetry(&mut self) -> Result<Reading> {
        self.chassis.select_channel(self.cfg.source_channel)?;
        let source_voltage = self.chassis.measure_voltage()?;

        self.chassis.select_channel(self.cfg.output_channel)?;
        let output_voltage = self.chassis.measure_voltage()?;
        let output_current = self.chassis.measure_current()?;

        self.chassis
            .dialog_data_float("source_voltage", Unit::Volt, source_voltage)?;
        self.chassis
            .dialog_data_float("target_voltage", Unit::Volt, output_voltage)?;
        self.chassis
            .dialog_data_float("target_current", Unit::Amper, output_current)?;
        self.chassis
            .dialog_data_float("voltage_offset", Unit::Volt, self.session.offset)?;
        self.chassis
            .dialog_data_float("current_limit", Unit::Amper, self.session.current_limit)?;

        Ok(Reading {
            source_voltage,
            output_voltage,
            output_current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tokens() {
        assert_eq!(Action::from_token("start_control"), Some(Action::Start));
        assert_eq!(Action::from_token("stop_control"), Some(Action::Stop));
        assert_eq!(
            Action::from_token("config_voltage_offset"),
            Some(Action::ConfigureOffset)
        );
        assert_eq!(
            Action::from_token("config_current_limit"),
            Some(Action::ConfigureLimit)
        );
        assert_eq!(Action::from_token("close_dialog"), Some(Action::Close));
        assert_eq!(Action::from_token("mystery_button"), None);
    }
}
