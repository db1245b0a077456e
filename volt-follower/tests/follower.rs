//! End-to-end control loop tests over a scripted mock transport
//!
//! The mock's read FIFO is loaded with the device's reply lines in the
//! exact order the loop queries them; everything the loop writes is
//! captured for wire-level assertions.

use bb3_link::Chassis;
use bb3_link::transport::mock::MockTransport;
use std::sync::atomic::AtomicBool;
use volt_follower::config::ControlConfig;
use volt_follower::controller::Controller;
use volt_follower::error::FollowerError;

fn controller_over(mock: &MockTransport) -> Controller<MockTransport> {
    Controller::new(Chassis::new(mock.clone()), ControlConfig::default())
}

/// Reply lines for one telemetry refresh: source V, output V, output I
fn inject_refresh(mock: &MockTransport, v_in: &str, v_out: &str, i_out: &str) {
    mock.inject_line(v_in);
    mock.inject_line(v_out);
    mock.inject_line(i_out);
}

#[test]
fn test_follow_sequence_with_offset() {
    let mock = MockTransport::new();

    // Iteration 1: operator configures a +0.5 V offset
    mock.inject_line("\"config_voltage_offset\"");
    mock.inject_line("1.000"); // source reading for the bounds
    mock.inject_line("0.5"); // operator input
    inject_refresh(&mock, "1.000", "0.000", "0.000");

    // Iteration 2: start; source still at 1.0 V
    mock.inject_line("\"start_control\"");
    inject_refresh(&mock, "1.000", "0.000", "0.000");

    // Iterations 3-4: source steps to 2.0 V then 3.0 V, no actions
    mock.inject_line("\"\"");
    inject_refresh(&mock, "2.000", "1.500", "0.100");
    mock.inject_line("\"\"");
    inject_refresh(&mock, "3.000", "2.500", "0.100");

    // Iteration 5: close
    mock.inject_line("\"close_dialog\"");

    let mut controller = controller_over(&mock);
    controller.run(&AtomicBool::new(false)).unwrap();

    let volt_cmds: Vec<String> = mock
        .written_lines()
        .into_iter()
        .filter(|l| l.starts_with("VOLT ") && !l.starts_with("VOLT:"))
        .collect();
    assert_eq!(volt_cmds, vec!["VOLT 1.500", "VOLT 2.500", "VOLT 3.500"]);

    assert!(controller.session().running);
    assert_eq!(controller.session().offset, 0.5);
    assert_eq!(controller.session().last_target, 3.5);
}

#[test]
fn test_start_stop_idempotent_on_wire() {
    let mock = MockTransport::new();

    for action in ["start_control", "start_control", "stop_control", "stop_control"] {
        mock.inject_line(&format!("\"{action}\""));
        inject_refresh(&mock, "1.000", "1.000", "0.050");
    }
    mock.inject_line("\"close_dialog\"");

    let mut controller = controller_over(&mock);
    controller.run(&AtomicBool::new(false)).unwrap();

    let lines = mock.written_lines();
    let enables = lines.iter().filter(|l| *l == "OUTP 1").count();
    let disables = lines.iter().filter(|l| *l == "OUTP 0").count();

    // Duplicate start/stop re-issue the enable/disable, nothing more
    assert_eq!(enables, 2);
    assert_eq!(disables, 2);
    assert_eq!(lines.iter().filter(|l| *l == "CURR 0.100").count(), 2);
    assert!(!controller.session().running);
}

#[test]
fn test_cancelled_offset_leaves_prior_value() {
    let mock = MockTransport::new();

    mock.inject_line("\"config_voltage_offset\"");
    mock.inject_line("1.000");
    mock.inject_line("\"\""); // operator cancelled
    inject_refresh(&mock, "1.000", "0.000", "0.000");
    mock.inject_line("\"close_dialog\"");

    let mut controller = controller_over(&mock);
    controller.run(&AtomicBool::new(false)).unwrap();

    assert_eq!(controller.session().offset, 0.0);
}

#[test]
fn test_module_check_passes_and_fails() {
    let mock = MockTransport::new();
    mock.inject_line("DCP405");
    mock.inject_line("DCP405");
    assert!(controller_over(&mock).check_modules().is_ok());

    let mock = MockTransport::new();
    mock.inject_line("DCP405");
    mock.inject_line("DCM224");
    match controller_over(&mock).check_modules().unwrap_err() {
        FollowerError::IncompatibleModule { channel, model, .. } => {
            assert_eq!(channel, 2);
            assert_eq!(model, "DCM224");
        }
        other => panic!("Expected IncompatibleModule, got {other:?}"),
    }
}

#[test]
fn test_io_error_terminates_loop() {
    let mock = MockTransport::new();

    // One quiet poll, then the script runs dry: the refresh query times
    // out and the loop must fail fast instead of retrying.
    mock.inject_line("\"\"");

    let mut controller = controller_over(&mock);
    let err = controller.run(&AtomicBool::new(false)).unwrap_err();
    assert!(matches!(
        err,
        FollowerError::Link(bb3_link::Error::Timeout)
    ));
}
