//! Fan-out behaviour of the orchestrator against simulated devices

use std::time::{Duration, Instant};

use lights_gateway::{
    ColorInput, ControlOutcome, ControlRequest, DeviceState, ErrorKind, OutcomeValue, PowerAction,
};

mod common;
use common::{TestHomeBuilder, names};

fn toggle(targets: Option<Vec<String>>) -> ControlRequest {
    ControlRequest::set_state(PowerAction::Toggle, targets)
}

#[tokio::test]
async fn test_failures_do_not_affect_other_devices() {
    let home = TestHomeBuilder::new()
        .bulb("a", true)
        .bulb("b", false)
        .bulb("c", true)
        .build()
        .await;
    home.sim("c").set_fail_with(Some(-32000));

    let outcomes = home.orchestrator.dispatch(toggle(None)).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes["a"], ControlOutcome::confirmation("off"));
    assert_eq!(outcomes["b"], ControlOutcome::confirmation("on"));
    assert_eq!(outcomes["c"].failure_kind(), Some(ErrorKind::DeviceError));
    assert!(!home.sim("a").is_on());
    assert!(home.sim("b").is_on());
}

#[tokio::test]
async fn test_absent_device_is_unreachable() {
    let home = TestHomeBuilder::new()
        .bulb("a", true)
        .offline("b")
        .build()
        .await;

    let outcomes = home.orchestrator.dispatch(toggle(names(&["a", "b"]))).await;

    assert_eq!(outcomes["a"], ControlOutcome::confirmation("off"));
    assert_eq!(outcomes["b"].failure_kind(), Some(ErrorKind::Unreachable));
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let home = TestHomeBuilder::new().bulb("a", false).build().await;

    let outcomes = home
        .orchestrator
        .dispatch(ControlRequest::set_state(
            PowerAction::On,
            names(&["ghost", "a"]),
        ))
        .await;

    let keys: Vec<_> = outcomes.keys().map(String::as_str).collect();
    assert_eq!(keys, ["ghost", "a"]);
    assert_eq!(outcomes["ghost"].failure_kind(), Some(ErrorKind::NotFound));
    assert_eq!(outcomes["a"], ControlOutcome::confirmation("on"));
}

#[tokio::test]
async fn test_zero_valid_devices() {
    let home = TestHomeBuilder::new().bulb("a", false).build().await;

    let outcomes = home.orchestrator.dispatch(toggle(names(&[]))).await;
    assert!(outcomes.is_empty());

    let outcomes = home.orchestrator.dispatch(toggle(names(&["x", "y"]))).await;
    assert_eq!(outcomes.len(), 2);
    assert!(
        outcomes
            .values()
            .all(|o| o.failure_kind() == Some(ErrorKind::NotFound))
    );
    assert!(home.sim("a").calls().is_empty());
}

#[tokio::test]
async fn test_outcomes_follow_request_order_not_completion_order() {
    let home = TestHomeBuilder::new()
        .bulb("a", false)
        .bulb("b", false)
        .bulb("c", false)
        .build()
        .await;
    home.sim("c").set_stall(Some(Duration::from_millis(150)));

    let outcomes = home
        .orchestrator
        .dispatch(ControlRequest::set_state(
            PowerAction::On,
            names(&["c", "a", "b"]),
        ))
        .await;

    let keys: Vec<_> = outcomes.keys().map(String::as_str).collect();
    assert_eq!(keys, ["c", "a", "b"]);
    assert!(outcomes.values().all(ControlOutcome::is_success));
}

#[tokio::test]
async fn test_default_targets_are_all_devices_in_configuration_order() {
    let home = TestHomeBuilder::new()
        .bulb("kitchen_light", false)
        .offline("tv_light")
        .switch("living_room_plug", false)
        .build()
        .await;

    let outcomes = home.orchestrator.dispatch(toggle(None)).await;

    let keys: Vec<_> = outcomes.keys().map(String::as_str).collect();
    assert_eq!(keys, ["kitchen_light", "tv_light", "living_room_plug"]);
    assert_eq!(
        outcomes["tv_light"].failure_kind(),
        Some(ErrorKind::Unreachable)
    );
}

#[tokio::test]
async fn test_devices_run_concurrently() {
    let home = TestHomeBuilder::new()
        .bulb("a", false)
        .bulb("b", false)
        .bulb("c", false)
        .build()
        .await;
    for name in ["a", "b", "c"] {
        home.sim(name).set_stall(Some(Duration::from_millis(300)));
    }

    let started = Instant::now();
    let outcomes = home.orchestrator.dispatch(toggle(None)).await;

    assert!(outcomes.values().all(ControlOutcome::is_success));
    // Two stalled calls per device (read, then write); serial dispatch would take 1.8s.
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_duplicate_targets_dispatched_once() {
    let home = TestHomeBuilder::new().bulb("a", true).build().await;

    let outcomes = home.orchestrator.dispatch(toggle(names(&["a", "a"]))).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(home.sim("a").calls(), ["get_state", "turn_off"]);
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let home = TestHomeBuilder::new()
        .bulb("a", true)
        .switch("p", false)
        .build()
        .await;

    let first = home.orchestrator.dispatch(toggle(None)).await;
    assert_eq!(first["a"], ControlOutcome::confirmation("off"));
    assert_eq!(first["p"], ControlOutcome::confirmation("on"));

    let second = home.orchestrator.dispatch(toggle(None)).await;
    assert_eq!(second["a"], ControlOutcome::confirmation("on"));
    assert_eq!(second["p"], ControlOutcome::confirmation("off"));

    assert!(home.sim("a").is_on());
    assert!(!home.sim("p").is_on());
}

#[tokio::test]
async fn test_set_properties_step_order() {
    let home = TestHomeBuilder::new().bulb("a", false).build().await;

    let request = ControlRequest::set_properties(
        Some(50),
        Some(&ColorInput::Hex("#FF0000".into())),
        names(&["a"]),
    )
    .unwrap();
    let outcomes = home.orchestrator.dispatch(request).await;

    assert_eq!(outcomes["a"], ControlOutcome::confirmation("properties set"));
    assert_eq!(
        home.sim("a").calls(),
        ["turn_on", "set_brightness(50)", "set_color(rgb 255,0,0)"]
    );
}

#[tokio::test]
async fn test_zero_brightness_does_not_power_on_bulb() {
    let home = TestHomeBuilder::new().bulb("a", false).build().await;

    let request = ControlRequest::set_properties(Some(0), None, None).unwrap();
    home.orchestrator.dispatch(request).await;

    assert_eq!(home.sim("a").calls(), ["set_brightness(0)"]);
}

#[tokio::test]
async fn test_color_only() {
    let home = TestHomeBuilder::new().bulb("a", true).build().await;

    let request =
        ControlRequest::set_properties(None, Some(&ColorInput::Triple([0, 0, 255])), None)
            .unwrap();
    home.orchestrator.dispatch(request).await;

    assert_eq!(home.sim("a").calls(), ["set_color(rgb 0,0,255)"]);
}

#[tokio::test]
async fn test_switch_never_receives_brightness_or_color() {
    let home = TestHomeBuilder::new().switch("p", false).build().await;

    let request = ControlRequest::set_properties(
        Some(80),
        Some(&ColorInput::Hex("#00FF00".into())),
        None,
    )
    .unwrap();
    let outcomes = home.orchestrator.dispatch(request).await;
    assert_eq!(outcomes["p"], ControlOutcome::confirmation("properties set"));
    assert_eq!(home.sim("p").calls(), ["turn_on"]);

    home.sim("p").clear_calls();
    let request = ControlRequest::set_properties(Some(0), None, None).unwrap();
    home.orchestrator.dispatch(request).await;
    assert_eq!(home.sim("p").calls(), ["turn_off"]);
    assert!(!home.sim("p").is_on());
}

#[tokio::test]
async fn test_invalid_color_rejected_before_dispatch() {
    let home = TestHomeBuilder::new().bulb("a", false).build().await;

    let err = ControlRequest::set_properties(
        Some(50),
        Some(&ColorInput::Hex("#FF00".into())),
        None,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);

    let err = ControlRequest::set_properties(Some(101), None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);

    assert!(home.sim("a").calls().is_empty());
}

#[tokio::test]
async fn test_partial_property_update_is_not_rolled_back() {
    let home = TestHomeBuilder::new().bulb("a", false).build().await;
    home.sim("a").set_fail_on(Some("set_color"));

    let request = ControlRequest::set_properties(
        Some(40),
        Some(&ColorInput::Hex("#0000ff".into())),
        None,
    )
    .unwrap();
    let outcomes = home.orchestrator.dispatch(request).await;

    assert_eq!(outcomes["a"].failure_kind(), Some(ErrorKind::DeviceError));
    assert_eq!(
        home.sim("a").calls(),
        ["turn_on", "set_brightness(40)", "set_color(rgb 0,0,255) (failed)"]
    );
    assert!(home.sim("a").is_on());
}

#[tokio::test]
async fn test_stalled_device_times_out_alone() {
    let home = TestHomeBuilder::new()
        .bulb("slow", false)
        .bulb("fast", false)
        .timeout(Duration::from_millis(100))
        .build()
        .await;
    home.sim("slow").set_stall(Some(Duration::from_secs(30)));

    let started = Instant::now();
    let outcomes = home
        .orchestrator
        .dispatch(ControlRequest::set_state(PowerAction::On, None))
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(outcomes["slow"].failure_kind(), Some(ErrorKind::Timeout));
    assert_eq!(outcomes["fast"], ControlOutcome::confirmation("on"));
}

#[tokio::test]
async fn test_panicking_driver_is_contained() {
    let home = TestHomeBuilder::new()
        .bulb("broken", false)
        .bulb("fine", false)
        .build()
        .await;
    home.sim("broken").set_panic(true);

    let outcomes = home
        .orchestrator
        .dispatch(ControlRequest::set_state(PowerAction::On, None))
        .await;

    assert_eq!(outcomes["broken"].failure_kind(), Some(ErrorKind::DeviceError));
    assert_eq!(outcomes["fine"], ControlOutcome::confirmation("on"));
}

#[tokio::test]
async fn test_query_info() {
    let home = TestHomeBuilder::new()
        .bulb("a", true)
        .offline("b")
        .build()
        .await;

    let outcomes = home
        .orchestrator
        .dispatch(ControlRequest::query_info(None))
        .await;

    assert_eq!(
        outcomes["a"].value(),
        Some(&OutcomeValue::State(DeviceState {
            is_on: true,
            hue: Some(0),
            brightness: Some(0),
        }))
    );
    assert_eq!(outcomes["b"].failure_kind(), Some(ErrorKind::Unreachable));
    assert_eq!(home.sim("a").calls(), ["get_state"]);
}
