use serde_json::{json, Value};

use deck_core::bridge::BridgeError;

use super::*;
use crate::SessionMode;

#[test]
fn test_ime_calls_reach_connection() {
    let mut h = Harness::new();
    h.start();

    let reply = h.controller.handle_ime_call("commitText", &json!("hello"));
    assert_eq!(reply, Ok(Value::Bool(true)));
    assert_eq!(h.world().committed, "hello");

    assert_eq!(
        h.controller.handle_ime_call("getConnectionStatus", &Value::Null),
        Ok(Value::Bool(true))
    );
    h.end(true);
    assert_eq!(
        h.controller.handle_ime_call("getConnectionStatus", &Value::Null),
        Ok(Value::Bool(false))
    );
}

#[test]
fn test_unknown_ime_method_not_implemented() {
    let mut h = Harness::new();
    assert_eq!(
        h.controller.handle_ime_call("selectAll", &Value::Null),
        Err(BridgeError::NotImplemented("selectAll".to_string()))
    );
    assert!(matches!(
        h.controller.handle_ime_call("moveCursor", &json!("left")),
        Err(BridgeError::InvalidArguments { .. })
    ));
}

#[test]
fn test_hide_keyboard_call_dismisses_presentation() {
    let mut h = Harness::with_secondary();
    h.start();
    assert!(h.controller.is_presentation_showing());

    let reply = h.controller.handle_ime_call("hideKeyboard", &Value::Null);
    assert_eq!(reply, Ok(Value::Bool(true)));
    assert!(!h.controller.is_presentation_showing());
    assert_eq!(h.controller.mode(), Some(SessionMode::SecondaryDisplay));
}

#[test]
fn test_settings_calls() {
    let mut h = Harness::new();
    let status = json!({"enabled": true, "selected": false});
    assert_eq!(h.controller.handle_settings_call("getStatus"), Ok(status.clone()));
    assert_eq!(h.controller.handle_settings_call("getIMEStatus"), Ok(status));
    assert_eq!(h.controller.handle_settings_call("isIMEEnabled"), Ok(Value::Bool(true)));
    assert_eq!(h.controller.handle_settings_call("isActive"), Ok(Value::Bool(false)));
    assert!(h.controller.handle_settings_call("reboot").is_err());
}

#[test]
fn test_status_push_goes_to_given_engine() {
    let mut h = Harness::new();
    h.controller.notify_settings_status(42);
    let w = h.world();
    assert_eq!(
        w.sent.last(),
        Some(&(42, "onStatusChanged".to_string(), json!({"enabled": true, "selected": false})))
    );
}

#[test]
fn test_toggle_with_secondary_flips_presentation() {
    let mut h = Harness::with_secondary();
    h.start();
    let first = h.controller.presentation_engine().unwrap();

    assert!(h.controller.handle_toggle_action("app.gsmlg.tele_deck.TOGGLE_KEYBOARD"));
    assert!(!h.controller.is_presentation_showing());
    assert_eq!(h.log_count(&format!("destroy:{first}")), 1);

    assert!(h.controller.handle_toggle_action("TOGGLE_KEYBOARD"));
    assert!(h.controller.is_presentation_showing());
    assert_ne!(h.controller.presentation_engine(), Some(first));
    assert_eq!(h.controller.mode(), Some(SessionMode::SecondaryDisplay));
}

#[test]
fn test_show_keeps_remote_input_mode() {
    let mut h = Harness::with_secondary();
    h.start_in(Some("com.ayaneo.home"));
    h.controller.hide_keyboard();
    assert!(!h.controller.is_presentation_showing());

    h.controller.show_keyboard();
    assert_eq!(h.controller.mode(), Some(SessionMode::PrimaryForRemoteInput));
    assert_eq!(h.controller.presentation_display().map(|d| d.id), Some(0));
}

#[test]
fn test_toggle_without_secondary_delegates_to_host() {
    let mut h = Harness::new();
    h.start();

    h.send(ControllerEvent::Toggle(deck_core::bridge::ToggleAction::Toggle));
    h.send(ControllerEvent::Toggle(deck_core::bridge::ToggleAction::Toggle));
    assert!(h.controller.handle_toggle_action("HIDE_KEYBOARD"));
    assert!(h.controller.handle_toggle_action("SHOW_KEYBOARD"));

    let w = h.world();
    assert_eq!(w.show_requests, 2);
    assert_eq!(w.hide_requests, 2);
    assert!(w.input_view_shown);
}

#[test]
fn test_unknown_toggle_action_rejected() {
    let mut h = Harness::new();
    assert!(!h.controller.handle_toggle_action("app.gsmlg.tele_deck.FLIP"));
}
