use serde_json::json;

use deck_core::error::EngineState;
use deck_core::settings::HardwareEmulationPreference;

use super::*;
use crate::{SessionMode, SessionState};

#[test]
fn test_start_without_secondary_uses_primary() {
    let mut h = Harness::new();
    h.start();

    assert_eq!(h.controller.state(), SessionState::Active(SessionMode::PrimaryFallback));
    assert_eq!(h.controller.mode_tag(), Some("primary_fallback"));
    assert!(h.controller.primary_session().is_attached());
    assert!(!h.controller.is_presentation_showing());
    assert_eq!(h.controller.wired_engine(), Some(PRIMARY_ENGINE));
    assert_eq!(
        h.modes_sent_to(PRIMARY_ENGINE),
        vec![json!({"mode": "primary_fallback", "displayWidth": 1080, "displayHeight": 2400})]
    );
    assert_eq!(h.log_count("entry:1:imeMain"), 1);
}

#[test]
fn test_start_with_secondary_shows_presentation() {
    let mut h = Harness::with_secondary();
    h.start_in(Some("org.example.notes"));

    assert_eq!(h.controller.state(), SessionState::Active(SessionMode::SecondaryDisplay));
    assert!(h.controller.is_presentation_showing());
    assert_eq!(h.controller.presentation_display().map(|d| d.id), Some(SECONDARY_ID));
    assert!(!h.controller.primary_session().is_attached());

    let engine = h.controller.presentation_engine().unwrap();
    assert_eq!(h.controller.wired_engine(), Some(engine));
    assert_eq!(
        h.modes_sent_to(engine),
        vec![json!({"mode": "secondary", "displayWidth": 1080, "displayHeight": 1240})]
    );
    assert!(h.modes_sent_to(PRIMARY_ENGINE).is_empty());
}

#[test]
fn test_editor_on_secondary_puts_keyboard_on_primary() {
    let mut h = Harness::with_secondary();
    h.start_in(Some("com.ayaneo.secondlauncher"));

    assert_eq!(
        h.controller.state(),
        SessionState::Active(SessionMode::PrimaryForRemoteInput)
    );
    assert_eq!(h.controller.presentation_display().map(|d| d.id), Some(0));
    let engine = h.controller.presentation_engine().unwrap();
    assert_eq!(
        h.modes_sent_to(engine),
        vec![json!({
            "mode": "primary_for_secondary_input",
            "displayWidth": 1080,
            "displayHeight": 2400
        })]
    );
}

#[test]
fn test_task_query_detects_editor_on_secondary() {
    let mut h = Harness::with_secondary();
    h.world().tasks = vec![deck_core::display::TaskInfo {
        top_package: Some("org.example.game".to_string()),
        display_id: Some(SECONDARY_ID),
    }];
    h.start_in(Some("org.example.game"));
    assert_eq!(h.controller.mode(), Some(SessionMode::PrimaryForRemoteInput));
}

#[test]
fn test_transient_cycles_keep_primary_view() {
    let mut h = Harness::new();
    for _ in 0..5 {
        h.start();
        h.end(false);
        assert_eq!(h.controller.state(), SessionState::Ending(SessionMode::PrimaryFallback));
    }
    h.start();

    let primary = h.controller.primary_session();
    assert_eq!(primary.attach_count(), 1);
    assert!(primary.entrypoint_executed());
    assert_eq!(h.log_count("entry:1:imeMain"), 1);
    assert_eq!(h.log_count("destroy:1"), 0);
}

#[test]
fn test_transient_end_keeps_presentation() {
    let mut h = Harness::with_secondary();
    h.start();
    let engine = h.controller.presentation_engine().unwrap();

    h.end(false);
    assert!(h.controller.is_presentation_showing());
    assert_eq!(h.controller.state(), SessionState::Ending(SessionMode::SecondaryDisplay));

    h.start();
    assert_eq!(h.controller.presentation_engine(), Some(engine));
    assert_eq!(h.log_count(&format!("create:{SECONDARY_ID}:{engine}")), 1);
    assert_eq!(h.log_count(&format!("destroy:{engine}")), 0);
    assert_eq!(h.modes_sent_to(engine).len(), 2);
}

#[test]
fn test_finish_input_drops_connection_only() {
    let mut h = Harness::with_secondary();
    h.start();
    assert!(h.controller.has_connection());

    h.end(true);
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert!(!h.controller.has_connection());
    assert!(h.controller.is_presentation_showing());
}

#[test]
fn test_presentation_failure_falls_back_with_fault() {
    let mut h = Harness::with_secondary();
    h.world().fail_presentation = true;
    h.start();

    assert_eq!(h.controller.state(), SessionState::Active(SessionMode::PrimaryFallback));
    assert!(h.controller.primary_session().is_attached());
    assert!(h.controller.presentation_engine().is_none());
    assert_eq!(h.log_count("destroy:100"), 1);

    let w = h.world();
    assert_eq!(w.faults.len(), 1);
    let fault = &w.faults[0];
    assert_eq!(fault.error_type, "WindowManager$InvalidDisplayException");
    assert_eq!(fault.engine_state, EngineState::Stopped);
    assert!(fault.stack_trace.contains("addView"));
    let display = fault.display_state.as_ref().unwrap();
    assert!(display.has_secondary_display);
    assert_eq!(display.secondary_display_id, Some(SECONDARY_ID));
    assert_eq!((display.primary_width, display.primary_height), PRIMARY_SIZE);
    assert_eq!(display.secondary_width, Some(SECONDARY_SIZE.0));
    assert_eq!(display.secondary_height, Some(SECONDARY_SIZE.1));
}

#[test]
fn test_inline_view_failure_sends_no_mode() {
    let mut h = Harness::new();
    h.world().fail_embedded = true;
    h.start();

    assert_eq!(h.controller.state(), SessionState::Active(SessionMode::PrimaryFallback));
    assert!(!h.controller.primary_session().is_attached());
    assert!(!h.controller.primary_session().is_resumed());
    assert_eq!(h.controller.wired_engine(), None);
    assert!(h.modes_sent_to(PRIMARY_ENGINE).is_empty());
    assert_eq!(h.log_count("resume:1"), 0);
    {
        let w = h.world();
        assert_eq!(w.faults.len(), 1);
        assert_eq!(w.faults[0].engine_state, EngineState::Running);
    }

    // The next session retries the attach.
    h.world().fail_embedded = false;
    h.end(false);
    h.start();
    assert!(h.controller.primary_session().is_attached());
    assert_eq!(h.controller.wired_engine(), Some(PRIMARY_ENGINE));
    assert_eq!(
        h.modes_sent_to(PRIMARY_ENGINE),
        vec![json!({"mode": "primary_fallback", "displayWidth": 1080, "displayHeight": 2400})]
    );
}

#[test]
fn test_render_failure_on_presentation_falls_back() {
    let mut h = Harness::with_secondary();
    h.start();
    let engine = h.controller.presentation_engine().unwrap();

    h.send(ControllerEvent::RenderFailure(PlatformError::new(
        "IllegalStateException",
        "surface lost",
    )));
    assert_eq!(h.controller.mode(), Some(SessionMode::PrimaryFallback));
    assert_eq!(h.log_count(&format!("destroy:{engine}")), 1);
    assert_eq!(h.world().faults[0].engine_state, EngineState::Running);
}

#[test]
fn test_shutdown_releases_everything() {
    let mut h = Harness::with_secondary();
    assert!(h.world().hotplug_registered);
    h.start();
    let engine = h.controller.presentation_engine().unwrap();

    h.controller.shutdown();
    assert!(h.controller.is_shut_down());
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.log_count(&format!("destroy:{engine}")), 1);
    assert_eq!(h.log_count("destroy:1"), 0);
    {
        let w = h.world();
        assert!(w.keys_cleaned);
        assert!(!w.hotplug_registered);
    }

    h.clear_log();
    h.start();
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert!(h.world().log.is_empty());
}

#[test]
fn test_settings_change_reloads_preference() {
    let mut h = Harness::new();
    assert_eq!(h.controller.preference(), HardwareEmulationPreference::Ime);

    h.world().settings_blob = Some(r#"{"keyboardType":"physical"}"#.to_string());
    h.controller.on_settings_changed(Some("unrelated"));
    assert_eq!(h.controller.preference(), HardwareEmulationPreference::Ime);

    h.controller.on_settings_changed(Some("flutter.teledeck_settings"));
    assert_eq!(h.controller.preference(), HardwareEmulationPreference::Physical);
    assert_eq!(
        h.world().preferences.last(),
        Some(&HardwareEmulationPreference::Physical)
    );

    h.world().settings_blob = Some("not json".to_string());
    h.controller.on_settings_changed(None);
    assert_eq!(h.controller.preference(), HardwareEmulationPreference::Ime);
}
