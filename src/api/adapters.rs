//! Host objects seen through the core traits.

use std::sync::Arc;

use tracing::warn;

use deck_core::bridge::{
    ExtractedText, InputConnection, KeyEvent, MessageSink, SystemControls, VolumeAdjust,
};
use deck_core::crash::CrashNotifier;
use deck_core::display::{DisplayHandle, DisplayId, DisplayService, FocusProbe, TaskInfo};
use deck_core::hardware::{HidTransport, VirtualKeyboardDriver};
use deck_core::settings::SettingsStore;
use deck_core::surface::{EngineId, RenderEngine, SurfaceHost, SurfaceLayout, SurfaceTarget};
use deck_core::PlatformError;

use super::platform::{
    DeckCrashNotifier, DeckDisplayService, DeckFocusProbe, DeckHidTransport, DeckInputConnection,
    DeckMessageSink, DeckSettingsStore, DeckSurfaceHost, DeckSystemControls,
    DeckVirtualKeyboardDriver,
};

// ---------------------------------------------------------------------------
// Displays
// ---------------------------------------------------------------------------

pub(super) struct HostDisplays(pub Arc<dyn DeckDisplayService>);

impl DisplayService for HostDisplays {
    fn displays(&self) -> Result<Vec<DisplayHandle>, PlatformError> {
        Ok(self.0.displays()?.into_iter().map(Into::into).collect())
    }

    fn display(&self, id: DisplayId) -> Result<Option<DisplayHandle>, PlatformError> {
        Ok(self.0.display(id)?.map(Into::into))
    }

    fn primary_metrics(&self) -> Result<(u32, u32), PlatformError> {
        let size = self.0.primary_metrics()?;
        Ok((size.width, size.height))
    }

    fn register_hotplug(&mut self) -> Result<(), PlatformError> {
        Ok(self.0.register_hotplug()?)
    }

    fn unregister_hotplug(&mut self) {
        if let Err(e) = self.0.unregister_hotplug() {
            warn!("hotplug unregistration failed: {e}");
        }
    }
}

pub(super) struct HostFocus(pub Arc<dyn DeckFocusProbe>);

impl FocusProbe for HostFocus {
    fn running_tasks(&self) -> Result<Vec<TaskInfo>, PlatformError> {
        Ok(self.0.running_tasks()?.into_iter().map(Into::into).collect())
    }

    fn ime_window_display(&self) -> Result<Option<DisplayId>, PlatformError> {
        Ok(self.0.ime_window_display()?)
    }
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

/// Engine living in the host, driven by id.
pub(super) struct HostEngine {
    id: EngineId,
    host: Arc<dyn DeckSurfaceHost>,
}

impl HostEngine {
    pub(super) fn new(id: EngineId, host: Arc<dyn DeckSurfaceHost>) -> Self {
        Self { id, host }
    }
}

impl RenderEngine for HostEngine {
    fn id(&self) -> EngineId {
        self.id
    }

    fn execute_entrypoint(&mut self, entrypoint: &str) -> Result<(), PlatformError> {
        Ok(self.host.execute_entrypoint(self.id, entrypoint.to_string())?)
    }

    fn resume(&mut self) {
        if let Err(e) = self.host.resume_engine(self.id) {
            warn!(engine = self.id, "resume failed: {e}");
        }
    }

    fn pause(&mut self) {
        if let Err(e) = self.host.pause_engine(self.id) {
            warn!(engine = self.id, "pause failed: {e}");
        }
    }

    fn destroy(&mut self) {
        if let Err(e) = self.host.destroy_engine(self.id) {
            warn!(engine = self.id, "destroy failed: {e}");
        }
    }
}

pub(super) struct HostSurfaces(pub Arc<dyn DeckSurfaceHost>);

impl SurfaceHost for HostSurfaces {
    fn create_engine(&mut self, target: &SurfaceTarget) -> Result<Box<dyn RenderEngine>, PlatformError> {
        let id = self.0.create_engine(target.into())?;
        Ok(Box::new(HostEngine::new(id, Arc::clone(&self.0))))
    }

    fn attach(
        &mut self,
        target: &SurfaceTarget,
        engine: EngineId,
        layout: &SurfaceLayout,
    ) -> Result<(), PlatformError> {
        Ok(self.0.attach(target.into(), engine, layout.into())?)
    }

    fn detach(&mut self, target: &SurfaceTarget, engine: EngineId) -> Result<(), PlatformError> {
        Ok(self.0.detach(target.into(), engine)?)
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

pub(super) struct HostSink(pub Arc<dyn DeckMessageSink>);

impl MessageSink for HostSink {
    fn send(
        &mut self,
        engine: EngineId,
        channel: &str,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<(), PlatformError> {
        Ok(self
            .0
            .send(engine, channel.to_string(), method.to_string(), payload.to_string())?)
    }
}

pub(super) struct HostSystem(pub Arc<dyn DeckSystemControls>);

impl SystemControls for HostSystem {
    fn adjust_volume(&mut self, adjust: VolumeAdjust) -> Result<(), PlatformError> {
        Ok(self.0.adjust_volume(adjust.into())?)
    }

    fn dispatch_media_key(&mut self, key_code: u32) -> Result<(), PlatformError> {
        Ok(self.0.dispatch_media_key(key_code)?)
    }

    fn microphone_muted(&self) -> Result<bool, PlatformError> {
        Ok(self.0.microphone_muted()?)
    }

    fn set_microphone_muted(&mut self, muted: bool) -> Result<(), PlatformError> {
        Ok(self.0.set_microphone_muted(muted)?)
    }

    fn is_ime_enabled(&self) -> Result<bool, PlatformError> {
        Ok(self.0.is_ime_enabled()?)
    }

    fn is_ime_selected(&self) -> Result<bool, PlatformError> {
        Ok(self.0.is_ime_selected()?)
    }

    fn open_ime_picker(&mut self) -> Result<(), PlatformError> {
        Ok(self.0.open_ime_picker()?)
    }

    fn open_ime_settings(&mut self) -> Result<(), PlatformError> {
        Ok(self.0.open_ime_settings()?)
    }

    fn request_show_self(&mut self) -> Result<(), PlatformError> {
        Ok(self.0.request_show_self()?)
    }

    fn request_hide_self(&mut self) -> Result<(), PlatformError> {
        Ok(self.0.request_hide_self()?)
    }

    fn is_input_view_shown(&self) -> Result<bool, PlatformError> {
        Ok(self.0.is_input_view_shown()?)
    }
}

pub(super) struct HostConnection(pub Arc<dyn DeckInputConnection>);

impl InputConnection for HostConnection {
    fn commit_text(&mut self, text: &str) -> Result<(), PlatformError> {
        Ok(self.0.commit_text(text.to_string())?)
    }

    fn delete_surrounding_text(&mut self, before: u32, after: u32) -> Result<(), PlatformError> {
        Ok(self.0.delete_surrounding_text(before, after)?)
    }

    fn perform_editor_action(&mut self, action: u32) -> Result<(), PlatformError> {
        Ok(self.0.perform_editor_action(action)?)
    }

    fn extracted_text(&mut self) -> Result<Option<ExtractedText>, PlatformError> {
        Ok(self.0.extracted_text()?.map(Into::into))
    }

    fn set_selection(&mut self, start: i32, end: i32) -> Result<(), PlatformError> {
        Ok(self.0.set_selection(start, end)?)
    }

    fn send_key_event(&mut self, event: &KeyEvent) -> Result<(), PlatformError> {
        Ok(self.0.send_key_event(event.into())?)
    }
}

// ---------------------------------------------------------------------------
// Settings and crash notification
// ---------------------------------------------------------------------------

pub(super) struct HostSettings(pub Arc<dyn DeckSettingsStore>);

impl SettingsStore for HostSettings {
    fn get_string(&self, key: &str) -> Option<String> {
        self.0.get_string(key.to_string())
    }
}

pub(super) struct HostCrashNotifier(pub Arc<dyn DeckCrashNotifier>);

impl CrashNotifier for HostCrashNotifier {
    fn notify(&self, id: &str, error_type: &str) {
        self.0.notify(id.to_string(), error_type.to_string());
    }
}

// ---------------------------------------------------------------------------
// Hardware drivers
// ---------------------------------------------------------------------------

pub(super) struct HostVirtualKeyboard(pub Arc<dyn DeckVirtualKeyboardDriver>);

impl VirtualKeyboardDriver for HostVirtualKeyboard {
    fn probe(&self) -> Result<(), PlatformError> {
        Ok(self.0.probe()?)
    }

    fn open(&mut self, display: Option<DisplayId>) -> Result<(), PlatformError> {
        Ok(self.0.open(display)?)
    }

    fn close(&mut self) {
        self.0.close();
    }

    fn send_key(&mut self, key_code: u32, down: bool) -> Result<(), PlatformError> {
        Ok(self.0.send_key(key_code, down)?)
    }
}

pub(super) struct HostHidTransport(pub Arc<dyn DeckHidTransport>);

impl HidTransport for HostHidTransport {
    fn is_supported(&self) -> bool {
        self.0.is_supported()
    }

    fn register(&mut self) -> Result<(), PlatformError> {
        Ok(self.0.register()?)
    }

    fn unregister(&mut self) {
        self.0.unregister();
    }

    fn connected_device(&self) -> Option<String> {
        self.0.connected_device()
    }

    fn send_report(&mut self, report: &[u8; 8]) -> Result<(), PlatformError> {
        Ok(self.0.send_report(report.to_vec())?)
    }
}
