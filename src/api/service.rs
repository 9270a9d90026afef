use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use deck_core::crash::CrashLogStore;
use deck_core::bridge::Modifiers;
use deck_core::hardware::{
    BackendError, BluetoothHidBackend, HardwareBackend, HardwareEmulationRouter, KeyDirection,
    VirtualDeviceBackend,
};
use deck_core::settings::{self, DeckConfig};
use deck_core::PlatformError;
use deck_session::{ControllerDeps, ControllerEvent, ImeSessionController};

use crate::async_worker::{lock_router, BackendWorker, WorkerKeyEmulation};

use super::adapters::{
    HostConnection, HostCrashNotifier, HostDisplays, HostEngine, HostFocus, HostHidTransport,
    HostSettings, HostSink, HostSurfaces, HostSystem, HostVirtualKeyboard,
};
use super::platform::{
    DeckCrashNotifier, DeckDisplayService, DeckFocusProbe, DeckHidTransport, DeckInputConnection,
    DeckMessageSink, DeckSettingsStore, DeckSurfaceHost, DeckSystemControls,
    DeckVirtualKeyboardDriver,
};
use super::{DeckBackendKind, DeckBackendStatus, DeckEditorInfo, DeckError, DeckHardwareKey};

/// Host platform objects handed to [`DeckService`].
pub struct DeckPlatform {
    pub displays: Arc<dyn DeckDisplayService>,
    pub focus: Arc<dyn DeckFocusProbe>,
    pub surfaces: Arc<dyn DeckSurfaceHost>,
    pub system: Arc<dyn DeckSystemControls>,
    pub sink: Arc<dyn DeckMessageSink>,
    pub settings: Arc<dyn DeckSettingsStore>,
    /// Directory crash logs are written to.
    pub crash_dir: String,
    pub crash_notifier: Option<Arc<dyn DeckCrashNotifier>>,
    pub virtual_keyboard: Option<Arc<dyn DeckVirtualKeyboardDriver>>,
    pub hid_transport: Option<Arc<dyn DeckHidTransport>>,
}

#[derive(uniffi::Object)]
pub struct DeckService {
    controller: Mutex<ImeSessionController>,
    backends: BackendWorker,
}

impl DeckService {
    fn controller(&self) -> MutexGuard<'_, ImeSessionController> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, event: ControllerEvent) {
        self.controller().handle(event, Instant::now());
    }

    fn router(&self) -> MutexGuard<'_, HardwareEmulationRouter> {
        lock_router(self.backends.router())
    }

    /// Queue a hotplug event and report when `poll` is next due.
    fn handle_hotplug(&self, event: ControllerEvent) -> Option<u64> {
        let now = Instant::now();
        let mut controller = self.controller();
        controller.handle(event, now);
        controller.poll(now).map(delay_millis)
    }

    pub(crate) fn with_config(
        platform: DeckPlatform,
        primary_engine: u64,
        primary_entrypoint_executed: bool,
        config: DeckConfig,
    ) -> Self {
        let mut backends: Vec<Box<dyn HardwareBackend>> = Vec::new();
        if let Some(driver) = platform.virtual_keyboard {
            backends.push(Box::new(VirtualDeviceBackend::new(Box::new(HostVirtualKeyboard(
                driver,
            )))));
        }
        #[cfg(any(target_os = "linux", target_os = "android"))]
        backends.push(Box::new(deck_core::hardware::UinputBackend::new()));
        if let Some(transport) = platform.hid_transport {
            backends.push(Box::new(BluetoothHidBackend::new(Box::new(HostHidTransport(
                transport,
            )))));
        }
        let router = HardwareEmulationRouter::new(backends, &config.hardware.backend_order);
        let worker = BackendWorker::new(router);

        let mut crash = CrashLogStore::new(platform.crash_dir, config.crash.retention());
        if let Some(notifier) = platform.crash_notifier {
            crash = crash.with_notifier(Box::new(HostCrashNotifier(notifier)));
        }

        let deps = ControllerDeps {
            displays: Box::new(HostDisplays(platform.displays)),
            focus: Arc::new(HostFocus(platform.focus)),
            primary_engine: Box::new(HostEngine::new(
                primary_engine,
                Arc::clone(&platform.surfaces),
            )),
            primary_entrypoint_executed,
            surfaces: Box::new(HostSurfaces(platform.surfaces)),
            system: Box::new(HostSystem(platform.system)),
            sink: Box::new(HostSink(platform.sink)),
            settings: Box::new(HostSettings(platform.settings)),
            crash: Box::new(crash),
            keys: Box::new(WorkerKeyEmulation::new(worker.clone())),
        };
        Self {
            controller: Mutex::new(ImeSessionController::new(deps, config)),
            backends: worker,
        }
    }
}

#[uniffi::export]
impl DeckService {
    /// `primary_engine` is the host's cached engine for the inline input
    /// view; it is reused across sessions and never destroyed here.
    #[uniffi::constructor]
    #[allow(clippy::too_many_arguments)]
    fn new(
        displays: Arc<dyn DeckDisplayService>,
        focus: Arc<dyn DeckFocusProbe>,
        surfaces: Arc<dyn DeckSurfaceHost>,
        system: Arc<dyn DeckSystemControls>,
        sink: Arc<dyn DeckMessageSink>,
        settings_store: Arc<dyn DeckSettingsStore>,
        crash_dir: String,
        crash_notifier: Option<Arc<dyn DeckCrashNotifier>>,
        virtual_keyboard: Option<Arc<dyn DeckVirtualKeyboardDriver>>,
        hid_transport: Option<Arc<dyn DeckHidTransport>>,
        primary_engine: u64,
        primary_entrypoint_executed: bool,
    ) -> Arc<Self> {
        let platform = DeckPlatform {
            displays,
            focus,
            surfaces,
            system,
            sink,
            settings: settings_store,
            crash_dir,
            crash_notifier,
            virtual_keyboard,
            hid_transport,
        };
        Arc::new(Self::with_config(
            platform,
            primary_engine,
            primary_entrypoint_executed,
            settings::config().clone(),
        ))
    }

    // -----------------------------------------------------------------
    // Input session lifecycle
    // -----------------------------------------------------------------

    pub fn on_start_input_view(
        &self,
        editor: DeckEditorInfo,
        connection: Option<Arc<dyn DeckInputConnection>>,
    ) {
        let connection = connection.map(|c| {
            Box::new(HostConnection(c)) as Box<dyn deck_core::bridge::InputConnection>
        });
        self.handle(ControllerEvent::SessionStart {
            editor: editor.into(),
            connection,
        });
    }

    pub fn on_finish_input_view(&self) {
        self.handle(ControllerEvent::SessionEnd {
            finishing_input: false,
        });
    }

    pub fn on_finish_input(&self) {
        self.handle(ControllerEvent::SessionEnd {
            finishing_input: true,
        });
    }

    // -----------------------------------------------------------------
    // Displays
    // -----------------------------------------------------------------

    /// Returns milliseconds until `poll` should be called, like `poll`.
    pub fn on_display_added(&self, display_id: i32) -> Option<u64> {
        self.handle_hotplug(ControllerEvent::DisplayAdded(display_id))
    }

    pub fn on_display_removed(&self, display_id: i32) -> Option<u64> {
        self.handle_hotplug(ControllerEvent::DisplayRemoved(display_id))
    }

    /// Fire due hotplug events. Returns milliseconds until `poll` should be
    /// called again, or `None` when nothing is pending.
    pub fn poll(&self) -> Option<u64> {
        self.controller().poll(Instant::now()).map(delay_millis)
    }

    // -----------------------------------------------------------------
    // Channels
    // -----------------------------------------------------------------

    /// Call on the ime channel; `args_json` and the reply are JSON.
    pub fn handle_ime_call(&self, method: String, args_json: String) -> Result<String, DeckError> {
        let args = parse_args(&args_json)?;
        let reply = self.controller().handle_ime_call(&method, &args)?;
        Ok(reply.to_string())
    }

    /// Call on the settings channel; the reply is JSON.
    pub fn handle_settings_call(&self, method: String, args_json: String) -> Result<String, DeckError> {
        parse_args(&args_json)?;
        let reply = self.controller().handle_settings_call(&method)?;
        Ok(reply.to_string())
    }

    /// Push the enabled/selected status to the settings UI in `engine`.
    pub fn notify_settings_status(&self, engine: u64) {
        self.controller().notify_settings_status(engine);
    }

    pub fn handle_toggle_action(&self, action: String) -> bool {
        self.controller().handle_toggle_action(&action)
    }

    pub fn toggle_keyboard(&self) {
        self.controller().toggle_keyboard();
    }

    pub fn show_keyboard(&self) {
        self.controller().show_keyboard();
    }

    pub fn hide_keyboard(&self) {
        self.controller().hide_keyboard();
    }

    // -----------------------------------------------------------------
    // Settings, hardware and faults
    // -----------------------------------------------------------------

    pub fn on_settings_changed(&self, key: Option<String>) {
        self.controller().on_settings_changed(key.as_deref());
    }

    /// A visible surface stopped rendering.
    pub fn report_render_failure(&self, kind: String, message: String, trace: String) {
        let err = PlatformError::new(kind, message).with_trace(trace);
        self.handle(ControllerEvent::RenderFailure(err));
    }

    pub fn hardware_status(&self) -> Vec<DeckBackendStatus> {
        self.router()
            .statuses()
            .into_iter()
            .map(Into::into)
            .collect()
    }

    pub fn is_backend_available(&self, kind: DeckBackendKind) -> bool {
        self.router().is_available(kind.into())
    }

    /// Switch to `kind` in the background. The previous backend is cleaned
    /// up first; progress shows up in `hardware_status`.
    pub fn select_backend(&self, kind: DeckBackendKind) {
        self.backends.select(kind.into());
    }

    /// Tear down the active backend in the background.
    pub fn dispose_backend(&self) {
        self.backends.cleanup();
    }

    /// Send one key through the active backend. Blocks while the backend
    /// worker is busy, so never call it from the input path.
    pub fn send_hardware_key(&self, key: DeckHardwareKey) -> Result<(), DeckError> {
        send_key(&mut self.router(), key).map_err(backend_error)
    }

    /// Send keys in order, carrying on past failures. Returns whether every
    /// key went through.
    pub fn send_hardware_keys(&self, keys: Vec<DeckHardwareKey>) -> bool {
        let mut router = self.router();
        let mut all_sent = true;
        for key in keys {
            if let Err(e) = send_key(&mut router, key) {
                debug!(key_code = key.key_code, "hardware key not sent: {e}");
                all_sent = false;
            }
        }
        all_sent
    }

    /// Type `text` through the active hardware backend. May block while a
    /// backend initialises, so never call it from the input path.
    pub fn type_text(&self, text: String) -> Result<u32, DeckError> {
        let typed = self.router().type_text(&text).map_err(backend_error)?;
        Ok(u32::try_from(typed).unwrap_or(u32::MAX))
    }

    pub fn mode_tag(&self) -> Option<String> {
        self.controller().mode_tag().map(str::to_string)
    }

    pub fn shutdown(&self) {
        self.controller().shutdown();
        debug!("service shut down");
    }
}

fn parse_args(args_json: &str) -> Result<Value, DeckError> {
    if args_json.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(args_json).map_err(|e| DeckError::InvalidArguments { msg: e.to_string() })
}

fn delay_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn send_key(router: &mut HardwareEmulationRouter, key: DeckHardwareKey) -> Result<(), BackendError> {
    let modifiers = Modifiers {
        shift: key.shift,
        ctrl: key.ctrl,
        alt: key.alt,
        meta: key.meta,
    };
    let direction = key.down.map(|down| {
        if down {
            KeyDirection::Down
        } else {
            KeyDirection::Up
        }
    });
    router.send_on_active(key.key_code, modifiers, direction)
}

fn backend_error(e: BackendError) -> DeckError {
    match e {
        BackendError::Io(e) => DeckError::Io { msg: e.to_string() },
        e @ BackendError::UnknownBackend(_) => DeckError::InvalidArguments { msg: e.to_string() },
        other => DeckError::Internal {
            msg: other.to_string(),
        },
    }
}
