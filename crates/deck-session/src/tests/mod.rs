mod basic;
mod bridge;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::Value;

use deck_core::bridge::{
    EditorInfo, ExtractedText, InputConnection, KeyEvent, MessageSink, Modifiers, SystemControls,
    VolumeAdjust,
};
use deck_core::crash::{CrashReporter, FaultReport};
use deck_core::display::{
    DisplayCategory, DisplayHandle, DisplayId, DisplayService, FocusProbe, TaskInfo,
};
use deck_core::hardware::{BackendError, KeyDirection, KeyEmulation};
use deck_core::settings::{DeckConfig, HardwareEmulationPreference, SettingsStore};
use deck_core::surface::{EngineId, RenderEngine, SurfaceHost, SurfaceLayout, SurfaceTarget};
use deck_core::PlatformError;

use crate::{ControllerDeps, ControllerEvent, ImeSessionController};

pub(super) const PRIMARY_ENGINE: EngineId = 1;
pub(super) const SECONDARY_ID: DisplayId = 4;
pub(super) const PRIMARY_SIZE: (u32, u32) = (1080, 2400);
pub(super) const SECONDARY_SIZE: (u32, u32) = (1080, 1240);

/// Everything the fakes observe or are told to do.
#[derive(Default)]
pub(super) struct World {
    pub displays: Vec<DisplayHandle>,
    pub tasks: Vec<TaskInfo>,
    pub fail_presentation: bool,
    pub fail_embedded: bool,
    pub next_engine: EngineId,
    /// Surface calls in order, e.g. `attach:4:100`, `destroy:100`.
    pub log: Vec<String>,
    pub sent: Vec<(EngineId, String, Value)>,
    pub faults: Vec<FaultReport>,
    pub show_requests: u32,
    pub hide_requests: u32,
    pub input_view_shown: bool,
    pub settings_blob: Option<String>,
    pub preferences: Vec<HardwareEmulationPreference>,
    pub keys_cleaned: bool,
    pub committed: String,
    pub hotplug_registered: bool,
}

pub(super) type Shared = Arc<Mutex<World>>;

pub(super) fn lock(world: &Shared) -> MutexGuard<'_, World> {
    world.lock().unwrap()
}

pub(super) fn primary_display() -> DisplayHandle {
    DisplayHandle {
        id: 0,
        name: "Built-in Screen".to_string(),
        width: PRIMARY_SIZE.0,
        height: PRIMARY_SIZE.1,
        valid: true,
        category: DisplayCategory::Builtin,
    }
}

pub(super) fn secondary_display() -> DisplayHandle {
    DisplayHandle {
        id: SECONDARY_ID,
        name: "DS".to_string(),
        width: SECONDARY_SIZE.0,
        height: SECONDARY_SIZE.1,
        valid: true,
        category: DisplayCategory::Presentation,
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeDisplays(Shared);

impl DisplayService for FakeDisplays {
    fn displays(&self) -> Result<Vec<DisplayHandle>, PlatformError> {
        Ok(lock(&self.0).displays.clone())
    }

    fn display(&self, id: DisplayId) -> Result<Option<DisplayHandle>, PlatformError> {
        Ok(lock(&self.0).displays.iter().find(|d| d.id == id).cloned())
    }

    fn primary_metrics(&self) -> Result<(u32, u32), PlatformError> {
        Ok(PRIMARY_SIZE)
    }

    fn register_hotplug(&mut self) -> Result<(), PlatformError> {
        lock(&self.0).hotplug_registered = true;
        Ok(())
    }

    fn unregister_hotplug(&mut self) {
        lock(&self.0).hotplug_registered = false;
    }
}

struct FakeFocus(Shared);

impl FocusProbe for FakeFocus {
    fn running_tasks(&self) -> Result<Vec<TaskInfo>, PlatformError> {
        Ok(lock(&self.0).tasks.clone())
    }

    fn ime_window_display(&self) -> Result<Option<DisplayId>, PlatformError> {
        Ok(None)
    }
}

struct FakeEngine {
    id: EngineId,
    world: Shared,
}

impl RenderEngine for FakeEngine {
    fn id(&self) -> EngineId {
        self.id
    }

    fn execute_entrypoint(&mut self, entrypoint: &str) -> Result<(), PlatformError> {
        lock(&self.world).log.push(format!("entry:{}:{entrypoint}", self.id));
        Ok(())
    }

    fn resume(&mut self) {
        lock(&self.world).log.push(format!("resume:{}", self.id));
    }

    fn pause(&mut self) {
        lock(&self.world).log.push(format!("pause:{}", self.id));
    }

    fn destroy(&mut self) {
        lock(&self.world).log.push(format!("destroy:{}", self.id));
    }
}

struct FakeHost(Shared);

impl SurfaceHost for FakeHost {
    fn create_engine(&mut self, target: &SurfaceTarget) -> Result<Box<dyn RenderEngine>, PlatformError> {
        let mut w = lock(&self.0);
        w.next_engine += 1;
        let id = 99 + w.next_engine;
        w.log.push(format!("create:{}:{id}", target.display_id()));
        Ok(Box::new(FakeEngine {
            id,
            world: Arc::clone(&self.0),
        }))
    }

    fn attach(
        &mut self,
        target: &SurfaceTarget,
        engine: EngineId,
        _layout: &SurfaceLayout,
    ) -> Result<(), PlatformError> {
        let mut w = lock(&self.0);
        if target.is_presentation() && w.fail_presentation {
            return Err(PlatformError::new(
                "WindowManager$InvalidDisplayException",
                "Unable to add window -- the specified display can not be found",
            )
            .with_trace("android.view.WindowManager$InvalidDisplayException\n\tat addView"));
        }
        if !target.is_presentation() && w.fail_embedded {
            return Err(PlatformError::new(
                "IllegalStateException",
                "The specified child already has a parent",
            ));
        }
        w.log.push(format!("attach:{}:{engine}", target.display_id()));
        Ok(())
    }

    fn detach(&mut self, target: &SurfaceTarget, engine: EngineId) -> Result<(), PlatformError> {
        lock(&self.0).log.push(format!("detach:{}:{engine}", target.display_id()));
        Ok(())
    }
}

struct FakeSink(Shared);

impl MessageSink for FakeSink {
    fn send(
        &mut self,
        engine: EngineId,
        _channel: &str,
        method: &str,
        payload: Value,
    ) -> Result<(), PlatformError> {
        lock(&self.0).sent.push((engine, method.to_string(), payload));
        Ok(())
    }
}

struct FakeSystem(Shared);

impl SystemControls for FakeSystem {
    fn adjust_volume(&mut self, _adjust: VolumeAdjust) -> Result<(), PlatformError> {
        Ok(())
    }

    fn dispatch_media_key(&mut self, _key_code: u32) -> Result<(), PlatformError> {
        Ok(())
    }

    fn microphone_muted(&self) -> Result<bool, PlatformError> {
        Ok(false)
    }

    fn set_microphone_muted(&mut self, _muted: bool) -> Result<(), PlatformError> {
        Ok(())
    }

    fn is_ime_enabled(&self) -> Result<bool, PlatformError> {
        Ok(true)
    }

    fn is_ime_selected(&self) -> Result<bool, PlatformError> {
        Ok(false)
    }

    fn open_ime_picker(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn open_ime_settings(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn request_show_self(&mut self) -> Result<(), PlatformError> {
        let mut w = lock(&self.0);
        w.show_requests += 1;
        w.input_view_shown = true;
        Ok(())
    }

    fn request_hide_self(&mut self) -> Result<(), PlatformError> {
        let mut w = lock(&self.0);
        w.hide_requests += 1;
        w.input_view_shown = false;
        Ok(())
    }

    fn is_input_view_shown(&self) -> Result<bool, PlatformError> {
        Ok(lock(&self.0).input_view_shown)
    }
}

struct FakeSettings(Shared);

impl SettingsStore for FakeSettings {
    fn get_string(&self, _key: &str) -> Option<String> {
        lock(&self.0).settings_blob.clone()
    }
}

struct FakeCrash(Shared);

impl CrashReporter for FakeCrash {
    fn report(&mut self, fault: &FaultReport) -> Option<String> {
        let mut w = lock(&self.0);
        w.faults.push(fault.clone());
        Some(format!("crash_{}", w.faults.len()))
    }
}

struct FakeKeys(Shared);

impl KeyEmulation for FakeKeys {
    fn send_key_event(
        &mut self,
        _key_code: u32,
        _modifiers: Modifiers,
        _direction: Option<KeyDirection>,
    ) -> Result<(), BackendError> {
        Err(BackendError::Disabled)
    }

    fn apply_preference(
        &mut self,
        preference: HardwareEmulationPreference,
        _display: Option<&DisplayHandle>,
    ) {
        lock(&self.0).preferences.push(preference);
    }

    fn cleanup(&mut self) {
        lock(&self.0).keys_cleaned = true;
    }
}

pub(super) struct FakeConnection(pub Shared);

impl InputConnection for FakeConnection {
    fn commit_text(&mut self, text: &str) -> Result<(), PlatformError> {
        lock(&self.0).committed.push_str(text);
        Ok(())
    }

    fn delete_surrounding_text(&mut self, _before: u32, _after: u32) -> Result<(), PlatformError> {
        Ok(())
    }

    fn perform_editor_action(&mut self, _action: u32) -> Result<(), PlatformError> {
        Ok(())
    }

    fn extracted_text(&mut self) -> Result<Option<ExtractedText>, PlatformError> {
        Ok(None)
    }

    fn set_selection(&mut self, _start: i32, _end: i32) -> Result<(), PlatformError> {
        Ok(())
    }

    fn send_key_event(&mut self, _event: &KeyEvent) -> Result<(), PlatformError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub(super) struct Harness {
    pub world: Shared,
    pub controller: ImeSessionController,
    pub now: Instant,
}

impl Harness {
    /// Controller over a device whose only display is the primary one.
    pub fn new() -> Self {
        Self::with_displays(vec![primary_display()])
    }

    pub fn with_secondary() -> Self {
        Self::with_displays(vec![primary_display(), secondary_display()])
    }

    pub fn with_displays(displays: Vec<DisplayHandle>) -> Self {
        let world: Shared = Arc::new(Mutex::new(World {
            displays,
            ..World::default()
        }));
        let deps = ControllerDeps {
            displays: Box::new(FakeDisplays(Arc::clone(&world))),
            focus: Arc::new(FakeFocus(Arc::clone(&world))),
            surfaces: Box::new(FakeHost(Arc::clone(&world))),
            system: Box::new(FakeSystem(Arc::clone(&world))),
            sink: Box::new(FakeSink(Arc::clone(&world))),
            settings: Box::new(FakeSettings(Arc::clone(&world))),
            crash: Box::new(FakeCrash(Arc::clone(&world))),
            keys: Box::new(FakeKeys(Arc::clone(&world))),
            primary_engine: Box::new(FakeEngine {
                id: PRIMARY_ENGINE,
                world: Arc::clone(&world),
            }),
            primary_entrypoint_executed: false,
        };
        let controller = ImeSessionController::new(deps, DeckConfig::default());
        Self {
            world,
            controller,
            now: Instant::now(),
        }
    }

    pub fn world(&self) -> MutexGuard<'_, World> {
        lock(&self.world)
    }

    pub fn send(&mut self, event: ControllerEvent) {
        self.controller.handle(event, self.now);
    }

    pub fn start(&mut self) {
        self.start_in(None);
    }

    /// Start a session for an editor owned by `package`, with a connection.
    pub fn start_in(&mut self, package: Option<&str>) {
        let editor = EditorInfo {
            package_name: package.map(str::to_string),
            ..EditorInfo::default()
        };
        let connection: Box<dyn InputConnection> = Box::new(FakeConnection(Arc::clone(&self.world)));
        self.send(ControllerEvent::SessionStart {
            editor,
            connection: Some(connection),
        });
    }

    pub fn end(&mut self, finishing_input: bool) {
        self.send(ControllerEvent::SessionEnd { finishing_input });
    }

    /// Move the clock forward and fire due hotplug events.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        self.controller.poll(self.now);
    }

    pub fn plug_secondary(&mut self) {
        {
            let mut w = self.world();
            if w.displays.iter().all(|d| d.id != SECONDARY_ID) {
                w.displays.push(secondary_display());
            }
        }
        self.send(ControllerEvent::DisplayAdded(SECONDARY_ID));
    }

    pub fn unplug_secondary(&mut self) {
        self.world().displays.retain(|d| d.id != SECONDARY_ID);
        self.send(ControllerEvent::DisplayRemoved(SECONDARY_ID));
    }

    /// `displayModeChanged` payloads sent to `engine`, in order.
    pub fn modes_sent_to(&self, engine: EngineId) -> Vec<Value> {
        self.world()
            .sent
            .iter()
            .filter(|(e, method, _)| *e == engine && method == "displayModeChanged")
            .map(|(_, _, payload)| payload.clone())
            .collect()
    }

    pub fn log_count(&self, entry: &str) -> usize {
        self.world().log.iter().filter(|l| l.as_str() == entry).count()
    }

    pub fn clear_log(&self) {
        let mut w = self.world();
        w.log.clear();
        w.sent.clear();
    }
}

pub(super) const DEBOUNCE: Duration = Duration::from_millis(500);
