use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::{debug, warn};

use deck_core::bridge::Modifiers;
use deck_core::display::DisplayHandle;
use deck_core::hardware::{
    BackendError, BackendKind, HardwareEmulationRouter, KeyDirection, KeyEmulation,
};
use deck_core::settings::HardwareEmulationPreference;

// ---------------------------------------------------------------------------
// Work types
// ---------------------------------------------------------------------------

pub(crate) enum BackendWork {
    /// Record the preference, then bring a backend up or tear it down.
    Apply {
        preference: HardwareEmulationPreference,
        display: Option<DisplayHandle>,
    },
    /// Initialise if still the latest request.
    Initialize { generation: u64 },
    /// Switch to one backend, tearing down the current one first.
    Select { kind: BackendKind },
    Cleanup,
}

// ---------------------------------------------------------------------------
// BackendWorker
// ---------------------------------------------------------------------------

/// Runs backend initialisation and teardown on its own thread. Initialising
/// can block on a root prompt or a Bluetooth registration; the input path
/// only ever `try_lock`s the router.
#[derive(Clone)]
pub(crate) struct BackendWorker {
    tx: mpsc::Sender<BackendWork>,
    generation: Arc<AtomicU64>,
    router: Arc<Mutex<HardwareEmulationRouter>>,
}

impl BackendWorker {
    pub fn new(router: HardwareEmulationRouter) -> Self {
        let router = Arc::new(Mutex::new(router));
        let generation = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::channel::<BackendWork>();
        {
            let router = Arc::clone(&router);
            let generation = Arc::clone(&generation);
            let spawned = thread::Builder::new()
                .name("deck-backends".into())
                .spawn(move || backend_worker(rx, generation, router));
            if let Err(e) = spawned {
                warn!("failed to spawn backend worker: {e}");
            }
        }
        Self {
            tx,
            generation,
            router,
        }
    }

    pub fn router(&self) -> &Arc<Mutex<HardwareEmulationRouter>> {
        &self.router
    }

    fn submit(&self, work: BackendWork) {
        if self.tx.send(work).is_err() {
            debug!("backend worker gone");
        }
    }

    pub fn request_initialize(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.submit(BackendWork::Initialize { generation });
    }

    pub fn apply(&self, preference: HardwareEmulationPreference, display: Option<DisplayHandle>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.submit(BackendWork::Apply {
            preference,
            display,
        });
    }

    pub fn select(&self, kind: BackendKind) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.submit(BackendWork::Select { kind });
    }

    pub fn cleanup(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.submit(BackendWork::Cleanup);
    }
}

pub(crate) fn lock_router(
    router: &Mutex<HardwareEmulationRouter>,
) -> MutexGuard<'_, HardwareEmulationRouter> {
    router.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Worker thread
// ---------------------------------------------------------------------------

fn backend_worker(
    rx: mpsc::Receiver<BackendWork>,
    generation: Arc<AtomicU64>,
    router: Arc<Mutex<HardwareEmulationRouter>>,
) {
    while let Ok(work) = rx.recv() {
        match work {
            BackendWork::Apply {
                preference,
                display,
            } => {
                lock_router(&router).apply_preference(preference, display.as_ref());
            }
            BackendWork::Initialize { generation: g } => {
                // Skip superseded requests
                if g != generation.load(Ordering::SeqCst) {
                    continue;
                }
                let mut router = lock_router(&router);
                if router.is_ready() {
                    continue;
                }
                match router.ensure_initialized() {
                    Ok(kind) => debug!(backend = %kind, "backend initialised off the input path"),
                    Err(e) => debug!("backend initialisation skipped: {e}"),
                }
            }
            BackendWork::Select { kind } => match lock_router(&router).select(kind) {
                Ok(()) => debug!(backend = %kind, "backend selected"),
                Err(e) => warn!(backend = %kind, "backend selection failed: {e}"),
            },
            BackendWork::Cleanup => lock_router(&router).cleanup(),
        }
    }
}

// ---------------------------------------------------------------------------
// Key emulation seen by the controller
// ---------------------------------------------------------------------------

/// Never blocks: a busy or cold router answers with an error so the key goes
/// through the input connection, and a cold one gets an initialisation
/// request queued.
pub(crate) struct WorkerKeyEmulation {
    worker: BackendWorker,
}

impl WorkerKeyEmulation {
    pub fn new(worker: BackendWorker) -> Self {
        Self { worker }
    }
}

impl KeyEmulation for WorkerKeyEmulation {
    fn send_key_event(
        &mut self,
        key_code: u32,
        modifiers: Modifiers,
        direction: Option<KeyDirection>,
    ) -> Result<(), BackendError> {
        let mut router = match self.worker.router.try_lock() {
            Ok(r) => r,
            Err(std::sync::TryLockError::Poisoned(p)) => p.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return Err(BackendError::Busy),
        };
        if router.preference() == HardwareEmulationPreference::Ime {
            return Err(BackendError::Disabled);
        }
        if !router.is_ready() {
            drop(router);
            self.worker.request_initialize();
            return Err(BackendError::NoBackend);
        }
        router.send_if_ready(key_code, modifiers, direction)
    }

    fn apply_preference(
        &mut self,
        preference: HardwareEmulationPreference,
        display: Option<&DisplayHandle>,
    ) {
        self.worker.apply(preference, display.cloned());
    }

    fn cleanup(&mut self) {
        self.worker.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use deck_core::hardware::{BackendKind, BackendState, HardwareBackend};

    use super::*;

    struct Recorder {
        state: BackendState,
        keys: Arc<Mutex<Vec<(u32, bool)>>>,
    }

    impl HardwareBackend for Recorder {
        fn kind(&self) -> BackendKind {
            BackendKind::VirtualDevice
        }

        fn state(&self) -> BackendState {
            self.state
        }

        fn initialize(&mut self, _display: Option<&DisplayHandle>) -> Result<(), BackendError> {
            self.state = BackendState::Initialized;
            Ok(())
        }

        fn cleanup(&mut self) {
            self.state = BackendState::Available;
        }

        fn send_raw(&mut self, key_code: u32, down: bool) -> Result<(), BackendError> {
            self.keys.lock().unwrap().push((key_code, down));
            Ok(())
        }

        fn status_message(&self) -> String {
            "recorder".to_string()
        }
    }

    fn emulation() -> (WorkerKeyEmulation, Arc<Mutex<Vec<(u32, bool)>>>) {
        let keys = Arc::new(Mutex::new(Vec::new()));
        let backend = Recorder {
            state: BackendState::Available,
            keys: Arc::clone(&keys),
        };
        let router = HardwareEmulationRouter::new(vec![Box::new(backend)], &BackendKind::ALL);
        (WorkerKeyEmulation::new(BackendWorker::new(router)), keys)
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_ime_preference_disables_keys() {
        let (mut keys, _) = emulation();
        assert!(matches!(
            keys.send_key_event(29, Modifiers::NONE, None),
            Err(BackendError::Disabled)
        ));
    }

    #[test]
    fn test_physical_preference_initialises_on_worker() {
        let (mut emu, sent) = emulation();
        emu.apply_preference(HardwareEmulationPreference::Physical, None);

        // Apply initialises on the worker; wait for it.
        let router = Arc::clone(emu.worker.router());
        assert!(wait_until(|| lock_router(&router).is_ready()));

        emu.send_key_event(29, Modifiers::NONE, None).unwrap();
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_busy_router_reports_busy() {
        let (mut emu, _) = emulation();
        let router = Arc::clone(emu.worker.router());
        let _held = lock_router(&router);
        assert!(matches!(
            emu.send_key_event(29, Modifiers::NONE, None),
            Err(BackendError::Busy)
        ));
    }

    #[test]
    fn test_cleanup_returns_to_available() {
        let (mut emu, _) = emulation();
        emu.apply_preference(HardwareEmulationPreference::Physical, None);
        let router = Arc::clone(emu.worker.router());
        assert!(wait_until(|| lock_router(&router).is_ready()));

        emu.cleanup();
        assert!(wait_until(|| !lock_router(&router).is_ready()));
    }

    #[test]
    fn test_select_runs_on_worker_and_dispose_tears_down() {
        let (emu, _) = emulation();
        let worker = emu.worker.clone();
        worker.select(BackendKind::VirtualDevice);
        let router = Arc::clone(worker.router());
        assert!(wait_until(|| {
            lock_router(&router).active_kind() == Some(BackendKind::VirtualDevice)
        }));

        worker.cleanup();
        assert!(wait_until(|| lock_router(&router).active_kind().is_none()));
    }
}
