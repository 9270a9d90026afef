use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{
    ClassifierChain, DebounceTable, DisplayCategory, DisplayEventKind, DisplayHandle, DisplayId,
    DisplayService, FocusContext, ScheduleOutcome, DEFAULT_DISPLAY,
};

/// A hotplug notification that survived the debounce window and re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Added(DisplayHandle),
    Removed(DisplayId),
}

/// Wraps the platform display service: enumeration, debounced hotplug and
/// input-display classification. Lookup failures never escape; they read as
/// "no secondary display" or "input on primary".
pub struct DisplayWatcher {
    service: Box<dyn DisplayService>,
    debounce: DebounceTable,
    classifiers: ClassifierChain,
    subscribed: bool,
}

impl DisplayWatcher {
    pub fn new(
        service: Box<dyn DisplayService>,
        classifiers: ClassifierChain,
        debounce_delay: Duration,
    ) -> Self {
        Self {
            service,
            debounce: DebounceTable::new(debounce_delay),
            classifiers,
            subscribed: false,
        }
    }

    pub fn subscribe(&mut self) -> bool {
        if self.subscribed {
            return true;
        }
        match self.service.register_hotplug() {
            Ok(()) => {
                self.subscribed = true;
                true
            }
            Err(e) => {
                warn!("display hotplug registration failed: {e}");
                false
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        self.debounce.clear();
        if self.subscribed {
            self.service.unregister_hotplug();
            self.subscribed = false;
        }
    }

    /// Valid non-primary displays, ordered by id.
    pub fn list_secondary_displays(&self) -> Vec<DisplayHandle> {
        let mut displays = match self.service.displays() {
            Ok(d) => d,
            Err(e) => {
                warn!("display enumeration failed: {e}");
                return Vec::new();
            }
        };
        displays.retain(DisplayHandle::is_usable_secondary);
        displays.sort_by_key(|d| d.id);
        displays.dedup_by_key(|d| d.id);
        displays
    }

    pub fn secondary_display(&self) -> Option<DisplayHandle> {
        self.list_secondary_displays().into_iter().next()
    }

    pub fn display_info(&self, id: DisplayId) -> Option<DisplayHandle> {
        match self.service.display(id) {
            Ok(d) => d,
            Err(e) => {
                debug!(display = id, "display lookup failed: {e}");
                None
            }
        }
    }

    pub fn primary_display(&self) -> Option<DisplayHandle> {
        self.display_info(DEFAULT_DISPLAY)
    }

    /// Pixel size of the primary display, `(0, 0)` when nothing answers.
    pub fn primary_metrics(&self) -> (u32, u32) {
        match self.service.primary_metrics() {
            Ok(size) => size,
            Err(e) => {
                debug!("primary metrics unavailable: {e}");
                self.primary_display()
                    .map(|d| d.pixel_size())
                    .unwrap_or((0, 0))
            }
        }
    }

    pub fn on_display_added(&mut self, id: DisplayId, now: Instant) -> Option<ScheduleOutcome> {
        self.on_raw_event(id, DisplayEventKind::Added, now)
    }

    pub fn on_display_removed(&mut self, id: DisplayId, now: Instant) -> Option<ScheduleOutcome> {
        self.on_raw_event(id, DisplayEventKind::Removed, now)
    }

    fn on_raw_event(
        &mut self,
        id: DisplayId,
        kind: DisplayEventKind,
        now: Instant,
    ) -> Option<ScheduleOutcome> {
        if id == DEFAULT_DISPLAY {
            debug!(?kind, "ignoring hotplug for the primary display");
            return None;
        }
        let outcome = self.debounce.schedule(id, kind, now);
        debug!(display = id, ?kind, ?outcome, "hotplug scheduled");
        Some(outcome)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.next_deadline()
    }

    /// Fire every debounced event whose delay has elapsed. Added displays are
    /// re-fetched: one that vanished or turned invalid in the meantime is
    /// dropped.
    pub fn poll(&mut self, now: Instant) -> Vec<DisplayEvent> {
        self.debounce
            .take_due(now)
            .into_iter()
            .filter_map(|pending| match pending.kind {
                DisplayEventKind::Added => {
                    let handle = self.display_info(pending.display_id);
                    match handle {
                        Some(h) if h.is_usable_secondary() => Some(DisplayEvent::Added(h)),
                        _ => {
                            debug!(display = pending.display_id, "added display gone at fire time");
                            None
                        }
                    }
                }
                DisplayEventKind::Removed => Some(DisplayEvent::Removed(pending.display_id)),
            })
            .collect()
    }

    /// Which display currently holds the focused editor. Falls back to the
    /// primary display on any lookup failure.
    pub fn detect_display_for_active_input(
        &self,
        editor_package: Option<&str>,
        secondary: Option<&DisplayHandle>,
    ) -> DisplayHandle {
        let ctx = FocusContext {
            editor_package,
            secondary,
        };
        let id = self.classifiers.detect(&ctx);
        if let Some(sec) = secondary.filter(|s| s.id == id) {
            return sec.clone();
        }
        if id != DEFAULT_DISPLAY {
            if let Some(handle) = self.display_info(id) {
                return handle;
            }
        }
        self.primary_handle()
    }

    /// Primary display handle, built from the primary metrics when the
    /// service cannot produce one.
    pub fn primary_handle(&self) -> DisplayHandle {
        if let Some(handle) = self.primary_display() {
            return handle;
        }
        let (width, height) = self.primary_metrics();
        DisplayHandle {
            id: DEFAULT_DISPLAY,
            name: "primary".to_string(),
            width,
            height,
            valid: true,
            category: DisplayCategory::Builtin,
        }
    }
}
