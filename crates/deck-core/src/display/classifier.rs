//! Best-effort classification of which display holds the focused editor.
//!
//! Classifiers run in order of preference; the first one that resolves a
//! display wins. A classifier that errors is skipped, and an unresolved chain
//! answers with the primary display.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::{DisplayHandle, DisplayId, DEFAULT_DISPLAY};
use crate::PlatformError;

/// A running task as reported by the platform's activity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub top_package: Option<String>,
    /// `None` when the platform version does not expose per-task displays.
    pub display_id: Option<DisplayId>,
}

/// Platform introspection used by the classifiers.
pub trait FocusProbe: Send + Sync {
    fn running_tasks(&self) -> Result<Vec<TaskInfo>, PlatformError>;

    /// Display the keyboard's own window is attached to, if known.
    fn ime_window_display(&self) -> Result<Option<DisplayId>, PlatformError>;
}

#[derive(Debug, Clone, Copy)]
pub struct FocusContext<'a> {
    pub editor_package: Option<&'a str>,
    pub secondary: Option<&'a DisplayHandle>,
}

pub trait InputDisplayClassifier: Send {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "no opinion", letting the next classifier decide.
    fn classify(&self, ctx: &FocusContext<'_>) -> Result<Option<DisplayId>, PlatformError>;
}

/// Matches the focused package against the running-task list and reads the
/// task's display.
pub struct TaskQueryClassifier {
    probe: Arc<dyn FocusProbe>,
}

impl TaskQueryClassifier {
    pub fn new(probe: Arc<dyn FocusProbe>) -> Self {
        Self { probe }
    }
}

impl InputDisplayClassifier for TaskQueryClassifier {
    fn name(&self) -> &'static str {
        "task_query"
    }

    fn classify(&self, ctx: &FocusContext<'_>) -> Result<Option<DisplayId>, PlatformError> {
        let Some(editor) = ctx.editor_package else {
            return Ok(None);
        };
        let tasks = self.probe.running_tasks()?;
        Ok(tasks
            .iter()
            .filter(|t| t.top_package.as_deref() == Some(editor))
            .filter_map(|t| t.display_id)
            .find(|&id| id != DEFAULT_DISPLAY))
    }
}

/// Packages known to live on the secondary display.
pub struct PackageAllowListClassifier {
    packages: HashSet<String>,
}

impl PackageAllowListClassifier {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }
}

impl InputDisplayClassifier for PackageAllowListClassifier {
    fn name(&self) -> &'static str {
        "package_allow_list"
    }

    fn classify(&self, ctx: &FocusContext<'_>) -> Result<Option<DisplayId>, PlatformError> {
        let Some(editor) = ctx.editor_package else {
            return Ok(None);
        };
        if !self.packages.contains(editor) {
            return Ok(None);
        }
        Ok(Some(ctx.secondary.map_or(DEFAULT_DISPLAY, |d| d.id)))
    }
}

/// Uses the display the keyboard window itself was created on.
pub struct WindowAffinityClassifier {
    probe: Arc<dyn FocusProbe>,
}

impl WindowAffinityClassifier {
    pub fn new(probe: Arc<dyn FocusProbe>) -> Self {
        Self { probe }
    }
}

impl InputDisplayClassifier for WindowAffinityClassifier {
    fn name(&self) -> &'static str {
        "window_affinity"
    }

    fn classify(&self, ctx: &FocusContext<'_>) -> Result<Option<DisplayId>, PlatformError> {
        if ctx.secondary.is_none() {
            return Ok(None);
        }
        Ok(self
            .probe
            .ime_window_display()?
            .filter(|&id| id != DEFAULT_DISPLAY))
    }
}

pub struct ClassifierChain {
    classifiers: Vec<Box<dyn InputDisplayClassifier>>,
}

impl ClassifierChain {
    pub fn new(classifiers: Vec<Box<dyn InputDisplayClassifier>>) -> Self {
        Self { classifiers }
    }

    /// Task query, then package allow-list, then window affinity.
    pub fn standard<I, S>(probe: Arc<dyn FocusProbe>, secondary_packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(vec![
            Box::new(TaskQueryClassifier::new(Arc::clone(&probe))),
            Box::new(PackageAllowListClassifier::new(secondary_packages)),
            Box::new(WindowAffinityClassifier::new(probe)),
        ])
    }

    pub fn detect(&self, ctx: &FocusContext<'_>) -> DisplayId {
        for classifier in &self.classifiers {
            match classifier.classify(ctx) {
                Ok(Some(id)) => {
                    debug!(classifier = classifier.name(), display = id, "input display resolved");
                    return id;
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(classifier = classifier.name(), "lookup failed: {e}");
                }
            }
        }
        DEFAULT_DISPLAY
    }
}
