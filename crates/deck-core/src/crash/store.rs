use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{CrashLogError, CrashNotifier, CrashRecord, CrashReporter, FaultReport};

pub const CRASH_LOGS_DIR: &str = "crash_logs";

const EXTENSION: &str = "log";

/// Directory of `<id>.log` JSON files with time-based retention.
pub struct CrashLogStore {
    dir: PathBuf,
    retention: Duration,
    notifier: Option<Box<dyn CrashNotifier>>,
}

impl CrashLogStore {
    pub fn new(dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            dir: dir.into(),
            retention,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn CrashNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `fault` as of `now`, sweep expired logs and notify.
    pub fn write(&self, fault: &FaultReport, now: SystemTime) -> Result<CrashRecord, CrashLogError> {
        fs::create_dir_all(&self.dir)?;
        let millis = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let base = format!("crash_{millis}");
        let mut id = base.clone();
        let mut n = 1;
        while self.path_for(&id).exists() {
            id = format!("{base}_{n}");
            n += 1;
        }
        let record = CrashRecord {
            id,
            timestamp: format_timestamp(now)?,
            error_type: fault.error_type.clone(),
            message: fault.message.clone(),
            stack_trace: fault.stack_trace.clone(),
            engine_state: fault.engine_state.to_string(),
            display_state: fault.display_state.clone(),
        };
        fs::write(self.path_for(&record.id), serde_json::to_vec(&record)?)?;
        debug!(id = %record.id, "crash logged");

        if let Err(e) = self.sweep(now) {
            warn!("crash log sweep failed: {e}");
        }
        if let Some(notifier) = &self.notifier {
            notifier.notify(&record.id, &record.error_type);
        }
        Ok(record)
    }

    /// All readable records, newest first. Unparseable files are skipped.
    pub fn list(&self) -> Result<Vec<CrashRecord>, CrashLogError> {
        let mut records = Vec::new();
        for path in self.log_files()? {
            match read_record(&path) {
                Ok(r) => records.push(r),
                Err(e) => warn!(path = %path.display(), "skipping crash log: {e}"),
            }
        }
        records.sort_by(|a, b| b.id_millis().cmp(&a.id_millis()).then_with(|| b.id.cmp(&a.id)));
        Ok(records)
    }

    pub fn get(&self, id: &str) -> Result<Option<CrashRecord>, CrashLogError> {
        validate_id(id)?;
        match read_record(&self.path_for(id)) {
            Ok(r) => Ok(Some(r)),
            Err(CrashLogError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete every log. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, CrashLogError> {
        let mut removed = 0;
        for path in self.log_files()? {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Delete logs last modified before `now - retention`.
    pub fn sweep(&self, now: SystemTime) -> Result<usize, CrashLogError> {
        let Some(cutoff) = now.checked_sub(self.retention) else {
            return Ok(0);
        };
        let mut removed = 0;
        for path in self.log_files()? {
            let modified = fs::metadata(&path)?.modified()?;
            if modified < cutoff {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "expired crash logs removed");
        }
        Ok(removed)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    fn log_files(&self) -> Result<Vec<PathBuf>, CrashLogError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|x| x == EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl CrashReporter for CrashLogStore {
    fn report(&mut self, fault: &FaultReport) -> Option<String> {
        match self.write(fault, SystemTime::now()) {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!("failed to log crash: {e}");
                None
            }
        }
    }
}

impl CrashRecord {
    fn id_millis(&self) -> u128 {
        self.id
            .strip_prefix("crash_")
            .and_then(|rest| rest.split('_').next())
            .and_then(|ms| ms.parse().ok())
            .unwrap_or(0)
    }
}

fn read_record(path: &Path) -> Result<CrashRecord, CrashLogError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn validate_id(id: &str) -> Result<(), CrashLogError> {
    let ok = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CrashLogError::InvalidId(id.to_string()))
    }
}

fn format_timestamp(at: SystemTime) -> Result<String, CrashLogError> {
    let fmt = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    Ok(OffsetDateTime::from(at).format(&fmt)?)
}
