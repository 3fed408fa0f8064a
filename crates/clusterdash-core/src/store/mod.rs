//! Persistent State Store
//!
//! JSON-backed odometer, trip, fuel and theme record.
//!
//! Callers may report new totals many times a second, so writes are gated:
//! [`PersistentStore::update`] always changes the in-memory record but only
//! writes when some tracked field has drifted past its threshold from the
//! last snapshot that actually reached disk. A failed write leaves that
//! snapshot untouched, so the next update retries it. Every write goes to a
//! temporary sibling first and is renamed into place.

mod error;
mod record;

pub use error::StoreError;
pub use record::{PersistentRecord, SaveThresholds, DEFAULT_TOTAL_ODOMETER, STYLE_COUNT};

use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::odometer::average_mpg;
use crate::protocol::{ByteChannel, OutboundMessage, ProtocolError};

/// A timestamped copy of the record is kept every this many saves
pub const BACKUP_INTERVAL: u64 = 1000;

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Successful writes
    pub writes: u64,
    /// Writes that failed and left the file untouched
    pub failed_writes: u64,
    /// Backup copies taken
    pub backups: u64,
}

/// Owner of the durable record
#[derive(Debug)]
pub struct PersistentStore {
    path: PathBuf,
    record: PersistentRecord,
    /// Last record known to be on disk
    persisted: Option<PersistentRecord>,
    thresholds: SaveThresholds,
    backup_interval: u64,
    stats: StoreStats,
}

impl PersistentStore {
    /// Load the record at `path`, falling back to defaults
    ///
    /// A missing file starts from defaults. An unreadable or corrupt file is
    /// set aside as `<file>.corrupt_<unixtime>` and replaced by defaults.
    /// Either way the defaults are written immediately; a failure to do so
    /// is logged and retried on the next qualifying update.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        Self::load_with(path, SaveThresholds::default(), BACKUP_INTERVAL)
    }

    /// [`load`](Self::load) with explicit thresholds and backup interval
    pub fn load_with<P: AsRef<Path>>(
        path: P,
        thresholds: SaveThresholds,
        backup_interval: u64,
    ) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            path,
            record: PersistentRecord::default(),
            persisted: None,
            thresholds,
            backup_interval: backup_interval.max(1),
            stats: StoreStats::default(),
        };

        match read_record(&store.path) {
            Ok(record) => {
                tracing::info!(
                    total = record.total_odometer,
                    trip = record.trip_odometer,
                    style = record.dashboard_style,
                    "loaded persistent data"
                );
                store.persisted = Some(record.clone());
                store.record = record;
            }
            Err(StoreError::NotFound(_)) => {
                tracing::info!(path = %store.path.display(), "no persistent data file, starting with defaults");
                store.save_logged();
            }
            Err(e) => {
                tracing::warn!(path = %store.path.display(), error = %e, "persistent data unreadable, starting with defaults");
                store.set_aside_corrupt();
                store.save_logged();
            }
        }

        store
    }

    /// Current in-memory record
    pub fn record(&self) -> &PersistentRecord {
        &self.record
    }

    /// Path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write counters since load
    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Whether memory holds changes that have not reached disk
    pub fn is_dirty(&self) -> bool {
        match &self.persisted {
            None => true,
            Some(p) => {
                p.total_odometer != self.record.total_odometer
                    || p.trip_odometer != self.record.trip_odometer
                    || p.fuel_used != self.record.fuel_used
                    || p.fuel_used_secondary != self.record.fuel_used_secondary
                    || p.dashboard_style != self.record.dashboard_style
            }
        }
    }

    /// Set the four accounting fields, writing only past a threshold
    ///
    /// Returns whether a write happened. Negative distances are clamped to
    /// zero. A non-finite value leaves its field unchanged.
    pub fn update(
        &mut self,
        total_odometer: f64,
        trip_odometer: f64,
        fuel_used: f64,
        fuel_used_secondary: f64,
    ) -> Result<bool, StoreError> {
        let r = &mut self.record;
        r.total_odometer = finite_or("total_odometer", total_odometer, r.total_odometer).max(0.0);
        r.trip_odometer = finite_or("trip_odometer", trip_odometer, r.trip_odometer).max(0.0);
        r.fuel_used = finite_or("fuel_used", fuel_used, r.fuel_used);
        r.fuel_used_secondary =
            finite_or("fuel_used_bpw", fuel_used_secondary, r.fuel_used_secondary);

        let due = match &self.persisted {
            None => true,
            Some(p) => self.thresholds.exceeded(p, &self.record),
        };
        if !due {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Write the full record now
    ///
    /// Bumps `save_count` and stamps `last_updated` only once the write has
    /// succeeded. Every [`BACKUP_INTERVAL`]th save first copies the existing
    /// file to `<file>.backup_<unixtime>`.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let mut next = self.record.clone();
        next.save_count = self.record.save_count + 1;
        next.last_updated = Utc::now().to_rfc3339();

        if next.save_count % self.backup_interval == 0 {
            self.backup();
        }

        if let Err(e) = write_record(&self.path, &next) {
            self.stats.failed_writes += 1;
            return Err(e);
        }

        self.stats.writes += 1;
        self.record.save_count = next.save_count;
        self.record.last_updated = next.last_updated.clone();
        self.persisted = Some(next);
        Ok(())
    }

    /// Write if anything changed since the last write, e.g. at shutdown
    pub fn flush(&mut self) -> Result<bool, StoreError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Zero the trip odometer and save
    pub fn reset_trip(&mut self) -> Result<(), StoreError> {
        self.record.trip_odometer = 0.0;
        self.save()
    }

    /// Replace both fuel accumulators and save
    pub fn set_fuel(&mut self, fuel_used: f64, fuel_used_secondary: f64) -> Result<(), StoreError> {
        let r = &mut self.record;
        r.fuel_used = finite_or("fuel_used", fuel_used, r.fuel_used);
        r.fuel_used_secondary =
            finite_or("fuel_used_bpw", fuel_used_secondary, r.fuel_used_secondary);
        self.save()
    }

    /// Select a theme and save
    pub fn set_dashboard_style(&mut self, style: u8) -> Result<(), StoreError> {
        self.record.dashboard_style = style % STYLE_COUNT;
        self.save()
    }

    /// Advance to the next theme and save, returning the new index
    ///
    /// The in-memory index changes even when the write fails.
    pub fn advance_style(&mut self) -> Result<u8, StoreError> {
        let next = self.record.next_style();
        self.set_dashboard_style(next)?;
        Ok(next)
    }

    /// Average economy implied by the stored trip and fuel figures
    pub fn average_mpg(&self) -> f64 {
        average_mpg(
            self.record.trip_odometer,
            self.record.fuel_used,
            self.record.fuel_used_secondary,
        )
    }

    /// Messages that resynchronize the controller's own counters
    pub fn init_payload(&self) -> [OutboundMessage; 2] {
        [
            OutboundMessage::InitData {
                fuel_used: self.record.fuel_used,
                fuel_used_secondary: self.record.fuel_used_secondary,
            },
            OutboundMessage::AvgMpgUpdate(self.average_mpg()),
        ]
    }

    /// Send [`init_payload`](Self::init_payload) over the channel
    pub fn send_init_payload(&self, channel: &mut dyn ByteChannel) -> Result<(), ProtocolError> {
        for message in self.init_payload() {
            message.send(channel)?;
        }
        tracing::debug!(
            fuel_used = self.record.fuel_used,
            fuel_used_secondary = self.record.fuel_used_secondary,
            "sent init payload"
        );
        Ok(())
    }

    fn save_logged(&mut self) {
        if let Err(e) = self.save() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to save persistent data");
        }
    }

    fn backup(&mut self) {
        if !self.path.exists() {
            return;
        }
        let backup = sibling(&self.path, &format!("backup_{}", Utc::now().timestamp()));
        match fs::copy(&self.path, &backup) {
            Ok(_) => {
                self.stats.backups += 1;
                tracing::info!(backup = %backup.display(), "created backup");
            }
            Err(e) => {
                tracing::warn!(backup = %backup.display(), error = %e, "backup failed");
            }
        }
    }

    fn set_aside_corrupt(&self) {
        if !self.path.exists() {
            return;
        }
        let aside = sibling(&self.path, &format!("corrupt_{}", Utc::now().timestamp()));
        if let Err(e) = fs::rename(&self.path, &aside) {
            tracing::warn!(error = %e, "could not set corrupt data file aside");
        }
    }
}

/// JSON has no spelling for NaN or infinity, so such values never reach the record
fn finite_or(field: &'static str, value: f64, current: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        tracing::warn!(field, value, "ignoring non-finite value");
        current
    }
}

/// `<dir>/<file>.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}", name, suffix))
}

/// Read and validate the record at `path`
pub fn read_record(path: &Path) -> Result<PersistentRecord, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let mut record: PersistentRecord = serde_json::from_str(&content)?;
    record.sanitize();
    Ok(record)
}

/// Write the record through a temporary sibling and rename it into place
pub fn write_record(path: &Path, record: &PersistentRecord) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(record)?;
    let temp_path = sibling(path, "tmp");

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
