//! Ownership and persistence of the next visit date
//!
//! The store keeps the date in memory, answers countdown queries against the
//! configured time zone, and writes the single-line file back on request.
//!
//! Alongside the wall-clock date it keeps the instant that date was resolved
//! to. Day shifts move that instant, so a date shifted into the repeated hour
//! of a DST fall-back keeps its offset and shifts back to where it came from.

use crate::domain::visit_date::{self, VisitDate, VisitDateError};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct VisitDateStore<Tz: TimeZone = Local> {
    path: PathBuf,
    tz: Tz,
    visit: VisitDate,
    /// `visit` pinned to an offset; source of truth for shifts
    instant: DateTime<Tz>,
}

impl<Tz: TimeZone> VisitDateStore<Tz> {
    /// Store holding `visit` that will save to `path`; nothing is read or written
    pub fn new<P: AsRef<Path>>(path: P, tz: Tz, visit: VisitDate) -> Self {
        let instant = visit_date::resolve_local(&tz, visit.as_naive());
        Self { path: path.as_ref().to_path_buf(), tz, visit, instant }
    }

    /// Read the first line of `path` as `DD,MM,YYYY,HH,MM`
    pub fn load<P: AsRef<Path>>(path: P, tz: Tz) -> Result<Self, VisitDateError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| VisitDateError::Io { path: path.to_path_buf(), source })?;

        let line = content.lines().next().unwrap_or("");
        let visit = VisitDate::parse(line)?;

        info!(path = %path.display(), visit = %visit, "visit_loaded");
        Ok(Self::new(path, tz, visit))
    }

    /// Startup policy: a missing file means first run and yields `fallback`;
    /// any other failure is returned so a bad file is never overwritten.
    pub fn load_or_default<P: AsRef<Path>>(
        path: P,
        tz: Tz,
        fallback: VisitDate,
    ) -> Result<Self, VisitDateError> {
        let path = path.as_ref();
        match Self::load(path, tz.clone()) {
            Ok(store) => Ok(store),
            Err(e) if e.is_not_found() => {
                warn!(path = %path.display(), fallback = %fallback, "visit_file_missing");
                Ok(Self::new(path, tz, fallback))
            }
            Err(e) => Err(e),
        }
    }

    /// Write the date as one line, replacing the file atomically
    pub fn save(&self) -> Result<(), VisitDateError> {
        self.write_line(&self.visit.to_string())
            .map_err(|source| VisitDateError::Io { path: self.path.clone(), source })?;

        info!(path = %self.path.display(), visit = %self.visit, "visit_saved");
        Ok(())
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, line)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(file = %self.path.display(), bytes = %line.len(), "visit_written");
        Ok(())
    }

    pub fn visit(&self) -> VisitDate {
        self.visit
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Whole days from local midnight of `now` to the visit
    pub fn days_until(&self, now: NaiveDateTime) -> i64 {
        visit_date::days_from_midnight(&self.tz, &self.instant, now)
    }

    /// Move the visit by whole days (24h each); not persisted until `save`
    pub fn shift_days(&mut self, delta: i64) -> VisitDate {
        let previous = self.visit;
        self.instant = visit_date::shift_days(&self.instant, delta);
        self.visit = VisitDate::new(self.instant.naive_local());
        debug!(from = %previous, to = %self.visit, delta = %delta, "visit_shifted");
        self.visit
    }
}
