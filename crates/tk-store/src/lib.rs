//! tk-store
//!
//! Persistence for one day of hourly prices.
//!
//! On-disk format (compact JSON):
//!
//! ```json
//! {"time":1768860000000,"data":[4.63,4.12, ...]}
//! ```
//!
//! `time` is the epoch-millisecond timestamp of **local** midnight of the day the
//! prices belong to. A file is fresh for `today` when `time >= start_of_day(today)`.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tk_query::PriceSeries;

/// Default location of the series file.
pub const DEFAULT_DATA_FILE: &str = "/tmp/tarkka_data.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFile {
    /// Local midnight of the reference day, epoch millis.
    pub time: i64,
    /// Price per hour index, c/kWh.
    pub data: Vec<f64>,
}

impl SeriesFile {
    pub fn for_day(day: NaiveDate, data: Vec<f64>) -> Result<Self> {
        Ok(Self {
            time: start_of_day_millis(day)?,
            data,
        })
    }

    pub fn is_fresh(&self, today: NaiveDate) -> Result<bool> {
        Ok(self.time >= start_of_day_millis(today)?)
    }

    /// Local calendar day of `time`.
    pub fn reference_day(&self) -> Result<NaiveDate> {
        let utc = DateTime::from_timestamp_millis(self.time)
            .ok_or_else(|| anyhow!("series time out of range: {}", self.time))?;
        Ok(utc.with_timezone(&Local).date_naive())
    }

    pub fn into_series(self) -> Result<PriceSeries> {
        let day = self.reference_day()?;
        Ok(PriceSeries::new(day, self.data))
    }
}

/// Epoch millis of local midnight for `day`.
pub fn start_of_day_millis(day: NaiveDate) -> Result<i64> {
    Ok(start_of_day(&Local, day)?.timestamp_millis())
}

/// Longest DST gap we step over looking for the first valid instant of a day.
const MAX_GAP_MINUTES: i64 = 180;

/// First instant of `day` in `tz`.
///
/// Midnight if it exists (the earlier one if repeated); if a DST jump skips
/// midnight, the first minute after the gap.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Result<DateTime<Tz>> {
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid midnight for {day}"))?;
    (0..=MAX_GAP_MINUTES)
        .find_map(|m| {
            tz.from_local_datetime(&(midnight + Duration::minutes(m)))
                .earliest()
        })
        .ok_or_else(|| anyhow!("no valid local start of day for {day}"))
}

/// State of the series file as seen by the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Missing,
    /// Exists but is unreadable, malformed, or for an earlier day.
    Stale,
    Fresh,
}

/// Inspect `path` for `today`.
///
/// Errors only when the path exists and is not a regular file; any other
/// problem reading it means it should be refetched.
pub fn inspect(path: &Path, today: NaiveDate) -> Result<FileState> {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return Ok(FileState::Missing),
    };
    if !meta.is_file() {
        bail!("'{}' is not a file.", path.display());
    }
    match load(path).and_then(|f| f.is_fresh(today)) {
        Ok(true) => Ok(FileState::Fresh),
        _ => Ok(FileState::Stale),
    }
}

pub fn load(path: &Path) -> Result<SeriesFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read series file failed: {}", path.display()))?;
    let file: SeriesFile = serde_json::from_str(&raw)
        .with_context(|| format!("series file is not valid JSON: {}", path.display()))?;
    Ok(file)
}

/// Load `path` and require it to hold data for `today` (or later).
pub fn load_fresh(path: &Path, today: NaiveDate) -> Result<PriceSeries> {
    let meta = fs::metadata(path)
        .with_context(|| format!("series file not found: {}", path.display()))?;
    if !meta.is_file() {
        bail!("'{}' is not a file.", path.display());
    }
    let file = load(path)?;
    if !file.is_fresh(today)? {
        bail!(
            "File '{}' does not contain valid results for today.",
            path.display()
        );
    }
    file.into_series()
}

/// Write `file` to `path`, creating parent directories as needed.
pub fn save(path: &Path, file: &SeriesFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create data dir failed: {}", parent.display()))?;
    }
    let json = serde_json::to_string(file).context("serialize series file failed")?;
    fs::write(path, json).with_context(|| format!("write series file failed: {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reference_day_round_trips_through_millis() {
        let day = d(2026, 10, 25);
        let f = SeriesFile::for_day(day, vec![1.0]).unwrap();
        assert_eq!(f.reference_day().unwrap(), day);
    }

    #[test]
    fn freshness_boundaries() {
        let f = SeriesFile::for_day(d(2026, 5, 10), vec![1.0]).unwrap();
        assert!(f.is_fresh(d(2026, 5, 9)).unwrap());
        assert!(f.is_fresh(d(2026, 5, 10)).unwrap());
        assert!(!f.is_fresh(d(2026, 5, 11)).unwrap());
    }

    #[test]
    fn wire_field_names() {
        let f = SeriesFile {
            time: 1_420_063_200_000,
            data: vec![4.63, 3.5],
        };
        assert_eq!(
            serde_json::to_string(&f).unwrap(),
            r#"{"time":1420063200000,"data":[4.63,3.5]}"#
        );
    }

    #[test]
    fn skipped_midnight_starts_after_the_gap() {
        // Chile moved 2024-09-08 00:00 straight to 01:00.
        let start = start_of_day(&chrono_tz::America::Santiago, d(2024, 9, 8)).unwrap();
        assert_eq!(start.naive_local(), d(2024, 9, 8).and_hms_opt(1, 0, 0).unwrap());
        assert_eq!(
            start.timestamp(),
            d(2024, 9, 8).and_hms_opt(4, 0, 0).unwrap().and_utc().timestamp()
        );
    }

    #[test]
    fn repeated_midnight_takes_the_earlier_instant() {
        // Cuba turned 2024-11-03 01:00 back to 00:00, so midnight happened twice.
        let start = start_of_day(&chrono_tz::America::Havana, d(2024, 11, 3)).unwrap();
        assert_eq!(start.naive_local(), d(2024, 11, 3).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            start.timestamp(),
            d(2024, 11, 3).and_hms_opt(4, 0, 0).unwrap().and_utc().timestamp()
        );
    }

    #[test]
    fn fetched_prices_survive_save_and_load_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("prices.json");
        let prices = vec![0.1 + 0.2, 6192.56 / 100.0 * 1.24, -61.925599999999996, 4.63];
        save(&p, &SeriesFile::for_day(d(2026, 1, 1), prices.clone()).unwrap()).unwrap();

        let back = load(&p).unwrap().data;
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&back), bits(&prices));
    }

    #[test]
    fn inspect_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let state = inspect(&dir.path().join("nope.json"), d(2026, 1, 1)).unwrap();
        assert_eq!(state, FileState::Missing);
    }

    #[test]
    fn inspect_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = inspect(dir.path(), d(2026, 1, 1)).unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }

    #[test]
    fn inspect_garbage_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.json");
        fs::write(&p, "not json").unwrap();
        assert_eq!(inspect(&p, d(2026, 1, 1)).unwrap(), FileState::Stale);
    }
}
