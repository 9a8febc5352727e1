//! Save -> inspect -> load_fresh across a day boundary.

use chrono::NaiveDate;
use tk_store::{inspect, load, load_fresh, save, FileState, SeriesFile};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
}

fn prices() -> Vec<f64> {
    (0..24).map(|h| 3.0 + (h as f64) * 0.25).collect()
}

#[test]
fn saved_file_is_fresh_on_its_day_and_stale_the_next() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tarkka_data.json");

    let file = SeriesFile::for_day(day(7), prices()).unwrap();
    save(&path, &file).unwrap();

    assert_eq!(inspect(&path, day(7)).unwrap(), FileState::Fresh);
    assert_eq!(inspect(&path, day(8)).unwrap(), FileState::Stale);

    let series = load_fresh(&path, day(7)).unwrap();
    assert_eq!(series.reference_day, day(7));
    assert_eq!(series.hourly_prices, prices());

    let err = load_fresh(&path, day(8)).unwrap_err();
    assert!(err
        .to_string()
        .contains("does not contain valid results for today"));
}

#[test]
fn load_reads_externally_written_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tarkka_data.json");
    let written = SeriesFile::for_day(day(2), vec![4.63, -0.12]).unwrap();
    std::fs::write(
        &path,
        format!("{{\"time\":{},\"data\":[4.63,-0.12]}}", written.time),
    )
    .unwrap();

    assert_eq!(load(&path).unwrap(), written);
}

#[test]
fn load_fresh_missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_fresh(&path, day(1)).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}
