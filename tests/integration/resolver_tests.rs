//! Series resolution integration tests.
//!
//! Tests verify, against real files in a temporary directory:
//! - A project database opens the recordings named in its table
//! - Without a table parser the directory listing is used, sorted
//! - Timestamps and plane timing continue across series
//! - Used files are reported with and without pixel files
//! - The project next to an image is preferred only when asked
//! - Small cache blocks still serve whole planes

use lsm_reader::series::{LocalFileSource, LsmReader, ResolveOptions};
use lsm_reader::{LsmError, MetaTarget};

use super::test_utils::{plane_pattern, write_file, LsmBuilder, RecordingsTable};

fn time_series(stamps: &[f64]) -> Vec<u8> {
    LsmBuilder::new(4, 4)
        .scan_type(3)
        .declared(1, 1, stamps.len() as i32)
        .patterned_planes(stamps.len())
        .timestamps(stamps)
        .build()
}

// =============================================================================
// Project Tests
// =============================================================================

#[test]
fn test_project_opens_referenced_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.lsm", &time_series(&[0.0, 1.0]));
    let b = write_file(dir.path(), "b.lsm", &time_series(&[5.0, 7.0]));
    let project = write_file(dir.path(), "p.mdb", b"project");

    let mut reader = LsmReader::new(LocalFileSource::new())
        .with_table_parser(Box::new(RecordingsTable::new(&["C:\\scans\\b.lsm", "a.lsm"])));
    reader.open(&project).unwrap();

    assert_eq!(reader.series_count(), 2);
    assert!(reader.resolution().unwrap().is_project());
    // table row order decides series order
    assert_eq!(reader.series(0).unwrap().path, b);
    assert_eq!(reader.series(1).unwrap().path, a);

    assert_eq!(
        reader
            .metadata()
            .global("Recordings SampleData 1")
            .and_then(|v| v.as_str()),
        Some("C:\\scans\\b.lsm")
    );
    assert_eq!(
        reader
            .metadata()
            .global("Recordings Name 2")
            .and_then(|v| v.as_str()),
        Some("Recording 2")
    );

    assert_eq!(reader.open_plane(1, 1).unwrap(), plane_pattern(1, 16));
}

#[test]
fn test_timestamps_continue_across_series() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.lsm", &time_series(&[0.0, 1.0]));
    write_file(dir.path(), "b.lsm", &time_series(&[5.0, 7.0]));
    let project = write_file(dir.path(), "p.mdb", b"project");

    let mut reader = LsmReader::new(LocalFileSource::new())
        .with_table_parser(Box::new(RecordingsTable::new(&["b.lsm", "a.lsm"])));
    reader.open(&project).unwrap();

    assert_eq!(reader.timestamps(), &[5.0, 7.0, 0.0, 1.0]);

    let store = reader.metadata();
    let timing = |series, plane, key| {
        store
            .get(MetaTarget::Plane { series, plane }, key)
            .and_then(|v| v.as_f64())
            .unwrap()
    };
    assert_eq!(timing(0, 1, "DeltaT"), 2.0);
    // the second series measures from its own first stamp
    assert_eq!(timing(1, 0, "DeltaT"), 0.0);
    assert_eq!(timing(1, 0, "ExposureTime"), 1.0);
    assert_eq!(timing(1, 1, "DeltaT"), 1.0);
}

#[test]
fn test_used_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.lsm", &time_series(&[0.0]));
    let project = write_file(dir.path(), "p.mdb", b"project");

    let mut reader = LsmReader::new(LocalFileSource::new())
        .with_table_parser(Box::new(RecordingsTable::new(&["a.lsm"])));
    reader.open(&project).unwrap();

    assert_eq!(reader.used_files(false).unwrap(), vec![a.clone(), project.clone()]);
    assert_eq!(reader.used_files(true).unwrap(), vec![project]);

    let mut plain = LsmReader::new(LocalFileSource::new());
    plain.open(&a).unwrap();
    assert_eq!(plain.used_files(false).unwrap(), vec![a]);
    assert!(plain.used_files(true).unwrap().is_empty());
}

#[test]
fn test_project_without_parser_lists_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "b.lsm", &time_series(&[0.0]));
    write_file(dir.path(), "a.lsm", &time_series(&[0.0]));
    write_file(dir.path(), "notes.txt", b"not an image");
    std::fs::create_dir(dir.path().join("folder.lsm")).unwrap();
    let project = write_file(dir.path(), "p.mdb", b"project");

    let mut reader = LsmReader::new(LocalFileSource::new());
    reader.open(&project).unwrap();

    let files = &reader.resolution().unwrap().files;
    assert_eq!(files, &vec![dir.path().join("a.lsm"), dir.path().join("b.lsm")]);
}

#[test]
fn test_missing_references_fall_back_to_listing() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "real.lsm", &time_series(&[0.0]));
    let project = write_file(dir.path(), "p.mdb", b"project");

    let mut reader = LsmReader::new(LocalFileSource::new())
        .with_table_parser(Box::new(RecordingsTable::new(&["gone.lsm"])));
    reader.open(&project).unwrap();

    assert_eq!(
        reader.resolution().unwrap().files,
        vec![dir.path().join("real.lsm")]
    );
}

#[test]
fn test_empty_project_fails() {
    let dir = tempfile::tempdir().unwrap();
    let project = write_file(dir.path(), "p.mdb", b"project");

    let mut reader = LsmReader::new(LocalFileSource::new());
    assert!(matches!(
        reader.open(&project),
        Err(LsmError::NoFilesFound(_))
    ));
    assert!(!reader.is_open());
}

// =============================================================================
// Preference Tests
// =============================================================================

#[test]
fn test_prefer_project_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.lsm", &time_series(&[0.0]));
    write_file(dir.path(), "b.lsm", &time_series(&[0.0]));
    let project = write_file(dir.path(), "p.mdb", b"project");

    let mut reader = LsmReader::new(LocalFileSource::new());
    reader.open(&a).unwrap();
    assert_eq!(reader.series_count(), 1);
    assert!(!reader.resolution().unwrap().is_project());

    let mut reader = LsmReader::new(LocalFileSource::new()).with_options(ResolveOptions {
        prefer_project: true,
    });
    reader.open(&a).unwrap();
    assert_eq!(reader.resolution().unwrap().current, project);
    assert_eq!(reader.series_count(), 2);
}

// =============================================================================
// Cache Tests
// =============================================================================

#[test]
fn test_small_cache_blocks_serve_whole_planes() {
    let dir = tempfile::tempdir().unwrap();
    let data = LsmBuilder::new(64, 32)
        .bits(16)
        .declared(3, 1, 1)
        .thumbnails()
        .patterned_planes(3)
        .channel_names(&["Cy5"])
        .build();
    let path = write_file(dir.path(), "large.lsm", &data);

    let mut reader = LsmReader::new(LocalFileSource::with_cache(512, 2));
    reader.open(&path).unwrap();

    let len = 64 * 32 * 2;
    for no in 0..3 {
        assert_eq!(reader.open_plane(0, no).unwrap(), plane_pattern(no, len));
    }
    assert_eq!(
        reader
            .metadata()
            .global("Series 0 ChannelName0")
            .and_then(|v| v.as_str()),
        Some("Cy5")
    );
}
