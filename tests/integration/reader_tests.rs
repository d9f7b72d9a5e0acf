//! Reader integration tests.
//!
//! Tests verify:
//! - Single-file datasets open with the expected dimensions and metadata
//! - Plane bytes and regions come back in file order
//! - Declared extents are reconciled with the stored plane count
//! - Composite planes are split when data channels match the channel count
//! - Scan information is mapped onto channel and light source slots
//! - Timestamps, events and per-plane timing are published
//! - Errors for out-of-range requests and unreadable files

use std::path::Path;

use lsm_reader::series::{LookupTable, LsmReader, MemorySource};
use lsm_reader::{DimensionOrder, LsmError, MetaTarget, PixelType};

use super::test_utils::{plane_pattern, two_channel_scan_info, LsmBuilder};

fn open(name: &str, data: Vec<u8>) -> LsmReader<MemorySource> {
    let mut source = MemorySource::new();
    let path = format!("/data/{}", name);
    source.add_file(path.as_str(), data);
    let mut reader = LsmReader::new(source);
    reader.open(Path::new(&path)).unwrap();
    reader
}

fn series_value<S: lsm_reader::SeriesSource>(
    reader: &LsmReader<S>,
    key: &str,
) -> lsm_reader::MetaValue {
    reader
        .metadata()
        .get(MetaTarget::Series(0), key)
        .cloned()
        .unwrap_or_else(|| panic!("missing series key {key}"))
}

fn channel_value(reader: &LsmReader<MemorySource>, channel: usize, key: &str) -> Option<String> {
    reader
        .metadata()
        .get(MetaTarget::Channel { series: 0, channel }, key)
        .map(|v| v.to_string())
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// =============================================================================
// Single Image Tests
// =============================================================================

#[test]
fn test_open_grayscale_stack() {
    let data = LsmBuilder::new(4, 3)
        .declared(3, 1, 1)
        .thumbnails()
        .patterned_planes(3)
        .channel_names(&["DAPI"])
        .build();
    let reader = open("stack.lsm", data);

    assert!(reader.is_open());
    assert_eq!(reader.series_count(), 1);

    let info = reader.series(0).unwrap();
    let d = &info.dimensions;
    assert_eq!((d.size_x, d.size_y), (4, 3));
    assert_eq!((d.size_z, d.size_c, d.size_t), (3, 1, 1));
    assert_eq!(info.image_count(), 3);
    assert_eq!(d.order, DimensionOrder::XYZCT);
    assert!(!d.rgb && !d.indexed && !d.split_planes);
    assert_eq!(info.pixel_type, PixelType::Uint8);
    assert!(info.little_endian);
    // thumbnails are not planes
    assert_eq!(info.planes.len(), 3);

    assert_close(info.physical_size[0], 0.2);
    assert_close(info.physical_size[1], 0.2);
    assert_close(info.physical_size[2], 1.0);
}

#[test]
fn test_plane_bytes_and_region() {
    let data = LsmBuilder::new(4, 3)
        .declared(3, 1, 1)
        .thumbnails()
        .patterned_planes(3)
        .build();
    let reader = open("stack.lsm", data);

    for no in 0..3 {
        assert_eq!(reader.open_plane(0, no).unwrap(), plane_pattern(no, 12));
    }

    // rows 1..3, columns 1..3 of plane 2
    let region = reader.open_bytes(0, 2, 1, 1, 2, 2).unwrap();
    let base = (2 * 37) as u8;
    assert_eq!(region, vec![base + 5, base + 6, base + 9, base + 10]);
}

#[test]
fn test_series_and_global_metadata() {
    let data = LsmBuilder::new(4, 3)
        .declared(2, 1, 1)
        .patterned_planes(2)
        .channel_names(&["DAPI"])
        .build();
    let reader = open("meta.lsm", data);
    let store = reader.metadata();

    assert_eq!(
        store.global("Series 0 ChannelName0").and_then(|v| v.as_str()),
        Some("DAPI")
    );
    assert_eq!(
        store.global("Series 0 DimensionZ").and_then(|v| v.as_i64()),
        Some(2)
    );
    assert_eq!(
        store.global("Series 0 DimensionChannels").and_then(|v| v.as_i64()),
        Some(1)
    );
    assert_eq!(
        store.global("Series 0 DimensionX").and_then(|v| v.as_i64()),
        Some(4)
    );

    assert_eq!(series_value(&reader, "SizeZ").as_i64(), Some(2));
    assert_eq!(series_value(&reader, "DimensionOrder").as_str(), Some("XYZCT"));
    assert_eq!(series_value(&reader, "PixelType").as_str(), Some("uint8"));
    assert_eq!(series_value(&reader, "BigEndian").as_bool(), Some(false));
    assert_eq!(
        series_value(&reader, "InstrumentID").as_str(),
        Some("Instrument:0")
    );
    assert_close(series_value(&reader, "PhysicalSizeZ").as_f64().unwrap(), 1.0);
}

#[test]
fn test_reconcile_declared_extents() {
    // Declares Z=2, T=3 but stores only 4 planes
    let data = LsmBuilder::new(2, 2)
        .declared(2, 1, 3)
        .patterned_planes(4)
        .build();
    let reader = open("short.lsm", data);

    let d = &reader.series(0).unwrap().dimensions;
    assert_eq!(d.image_count, 4);
    assert_eq!(d.size_z, 2);
    assert_eq!(d.size_t, 2);
    assert_eq!(
        reader
            .metadata()
            .global("Series 0 DimensionZ")
            .and_then(|v| v.as_i64()),
        Some(2)
    );
}

#[test]
fn test_zero_declared_extents_are_filled() {
    let data = LsmBuilder::new(2, 2)
        .declared(0, 1, 0)
        .patterned_planes(3)
        .build();
    let reader = open("zero.lsm", data);

    let d = &reader.series(0).unwrap().dimensions;
    assert_eq!(d.image_count, 3);
    assert!(d.size_z * d.size_t == 3);
}

// =============================================================================
// Multi-Sample Tests
// =============================================================================

#[test]
fn test_rgb_without_scan_info_is_composite() {
    let data = LsmBuilder::new(2, 2)
        .samples(3)
        .declared(1, 3, 1)
        .patterned_planes(1)
        .build();
    let reader = open("rgb.lsm", data);

    let info = reader.series(0).unwrap();
    assert!(info.dimensions.rgb);
    assert!(!info.dimensions.split_planes);
    assert_eq!(info.dimensions.size_c, 3);
    assert_eq!(info.image_count(), 1);
    assert_eq!(info.dimensions.order, DimensionOrder::XYCZT);

    // channel after channel
    let bytes = reader.open_plane(0, 0).unwrap();
    let stored = plane_pattern(0, 12);
    let red: Vec<u8> = stored.iter().step_by(3).copied().collect();
    let blue: Vec<u8> = stored.iter().skip(2).step_by(3).copied().collect();
    assert_eq!(bytes.len(), 12);
    assert_eq!(&bytes[..4], red.as_slice());
    assert_eq!(&bytes[8..], blue.as_slice());
}

#[test]
fn test_split_planes_with_matching_data_channels() {
    let data = LsmBuilder::new(4, 3)
        .samples(2)
        .declared(2, 2, 1)
        .patterned_planes(2)
        .scan_info(two_channel_scan_info())
        .build();
    let reader = open("split.lsm", data);

    let info = reader.series(0).unwrap();
    assert!(info.dimensions.split_planes);
    assert!(!info.dimensions.rgb);
    assert_eq!(info.dimensions.size_c, 2);
    assert_eq!(info.image_count(), 4);

    let first = plane_pattern(0, 24);
    let second = plane_pattern(1, 24);
    let odd: Vec<u8> = first.iter().skip(1).step_by(2).copied().collect();
    let even: Vec<u8> = second.iter().step_by(2).copied().collect();

    assert_eq!(reader.open_plane(0, 1).unwrap(), odd);
    assert_eq!(reader.open_plane(0, 2).unwrap(), even);
    assert!(matches!(
        reader.open_plane(0, 4),
        Err(LsmError::PlaneOutOfRange { plane: 4, count: 4 })
    ));
}

#[test]
fn test_scan_information_metadata() {
    let data = LsmBuilder::new(4, 3)
        .samples(2)
        .declared(2, 2, 1)
        .patterned_planes(2)
        .scan_info(two_channel_scan_info())
        .build();
    let reader = open("scan.lsm", data);
    let store = reader.metadata();

    let info = reader.series(0).unwrap();
    assert_eq!(info.records.len(), 10);

    assert_eq!(channel_value(&reader, 0, "Name").as_deref(), Some("Ch1-T1"));
    assert_eq!(channel_value(&reader, 1, "Name").as_deref(), Some("Ch2-T1"));
    assert_eq!(
        channel_value(&reader, 1, "LightSourceRef").as_deref(),
        Some("LightSource:1")
    );
    assert_eq!(channel_value(&reader, 0, "PinholeSize").as_deref(), Some("96"));
    assert_eq!(channel_value(&reader, 1, "PinholeSize").as_deref(), Some("120"));
    assert_eq!(
        channel_value(&reader, 0, "ExcitationWavelength").as_deref(),
        Some("488")
    );
    assert_eq!(
        channel_value(&reader, 1, "ExcitationWavelength").as_deref(),
        Some("543")
    );

    let laser = MetaTarget::LightSource {
        series: 0,
        index: 1,
    };
    assert_eq!(
        store.get(laser, "ID").and_then(|v| v.as_str()),
        Some("LightSource:1")
    );

    assert_eq!(
        series_value(&reader, "ImageDescription").as_str(),
        Some("live cells")
    );
    assert_eq!(
        series_value(&reader, "ObjectiveNominalMagnification").as_i64(),
        Some(63)
    );
    assert_eq!(series_value(&reader, "ObjectiveImmersion").as_str(), Some("Oil"));
    assert_close(series_value(&reader, "TimeIncrement").as_f64().unwrap(), 2.5);

    assert_eq!(
        store
            .global("Series 0 DataChannel #2 Acquire")
            .and_then(|v| v.as_bool()),
        Some(true)
    );
    assert!(store
        .global("Series 0 IlluminationChannel #1 Wavelength")
        .is_some());
}

// =============================================================================
// Time Series Tests
// =============================================================================

#[test]
fn test_big_endian_time_series() {
    let data = LsmBuilder::new(3, 2)
        .big_endian()
        .bits(16)
        .scan_type(3)
        .declared(1, 1, 3)
        .patterned_planes(3)
        .timestamps(&[10.0, 10.5, 11.5])
        .event(1.5, 1, "bleach")
        .build();
    assert_eq!(&data[..2], b"MM");
    let reader = open("time.lsm", data);

    let info = reader.series(0).unwrap();
    assert!(!info.little_endian);
    assert_eq!(info.pixel_type, PixelType::Uint16);
    assert_eq!(info.dimensions.order, DimensionOrder::XYTCZ);
    assert_eq!(info.dimensions.size_t, 3);
    assert_eq!(series_value(&reader, "BigEndian").as_bool(), Some(true));

    // bytes keep the file's order
    assert_eq!(reader.open_plane(0, 2).unwrap(), plane_pattern(2, 12));

    assert_eq!(reader.timestamps(), &[10.0, 10.5, 11.5]);
    let store = reader.metadata();
    assert_eq!(
        store.global("Series 0 TimeStamp1").and_then(|v| v.as_f64()),
        Some(10.5)
    );

    assert_eq!(info.events.len(), 1);
    assert_eq!(
        store
            .global("Series 0 Event0 Description")
            .and_then(|v| v.as_str()),
        Some("bleach")
    );
    assert_eq!(
        store.global("Series 0 Event0 Type").and_then(|v| v.as_i64()),
        Some(1)
    );

    let plane = |p| MetaTarget::Plane {
        series: 0,
        plane: p,
    };
    let get = |p, key| store.get(plane(p), key).and_then(|v| v.as_f64()).unwrap();
    assert_close(get(0, "DeltaT"), 0.0);
    assert_close(get(0, "ExposureTime"), 0.5);
    assert_close(get(1, "DeltaT"), 0.5);
    assert_close(get(1, "ExposureTime"), 1.0);
    // the last timepoint reuses the preceding interval
    assert_close(get(2, "DeltaT"), 1.5);
    assert_close(get(2, "ExposureTime"), 1.0);
}

// =============================================================================
// Lookup Table Tests
// =============================================================================

#[test]
fn test_indexed_lookup_tables() {
    let data = LsmBuilder::new(2, 2).color_map().patterned_planes(1).build();
    let reader = open("indexed8.lsm", data);
    assert!(reader.series(0).unwrap().dimensions.indexed);
    match reader.lookup_table(0).unwrap() {
        Some(LookupTable::Bits8(tables)) => {
            for table in &tables {
                assert_eq!(table.len(), 256);
                assert_eq!(table[200], 200);
            }
        }
        other => panic!("expected an 8-bit table, got {other:?}"),
    }

    let data = LsmBuilder::new(2, 2)
        .bits(16)
        .color_map()
        .patterned_planes(1)
        .build();
    let reader = open("indexed16.lsm", data);
    match reader.lookup_table(0).unwrap() {
        Some(LookupTable::Bits16(tables)) => {
            assert_eq!(tables[2].len(), 65536);
            assert_eq!(tables[2][40000], 40000);
        }
        other => panic!("expected a 16-bit table, got {other:?}"),
    }

    let data = LsmBuilder::new(2, 2).patterned_planes(1).build();
    let reader = open("plain.lsm", data);
    assert_eq!(reader.lookup_table(0).unwrap(), None);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_out_of_range_requests() {
    let data = LsmBuilder::new(4, 3).patterned_planes(1).build();
    let reader = open("one.lsm", data);

    assert!(matches!(
        reader.series(1),
        Err(LsmError::SeriesOutOfRange {
            series: 1,
            count: 1
        })
    ));
    assert!(matches!(
        reader.open_plane(0, 1),
        Err(LsmError::PlaneOutOfRange { plane: 1, count: 1 })
    ));
    assert!(matches!(
        reader.open_bytes(0, 0, 3, 0, 2, 1),
        Err(LsmError::RegionOutOfBounds { .. })
    ));
}

#[test]
fn test_compressed_planes_are_rejected() {
    let data = LsmBuilder::new(2, 2)
        .compression(5)
        .patterned_planes(1)
        .build();
    let reader = open("lzw.lsm", data);

    // metadata still decodes
    assert_eq!(reader.series(0).unwrap().image_count(), 1);
    assert!(matches!(
        reader.open_plane(0, 0),
        Err(LsmError::UnsupportedCompression(_))
    ));
}

#[test]
fn test_unreadable_file_fails_to_open() {
    let mut source = MemorySource::new();
    source.add_file("/data/bad.lsm", b"definitely not a TIFF".to_vec());
    let mut reader = LsmReader::new(source);

    let result = reader.open(Path::new("/data/bad.lsm"));
    assert!(matches!(result, Err(LsmError::Tiff(_))));
    assert!(!reader.is_open());
    assert_eq!(reader.series_count(), 0);
}

#[test]
fn test_missing_file_fails_to_open() {
    let mut reader = LsmReader::new(MemorySource::new());
    assert!(reader.open(Path::new("/data/missing.lsm")).is_err());
    assert!(!reader.is_open());
}

#[test]
fn test_close_resets_state() {
    let data = LsmBuilder::new(2, 2)
        .patterned_planes(1)
        .channel_names(&["GFP"])
        .build();
    let mut reader = open("close.lsm", data);
    assert!(!reader.metadata().is_empty());

    reader.close();
    assert!(!reader.is_open());
    assert!(reader.metadata().is_empty());
    assert!(reader.all_series().is_empty());
    assert!(matches!(reader.open_plane(0, 0), Err(LsmError::NotOpen)));
}

#[test]
fn test_summary_serializes() {
    let data = LsmBuilder::new(2, 2).patterned_planes(1).build();
    let reader = open("summary.lsm", data);

    let json = serde_json::to_value(reader.series(0).unwrap().summary()).unwrap();
    assert_eq!(json["size_x"], 2);
    assert_eq!(json["image_count"], 1);
    assert_eq!(json["pixel_type"], "uint8");
    assert_eq!(json["dimension_order"], "XYZCT");
}
