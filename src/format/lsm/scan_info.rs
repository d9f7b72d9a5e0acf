//! Scan-information tree decoding.
//!
//! The scan information block is a stream of tag/type/size triples. A triple
//! with type `SUBBLOCK` opens a record; the record then reads entry/value
//! pairs until the next `SUBBLOCK`-typed pair, which is consumed as the
//! sentinel. Nested lists therefore flatten into one ordered sequence of
//! records (recording, lasers, tracks, detection channels, ...), which is
//! what the adjacency rules operate on.
//!
//! Decoding happens in three passes:
//!
//! 1. [`read_scan_records`] walks the block and builds [`ScanRecord`]s.
//! 2. [`publish_records`] writes every record to global metadata, then
//!    [`validate_adjacency`] drops unacquired records and applies the
//!    neighbour rules.
//! 3. [`map_records`] threads a [`ChannelSlots`] accumulator through the
//!    surviving records and assigns them to indexed channel and light-source
//!    slots.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::error::{IoError, LsmError};
use crate::io::{ByteOrder, RangeReader, RecordCursor};
use crate::metadata::{MetaTarget, MetaValue, MetadataSink};

use super::labels::label_for;

// =============================================================================
// Constants
// =============================================================================

/// Size of one tag/type/size triple.
const RECORD_HEADER_SIZE: u64 = 12;

/// Value type codes.
pub const TYPE_SUBBLOCK: i32 = 0;
pub const TYPE_ASCII: i32 = 2;
pub const TYPE_LONG: i32 = 4;
pub const TYPE_RATIONAL: i32 = 5;

const RECORDING_DESCRIPTION: u32 = 0x1000_0002;
const RECORDING_OBJECTIVE: u32 = 0x1000_0004;
const RECORDING_START_TIME: u32 = 0x1000_0036;

const TRACK_ACQUIRE: u32 = 0x4000_0006;
const TRACK_TIME_BETWEEN_STACKS: u32 = 0x4000_000B;

const LASER_NAME: u32 = 0x5000_0001;
const LASER_ACQUIRE: u32 = 0x5000_0002;
const LASER_POWER: u32 = 0x5000_0003;

const DETECTION_GAIN: u32 = 0x7000_0003;
const DETECTION_PINHOLE_DIAMETER: u32 = 0x7000_0009;
const DETECTION_ACQUIRE: u32 = 0x7000_000B;
const DETECTION_SPI_START: u32 = 0x7000_0022;
const DETECTION_SPI_END: u32 = 0x7000_0023;

const ILLUMINATION_POWER: u32 = 0x9000_0002;
const ILLUMINATION_WAVELENGTH: u32 = 0x9000_0003;
const ILLUMINATION_ACQUIRE: u32 = 0x9000_0004;

const DATA_CHANNEL_NAME: u32 = 0xD000_0001;
const DATA_CHANNEL_ACQUIRE: u32 = 0xD000_0017;

// =============================================================================
// Values and Records
// =============================================================================

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanValue {
    Long(i32),
    Rational(f64),
    Ascii(String),
}

impl ScanValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScanValue::Ascii(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScanValue::Rational(v) => Some(*v),
            ScanValue::Long(v) => Some(*v as f64),
            ScanValue::Ascii(_) => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ScanValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&ScanValue> for MetaValue {
    fn from(value: &ScanValue) -> Self {
        match value {
            ScanValue::Long(v) => MetaValue::Int(*v as i64),
            ScanValue::Rational(v) => MetaValue::Float(*v),
            ScanValue::Ascii(v) => MetaValue::Text(v.clone()),
        }
    }
}

/// The closed set of recognized record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Recording,
    Track,
    Laser,
    DetectionChannel,
    IlluminationChannel,
    BeamSplitter,
    DataChannel,
    Timer,
    Marker,
}

impl RecordKind {
    /// Map an entry code to a record kind.
    pub fn from_entry(entry: u32) -> Option<Self> {
        match entry {
            0x1000_0000 => Some(RecordKind::Recording),
            0x4000_0000 => Some(RecordKind::Track),
            0x5000_0000 => Some(RecordKind::Laser),
            0x7000_0000 => Some(RecordKind::DetectionChannel),
            0x9000_0000 => Some(RecordKind::IlluminationChannel),
            0xB000_0000 => Some(RecordKind::BeamSplitter),
            0xD000_0000 => Some(RecordKind::DataChannel),
            0x1200_0000 => Some(RecordKind::Timer),
            0x1400_0000 => Some(RecordKind::Marker),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Recording => "Recording",
            RecordKind::Track => "Track",
            RecordKind::Laser => "Laser",
            RecordKind::DetectionChannel => "DetectionChannel",
            RecordKind::IlluminationChannel => "IlluminationChannel",
            RecordKind::BeamSplitter => "BeamSplitter",
            RecordKind::DataChannel => "DataChannel",
            RecordKind::Timer => "Timer",
            RecordKind::Marker => "Marker",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Objective lens description parsed from the recording's objective string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectiveInfo {
    pub correction: String,
    pub magnification: Option<i32>,
    pub lens_na: Option<f64>,
    pub immersion: String,
    pub iris: bool,
}

/// Typed fields extracted per record kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFields {
    Recording {
        description: Option<String>,
        objective: ObjectiveInfo,
        start_time: Option<f64>,
    },
    Laser {
        medium: String,
        laser_type: String,
        power: Option<f64>,
    },
    Track {
        time_increment: Option<f64>,
    },
    DetectionChannel {
        pinhole: Option<f64>,
        gain: Option<f64>,
        spi_start: Option<f64>,
        spi_end: Option<f64>,
    },
    IlluminationChannel {
        wavelength: Option<i64>,
        power: Option<f64>,
    },
    DataChannel {
        name: Option<String>,
    },
    /// Beam splitters, timers and markers carry no typed fields
    Untyped,
}

/// One record of the scan-information tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub kind: RecordKind,

    /// File offset of the record's header triple
    pub offset: u64,

    /// Raw attributes; the first occurrence of a tag wins
    pub attributes: BTreeMap<u32, ScanValue>,

    /// Whether the record takes part in the acquisition
    pub acquire: bool,

    pub fields: RecordFields,
}

impl ScanRecord {
    /// Build a record from its raw attributes.
    pub fn from_attributes(kind: RecordKind, offset: u64, attributes: BTreeMap<u32, ScanValue>) -> Self {
        let text = |tag: u32| attributes.get(&tag).and_then(ScanValue::as_str).map(str::to_string);
        let float = |tag: u32| attributes.get(&tag).and_then(ScanValue::as_f64);
        let flag = |tag: u32| {
            attributes
                .get(&tag)
                .and_then(ScanValue::as_i32)
                .map_or(true, |v| v != 0)
        };

        let (acquire, fields) = match kind {
            RecordKind::Recording => (
                true,
                RecordFields::Recording {
                    description: text(RECORDING_DESCRIPTION),
                    objective: parse_objective(text(RECORDING_OBJECTIVE).as_deref().unwrap_or("")),
                    start_time: float(RECORDING_START_TIME),
                },
            ),
            RecordKind::Laser => {
                let name = text(LASER_NAME).unwrap_or_default();
                let (medium, laser_type) = laser_medium(&name);
                (
                    flag(LASER_ACQUIRE),
                    RecordFields::Laser {
                        medium,
                        laser_type,
                        power: float(LASER_POWER),
                    },
                )
            }
            RecordKind::Track => (
                flag(TRACK_ACQUIRE),
                RecordFields::Track {
                    time_increment: float(TRACK_TIME_BETWEEN_STACKS),
                },
            ),
            RecordKind::DetectionChannel => (
                flag(DETECTION_ACQUIRE),
                RecordFields::DetectionChannel {
                    pinhole: float(DETECTION_PINHOLE_DIAMETER),
                    gain: float(DETECTION_GAIN),
                    spi_start: float(DETECTION_SPI_START),
                    spi_end: float(DETECTION_SPI_END),
                },
            ),
            RecordKind::IlluminationChannel => (
                flag(ILLUMINATION_ACQUIRE),
                RecordFields::IlluminationChannel {
                    wavelength: float(ILLUMINATION_WAVELENGTH).map(|w| w as i64),
                    power: float(ILLUMINATION_POWER),
                },
            ),
            RecordKind::DataChannel => (
                flag(DATA_CHANNEL_ACQUIRE),
                RecordFields::DataChannel {
                    name: text(DATA_CHANNEL_NAME).map(|n| cut_at_control(&n)),
                },
            ),
            RecordKind::BeamSplitter | RecordKind::Timer | RecordKind::Marker => {
                (true, RecordFields::Untyped)
            }
        };

        ScanRecord {
            kind,
            offset,
            attributes,
            acquire,
            fields,
        }
    }
}

/// Truncate a name at the first character below 10.
fn cut_at_control(name: &str) -> String {
    match name.char_indices().find(|&(_, c)| (c as u32) < 10) {
        Some((i, _)) => name[..i].to_string(),
        None => name.to_string(),
    }
}

// =============================================================================
// Field Parsers
// =============================================================================

/// Split an objective description such as `"Plan-Apochromat 63x/1.40 Oil DIC"`.
///
/// Tokens before the first token containing `/` form the correction. The
/// `/` token holds the magnification (ending one character before the
/// slash) and the numerical aperture (after it). The following tokens are the
/// immersion medium and an optional `iris` marker.
pub fn parse_objective(objective: &str) -> ObjectiveInfo {
    let mut tokens: Vec<&str> = objective.split(' ').collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }

    let mut info = ObjectiveInfo::default();
    let mut next = 0;
    while next < tokens.len() && !tokens[next].contains('/') {
        info.correction.push_str(tokens[next]);
        next += 1;
    }

    if let Some(token) = tokens.get(next) {
        next += 1;
        if let Some(slash) = token.find('/') {
            info.magnification = slash
                .checked_sub(1)
                .and_then(|end| token.get(..end))
                .and_then(|digits| digits.parse().ok());
            info.lens_na = token[slash + 1..].parse().ok();
        }
    }

    info.immersion = match tokens.get(next) {
        Some(token) => {
            next += 1;
            token.to_string()
        }
        None => "Unknown".to_string(),
    };
    info.iris = tokens
        .get(next)
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("iris"));
    info
}

/// Map a laser display name to `(medium, type)`.
pub fn laser_medium(name: &str) -> (String, String) {
    let (medium, laser_type) = if name.starts_with("HeNe") {
        ("HeNe", "Gas")
    } else if name.starts_with("Argon") {
        ("Ar", "Gas")
    } else if name == "Titanium:Sapphire" || name == "Mai Tai" {
        ("TiSapphire", "SolidState")
    } else if name == "YAG" {
        ("", "SolidState")
    } else if name == "Ar/Kr" {
        ("", "Gas")
    } else {
        ("", name)
    };
    (medium.to_string(), laser_type.to_string())
}

// =============================================================================
// Tree Walk
// =============================================================================

/// Walk the scan-information block at `offset`.
///
/// A record that runs past the end of the file is dropped and ends the
/// walk; everything decoded before it is kept.
pub fn read_scan_records<R: RangeReader + ?Sized>(
    reader: &R,
    order: ByteOrder,
    offset: u64,
) -> Vec<ScanRecord> {
    let mut c = RecordCursor::new(reader, order);
    let end = structure_end(&mut c, offset);
    c.seek(offset);

    let mut records = Vec::new();
    while c.position() + RECORD_HEADER_SIZE < end {
        let start = c.position();
        let (entry, block_type, size) = match read_triple(&mut c) {
            Ok(triple) => triple,
            Err(_) => {
                warn!(offset = start, "scan information header truncated");
                break;
            }
        };

        if block_type != TYPE_SUBBLOCK {
            c.skip(size.max(0) as u64);
            continue;
        }

        let Some(kind) = RecordKind::from_entry(entry) else {
            let skipped = LsmError::UnrecognizedScanEntry(entry);
            trace!(offset = start, %skipped, "walking into subblock");
            continue;
        };

        match read_attributes(&mut c) {
            Ok(attributes) => records.push(ScanRecord::from_attributes(kind, start, attributes)),
            Err(_) => {
                let error = LsmError::TruncatedRecord {
                    offset: start,
                    context: "scan information record",
                };
                warn!(%error, kind = %kind, "dropping record and ending scan information walk");
                break;
            }
        }
    }

    debug!(offset, records = records.len(), "read scan information");
    records
}

/// End of the block: the first record's declared extent when it fits in
/// the file, otherwise the end of the file.
fn structure_end<R: RangeReader + ?Sized>(c: &mut RecordCursor<'_, R>, offset: u64) -> u64 {
    c.seek(offset);
    match read_triple(c) {
        Ok((_, _, size)) if size > 0 => {
            let end = offset + RECORD_HEADER_SIZE + size as u64;
            if end <= c.len() {
                end
            } else {
                c.len()
            }
        }
        _ => c.len(),
    }
}

fn read_triple<R: RangeReader + ?Sized>(
    c: &mut RecordCursor<'_, R>,
) -> Result<(u32, i32, i32), IoError> {
    Ok((c.read_u32()?, c.read_i32()?, c.read_i32()?))
}

/// Read entry/value pairs up to and including the sentinel.
fn read_attributes<R: RangeReader + ?Sized>(
    c: &mut RecordCursor<'_, R>,
) -> Result<BTreeMap<u32, ScanValue>, IoError> {
    let mut attributes = BTreeMap::new();
    loop {
        let (entry, value_type, size) = read_triple(c)?;
        let value = match value_type {
            TYPE_SUBBLOCK => return Ok(attributes),
            TYPE_LONG => ScanValue::Long(c.read_i32()?),
            TYPE_RATIONAL => ScanValue::Rational(c.read_f64()?),
            TYPE_ASCII => ScanValue::Ascii(c.read_string(size.max(0) as usize)?),
            _ => {
                c.skip(size.max(0) as u64);
                continue;
            }
        };
        attributes.entry(entry).or_insert(value);
    }
}

// =============================================================================
// Publication and Validation
// =============================================================================

/// Publish every record as `"<prefix><Kind> #<k> <label>"`, where `k`
/// counts records of the same kind from 1.
pub fn publish_records(records: &[ScanRecord], prefix: &str, sink: &mut dyn MetadataSink) {
    let mut counters: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in records {
        let index = counters.entry(record.kind.as_str()).or_insert(0);
        *index += 1;
        let base = format!("{prefix}{} #{}", record.kind, index);

        for (tag, value) in &record.attributes {
            if let Some(label) = label_for(*tag) {
                sink.put_global(&format!("{base} {label}"), value.into());
            }
        }
        sink.put_global(&format!("{base} Acquire"), record.acquire.into());
    }
}

/// Drop unacquired records, then apply the neighbour rules left to right.
///
/// - An illumination channel that is not the last record loses its
///   wavelength unless the next record is a data or illumination channel.
/// - Otherwise, a detection channel that is not the first record is marked
///   unacquired unless the previous record is a track or detection channel.
pub fn validate_adjacency(records: Vec<ScanRecord>) -> Vec<ScanRecord> {
    let mut records: Vec<ScanRecord> = records.into_iter().filter(|r| r.acquire).collect();

    for i in 0..records.len() {
        match records[i].kind {
            RecordKind::IlluminationChannel if i + 1 < records.len() => {
                let next = records[i + 1].kind;
                if next != RecordKind::DataChannel && next != RecordKind::IlluminationChannel {
                    if let RecordFields::IlluminationChannel { wavelength, .. } =
                        &mut records[i].fields
                    {
                        *wavelength = None;
                    }
                }
            }
            RecordKind::DetectionChannel if i > 0 => {
                let prev = records[i - 1].kind;
                if prev != RecordKind::Track && prev != RecordKind::DetectionChannel {
                    records[i].acquire = false;
                }
            }
            _ => {}
        }
    }
    records
}

// =============================================================================
// Mapping Pass
// =============================================================================

/// Running slot counters for one series' mapping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSlots {
    pub next_laser: usize,
    pub next_data: usize,
    pub next_illumination: usize,
    pub next_detection: usize,
}

impl ChannelSlots {
    /// Number of logical channels named by data channel records, or 1.
    pub fn logical_channels(&self) -> usize {
        self.next_data.max(1)
    }
}

/// Map every acquired record onto indexed metadata slots of `series`.
pub fn map_records(
    records: &[ScanRecord],
    series: usize,
    size_c: usize,
    sink: &mut dyn MetadataSink,
) -> ChannelSlots {
    records
        .iter()
        .filter(|r| r.acquire)
        .fold(ChannelSlots::default(), |slots, record| {
            map_record(record, slots, series, size_c, &mut *sink)
        })
}

/// Apply one record and return the advanced counters.
pub fn map_record(
    record: &ScanRecord,
    mut slots: ChannelSlots,
    series: usize,
    size_c: usize,
    sink: &mut dyn MetadataSink,
) -> ChannelSlots {
    match &record.fields {
        RecordFields::Recording {
            description,
            objective,
            ..
        } => {
            let target = MetaTarget::Series(series);
            if let Some(description) = description {
                sink.put(target, "ImageDescription", description.as_str().into());
            }
            sink.put(target, "ObjectiveCorrection", objective.correction.as_str().into());
            sink.put(target, "ObjectiveImmersion", objective.immersion.as_str().into());
            if let Some(magnification) = objective.magnification {
                sink.put(target, "ObjectiveNominalMagnification", magnification.into());
            }
            if let Some(na) = objective.lens_na {
                sink.put(target, "ObjectiveLensNA", na.into());
            }
            sink.put(target, "ObjectiveIris", objective.iris.into());
            sink.put(target, "ObjectiveID", format!("Objective:{series}").into());
        }
        RecordFields::Laser {
            medium, laser_type, ..
        } => {
            let target = MetaTarget::LightSource {
                series,
                index: slots.next_laser,
            };
            sink.put(target, "LaserMedium", medium.as_str().into());
            sink.put(target, "LaserType", laser_type.as_str().into());
            sink.put(target, "ID", format!("LightSource:{}", slots.next_laser).into());
            slots.next_laser += 1;
        }
        RecordFields::Track { time_increment } => {
            if let Some(increment) = time_increment {
                sink.put(MetaTarget::Series(series), "TimeIncrement", (*increment).into());
            }
        }
        RecordFields::DataChannel { name: Some(name) } if slots.next_data < size_c => {
            let target = MetaTarget::Channel {
                series,
                channel: slots.next_data,
            };
            let light_source = if slots.next_data < slots.next_laser {
                Some(slots.next_data)
            } else {
                slots.next_laser.checked_sub(1)
            };
            if let Some(light_source) = light_source {
                sink.put(target, "LightSourceRef", format!("LightSource:{light_source}").into());
            }
            sink.put(target, "Name", name.as_str().into());
            slots.next_data += 1;
        }
        RecordFields::DetectionChannel { pinhole, .. } => {
            match pinhole {
                Some(pinhole) if *pinhole != 0.0 && slots.next_detection < size_c => {
                    let target = MetaTarget::Channel {
                        series,
                        channel: slots.next_detection,
                    };
                    sink.put(target, "PinholeSize", (*pinhole).into());
                }
                _ => {}
            }
            slots.next_detection += 1;
        }
        RecordFields::IlluminationChannel { wavelength, .. } => match wavelength {
            Some(wavelength) if slots.next_illumination < size_c => {
                let target = MetaTarget::Channel {
                    series,
                    channel: slots.next_illumination,
                };
                sink.put(target, "ExcitationWavelength", (*wavelength).into());
                slots.next_illumination += 1;
            }
            // The last channel slot is never skipped past
            _ if slots.next_illumination + 1 < size_c => slots.next_illumination += 1,
            _ => {}
        },
        RecordFields::DataChannel { .. } | RecordFields::Untyped => {}
    }
    slots
}

// =============================================================================
// Tests
// =============================================================================
