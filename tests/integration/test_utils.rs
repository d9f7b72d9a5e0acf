//! Test utilities for integration tests.
//!
//! This module synthesizes complete LSM files: a classic TIFF envelope with
//! full-resolution planes and optional thumbnails, a CZ_LSMINFO block, and
//! the auxiliary structures it points at (channel names, timestamps, events,
//! scan information and overlay lists).

use std::path::{Path, PathBuf};

use lsm_reader::series::{Table, TableParser, RECORDINGS_TABLE, SAMPLE_DATA_COLUMN};
use lsm_reader::LsmError;

// =============================================================================
// Byte Writer
// =============================================================================

/// A single value in the file's byte order.
#[derive(Debug, Clone)]
pub enum Field {
    I32(i32),
    U32(u32),
    F64(f64),
    /// NUL-terminated string
    Cstr(String),
    /// Fixed-width string field, NUL padded
    Fixed(String, usize),
    Zeros(usize),
}

/// Append-only buffer writing in one byte order.
pub struct Writer {
    pub little: bool,
    pub buf: Vec<u8>,
}

impl Writer {
    pub fn new(little: bool) -> Self {
        Self {
            little,
            buf: Vec::new(),
        }
    }

    pub fn pos(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn u16(&mut self, v: u16) {
        let bytes = if self.little {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        self.buf.extend_from_slice(&bytes);
    }

    pub fn u32(&mut self, v: u32) {
        let bytes = if self.little {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        self.buf.extend_from_slice(&bytes);
    }

    pub fn i32(&mut self, v: i32) {
        self.u32(v as u32);
    }

    pub fn f64(&mut self, v: f64) {
        let bytes = if self.little {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        self.buf.extend_from_slice(&bytes);
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn field(&mut self, field: &Field) {
        match field {
            Field::I32(v) => self.i32(*v),
            Field::U32(v) => self.u32(*v),
            Field::F64(v) => self.f64(*v),
            Field::Cstr(s) => {
                self.bytes(s.as_bytes());
                self.buf.push(0);
            }
            Field::Fixed(s, len) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.resize(*len, 0);
                self.bytes(&bytes);
            }
            Field::Zeros(n) => self.buf.resize(self.buf.len() + n, 0),
        }
    }

    pub fn align(&mut self) {
        if self.buf.len() % 2 == 1 {
            self.buf.push(0);
        }
    }

    pub fn patch_u32(&mut self, at: u32, v: u32) {
        let bytes = if self.little {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        let at = at as usize;
        self.buf[at..at + 4].copy_from_slice(&bytes);
    }

    pub fn patch_f64(&mut self, at: u32, v: f64) {
        let bytes = if self.little {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        let at = at as usize;
        self.buf[at..at + 8].copy_from_slice(&bytes);
    }

    pub fn patch_u16(&mut self, at: u32, v: u16) {
        let bytes = if self.little {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        let at = at as usize;
        self.buf[at..at + 2].copy_from_slice(&bytes);
    }
}

// =============================================================================
// Scan Information
// =============================================================================

pub const SUBBLOCK_RECORDING: u32 = 0x1000_0000;
pub const SUBBLOCK_LASERS: u32 = 0x3000_0000;
pub const SUBBLOCK_LASER: u32 = 0x5000_0000;
pub const SUBBLOCK_TRACKS: u32 = 0x2000_0000;
pub const SUBBLOCK_TRACK: u32 = 0x4000_0000;
pub const SUBBLOCK_DETECTIONS: u32 = 0x6000_0000;
pub const SUBBLOCK_DETECTION: u32 = 0x7000_0000;
pub const SUBBLOCK_ILLUMINATIONS: u32 = 0x8000_0000;
pub const SUBBLOCK_ILLUMINATION: u32 = 0x9000_0000;
pub const SUBBLOCK_DATA_CHANNELS: u32 = 0xC000_0000;
pub const SUBBLOCK_DATA_CHANNEL: u32 = 0xD000_0000;
pub const SUBBLOCK_END: u32 = 0xFFFF_FFFF;

pub const RECORDING_DESCRIPTION: u32 = 0x1000_0002;
pub const RECORDING_OBJECTIVE: u32 = 0x1000_0004;
pub const TRACK_ACQUIRE: u32 = 0x4000_0006;
pub const TRACK_TIME_BETWEEN_STACKS: u32 = 0x4000_000B;
pub const LASER_NAME: u32 = 0x5000_0001;
pub const LASER_ACQUIRE: u32 = 0x5000_0002;
pub const DETECTION_PINHOLE: u32 = 0x7000_0009;
pub const DETECTION_ACQUIRE: u32 = 0x7000_000B;
pub const ILLUMINATION_WAVELENGTH: u32 = 0x9000_0003;
pub const ILLUMINATION_ACQUIRE: u32 = 0x9000_0004;
pub const DATA_CHANNEL_NAME: u32 = 0xD000_0001;
pub const DATA_CHANNEL_ACQUIRE: u32 = 0xD000_0017;

/// Builder for a scan information block.
///
/// The first triple's size is patched to cover the whole block when the
/// block is written.
#[derive(Debug, Clone, Default)]
pub struct ScanInfo {
    fields: Vec<Field>,
}

impl ScanInfo {
    pub fn new() -> Self {
        Self::default()
    }

    fn triple(mut self, entry: u32, value_type: i32, size: i32) -> Self {
        self.fields.push(Field::U32(entry));
        self.fields.push(Field::I32(value_type));
        self.fields.push(Field::I32(size));
        self
    }

    pub fn open(self, entry: u32) -> Self {
        self.triple(entry, 0, 0)
    }

    pub fn end(self) -> Self {
        self.triple(SUBBLOCK_END, 0, 0)
    }

    pub fn long(self, entry: u32, v: i32) -> Self {
        let mut s = self.triple(entry, 4, 4);
        s.fields.push(Field::I32(v));
        s
    }

    pub fn rational(self, entry: u32, v: f64) -> Self {
        let mut s = self.triple(entry, 5, 8);
        s.fields.push(Field::F64(v));
        s
    }

    pub fn ascii(self, entry: u32, text: &str) -> Self {
        let mut s = self.triple(entry, 2, text.len() as i32 + 1);
        s.fields.push(Field::Cstr(text.to_string()));
        s
    }

    fn write(&self, w: &mut Writer) -> u32 {
        let start = w.pos();
        for field in &self.fields {
            w.field(field);
        }
        let len = w.pos() - start;
        if len >= 12 {
            w.patch_u32(start + 8, len - 12);
        }
        start
    }
}

/// A typical two-channel acquisition: one track, two lasers, two
/// detection channels, two illumination channels and two data channels.
pub fn two_channel_scan_info() -> ScanInfo {
    ScanInfo::new()
        .open(SUBBLOCK_RECORDING)
        .ascii(RECORDING_DESCRIPTION, "live cells")
        .ascii(RECORDING_OBJECTIVE, "Plan-Apochromat 63x/1.40 Oil DIC")
        .open(SUBBLOCK_LASERS)
        .open(SUBBLOCK_LASER)
        .ascii(LASER_NAME, "Argon/2")
        .long(LASER_ACQUIRE, 1)
        .end()
        .open(SUBBLOCK_LASER)
        .ascii(LASER_NAME, "HeNe543")
        .long(LASER_ACQUIRE, 1)
        .end()
        .end()
        .open(SUBBLOCK_TRACKS)
        .open(SUBBLOCK_TRACK)
        .long(TRACK_ACQUIRE, 1)
        .rational(TRACK_TIME_BETWEEN_STACKS, 2.5)
        .open(SUBBLOCK_DETECTIONS)
        .open(SUBBLOCK_DETECTION)
        .rational(DETECTION_PINHOLE, 96.0)
        .long(DETECTION_ACQUIRE, 1)
        .end()
        .open(SUBBLOCK_DETECTION)
        .rational(DETECTION_PINHOLE, 120.0)
        .long(DETECTION_ACQUIRE, 1)
        .end()
        .end()
        .open(SUBBLOCK_ILLUMINATIONS)
        .open(SUBBLOCK_ILLUMINATION)
        .rational(ILLUMINATION_WAVELENGTH, 488.0)
        .long(ILLUMINATION_ACQUIRE, 1)
        .end()
        .open(SUBBLOCK_ILLUMINATION)
        .rational(ILLUMINATION_WAVELENGTH, 543.0)
        .long(ILLUMINATION_ACQUIRE, 1)
        .end()
        .end()
        .open(SUBBLOCK_DATA_CHANNELS)
        .open(SUBBLOCK_DATA_CHANNEL)
        .ascii(DATA_CHANNEL_NAME, "Ch1-T1")
        .long(DATA_CHANNEL_ACQUIRE, 1)
        .end()
        .open(SUBBLOCK_DATA_CHANNEL)
        .ascii(DATA_CHANNEL_NAME, "Ch2-T1")
        .long(DATA_CHANNEL_ACQUIRE, 1)
        .end()
        .end()
        .end()
        .end()
        .end()
}

// =============================================================================
// Overlays
// =============================================================================

/// One overlay shape: its type code, style and type-specific body.
#[derive(Debug, Clone)]
pub struct ShapeRecord {
    pub type_code: i32,
    pub line_width: i32,
    pub color: i32,
    pub font_name: String,
    pub font_height: i32,
    pub italic: bool,
    pub body: Vec<Field>,
    /// Extra bytes after the body, covered by the block length
    pub padding: usize,
}

impl ShapeRecord {
    pub fn new(type_code: i32, body: Vec<Field>) -> Self {
        Self {
            type_code,
            line_width: 1,
            color: 0x00FF_0000,
            font_name: "Arial".to_string(),
            font_height: 12,
            italic: false,
            body,
            padding: 0,
        }
    }

    pub fn rectangle(a: (f64, f64), b: (f64, f64)) -> Self {
        Self::new(
            18,
            vec![
                Field::I32(2),
                Field::F64(a.0),
                Field::F64(a.1),
                Field::F64(b.0),
                Field::F64(b.1),
            ],
        )
    }

    pub fn text(anchor: (f64, f64), text: &str) -> Self {
        Self::new(
            13,
            vec![
                Field::F64(anchor.0),
                Field::F64(anchor.1),
                Field::Cstr(text.to_string()),
            ],
        )
    }

    pub fn line(start: (f64, f64), end: (f64, f64)) -> Self {
        Self::new(
            14,
            vec![
                Field::I32(2),
                Field::F64(start.0),
                Field::F64(start.1),
                Field::F64(end.0),
                Field::F64(end.1),
            ],
        )
    }

    pub fn circle(center: (f64, f64), edge: (f64, f64)) -> Self {
        Self::new(
            24,
            vec![
                Field::I32(2),
                Field::F64(center.0),
                Field::F64(center.1),
                Field::F64(edge.0),
                Field::F64(edge.1),
            ],
        )
    }

    /// Three-point circle; collinear points make it degenerate.
    pub fn circle_3point(p: [(f64, f64); 3]) -> Self {
        let mut body = vec![Field::I32(3)];
        for (x, y) in p {
            body.push(Field::F64(x));
            body.push(Field::F64(y));
        }
        Self::new(29, body)
    }

    pub fn open_polyline(points: &[(f64, f64)]) -> Self {
        let mut body = vec![Field::I32(points.len() as i32)];
        for &(x, y) in points {
            body.push(Field::F64(x));
            body.push(Field::F64(y));
        }
        Self::new(21, body)
    }

    pub fn padded(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn styled(mut self, color: i32, line_width: i32, italic: bool) -> Self {
        self.color = color;
        self.line_width = line_width;
        self.italic = italic;
        self
    }

    fn write(&self, w: &mut Writer) {
        let start = w.pos();
        w.i32(self.type_code);
        w.i32(0); // block length, patched below

        // style
        w.i32(self.line_width);
        w.i32(0); // measurements
        w.f64(0.0);
        w.f64(0.0);
        w.i32(self.color);
        w.i32(1); // valid
        w.i32(4); // knot width
        w.i32(4); // catch area
        w.i32(self.font_height);
        w.i32(0); // width
        w.i32(0); // escapement
        w.i32(0); // orientation
        w.i32(400); // weight
        w.i32(self.italic as i32);
        w.i32(0); // underline
        w.i32(0); // strikeout
        for _ in 0..5 {
            w.i32(0);
        }
        w.field(&Field::Fixed(self.font_name.clone(), 64));
        w.u16(0); // enabled
        w.i32(1); // not locked
        w.field(&Field::Zeros(34));
        assert_eq!(w.pos() - start, 204, "shape prefix must be 204 bytes");

        for field in &self.body {
            w.field(field);
        }
        w.field(&Field::Zeros(self.padding));
        let len = w.pos() - start;
        w.patch_u32(start + 4, len);
    }
}

fn write_overlay_list(w: &mut Writer, shapes: &[ShapeRecord]) -> u32 {
    let start = w.pos();
    w.i32(shapes.len() as i32);
    w.i32(200); // size
    w.field(&Field::Zeros(20));
    w.i32(1); // valid
    w.field(&Field::Zeros(164));
    for shape in shapes {
        shape.write(w);
    }
    start
}

// =============================================================================
// LSM File Builder
// =============================================================================

/// Builder for synthetic LSM files.
///
/// Each plane is stored as a single uncompressed strip. Thumbnails, when
/// enabled, are 2x2 8-bit images interleaved after every plane.
#[derive(Debug, Clone)]
pub struct LsmBuilder {
    little: bool,
    width: u32,
    height: u32,
    samples: u16,
    bits: u16,
    compression: u16,
    color_map: bool,
    thumbnails: bool,
    planes: Vec<Vec<u8>>,
    dim_z: i32,
    dim_c: i32,
    dim_t: i32,
    scan_type: i16,
    voxel: [f64; 3],
    channel_names: Vec<String>,
    timestamps: Vec<f64>,
    events: Vec<(f64, i32, String)>,
    scan_info: Option<ScanInfo>,
    overlays: Vec<(usize, Vec<ShapeRecord>)>,
}

impl LsmBuilder {
    /// A little-endian 8-bit grayscale image with one declared plane.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            little: true,
            width,
            height,
            samples: 1,
            bits: 8,
            compression: 1,
            color_map: false,
            thumbnails: false,
            planes: Vec::new(),
            dim_z: 1,
            dim_c: 1,
            dim_t: 1,
            scan_type: 0,
            voxel: [0.2e-6, 0.2e-6, 1.0e-6],
            channel_names: Vec::new(),
            timestamps: Vec::new(),
            events: Vec::new(),
            scan_info: None,
            overlays: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.little = false;
        self
    }

    pub fn samples(mut self, samples: u16) -> Self {
        self.samples = samples;
        self
    }

    pub fn bits(mut self, bits: u16) -> Self {
        self.bits = bits;
        self
    }

    pub fn compression(mut self, compression: u16) -> Self {
        self.compression = compression;
        self
    }

    pub fn color_map(mut self) -> Self {
        self.color_map = true;
        self
    }

    pub fn thumbnails(mut self) -> Self {
        self.thumbnails = true;
        self
    }

    /// Declared Z, channel and T counts of the header.
    pub fn declared(mut self, z: i32, c: i32, t: i32) -> Self {
        self.dim_z = z;
        self.dim_c = c;
        self.dim_t = t;
        self
    }

    pub fn scan_type(mut self, scan_type: i16) -> Self {
        self.scan_type = scan_type;
        self
    }

    /// Voxel size in meters.
    pub fn voxel_size(mut self, x: f64, y: f64, z: f64) -> Self {
        self.voxel = [x, y, z];
        self
    }

    /// Bytes in one stored plane.
    pub fn plane_len(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.samples as usize
            * (self.bits as usize).div_ceil(8)
    }

    /// Append `count` planes filled with [`plane_pattern`].
    pub fn patterned_planes(mut self, count: usize) -> Self {
        let len = self.plane_len();
        let first = self.planes.len();
        for i in first..first + count {
            self.planes.push(plane_pattern(i, len));
        }
        self
    }

    pub fn plane(mut self, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), self.plane_len(), "plane length mismatch");
        self.planes.push(data);
        self
    }

    pub fn channel_names(mut self, names: &[&str]) -> Self {
        self.channel_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn timestamps(mut self, stamps: &[f64]) -> Self {
        self.timestamps = stamps.to_vec();
        self
    }

    pub fn event(mut self, time: f64, event_type: i32, description: &str) -> Self {
        self.events.push((time, event_type, description.to_string()));
        self
    }

    pub fn scan_info(mut self, scan_info: ScanInfo) -> Self {
        self.scan_info = Some(scan_info);
        self
    }

    /// Attach an overlay list at header slot `list` (0..9).
    pub fn overlay(mut self, list: usize, shapes: Vec<ShapeRecord>) -> Self {
        self.overlays.push((list, shapes));
        self
    }

    /// Serialize the file.
    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::new(self.little);

        // TIFF header
        w.bytes(if self.little { b"II" } else { b"MM" });
        w.u16(42);
        w.u32(0); // first IFD, patched below

        // Pixel data
        let mut plane_offsets = Vec::new();
        let mut thumb_offsets = Vec::new();
        for plane in &self.planes {
            plane_offsets.push(w.pos());
            w.bytes(plane);
            w.align();
            if self.thumbnails {
                thumb_offsets.push(w.pos());
                w.bytes(&[1, 2, 3, 4]);
            }
        }

        let color_map_offset = if self.color_map {
            let offset = w.pos();
            w.field(&Field::Zeros(3 * 256 * 2));
            offset
        } else {
            0
        };

        // Auxiliary structures
        let channel_colors = if self.channel_names.is_empty() {
            0
        } else {
            let start = w.pos();
            w.i32(0); // block size
            w.i32(self.channel_names.len() as i32);
            w.i32(self.channel_names.len() as i32);
            w.i32(0); // colors offset
            w.i32(16); // names offset: names begin right after this header
            for name in &self.channel_names {
                w.field(&Field::Cstr(name.clone()));
            }
            w.align();
            start
        };

        let timestamps = if self.timestamps.is_empty() {
            0
        } else {
            let start = w.pos();
            w.i32(8 + 8 * self.timestamps.len() as i32);
            w.i32(self.timestamps.len() as i32);
            for stamp in &self.timestamps {
                w.f64(*stamp);
            }
            start
        };

        let events = if self.events.is_empty() {
            0
        } else {
            let start = w.pos();
            w.i32(0); // block size
            w.i32(self.events.len() as i32);
            for (time, event_type, description) in &self.events {
                w.i32(16 + description.len() as i32 + 1);
                w.f64(*time);
                w.i32(*event_type);
                w.field(&Field::Cstr(description.clone()));
            }
            w.align();
            start
        };

        let scan_info = match &self.scan_info {
            Some(info) => {
                let start = info.write(&mut w);
                w.align();
                start
            }
            None => 0,
        };

        let mut overlay_offsets = [0u32; 9];
        for (list, shapes) in &self.overlays {
            overlay_offsets[*list] = write_overlay_list(&mut w, shapes);
            w.align();
        }

        // CZ_LSMINFO
        let info_offset = w.pos();
        w.field(&Field::Zeros(224));
        let at = |off: u32| info_offset + off;
        w.patch_u32(at(0), 0x0400_494C);
        w.patch_u32(at(4), 224);
        w.patch_u32(at(8), self.width);
        w.patch_u32(at(12), self.height);
        w.patch_u32(at(16), self.dim_z as u32);
        w.patch_u32(at(20), self.dim_c as u32);
        w.patch_u32(at(24), self.dim_t as u32);
        w.patch_u32(at(28), 1);
        w.patch_f64(at(40), self.voxel[0]);
        w.patch_f64(at(48), self.voxel[1]);
        w.patch_f64(at(56), self.voxel[2]);
        w.patch_u16(at(88), self.scan_type as u16);
        w.patch_u32(at(96), overlay_offsets[0]);
        w.patch_u32(at(100), overlay_offsets[1]);
        w.patch_u32(at(104), overlay_offsets[2]);
        w.patch_u32(at(108), channel_colors);
        w.patch_f64(at(112), 0.0);
        w.patch_u32(at(124), scan_info);
        w.patch_u32(at(132), timestamps);
        w.patch_u32(at(136), events);
        w.patch_u32(at(140), overlay_offsets[3]);
        w.patch_u32(at(144), overlay_offsets[4]);
        for (i, offset) in overlay_offsets[5..].iter().enumerate() {
            w.patch_u32(at(184 + 4 * i as u32), *offset);
        }

        // IFD chain
        let mut images: Vec<(u32, bool)> = Vec::new();
        for (i, offset) in plane_offsets.iter().enumerate() {
            images.push((*offset, false));
            if let Some(thumb) = thumb_offsets.get(i) {
                images.push((*thumb, true));
            }
        }

        let mut previous_next: Option<u32> = None;
        for (i, (offset, thumbnail)) in images.iter().enumerate() {
            w.align();
            let ifd = w.pos();
            match previous_next {
                Some(at) => w.patch_u32(at, ifd),
                None => w.patch_u32(4, ifd),
            }
            let entries = self.ifd_entries(*offset, *thumbnail, i == 0, info_offset, color_map_offset);
            w.u16(entries.len() as u16);
            for entry in &entries {
                write_entry(&mut w, entry);
            }
            previous_next = Some(w.pos());
            w.u32(0);
        }

        w.buf
    }

    fn ifd_entries(
        &self,
        offset: u32,
        thumbnail: bool,
        first: bool,
        info_offset: u32,
        color_map_offset: u32,
    ) -> Vec<Entry> {
        if thumbnail {
            return vec![
                Entry::long(254, 1),
                Entry::long(256, 2),
                Entry::long(257, 2),
                Entry::short(258, 8),
                Entry::short(259, 1),
                Entry::short(262, 1),
                Entry::long(273, offset),
                Entry::short(277, 1),
                Entry::long(278, 2),
                Entry::long(279, 4),
            ];
        }

        let photometric = if self.color_map {
            3
        } else if self.samples > 1 {
            2
        } else {
            1
        };
        let mut entries = vec![
            Entry::long(254, 0),
            Entry::long(256, self.width),
            Entry::long(257, self.height),
            Entry::short(258, self.bits),
            Entry::short(259, self.compression),
            Entry::short(262, photometric),
            Entry::long(273, offset),
            Entry::short(277, self.samples),
            Entry::long(278, self.height),
            Entry::long(279, self.plane_len() as u32),
            Entry::short(284, 1),
        ];
        if self.color_map {
            entries.push(Entry {
                tag: 320,
                field_type: 3,
                count: 3 * 256,
                value: color_map_offset,
            });
        }
        if first {
            entries.push(Entry {
                tag: 34412,
                field_type: 1,
                count: 224,
                value: info_offset,
            });
        }
        entries
    }
}

/// One IFD entry. SHORT values with a count of 1 are stored left-justified.
pub struct Entry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub value: u32,
}

impl Entry {
    pub fn short(tag: u16, value: u16) -> Self {
        Self {
            tag,
            field_type: 3,
            count: 1,
            value: value as u32,
        }
    }

    pub fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            field_type: 4,
            count: 1,
            value,
        }
    }
}

fn write_entry(w: &mut Writer, entry: &Entry) {
    w.u16(entry.tag);
    w.u16(entry.field_type);
    w.u32(entry.count);
    if entry.field_type == 3 && entry.count == 1 {
        w.u16(entry.value as u16);
        w.u16(0);
    } else {
        w.u32(entry.value);
    }
}

/// Deterministic content of stored plane `index`.
pub fn plane_pattern(index: usize, len: usize) -> Vec<u8> {
    (0..len).map(|i| (index * 37 + i) as u8).collect()
}

// =============================================================================
// Files and Projects
// =============================================================================

/// Write `data` to `dir/name` and return the full path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Table parser returning a fixed `Recordings` table, whatever the path.
pub struct RecordingsTable {
    pub sample_data: Vec<String>,
}

impl RecordingsTable {
    pub fn new(sample_data: &[&str]) -> Self {
        Self {
            sample_data: sample_data.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TableParser for RecordingsTable {
    fn parse(&self, _path: &Path) -> Result<Vec<Table>, LsmError> {
        let rows = self
            .sample_data
            .iter()
            .enumerate()
            .map(|(i, cell)| vec![format!("Recording {}", i + 1), cell.clone()])
            .collect();
        Ok(vec![Table::new(
            RECORDINGS_TABLE.to_string(),
            ["Name".to_string(), SAMPLE_DATA_COLUMN.to_string()],
            rows,
        )])
    }
}
