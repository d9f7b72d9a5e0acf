//! The top-level LSM dataset reader.
//!
//! [`LsmReader`] resolves the path it is given into one image file per
//! series, then decodes every series in index order:
//!
//! ```text
//! envelope ─► normalize ─► header ─► reconcile ─► channel names / timestamps / events
//!                                                  ─► scan information ─► split planes
//!                                                  ─► overlays ─► plane timing
//! ```
//!
//! All metadata lands in the reader's [`MetadataStore`]. The only state
//! shared between series is the timestamp sequence and the count of planes
//! in earlier series.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{LsmError, TiffError};
use crate::format::lsm::{
    map_records, normalize_planes, publish_records, read_channel_names, read_events,
    read_overlay_list, read_scan_records, read_timestamps, validate_adjacency, DimensionOrder,
    Dimensions, LsmEvent, MetadataHeader, OverlayShape, PixelType, PlaneTiming, ScanRecord,
    LSM_INFO_TAG,
};
use crate::format::lsm::overlay::publish_shapes;
use crate::format::tiff::{Envelope, ImageFileDecoder, PlaneDescriptor, TiffDecoder};
use crate::io::RangeReader;
use crate::metadata::{MetaTarget, MetaValue, MetadataSink, MetadataStore};

use super::pixels::{read_samples, Region};
use super::resolver::{resolve, Resolution, ResolveOptions, TableParser};
use super::source::SeriesSource;

// =============================================================================
// SeriesInfo
// =============================================================================

/// Everything decoded for one series.
#[derive(Debug, Clone)]
pub struct SeriesInfo {
    /// Image file backing the series
    pub path: PathBuf,

    /// Final logical extents and layout flags
    pub dimensions: Dimensions,

    /// Sample type of every plane
    pub pixel_type: PixelType,

    /// Byte order of the file and of the bytes returned for its planes
    pub little_endian: bool,

    /// Voxel size in micrometers (X, Y, Z)
    pub physical_size: [f64; 3],

    /// Full-resolution planes after normalization
    pub planes: Vec<PlaneDescriptor>,

    /// The decoded CZ_LSMINFO header
    pub header: MetadataHeader,

    /// Acquired scan-information records after validation
    pub records: Vec<ScanRecord>,

    /// Acquisition events
    pub events: Vec<LsmEvent>,

    /// Overlay shapes of all lists, in shape index order
    pub shapes: Vec<OverlayShape>,

    /// Elapsed and exposure time per plane, where timestamps exist
    pub plane_timings: Vec<PlaneTiming>,
}

impl SeriesInfo {
    /// Number of logical planes.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.dimensions.image_count
    }

    /// Serializable overview of the series.
    pub fn summary(&self) -> SeriesSummary<'_> {
        let d = &self.dimensions;
        SeriesSummary {
            path: &self.path,
            size_x: d.size_x,
            size_y: d.size_y,
            size_z: d.size_z,
            size_c: d.size_c,
            size_t: d.size_t,
            image_count: d.image_count,
            dimension_order: d.order,
            rgb: d.rgb,
            indexed: d.indexed,
            split_planes: d.split_planes,
            little_endian: self.little_endian,
            pixel_type: self.pixel_type,
            physical_size: self.physical_size,
            stored_planes: self.planes.len(),
            events: &self.events,
            shapes: &self.shapes,
            plane_timings: &self.plane_timings,
        }
    }
}

/// JSON-friendly view of a [`SeriesInfo`].
#[derive(Debug, Serialize)]
pub struct SeriesSummary<'a> {
    pub path: &'a Path,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
    pub image_count: usize,
    pub dimension_order: DimensionOrder,
    pub rgb: bool,
    pub indexed: bool,
    pub split_planes: bool,
    pub little_endian: bool,
    pub pixel_type: PixelType,
    pub physical_size: [f64; 3],
    pub stored_planes: usize,
    pub events: &'a [LsmEvent],
    pub shapes: &'a [OverlayShape],
    pub plane_timings: &'a [PlaneTiming],
}

/// Identity palette of an indexed series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTable {
    /// Three 256-entry ramps for 8-bit data
    Bits8([Vec<u8>; 3]),

    /// Three 65536-entry ramps for 16-bit data
    Bits16([Vec<u16>; 3]),
}

impl LookupTable {
    fn identity_u8() -> Self {
        let ramp: Vec<u8> = (0..=u8::MAX).collect();
        LookupTable::Bits8([ramp.clone(), ramp.clone(), ramp])
    }

    fn identity_u16() -> Self {
        let ramp: Vec<u16> = (0..=u16::MAX).collect();
        LookupTable::Bits16([ramp.clone(), ramp.clone(), ramp])
    }
}

// =============================================================================
// LsmReader
// =============================================================================

/// State of an open dataset.
struct OpenDataset<R> {
    resolution: Resolution,
    readers: Vec<R>,
    series: Vec<SeriesInfo>,
    timestamps: Vec<f64>,
}

/// Reader for Zeiss LSM datasets.
///
/// One reader handles one open dataset at a time; [`LsmReader::close`]
/// resets it.
pub struct LsmReader<S: SeriesSource> {
    source: S,
    decoder: Box<dyn ImageFileDecoder>,
    tables: Option<Box<dyn TableParser>>,
    options: ResolveOptions,
    metadata: MetadataStore,
    state: Option<OpenDataset<S::Reader>>,
}

impl<S: SeriesSource> LsmReader<S> {
    /// Create a reader over `source` using the classic TIFF decoder.
    pub fn new(source: S) -> Self {
        Self {
            source,
            decoder: Box::new(TiffDecoder),
            tables: None,
            options: ResolveOptions::default(),
            metadata: MetadataStore::new(),
            state: None,
        }
    }

    /// Use `decoder` for the TIFF envelope.
    pub fn with_decoder(mut self, decoder: Box<dyn ImageFileDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Use `parser` to read project databases.
    pub fn with_table_parser(mut self, parser: Box<dyn TableParser>) -> Self {
        self.tables = Some(parser);
        self
    }

    /// Set series resolution options.
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// The storage source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Open the dataset at `path`, replacing any open dataset.
    ///
    /// # Errors
    /// Resolution failures, envelope errors and malformed headers are
    /// fatal. Damage inside auxiliary structures, the scan-information
    /// tree or the overlay lists is logged and skipped.
    pub fn open(&mut self, path: &Path) -> Result<(), LsmError> {
        self.close();

        let resolution = resolve(
            &self.source,
            self.tables.as_deref(),
            path,
            self.options,
            &mut self.metadata,
        )?;

        let mut readers = Vec::with_capacity(resolution.files.len());
        let mut series = Vec::with_capacity(resolution.files.len());
        let mut timestamps = Vec::new();
        let mut plane_offset = 0;

        for (index, file) in resolution.files.iter().enumerate() {
            let reader = self.source.open(file)?;
            let info = decode_series(
                self.decoder.as_ref(),
                &reader,
                file,
                index,
                &mut timestamps,
                plane_offset,
                &mut self.metadata,
            )?;
            plane_offset += info.image_count();
            info!(
                series = index,
                path = %file.display(),
                planes = info.image_count(),
                order = %info.dimensions.order,
                "opened series"
            );
            readers.push(reader);
            series.push(info);
        }

        self.state = Some(OpenDataset {
            resolution,
            readers,
            series,
            timestamps,
        });
        Ok(())
    }

    /// Close the open dataset and clear all metadata.
    pub fn close(&mut self) {
        self.state = None;
        self.metadata.clear();
    }

    /// Whether a dataset is open.
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> Result<&OpenDataset<S::Reader>, LsmError> {
        self.state.as_ref().ok_or(LsmError::NotOpen)
    }

    /// Number of series in the open dataset.
    pub fn series_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.series.len())
    }

    /// Decoded information for `series`.
    pub fn series(&self, series: usize) -> Result<&SeriesInfo, LsmError> {
        let state = self.state()?;
        state.series.get(series).ok_or(LsmError::SeriesOutOfRange {
            series,
            count: state.series.len(),
        })
    }

    /// All decoded series.
    pub fn all_series(&self) -> &[SeriesInfo] {
        self.state
            .as_ref()
            .map(|s| s.series.as_slice())
            .unwrap_or_default()
    }

    /// Metadata published while opening.
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Timestamps of every series, in series order.
    pub fn timestamps(&self) -> &[f64] {
        self.state
            .as_ref()
            .map(|s| s.timestamps.as_slice())
            .unwrap_or_default()
    }

    /// How the opened path was resolved.
    pub fn resolution(&self) -> Result<&Resolution, LsmError> {
        Ok(&self.state()?.resolution)
    }

    /// Files backing the open dataset.
    ///
    /// With `no_pixels`, only non-image files are listed.
    pub fn used_files(&self, no_pixels: bool) -> Result<Vec<PathBuf>, LsmError> {
        Ok(self.state()?.resolution.used_files(no_pixels))
    }

    /// Identity palette of an indexed series.
    ///
    /// Returns `None` unless the series is indexed with 8- or 16-bit
    /// unsigned samples.
    pub fn lookup_table(&self, series: usize) -> Result<Option<LookupTable>, LsmError> {
        let info = self.series(series)?;
        if !info.dimensions.indexed {
            return Ok(None);
        }
        Ok(match info.pixel_type {
            PixelType::Uint8 => Some(LookupTable::identity_u8()),
            PixelType::Uint16 => Some(LookupTable::identity_u16()),
            _ => None,
        })
    }

    /// Raw bytes of logical plane `no` of `series`, cropped to the region
    /// at (`x`, `y`) of size `w` x `h`.
    ///
    /// Samples keep the file's byte order. Multi-sample planes are returned
    /// channel after channel; split series return the one channel the
    /// logical plane stands for.
    ///
    /// # Errors
    /// `SeriesOutOfRange`, `PlaneOutOfRange`, `RegionOutOfBounds`, `PlaneTooLarge`,
    /// `UnsupportedCompression`, or I/O errors.
    pub fn open_bytes(
        &self,
        series: usize,
        no: usize,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> Result<Vec<u8>, LsmError> {
        let state = self.state()?;
        let info = self.series(series)?;
        let count = info.image_count();
        if no >= count {
            return Err(LsmError::PlaneOutOfRange { plane: no, count });
        }

        let (stored, channel) = info.dimensions.raw_plane(no);
        let plane = info.planes.get(stored).ok_or(LsmError::PlaneOutOfRange {
            plane: stored,
            count: info.planes.len(),
        })?;
        let reader = &state.readers[series];

        let samples = read_samples(reader, plane, Region { x, y, w, h })?;
        debug!(series, plane = no, stored, ?channel, "read plane");

        match channel {
            Some(c) => samples
                .into_iter()
                .nth(c)
                .ok_or(LsmError::PlaneOutOfRange { plane: no, count }),
            None => Ok(samples.concat()),
        }
    }

    /// Raw bytes of a whole logical plane.
    pub fn open_plane(&self, series: usize, no: usize) -> Result<Vec<u8>, LsmError> {
        let info = self.series(series)?;
        let (w, h) = (info.dimensions.size_x, info.dimensions.size_y);
        self.open_bytes(series, no, 0, 0, w, h)
    }
}

// =============================================================================
// Series Decoding
// =============================================================================

/// Decode one series from its image file.
///
/// `timestamps` is the dataset-wide stamp sequence this series appends to;
/// `plane_offset` is the number of logical planes in earlier series.
pub fn decode_series<R: RangeReader>(
    decoder: &dyn ImageFileDecoder,
    reader: &R,
    path: &Path,
    series: usize,
    timestamps: &mut Vec<f64>,
    plane_offset: usize,
    sink: &mut dyn MetadataSink,
) -> Result<SeriesInfo, LsmError> {
    let prefix = format!("Series {} ", series);

    // Envelope
    let envelope = decode_envelope(decoder, reader)?;
    let order = envelope.byte_order;
    let total = envelope.planes.len();
    let envelope = Envelope {
        byte_order: order,
        planes: normalize_planes(envelope.planes),
    };
    debug!(
        series,
        ifds = total,
        planes = envelope.planes.len(),
        "normalized envelope"
    );
    let Some(first) = envelope.planes.first() else {
        return Err(LsmError::NoPlanes(path.display().to_string()));
    };

    // Header
    let payload = envelope
        .vendor_tag(reader, 0, LSM_INFO_TAG)?
        .ok_or(TiffError::MissingTag("CZ_LSMINFO"))?;
    let header = MetadataHeader::parse(&payload, order)?;
    header.publish(sink, &prefix);
    debug!(
        series,
        scan_type = header.scan_type,
        z = header.dimension_z,
        t = header.dimension_time,
        "decoded LSM header"
    );

    // Dimensions
    let mut dims = Dimensions::initial(
        first,
        header.dimension_z,
        header.dimension_time,
        DimensionOrder::from_scan_type(header.scan_type),
    );
    let pixel_type = PixelType::from_tiff(first.bits_per_sample, first.sample_format);
    if let Some(rule) = dims.reconcile(envelope.planes.len()) {
        debug!(
            series,
            ?rule,
            z = dims.size_z,
            t = dims.size_t,
            images = dims.image_count,
            "reconciled dimensions with plane count"
        );
    } else {
        dims.fill_zero_extents();
    }
    sink.put_global(&format!("{prefix}DimensionZ"), dims.size_z.into());
    sink.put_global(&format!("{prefix}DimensionChannels"), dims.size_c.into());

    // Auxiliary structures
    if header.channel_colors_offset != 0 {
        for (i, name) in read_channel_names(reader, order, header.channel_colors_offset, dims.size_c)
        {
            sink.put_global(&format!("{prefix}ChannelName{i}"), name.into());
        }
    }

    if header.timestamps_offset != 0 {
        let stamps = read_timestamps(reader, order, header.timestamps_offset, dims.size_t);
        for (i, stamp) in stamps.iter().enumerate() {
            sink.put_global(&format!("{prefix}TimeStamp{i}"), (*stamp).into());
        }
        timestamps.extend(stamps);
    }

    let events = if header.event_list_offset != 0 {
        read_events(reader, order, header.event_list_offset)
    } else {
        Vec::new()
    };
    for (i, event) in events.iter().enumerate() {
        sink.put_global(&format!("{prefix}Event{i} Time"), event.time.into());
        sink.put_global(&format!("{prefix}Event{i} Type"), event.event_type.into());
        sink.put_global(
            &format!("{prefix}Event{i} Description"),
            event.description.as_str().into(),
        );
    }

    // Scan information
    let records = if header.scan_info_offset != 0 {
        let records = read_scan_records(reader, order, header.scan_info_offset);
        publish_records(&records, &prefix, sink);
        validate_adjacency(records)
    } else {
        Vec::new()
    };
    let slots = map_records(&records, series, dims.size_c, sink);

    // Split planes
    if dims.apply_split(slots.logical_channels()) {
        debug!(series, channels = dims.size_c, "splitting composite planes");
    }

    // Overlays
    let mut shapes = Vec::new();
    for (list, offset) in header.overlay_offsets() {
        let decoded = read_overlay_list(reader, order, list, offset);
        if decoded.is_empty() {
            continue;
        }
        publish_shapes(&decoded, series, shapes.len(), sink);
        shapes.extend(decoded);
    }

    // Series-level attributes and plane timing
    let physical_size = [header.voxel_size_x, header.voxel_size_y, header.voxel_size_z];
    let little_endian = envelope.is_little_endian();
    publish_series(sink, series, &dims, pixel_type, physical_size, little_endian);

    let plane_timings = dims.plane_timings(timestamps, plane_offset);
    for timing in &plane_timings {
        let target = MetaTarget::Plane {
            series,
            plane: timing.plane,
        };
        sink.put(target, "DeltaT", timing.delta_t.into());
        sink.put(target, "ExposureTime", timing.exposure.into());
    }

    Ok(SeriesInfo {
        path: path.to_path_buf(),
        dimensions: dims,
        pixel_type,
        little_endian,
        physical_size,
        planes: envelope.planes,
        header,
        records,
        events,
        shapes,
        plane_timings,
    })
}

fn decode_envelope<R: RangeReader>(
    decoder: &dyn ImageFileDecoder,
    reader: &R,
) -> Result<Envelope, LsmError> {
    decoder.decode(reader).map_err(|e| {
        warn!(file = reader.identifier(), error = %e, "failed to decode TIFF envelope");
        e.into()
    })
}

fn publish_series(
    sink: &mut dyn MetadataSink,
    series: usize,
    dims: &Dimensions,
    pixel_type: PixelType,
    physical_size: [f64; 3],
    little_endian: bool,
) {
    let target = MetaTarget::Series(series);
    let mut put = |key: &str, value: MetaValue| sink.put(target, key, value);

    put("InstrumentID", format!("Instrument:{series}").into());
    put("SizeX", dims.size_x.into());
    put("SizeY", dims.size_y.into());
    put("SizeZ", dims.size_z.into());
    put("SizeC", dims.size_c.into());
    put("SizeT", dims.size_t.into());
    put("DimensionOrder", dims.order.to_string().into());
    put("PixelType", pixel_type.as_str().into());
    put("PhysicalSizeX", physical_size[0].into());
    put("PhysicalSizeY", physical_size[1].into());
    put("PhysicalSizeZ", physical_size[2].into());
    put("BigEndian", (!little_endian).into());
}
