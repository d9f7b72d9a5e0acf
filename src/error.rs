use thiserror::Error;

/// I/O errors that can occur when reading from a backing file
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error reported by the operating system
    #[error("I/O error: {0}")]
    Os(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            IoError::NotFound(err.to_string())
        } else {
            IoError::Os(err.to_string())
        }
    }
}

/// Errors that can occur when parsing the TIFF envelope of a file
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42, got {0}")]
    InvalidVersion(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors produced while decoding LSM datasets
#[derive(Debug, Clone, Error)]
pub enum LsmError {
    /// I/O error while reading a backing file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Error in the TIFF envelope
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// Series resolution produced no image files
    #[error("No LSM files were found for {0}")]
    NoFilesFound(String),

    /// The vendor header is shorter than its fixed layout
    #[error("Malformed LSM header: need at least {required} bytes, got {actual}")]
    MalformedHeader { required: usize, actual: usize },

    /// A tag/length/value walk ran past the end of its buffer
    #[error("Truncated {context} at offset {offset}")]
    TruncatedRecord { offset: u64, context: &'static str },

    /// Circumcenter reconstruction divided by zero (collinear points)
    #[error("Degenerate geometry in overlay shape {shape}")]
    GeometryDegenerate { shape: usize },

    /// Scan-information entry code outside the known record set
    #[error("Unrecognized scan information entry 0x{0:08X}")]
    UnrecognizedScanEntry(u32),

    /// The envelope holds no full-resolution plane
    #[error("No full-resolution planes in {0}")]
    NoPlanes(String),

    /// Project table parsing failed
    #[error("Project table error: {0}")]
    Table(String),

    /// Series index is out of range
    #[error("Series {series} out of range (dataset has {count} series)")]
    SeriesOutOfRange { series: usize, count: usize },

    /// Plane index is out of range
    #[error("Plane {plane} out of range (series has {count} planes)")]
    PlaneOutOfRange { plane: usize, count: usize },

    /// Requested region exceeds the plane
    #[error("Region {w}x{h} at ({x}, {y}) exceeds plane size {width}x{height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },

    /// Requested region needs more bytes than the file holds
    #[error("Region {w}x{h} needs {needed} bytes but the file holds {available}")]
    PlaneTooLarge {
        w: u32,
        h: u32,
        needed: u64,
        available: u64,
    },

    /// Pixel data uses a compression scheme this reader does not decode
    #[error("Unsupported compression: {0} (only uncompressed planes are supported)")]
    UnsupportedCompression(String),

    /// No dataset is open
    #[error("No dataset is open")]
    NotOpen,
}
