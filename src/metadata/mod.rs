//! Metadata sink abstraction.
//!
//! Decoders never return metadata directly; they publish key/value pairs into
//! a [`MetadataSink`]. Every value is addressed by a [`MetaTarget`] (the whole
//! dataset, a series, or an indexed element inside a series) and a key.
//!
//! [`MetadataStore`] is the provided in-memory sink.

mod store;

use std::fmt;

use serde::Serialize;

pub use store::MetadataStore;

// =============================================================================
// MetaTarget
// =============================================================================

/// What a metadata value describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaTarget {
    /// Flat key/value metadata for the whole dataset
    Global,

    /// Image-level attributes of one series
    Series(usize),

    /// A logical channel of a series
    Channel { series: usize, channel: usize },

    /// A light source (laser) of a series' instrument
    LightSource { series: usize, index: usize },

    /// Timing of one plane
    Plane { series: usize, plane: usize },

    /// One overlay shape
    Shape { series: usize, shape: usize },
}

impl fmt::Display for MetaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaTarget::Global => write!(f, "global"),
            MetaTarget::Series(s) => write!(f, "series {}", s),
            MetaTarget::Channel { series, channel } => {
                write!(f, "series {} channel {}", series, channel)
            }
            MetaTarget::LightSource { series, index } => {
                write!(f, "series {} light source {}", series, index)
            }
            MetaTarget::Plane { series, plane } => write!(f, "series {} plane {}", series, plane),
            MetaTarget::Shape { series, shape } => write!(f, "series {} shape {}", series, shape),
        }
    }
}

// =============================================================================
// MetaValue
// =============================================================================

/// A published metadata value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl MetaValue {
    /// The value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a float; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Float(v) => Some(*v),
            MetaValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// The value as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Int(v) => write!(f, "{}", v),
            MetaValue::Float(v) => write!(f, "{}", v),
            MetaValue::Bool(v) => write!(f, "{}", v),
            MetaValue::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for MetaValue {
            fn from(v: $t) -> Self {
                MetaValue::Int(v as i64)
            }
        })*
    };
}

impl_from_int!(i16, i32, i64, u16, u32, usize);

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

// =============================================================================
// MetadataSink
// =============================================================================

/// Write-only receiver for decoded metadata.
pub trait MetadataSink {
    /// Record `value` under `key` for `target`, replacing any previous value.
    fn put(&mut self, target: MetaTarget, key: &str, value: MetaValue);

    /// Record a flat global key/value pair.
    fn put_global(&mut self, key: &str, value: MetaValue) {
        self.put(MetaTarget::Global, key, value);
    }
}

impl<S: MetadataSink + ?Sized> MetadataSink for &mut S {
    fn put(&mut self, target: MetaTarget, key: &str, value: MetaValue) {
        (**self).put(target, key, value)
    }
}
