//! The `Unknown` sentinel.
//!
//! Responses keep a stable shape regardless of how much of the journal has
//! been seen: a field whose true value is unavailable is reported as the
//! literal string `"Unknown"` instead of being omitted.

use serde::{Serialize, Serializer};

/// Placeholder emitted for any field whose value is unavailable.
pub const UNKNOWN_VALUE: &str = "Unknown";

/// A value that may not be known yet.
///
/// Serializes as the inner value when known and as [`UNKNOWN_VALUE`]
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Known<T> {
    /// The value was present in the source record.
    Value(T),
    /// The value could not be determined.
    Unknown,
}

impl<T> Known<T> {
    /// Returns `true` for the sentinel.
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Borrow the inner value, if known.
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unknown => None,
        }
    }
}

impl<T> Default for Known<T> {
    fn default() -> Self {
        Self::Unknown
    }
}

impl<T> From<Option<T>> for Known<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unknown, Self::Value)
    }
}

impl<T: Serialize> Serialize for Known<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unknown => serializer.serialize_str(UNKNOWN_VALUE),
        }
    }
}
