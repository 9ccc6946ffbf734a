//! Shape and dtype text encodings, and record naming
//!
//! Everything here is pure: no I/O, no state beyond constant tables.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{TensorError, TensorResult};

/// Default pattern used to enumerate stored tensors
pub const DEFAULT_PATTERN: &str = "*_tensor";

/// Tensor element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// Boolean, one byte per element
    Bool,
    /// Complex number made of two 32-bit floats
    Complex64,
    /// Complex number made of two 64-bit floats
    Complex128,
}

impl Dtype {
    /// Every supported element kind
    pub const ALL: [Dtype; 13] = [
        Dtype::Float32,
        Dtype::Float64,
        Dtype::Int8,
        Dtype::Int16,
        Dtype::Int32,
        Dtype::Int64,
        Dtype::UInt8,
        Dtype::UInt16,
        Dtype::UInt32,
        Dtype::UInt64,
        Dtype::Bool,
        Dtype::Complex64,
        Dtype::Complex128,
    ];

    /// Size of one element in bytes
    #[must_use]
    pub const fn element_size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::Bool => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Float32 | Self::Int32 | Self::UInt32 => 4,
            Self::Float64 | Self::Int64 | Self::UInt64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
        }
    }

    /// Canonical lowercase name, as written to `_dtype` records
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
        }
    }

    /// Exact-match lookup over the canonical names
    pub fn from_name(name: &str) -> TensorResult<Self> {
        match name {
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "bool" => Ok(Self::Bool),
            "complex64" => Ok(Self::Complex64),
            "complex128" => Ok(Self::Complex128),
            _ => Err(TensorError::UnknownDtype(name.to_string())),
        }
    }

    /// Looser lookup accepting common aliases and NumPy type codes
    ///
    /// Case-insensitive; surrounding whitespace is ignored. Little-endian and
    /// native byte-order prefixes (`<`, `=`, `|`) are accepted, big-endian
    /// codes are not since buffers are stored in native order.
    pub fn parse_lenient(name: &str) -> TensorResult<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let code = lowered.trim_start_matches(['<', '=', '|']);
        let dtype = match code {
            "float32" | "f32" | "f4" | "single" => Self::Float32,
            "float64" | "f64" | "f8" | "double" | "float" => Self::Float64,
            "int8" | "i8" | "i1" | "byte" => Self::Int8,
            "int16" | "i16" | "i2" | "short" => Self::Int16,
            "int32" | "i32" | "i4" | "intc" => Self::Int32,
            "int64" | "i64" | "int" | "long" | "longlong" => Self::Int64,
            "uint8" | "u8" | "u1" | "ubyte" => Self::UInt8,
            "uint16" | "u16" | "u2" | "ushort" => Self::UInt16,
            "uint32" | "u32" | "u4" | "uintc" => Self::UInt32,
            "uint64" | "u64" | "ulonglong" => Self::UInt64,
            "bool" | "bool_" | "b1" | "?" => Self::Bool,
            "complex64" | "c8" | "csingle" => Self::Complex64,
            "complex128" | "c16" | "complex" | "cdouble" => Self::Complex128,
            _ => return Err(TensorError::UnknownDtype(name.to_string())),
        };
        Ok(dtype)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Dtype {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s)
    }
}

/// Encode a shape as tuple text without whitespace
///
/// `[]` becomes `()`, `[5]` becomes `(5,)` and `[2, 3]` becomes `(2,3)`.
#[must_use]
pub fn encode_shape(shape: &[usize]) -> String {
    let mut out = String::with_capacity(2 + shape.len() * 4);
    out.push('(');
    for (i, dim) in shape.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{dim}");
    }
    if shape.len() == 1 {
        out.push(',');
    }
    out.push(')');
    out
}

/// Decode tuple (or list) shape text
///
/// Empty tokens are discarded so the trailing comma of a 1-D shape is
/// harmless; each remaining token must be a non-negative integer.
pub fn decode_shape(text: &str) -> TensorResult<Vec<usize>> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix(['(', '['])
        .and_then(|rest| rest.strip_suffix([')', ']']))
        .ok_or_else(|| TensorError::Format(text.to_string()))?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| TensorError::Format(text.to_string()))
        })
        .collect()
}

/// The three physical records of a logical tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Raw element buffer
    Tensor,
    /// Shape text
    Shape,
    /// Dtype name
    Dtype,
}

impl RecordKind {
    /// Write order used by every backend
    pub const WRITE_ORDER: [RecordKind; 3] = [RecordKind::Tensor, RecordKind::Shape, RecordKind::Dtype];

    /// Name suffix appended to the logical key
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Tensor => "_tensor",
            Self::Shape => "_shape",
            Self::Dtype => "_dtype",
        }
    }

    /// Physical record name for `key`
    #[must_use]
    pub fn record_name(self, key: &str) -> String {
        format!("{key}{}", self.suffix())
    }
}

/// Logical key of a `_tensor` record name
#[must_use]
pub fn logical_key(record_name: &str) -> Option<&str> {
    record_name.strip_suffix(RecordKind::Tensor.suffix())
}

/// Logical keys for every `_tensor` record in `records`
pub fn logical_keys<I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    records
        .into_iter()
        .filter_map(|name| logical_key(&name).map(str::to_string))
        .collect()
}
