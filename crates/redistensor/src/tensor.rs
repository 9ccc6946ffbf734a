//! Tensor values and typed element access

use bytes::Bytes;
use num_complex::{Complex32, Complex64};

use crate::codec::{Dtype, encode_shape};
use crate::error::{TensorError, TensorResult};

/// Rust element types that map onto a stored dtype
///
/// Elements are encoded in native byte order, matching the raw buffer dump
/// of the `_tensor` record.
pub trait Element: Copy + Send + Sync + 'static {
    /// Dtype this element is stored as
    const DTYPE: Dtype;

    /// Append the native-endian encoding of `self`
    fn write_ne(self, out: &mut Vec<u8>);

    /// Decode one element; `bytes` has exactly `DTYPE.element_size()` bytes
    fn read_ne(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: Dtype = Dtype::$dtype;

                fn write_ne(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_ne_bytes());
                }

                fn read_ne(bytes: &[u8]) -> Self {
                    let mut arr = [0u8; std::mem::size_of::<$ty>()];
                    arr.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(arr)
                }
            }
        )*
    };
}

impl_element! {
    f32 => Float32,
    f64 => Float64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
}

impl Element for bool {
    const DTYPE: Dtype = Dtype::Bool;

    fn write_ne(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_ne(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl Element for Complex32 {
    const DTYPE: Dtype = Dtype::Complex64;

    fn write_ne(self, out: &mut Vec<u8>) {
        self.re.write_ne(out);
        self.im.write_ne(out);
    }

    fn read_ne(bytes: &[u8]) -> Self {
        let (re, im) = bytes.split_at(4);
        Complex32::new(f32::read_ne(re), f32::read_ne(im))
    }
}

impl Element for Complex64 {
    const DTYPE: Dtype = Dtype::Complex128;

    fn write_ne(self, out: &mut Vec<u8>) {
        self.re.write_ne(out);
        self.im.write_ne(out);
    }

    fn read_ne(bytes: &[u8]) -> Self {
        let (re, im) = bytes.split_at(8);
        Complex64::new(f64::read_ne(re), f64::read_ne(im))
    }
}

/// Tensor: a dtype, a shape and a flat native-endian element buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor {
    dtype: Dtype,
    shape: Vec<usize>,
    data: Bytes,
}

impl Tensor {
    /// Build a tensor without checking that the buffer matches the shape
    ///
    /// Backends store such a tensor as-is; the disagreement surfaces as a
    /// read error on a later `get`.
    pub fn from_raw(dtype: Dtype, shape: impl Into<Vec<usize>>, data: impl Into<Bytes>) -> Self {
        Self {
            dtype,
            shape: shape.into(),
            data: data.into(),
        }
    }

    /// View a flat buffer as `dtype` with `shape`, checking the byte length
    pub fn reshape(dtype: Dtype, shape: impl Into<Vec<usize>>, data: impl Into<Bytes>) -> TensorResult<Self> {
        let tensor = Self::from_raw(dtype, shape, data);
        tensor.validate()?;
        Ok(tensor)
    }

    /// Build a tensor from typed elements
    pub fn from_slice<T: Element>(shape: impl Into<Vec<usize>>, values: &[T]) -> TensorResult<Self> {
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.element_size());
        for value in values {
            value.write_ne(&mut data);
        }
        Self::reshape(T::DTYPE, shape, data)
    }

    /// Zero-dimensional tensor holding one element
    pub fn scalar<T: Element>(value: T) -> Self {
        let mut data = Vec::with_capacity(T::DTYPE.element_size());
        value.write_ne(&mut data);
        Self::from_raw(T::DTYPE, Vec::new(), data)
    }

    /// Check that the buffer length equals `numel * element_size`
    pub fn validate(&self) -> TensorResult<()> {
        let expected = self
            .shape
            .iter()
            .try_fold(self.dtype.element_size(), |acc, &dim| acc.checked_mul(dim));
        match expected {
            Some(expected) if expected == self.data.len() => Ok(()),
            expected => Err(TensorError::ShapeMismatch {
                shape: self.shape.clone(),
                dtype: self.dtype.name(),
                expected: expected.unwrap_or(usize::MAX),
                actual: self.data.len(),
            }),
        }
    }

    /// Decode the buffer into typed elements
    pub fn to_vec<T: Element>(&self) -> TensorResult<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(TensorError::DtypeMismatch {
                expected: T::DTYPE.name(),
                actual: self.dtype.name(),
            });
        }
        self.validate()?;
        Ok(self
            .data
            .chunks_exact(self.dtype.element_size())
            .map(T::read_ne)
            .collect())
    }

    /// Element kind
    #[must_use]
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Dimension sizes
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw element buffer
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Number of elements implied by the shape
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Buffer size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Number of dimensions
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Consume into `(dtype, shape, data)`
    #[must_use]
    pub fn into_parts(self) -> (Dtype, Vec<usize>, Bytes) {
        (self.dtype, self.shape, self.data)
    }
}

impl std::fmt::Display for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} ({} bytes)",
            self.dtype,
            encode_shape(&self.shape),
            self.data.len()
        )
    }
}
