//! Precision-bounded storage for per-chromosome bin arrays.
//!
//! [`BinValues`] hides the 16-bit / 32-bit choice behind one `f64` view.
//! [`BinArray`] adds the compressed mode used for idle arrays: the values are
//! serialized little-endian and deflated with zlib, and decoded on demand.

use std::borrow::Cow;
use std::io::{Read, Write};
use std::slice;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use half::f16;
use thiserror::Error;

use bintrack_core::Precision;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to encode bin array: {0}")]
    Encode(#[source] std::io::Error),

    #[error("Failed to decode bin array: {0}")]
    Decode(#[source] std::io::Error),

    #[error("Compressed bin array holds more than the expected {expected} values")]
    TrailingData { expected: usize },
}

///
/// Bin values stored at a fixed precision.
///
#[derive(Debug, Clone, PartialEq)]
pub enum BinValues {
    Half(Vec<f16>),
    Single(Vec<f32>),
}

impl BinValues {
    pub fn zeros(precision: Precision, len: usize) -> Self {
        match precision {
            Precision::Half => BinValues::Half(vec![f16::ZERO; len]),
            Precision::Single => BinValues::Single(vec![0.0; len]),
        }
    }

    /// Narrow `values` to `precision`. Values outside the f16 range become infinite.
    pub fn from_f64(precision: Precision, values: &[f64]) -> Self {
        match precision {
            Precision::Half => BinValues::Half(values.iter().map(|v| f16::from_f64(*v)).collect()),
            Precision::Single => BinValues::Single(values.iter().map(|v| *v as f32).collect()),
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            BinValues::Half(_) => Precision::Half,
            BinValues::Single(_) => Precision::Single,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BinValues::Half(v) => v.len(),
            BinValues::Single(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            BinValues::Half(v) => v.get(index).map(|x| x.to_f64()),
            BinValues::Single(v) => v.get(index).map(|x| *x as f64),
        }
    }

    pub fn iter(&self) -> BinValuesIter<'_> {
        match self {
            BinValues::Half(v) => BinValuesIter::Half(v.iter()),
            BinValues::Single(v) => BinValuesIter::Single(v.iter()),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    fn encode(&self) -> Result<Vec<u8>, CompressionError> {
        let capacity = self.len() * self.precision().bytes_per_value() / 2;
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(capacity), Compression::fast());

        match self {
            BinValues::Half(values) => {
                for v in values {
                    encoder
                        .write_u16::<LittleEndian>(v.to_bits())
                        .map_err(CompressionError::Encode)?;
                }
            }
            BinValues::Single(values) => {
                for v in values {
                    encoder
                        .write_f32::<LittleEndian>(*v)
                        .map_err(CompressionError::Encode)?;
                }
            }
        }

        encoder.flush().map_err(CompressionError::Encode)?;
        encoder.finish().map_err(CompressionError::Encode)
    }

    fn decode(precision: Precision, len: usize, bytes: &[u8]) -> Result<Self, CompressionError> {
        let mut decoder = ZlibDecoder::new(bytes);

        let values = match precision {
            Precision::Half => {
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    let bits = decoder
                        .read_u16::<LittleEndian>()
                        .map_err(CompressionError::Decode)?;
                    values.push(f16::from_bits(bits));
                }
                BinValues::Half(values)
            }
            Precision::Single => {
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(
                        decoder
                            .read_f32::<LittleEndian>()
                            .map_err(CompressionError::Decode)?,
                    );
                }
                BinValues::Single(values)
            }
        };

        let mut probe = [0u8; 1];
        if decoder.read(&mut probe).map_err(CompressionError::Decode)? != 0 {
            return Err(CompressionError::TrailingData { expected: len });
        }

        Ok(values)
    }
}

/// Iterator over [`BinValues`] widened to `f64`.
pub enum BinValuesIter<'a> {
    Half(slice::Iter<'a, f16>),
    Single(slice::Iter<'a, f32>),
}

impl Iterator for BinValuesIter<'_> {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        match self {
            BinValuesIter::Half(it) => it.next().map(|v| v.to_f64()),
            BinValuesIter::Single(it) => it.next().map(|v| *v as f64),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            BinValuesIter::Half(it) => it.size_hint(),
            BinValuesIter::Single(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for BinValuesIter<'_> {}

/// An array that can be shrunk while idle and restored later.
///
/// Implementations leave the array untouched when a toggle fails.
pub trait Compressible {
    fn compress(&mut self) -> Result<(), CompressionError>;

    fn uncompress(&mut self) -> Result<(), CompressionError>;

    fn is_compressed(&self) -> bool;
}

#[derive(Debug, Clone)]
enum ArrayState {
    Plain(BinValues),
    Compressed(Vec<u8>),
}

///
/// One chromosome's bin array, plain or compressed.
///
#[derive(Debug, Clone)]
pub struct BinArray {
    precision: Precision,
    len: usize,
    state: ArrayState,
}

impl BinArray {
    pub fn new(values: BinValues) -> Self {
        BinArray {
            precision: values.precision(),
            len: values.len(),
            state: ArrayState::Plain(values),
        }
    }

    pub fn zeros(precision: Precision, len: usize) -> Self {
        BinArray::new(BinValues::zeros(precision, len))
    }

    pub fn from_f64(precision: Precision, values: &[f64]) -> Self {
        BinArray::new(BinValues::from_f64(precision, values))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    ///
    /// Borrow the values, decoding a temporary copy when the array is compressed.
    ///
    pub fn values(&self) -> Result<Cow<'_, BinValues>, CompressionError> {
        match &self.state {
            ArrayState::Plain(values) => Ok(Cow::Borrowed(values)),
            ArrayState::Compressed(bytes) => Ok(Cow::Owned(BinValues::decode(
                self.precision,
                self.len,
                bytes,
            )?)),
        }
    }

    pub fn get(&self, index: usize) -> Result<Option<f64>, CompressionError> {
        match &self.state {
            ArrayState::Plain(values) => Ok(values.get(index)),
            ArrayState::Compressed(_) if index >= self.len => Ok(None),
            ArrayState::Compressed(_) => Ok(self.values()?.get(index)),
        }
    }

    pub fn to_vec(&self) -> Result<Vec<f64>, CompressionError> {
        Ok(self.values()?.to_vec())
    }

    /// Bytes currently held by the array.
    pub fn stored_bytes(&self) -> usize {
        match &self.state {
            ArrayState::Plain(values) => values.len() * values.precision().bytes_per_value(),
            ArrayState::Compressed(bytes) => bytes.len(),
        }
    }

    /// A compressed copy of this array.
    pub fn compressed(&self) -> Result<BinArray, CompressionError> {
        match &self.state {
            ArrayState::Compressed(_) => Ok(self.clone()),
            ArrayState::Plain(values) => Ok(BinArray {
                precision: self.precision,
                len: self.len,
                state: ArrayState::Compressed(values.encode()?),
            }),
        }
    }

    /// An uncompressed copy of this array.
    pub fn uncompressed(&self) -> Result<BinArray, CompressionError> {
        match &self.state {
            ArrayState::Plain(_) => Ok(self.clone()),
            ArrayState::Compressed(bytes) => Ok(BinArray::new(BinValues::decode(
                self.precision,
                self.len,
                bytes,
            )?)),
        }
    }

    #[cfg(test)]
    pub(crate) fn corrupted(precision: Precision, len: usize) -> Self {
        BinArray {
            precision,
            len,
            state: ArrayState::Compressed(vec![0x78, 0x01, 0xde, 0xad]),
        }
    }
}

impl Compressible for BinArray {
    fn compress(&mut self) -> Result<(), CompressionError> {
        if let ArrayState::Plain(values) = &self.state {
            self.state = ArrayState::Compressed(values.encode()?);
        }
        Ok(())
    }

    fn uncompress(&mut self) -> Result<(), CompressionError> {
        if let ArrayState::Compressed(bytes) = &self.state {
            self.state = ArrayState::Plain(BinValues::decode(self.precision, self.len, bytes)?);
        }
        Ok(())
    }

    fn is_compressed(&self) -> bool {
        matches!(self.state, ArrayState::Compressed(_))
    }
}

impl PartialEq for BinArray {
    fn eq(&self, other: &Self) -> bool {
        if self.precision != other.precision || self.len != other.len {
            return false;
        }
        match (self.values(), other.values()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
