//! Endian-aware binary reader for zero-copy parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! binary data from a byte slice without copying. Shapefiles mix byte orders
//! inside a single file (big-endian headers, little-endian bodies), so the
//! reader carries a mutable [`Endian`] mode that every multi-byte read
//! consults.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// Byte order used for multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    #[default]
    Little,
}

/// Generates a fixed-width read method honouring the reader's endianness.
macro_rules! read_endian {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $size:expr) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes: [u8; $size] = self.read_array()?;
            Ok(match self.endian {
                Endian::Big => <$ty>::from_be_bytes(bytes),
                Endian::Little => <$ty>::from_le_bytes(bytes),
            })
        }
    };
}

/// A binary reader that provides zero-copy reading from a byte slice.
///
/// The reader maintains a position and an endianness mode. The mode can be
/// switched at any time with [`set_endian`](Self::set_endian); single-byte
/// reads ignore it.
///
/// # Example
///
/// ```
/// use shpkit_common::{BinaryReader, Endian};
///
/// let data = [0x00, 0x00, 0x27, 0x0A, 0xE8, 0x03, 0x00, 0x00];
/// let mut reader = BinaryReader::with_endian(&data, Endian::Big);
///
/// assert_eq!(reader.read_i32().unwrap(), 9994);
/// reader.set_endian(Endian::Little);
/// assert_eq!(reader.read_i32().unwrap(), 1000);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

impl<'a> BinaryReader<'a> {
    /// Create a new little-endian reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            endian: Endian::Little,
        }
    }

    /// Create a new reader with an explicit starting byte order.
    #[inline]
    pub const fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            position: 0,
            endian,
        }
    }

    /// Get the active byte order.
    #[inline]
    pub const fn endian(&self) -> Endian {
        self.endian
    }

    /// Switch the byte order used by subsequent multi-byte reads.
    #[inline]
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Skip `count` bytes, failing if the stream is shorter.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.position += count;
        Ok(())
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    #[inline]
    fn ensure(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(Error::Truncated {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Fill `buffer` completely from the stream.
    #[inline]
    pub fn read_fully(&mut self, buffer: &mut [u8]) -> Result<()> {
        let bytes = self.read_bytes(buffer.len())?;
        buffer.copy_from_slice(bytes);
        Ok(())
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.read_fully(&mut out)?;
        Ok(out)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    read_endian!(
        /// Read a u16 in the active byte order.
        read_u16, u16, 2
    );
    read_endian!(
        /// Read an i16 in the active byte order.
        read_i16, i16, 2
    );
    read_endian!(
        /// Read a u32 in the active byte order.
        read_u32, u32, 4
    );
    read_endian!(
        /// Read an i32 in the active byte order.
        read_i32, i32, 4
    );
    read_endian!(
        /// Read a u64 in the active byte order.
        read_u64, u64, 8
    );
    read_endian!(
        /// Read an i64 in the active byte order.
        read_i64, i64, 8
    );
    read_endian!(
        /// Read an IEEE-754 double in the active byte order.
        read_f64, f64, 8
    );

    /// Read `count` doubles in the active byte order.
    ///
    /// The length is checked up front so a corrupt count cannot trigger a
    /// huge allocation.
    pub fn read_f64_vec(&mut self, count: usize) -> Result<Vec<f64>> {
        self.ensure(count.saturating_mul(8))?;
        (0..count).map(|_| self.read_f64()).collect()
    }

    /// Read a fixed-size buffer, returning the bytes before the first NUL.
    pub fn read_bytes_in_buffer(&mut self, buffer_size: usize) -> Result<&'a [u8]> {
        let bytes = self.read_bytes(buffer_size)?;
        let end = memchr::memchr(0, bytes).unwrap_or(buffer_size);
        Ok(&bytes[..end])
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate. Byte
    /// order is defined by the struct's field types, not by the reader.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::Truncated {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read an i32 and fail unless it equals `expected`.
    pub fn expect_i32(&mut self, expected: i32) -> Result<()> {
        let actual = self.read_i32()?;
        if actual != expected {
            return Err(Error::ExpectedValue {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}
