//! Basic serializer / deserializer.
//!
//! The FromBytes/ToBytes traits are defined here, together with the
//! stream traits they run on, and the FromBytes/ToBytes implementations
//! for the primitive big-endian integer types.
//!
use std::convert::TryInto;

use auto_impl::auto_impl;

use crate::error::Result;
use crate::types::FourCC;

/// Byte reader in a stream.
#[auto_impl(&mut)]
pub trait ReadBytes: BoxBytes {
    /// Read an exact number of bytes, return a reference to the buffer.
    fn read(&mut self, amount: u64) -> Result<&[u8]>;

    /// Read an exact number of bytes, but don't advance position.
    fn peek(&mut self, amount: u64) -> Result<&[u8]>;

    /// Skip some bytes in the input.
    fn skip(&mut self, amount: u64) -> Result<()>;

    /// How much data is left?
    fn left(&mut self) -> u64;
}

/// Byte writer in a stream.
#[auto_impl(&mut)]
pub trait WriteBytes: BoxBytes {
    /// Write an exact number of bytes.
    fn write(&mut self, data: &[u8]) -> Result<()>;
    /// Zero-fill some bytes in the output.
    fn skip(&mut self, amount: u64) -> Result<()>;
}

/// A bunch of optional methods for reading/writing boxes rather than
/// simple structs. All the methods have defaults.
#[auto_impl(&mut)]
pub trait BoxBytes {
    /// Get current position in the stream.
    fn pos(&mut self) -> u64 {
        unimplemented!()
    }
    /// Seek to a position in the stream.
    fn seek(&mut self, _pos: u64) -> Result<()> {
        unimplemented!()
    }
    /// Size of the whole stream.
    fn size(&self) -> u64 {
        unimplemented!()
    }
    /// Version of the enclosing full box.
    fn version(&self) -> u8 {
        0
    }
    /// Flags of the enclosing full box.
    fn flags(&self) -> u32 {
        0
    }
    /// FourCC of the enclosing box.
    fn fourcc(&self) -> FourCC {
        unimplemented!()
    }
}

impl<'a, B: ?Sized + ReadBytes + 'a> ReadBytes for Box<B> {
    fn read(&mut self, amount: u64) -> Result<&[u8]> {
        B::read(&mut *self, amount)
    }
    fn peek(&mut self, amount: u64) -> Result<&[u8]> {
        B::peek(&mut *self, amount)
    }
    fn skip(&mut self, amount: u64) -> Result<()> {
        B::skip(&mut *self, amount)
    }
    fn left(&mut self) -> u64 {
        B::left(&mut *self)
    }
}

impl<'a, B: ?Sized + WriteBytes + 'a> WriteBytes for Box<B> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        B::write(&mut *self, data)
    }
    fn skip(&mut self, amount: u64) -> Result<()> {
        B::skip(&mut *self, amount)
    }
}

impl<'a, B: ?Sized + BoxBytes + 'a> BoxBytes for Box<B> {
    fn pos(&mut self) -> u64 {
        B::pos(&mut *self)
    }
    fn seek(&mut self, pos: u64) -> Result<()> {
        B::seek(&mut *self, pos)
    }
    fn size(&self) -> u64 {
        B::size(&*self)
    }
    fn version(&self) -> u8 {
        B::version(&*self)
    }
    fn flags(&self) -> u32 {
        B::flags(&*self)
    }
    fn fourcc(&self) -> FourCC {
        B::fourcc(&*self)
    }
}

/// Trait to deserialize a type.
pub trait FromBytes {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self>
    where
        Self: Sized;
    fn min_size() -> usize;
}

/// Trait to serialize a type.
pub trait ToBytes {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()>;
}

// Convenience macro to implement FromBytes/ToBytes for integer types.
macro_rules! def_from_to_bytes {
    ($type:ident) => {
        impl FromBytes for $type {
            #[inline]
            fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
                let sz = std::mem::size_of::<$type>();
                let pos = stream.pos();
                let data = stream.read(sz as u64)?;
                let data = data
                    .try_into()
                    .map_err(|_| decerr!(Truncated, pos, "short {}", stringify!($type)))?;
                Ok($type::from_be_bytes(data))
            }
            #[inline]
            fn min_size() -> usize {
                std::mem::size_of::<$type>()
            }
        }
        impl ToBytes for $type {
            #[inline]
            fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
                stream.write(&self.to_be_bytes()[..])
            }
        }
    };
}

def_from_to_bytes!(u8);
def_from_to_bytes!(i16);
def_from_to_bytes!(u16);
def_from_to_bytes!(i32);
def_from_to_bytes!(u32);
def_from_to_bytes!(i64);
def_from_to_bytes!(u64);

// Unit is the "no count on the wire" marker of the Array type.
impl FromBytes for () {
    fn from_bytes<R: ReadBytes>(_stream: &mut R) -> Result<Self> {
        Ok(())
    }
    fn min_size() -> usize {
        0
    }
}

impl ToBytes for () {
    fn to_bytes<W: WriteBytes>(&self, _stream: &mut W) -> Result<()> {
        Ok(())
    }
}

/// Per-container cap, so a malicious size field can't make us loop forever.
pub(crate) const MAX_BOXES_PER_CONTAINER: usize = 1024;

/// Generic implementation for Vec<T>.
///
/// Elements are read until the enclosing reader runs out of data.
impl<T> FromBytes for Vec<T>
where
    T: FromBytes,
{
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let mut v = Vec::new();
        let min_size = T::min_size() as u64;
        while stream.left() >= min_size && stream.left() > 0 {
            if v.len() >= MAX_BOXES_PER_CONTAINER {
                return Err(decerr!(
                    Malformed,
                    stream.pos(),
                    "more than {} entries in one container",
                    MAX_BOXES_PER_CONTAINER
                ));
            }
            v.push(T::from_bytes(stream)?);
        }
        Ok(v)
    }
    fn min_size() -> usize {
        0
    }
}

/// Generic implementation for Vec<T>.
impl<T> ToBytes for Vec<T>
where
    T: ToBytes,
{
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        for elem in self {
            elem.to_bytes(stream)?;
        }
        Ok(())
    }
}
