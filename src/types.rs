//! Definitions of types used inside boxes.
//!
//! This module contains fundamental wire types (FourCC, fixed-point
//! floats, versioned integers, packed language codes, etc) and the
//! `SampleFlags` bit-field.
//!
use std::convert::TryInto;
use std::fmt::{Debug, Display};
use std::mem;

use chrono::offset::{TimeZone, Utc};

use crate::error::Result;
use crate::mp4box::FullBox;
use crate::serialize::{FromBytes, ReadBytes, ToBytes, WriteBytes};

// Convenience macro to implement FromBytes/ToBytes for newtypes.
macro_rules! def_from_to_bytes_newtype {
    ($newtype:ident, $type:ty) => {
        impl FromBytes for $newtype {
            fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
                let res = <$type>::from_bytes(stream)?;
                Ok($newtype(res))
            }
            fn min_size() -> usize {
                <$type>::min_size()
            }
        }
        impl ToBytes for $newtype {
            fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
                self.0.to_bytes(stream)
            }
        }
    };
}

// 32 bits on the wire in version 0 boxes, 64 bits in version 1.
macro_rules! def_from_to_bytes_versioned {
    ($newtype:ident) => {
        def_from_to_bytes_versioned!($newtype, 0xffffffff);
    };
    ($newtype:ident, $max:expr) => {
        impl FromBytes for $newtype {
            fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
                Ok(match stream.version() {
                    1 => $newtype(u64::from_bytes(stream)?),
                    _ => $newtype(u32::from_bytes(stream)? as u64),
                })
            }
            fn min_size() -> usize {
                u32::min_size()
            }
        }
        impl ToBytes for $newtype {
            fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
                match stream.version() {
                    1 => self.0.to_bytes(stream)?,
                    _ => (std::cmp::min(self.0, $max as u64) as u32).to_bytes(stream)?,
                }
                Ok(())
            }
        }
        impl FullBox for $newtype {
            fn version(&self) -> Option<u8> {
                if self.0 <= $max {
                    None
                } else {
                    Some(1)
                }
            }
        }
        impl From<$newtype> for u64 {
            fn from(t: $newtype) -> u64 {
                t.0
            }
        }
        impl From<u64> for $newtype {
            fn from(t: u64) -> $newtype {
                $newtype(t)
            }
        }
    };
}

/// The optional "usertype" of a box is a uuid.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Uuid(pub [u8; 16]);

impl FromBytes for Uuid {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let data = stream.read(16)?;
        let mut u = [0u8; 16];
        u.copy_from_slice(data);
        Ok(Uuid(u))
    }

    fn min_size() -> usize {
        16
    }
}

impl ToBytes for Uuid {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        stream.write(&self.0[..])
    }
}

impl Display for Uuid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // 8-4-4-4-12
        let p1 = u32::from_be_bytes((self.0)[0..4].try_into().unwrap());
        let p2 = u16::from_be_bytes((self.0)[4..6].try_into().unwrap());
        let p3 = u16::from_be_bytes((self.0)[6..8].try_into().unwrap());
        let p4 = u16::from_be_bytes((self.0)[8..10].try_into().unwrap());
        let p5 = u16::from_be_bytes((self.0)[10..12].try_into().unwrap());
        let p6 = u32::from_be_bytes((self.0)[12..16].try_into().unwrap());
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:04x}{:08x}",
            p1, p2, p3, p4, p5, p6
        )
    }
}

impl Debug for Uuid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// Basically a blob of data.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Data(pub Vec<u8>);

impl Data {
    /// Read an exact number of bytes.
    pub fn read<R: ReadBytes>(stream: &mut R, count: usize) -> Result<Self> {
        let mut v = Vec::new();
        if count > 0 {
            let data = stream.read(count as u64)?;
            v.extend_from_slice(data);
        }
        Ok(Data(v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<Vec<u8>> for Data {
    fn from(v: Vec<u8>) -> Data {
        Data(v)
    }
}

impl From<&[u8]> for Data {
    fn from(v: &[u8]) -> Data {
        Data(v.to_vec())
    }
}

impl FromBytes for Data {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let left = stream.left();
        let data = stream.read(left)?;
        let mut v = Vec::new();
        v.extend_from_slice(data);
        Ok(Data(v))
    }

    fn min_size() -> usize {
        0
    }
}

impl ToBytes for Data {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        stream.write(&self.0[..])
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.0.len() <= 16 {
            let mut s = String::from("[");
            let mut first = true;
            for d in &self.0 {
                if !first {
                    s.push(' ');
                }
                first = false;
                s.push_str(&format!("{:02x}", d));
            }
            s.push(']');
            write!(f, "{}", s)
        } else {
            write!(f, "[u8; {}]", &self.0.len())
        }
    }
}

/// 32 bits in boxes with version 0, and 64 bits in boxes with version >= 1.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionSizedUint(pub u64);
def_from_to_bytes_versioned!(VersionSizedUint);

impl Debug for VersionSizedUint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

/// Duration_ is a 32/64 bit value where "all ones" means "unknown".
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Duration_(pub u64);
def_from_to_bytes_versioned!(Duration_, 0x7fffffff);

impl Debug for Duration_ {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

/// Time is a 32/64 bit value, measured in seconds since 01-01-1904 00:00:00.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Time(pub u64);
def_from_to_bytes_versioned!(Time);

// TZ=UTC date +%s -d "1904-01-01 00:00:00"
const OFFSET_TO_UNIX: u64 = 2082844800;

impl Time {
    fn to_unixtime(&self) -> i64 {
        (self.0 as i64) - (OFFSET_TO_UNIX as i64)
    }
}

impl Debug for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match Utc.timestamp_opt(self.to_unixtime(), 0).single() {
            Some(ts) => write!(f, "{:?}", ts.to_rfc3339()),
            None => write!(f, "Time({})", self.0),
        }
    }
}

/// FourCC is the 4-byte name of any box.
///
/// Usually this is four bytes of ASCII characters, but it could be anything.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FourCC(pub u32);
def_from_to_bytes_newtype!(FourCC, u32);

impl FourCC {
    pub fn new(s: &str) -> FourCC {
        s.as_bytes().into()
    }

    #[inline]
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    fn fmt_fourcc(&self, dbg: bool) -> String {
        let c = self.to_be_bytes();
        for i in 0..4 {
            if c[i] < 32 || c[i] > 126 {
                return format!("0x{:x}", self.0);
            }
        }
        let mut s = String::new();
        if dbg {
            s.push('"');
        }
        for i in 0..4 {
            s.push(c[i] as char);
        }
        if dbg {
            s.push('"');
        }
        s
    }
}

// Let if (fourcc == b"moov") .. work
impl std::cmp::PartialEq<&[u8; 4]> for FourCC {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.to_be_bytes() == *other
    }
}

impl Debug for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.fmt_fourcc(true))
    }
}

impl Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.fmt_fourcc(false))
    }
}

impl From<&[u8]> for FourCC {
    fn from(b: &[u8]) -> FourCC {
        FourCC(u32::from_be_bytes(b.try_into().unwrap()))
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(b: &[u8; 4]) -> FourCC {
        FourCC(u32::from_be_bytes(*b))
    }
}

/// Language code ('eng', 'dut', 'fra', etc).
///
/// A 16-bit value containing 3 5-bit values that are interpreted as
/// letters, so that we get a 3-character country code.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IsoLanguageCode(pub u16);
def_from_to_bytes_newtype!(IsoLanguageCode, u16);

impl Display for IsoLanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = String::new();
        s.push((((self.0 >> 10) & 0x1f) + 0x60) as u8 as char);
        s.push((((self.0 >> 5) & 0x1f) + 0x60) as u8 as char);
        s.push((((self.0 >> 0) & 0x1f) + 0x60) as u8 as char);
        write!(f, "{}", s)
    }
}

impl Debug for IsoLanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Default for IsoLanguageCode {
    fn default() -> IsoLanguageCode {
        // "und"
        IsoLanguageCode(0x55c4)
    }
}

/// Zero terminated ASCII string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ZString(pub String);

impl ZString {
    fn as_str(&self) -> &str {
        let len = if self.0.ends_with("\0") {
            self.0.len() - 1
        } else {
            self.0.len()
        };
        &(self.0)[..len]
    }
}

impl std::ops::Deref for ZString {
    type Target = str;
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl FromBytes for ZString {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let left = stream.left();
        let data = stream.read(left)?;
        let mut s = String::new();
        let mut idx = 0;
        let maxlen = data.len();
        while idx < maxlen {
            let b = data[idx];
            s.push(b as char);
            idx += 1;
            if b == 0 {
                break;
            }
        }
        Ok(ZString(s))
    }
    fn min_size() -> usize {
        0
    }
}

impl ToBytes for ZString {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut v = Vec::new();
        for c in self.0.chars() {
            if (c as u32) < 256 {
                v.push(c as u8);
            } else {
                v.push(0xff);
            }
        }
        stream.write(&v)
    }
}

impl Display for ZString {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Debug for ZString {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{}\"", self.as_str())
    }
}

/// Compressor name in a VisualSampleEntry.
///
/// A fixed-size 32 byte field: one length byte, up to 31 bytes of name,
/// zero padding.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CompressorName(pub String);

impl FromBytes for CompressorName {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let data = stream.read(32)?;
        let len = std::cmp::min(data[0] as usize, 31);
        let mut s = String::new();
        for b in &data[1..1 + len] {
            s.push(std::cmp::min(*b, 127) as char);
        }
        Ok(CompressorName(s))
    }
    fn min_size() -> usize {
        32
    }
}

impl ToBytes for CompressorName {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut buf = [0u8; 32];
        let len = std::cmp::min(self.0.len(), 31);
        buf[0] = len as u8;
        buf[1..1 + len].copy_from_slice(&self.0.as_bytes()[..len]);
        stream.write(&buf[..])
    }
}

impl Debug for CompressorName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Matrix: 3 rows of (16.16, 16.16, 2.30) fixed point values.
#[derive(Clone, PartialEq)]
pub struct Matrix([(FixedFloat16_16, FixedFloat16_16, FixedFloat2_30); 3]);

impl Matrix {
    /// The unity matrix.
    pub fn unity() -> Matrix {
        Matrix([
            (FixedFloat16_16(0x00010000), FixedFloat16_16(0), FixedFloat2_30(0)),
            (FixedFloat16_16(0), FixedFloat16_16(0x00010000), FixedFloat2_30(0)),
            (FixedFloat16_16(0), FixedFloat16_16(0), FixedFloat2_30(0x40000000)),
        ])
    }
}

impl Default for Matrix {
    fn default() -> Matrix {
        Matrix::unity()
    }
}

impl FromBytes for Matrix {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let mut m = [(FixedFloat16_16(0), FixedFloat16_16(0), FixedFloat2_30(0)); 3];
        for x in 0..3 {
            m[x] = (
                FixedFloat16_16::from_bytes(stream)?,
                FixedFloat16_16::from_bytes(stream)?,
                FixedFloat2_30::from_bytes(stream)?,
            );
        }
        Ok(Matrix(m))
    }
    fn min_size() -> usize {
        36
    }
}

impl ToBytes for Matrix {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        for x in 0..3 {
            (self.0)[x].0.to_bytes(stream)?;
            (self.0)[x].1.to_bytes(stream)?;
            (self.0)[x].2.to_bytes(stream)?;
        }
        Ok(())
    }
}

impl Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Matrix([{}][{}][{}] [{}][{}][{}] [{}][{}][{}])",
            (self.0)[0].0,
            (self.0)[0].1,
            (self.0)[0].2,
            (self.0)[1].0,
            (self.0)[1].1,
            (self.0)[1].2,
            (self.0)[2].0,
            (self.0)[2].1,
            (self.0)[2].2,
        )
    }
}

macro_rules! impl_flags {
    ($(#[$outer:meta])* $type:ident $(,$debug:ident)?) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq)]
        pub struct $type(pub u32);

        impl FromBytes for $type {
            fn from_bytes<R: ReadBytes>(stream: &mut R) -> crate::error::Result<Self> {
                Ok($type(stream.flags()))
            }
            fn min_size() -> usize {
                0
            }
        }

        impl ToBytes for $type {
            fn to_bytes<W: WriteBytes>(&self, _stream: &mut W) -> crate::error::Result<()> {
                Ok(())
            }
        }

        impl $crate::mp4box::FullBox for $type {
            fn flags(&self) -> u32 {
                self.0
            }
        }

        impl_flags_debug!($type, $($debug)?);

        impl $type {
            pub fn get(&self, bit: u32) -> bool {
                let mask = 1 << bit;
                self.0 & mask > 0
            }
            pub fn set(&mut self, bit: u32, on: bool) {
                if on {
                    self.0 |= 1u32 << bit;
                } else {
                    self.0 &= !(1u32 << bit)
                }
            }
        }
    };
}

macro_rules! impl_flags_debug {
    ($type:ty, debug) => {
        impl std::fmt::Debug for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "Flags({:#x})", self.0)
            }
        }
    };
    ($type:ty,) => {};
}

impl_flags!(
    /// Generic 24 bits flags.
    #[derive(Default)]
    Flags,
    debug
);

/// 8.8.3.1 Sample Flags (ISO/IEC 14496-12:2015(E))
///
/// The sample_is_non_sync_sample field provides the same information
/// as the sync sample table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleFlags {
    pub is_leading:                  u8,
    pub sample_depends_on:           u8,
    pub sample_is_depended_on:       u8,
    pub sample_has_redundancy:       u8,
    pub sample_padding_value:        u8,
    pub sample_is_non_sync_sample:   bool,
    pub sample_degradation_priority: u16,
}

impl SampleFlags {
    /// Build from the raw 32 bit word.
    pub fn from_bits(bits: u32) -> SampleFlags {
        let flags = (bits >> 16) as u16;
        SampleFlags {
            is_leading:                  ((flags & 0b0000110000000000) >> 10) as u8,
            sample_depends_on:           ((flags & 0b0000001100000000) >> 8) as u8,
            sample_is_depended_on:       ((flags & 0b0000000011000000) >> 6) as u8,
            sample_has_redundancy:       ((flags & 0b0000000000110000) >> 4) as u8,
            sample_padding_value:        ((flags & 0b0000000000001110) >> 1) as u8,
            sample_is_non_sync_sample:   (flags & 0b0000000000000001) > 0,
            sample_degradation_priority: (bits & 0xffff) as u16,
        }
    }

    /// The raw 32 bit word.
    pub fn bits(&self) -> u32 {
        let flags = (((self.is_leading & 0b11) as u16) << 10)
            | (((self.sample_depends_on & 0b11) as u16) << 8)
            | (((self.sample_is_depended_on & 0b11) as u16) << 6)
            | (((self.sample_has_redundancy & 0b11) as u16) << 4)
            | (((self.sample_padding_value & 0b111) as u16) << 1)
            | self.sample_is_non_sync_sample as u16;
        ((flags as u32) << 16) | (self.sample_degradation_priority as u32)
    }

    /// A sync sample can be decoded without referencing other samples.
    pub fn is_sync(&self) -> bool {
        !self.sample_is_non_sync_sample
    }

    /// Does this sample depend on no other samples (I-frame).
    pub fn is_independent(&self) -> bool {
        self.sample_depends_on == 2
    }

    /// Do other samples depend on this one.
    pub fn is_depended_upon(&self) -> bool {
        self.sample_is_depended_on == 1
    }
}

impl FromBytes for SampleFlags {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let bits = u32::from_bytes(stream)?;
        Ok(SampleFlags::from_bits(bits))
    }

    fn min_size() -> usize {
        4
    }
}

impl ToBytes for SampleFlags {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        self.bits().to_bytes(stream)
    }
}

mod doc_hidden {
    pub trait FromPrimitive: Sized {
        fn from_usize(n: usize) -> Self;
    }
    impl FromPrimitive for () {
        fn from_usize(_n: usize) -> () {
            ()
        }
    }
    impl FromPrimitive for u16 {
        fn from_usize(n: usize) -> u16 {
            n as u16
        }
    }
    impl FromPrimitive for u32 {
        fn from_usize(n: usize) -> u32 {
            n as u32
        }
    }

    pub trait ToPrimitive {
        fn to_usize(self) -> usize;
    }
    impl ToPrimitive for () {
        fn to_usize(self) -> usize {
            unimplemented!()
        }
    }
    impl ToPrimitive for u16 {
        fn to_usize(self) -> usize {
            self as usize
        }
    }
    impl ToPrimitive for u32 {
        fn to_usize(self) -> usize {
            self as usize
        }
    }
}

#[doc(hidden)]
pub use doc_hidden::*;

/// A list of items.
///
/// When reading or writing, the `N` type indicates whether there is an
/// integer in front of the array's elements stating its size:
///
/// - `()`: no size, elements go on to the end of the box
/// - `u16`: 2 bytes size
/// - `u32`: 4 bytes size.
///
pub struct Array<N, T> {
    vec:              Vec<T>,
    num_entries_type: std::marker::PhantomData<N>,
}

pub type ArraySized16<T> = Array<u16, T>;
pub type ArraySized32<T> = Array<u32, T>;
pub type ArrayUnsized<T> = Array<(), T>;

impl<N, T> Array<N, T> {
    /// Constructs a new, empty `Array`.
    pub fn new() -> Self {
        Self {
            vec:              Vec::<T>::new(),
            num_entries_type: std::marker::PhantomData,
        }
    }

    /// Appends an element to the back.
    pub fn push(&mut self, value: T) {
        self.vec.push(value)
    }

    /// Returns the number of elements in the array.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// Returns an iterator over the elements in this array.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.vec.iter()
    }
}

impl<N, T> Default for Array<N, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, T> FromBytes for Array<N, T>
where
    N: FromBytes + ToPrimitive,
    T: FromBytes,
{
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<Self> {
        let (mut v, count) = if mem::size_of::<N>() == 0 {
            (Vec::new(), std::u32::MAX as usize)
        } else {
            let sz = N::from_bytes(stream)?.to_usize();
            (Vec::with_capacity(std::cmp::min(sz, 1024)), sz)
        };
        let min_size = T::min_size() as u64;
        while v.len() < count && stream.left() >= min_size && stream.left() > 0 {
            v.push(T::from_bytes(stream)?);
        }
        Ok(Self {
            vec:              v,
            num_entries_type: std::marker::PhantomData,
        })
    }

    fn min_size() -> usize {
        if mem::size_of::<N>() > 0 {
            N::min_size()
        } else {
            0
        }
    }
}

impl<N, T> ToBytes for Array<N, T>
where
    N: ToBytes + FromPrimitive,
    T: ToBytes,
{
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        if mem::size_of::<N>() > 0 {
            N::from_usize(self.vec.len()).to_bytes(stream)?;
        }
        for elem in &self.vec {
            elem.to_bytes(stream)?;
        }
        Ok(())
    }
}

impl<N, T> FullBox for Array<N, T>
where
    T: FullBox,
{
    fn version(&self) -> Option<u8> {
        // Find the highest version of any entry.
        let mut r = None;
        for e in &self.vec {
            if let Some(ver) = e.version() {
                if let Some(r_ver) = r {
                    if ver > r_ver {
                        r = Some(ver);
                    }
                } else {
                    r = Some(ver);
                }
            }
        }
        r
    }
}

impl<N, T> Clone for Array<N, T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            vec:              self.vec.clone(),
            num_entries_type: std::marker::PhantomData,
        }
    }
}

// Debug implementation that delegates to the inner Vec.
impl<N, T> Debug for Array<N, T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        Debug::fmt(&self.vec, f)
    }
}

impl<N, T> std::ops::Deref for Array<N, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        std::ops::Deref::deref(&self.vec)
    }
}

impl<N, T> std::ops::DerefMut for Array<N, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        std::ops::DerefMut::deref_mut(&mut self.vec)
    }
}

impl<'a, N, T> IntoIterator for &'a Array<N, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<N, T> std::iter::FromIterator<T> for Array<N, T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            vec:              iter.into_iter().collect(),
            num_entries_type: std::marker::PhantomData,
        }
    }
}

macro_rules! fixed_float {
    ($(#[$outer:meta])* $name:ident, $type:tt, $frac_bits:expr) => {
        #[derive(Clone, Copy, Default, PartialEq, Eq)]
        $(#[$outer])*
        pub struct $name(pub $type);
        def_from_to_bytes_newtype!($name, $type);

        impl $name {
            fn get(&self) -> f64 {
                (self.0 as f64) / ((1 << $frac_bits) as f64)
            }

            #[allow(dead_code)]
            pub fn set(&mut self, value: f64) {
                let v = (value * ((1 << $frac_bits) as f64)).round();
                self.0 = if v > (std::$type::MAX as f64) {
                    std::$type::MAX
                } else if v < (std::$type::MIN as f64) {
                    std::$type::MIN
                } else {
                    v as $type
                };
            }

            /// The integer part. Logical shift, so large values survive.
            pub fn integer(&self) -> $type {
                self.0 >> $frac_bits
            }

            /// Build from an integer value.
            pub fn from_integer(value: $type) -> $name {
                $name(value << $frac_bits)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.get())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.get())
            }
        }

        impl From<f64> for $name {
            fn from(t: f64) -> $name {
                let mut x = $name(0);
                x.set(t);
                x
            }
        }

        impl From<$name> for f64 {
            fn from(t: $name) -> f64 {
                t.get()
            }
        }
    };
}

// Some fixed float types.
fixed_float!(
    /// 32 bits 2.30 fixed float
    FixedFloat2_30,
    u32,
    30
);
fixed_float!(
    /// 32 bits 16.16 fixed float.
    FixedFloat16_16,
    u32,
    16
);

fixed_float!(
    /// 16 bits 8.8 fixed float.
    FixedFloat8_8,
    u16,
    8
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_flags_bits_roundtrip() {
        let f = SampleFlags {
            is_leading:                  1,
            sample_depends_on:           2,
            sample_is_depended_on:       1,
            sample_has_redundancy:       0,
            sample_padding_value:        3,
            sample_is_non_sync_sample:   true,
            sample_degradation_priority: 0x1234,
        };
        assert_eq!(SampleFlags::from_bits(f.bits()).bits(), f.bits());
        assert_eq!(SampleFlags::from_bits(f.bits()), f);
    }

    #[test]
    fn sample_flags_key_frame() {
        let f = SampleFlags {
            sample_depends_on: 2,
            sample_is_non_sync_sample: false,
            ..SampleFlags::default()
        };
        assert_eq!(f.bits(), 0x02000000);
        assert!(f.is_sync());
        assert!(f.is_independent());
        assert!(!f.is_depended_upon());
    }

    #[test]
    fn fixed_float_integer_part() {
        let rate = FixedFloat16_16::from_integer(48000);
        assert_eq!(rate.0, 48000 << 16);
        assert_eq!(rate.integer(), 48000);
        // Large rates must use a logical shift.
        let rate = FixedFloat16_16::from_integer(44100);
        assert_eq!(rate.integer(), 44100);
        let vol = FixedFloat8_8::from_integer(1);
        assert_eq!(vol.0, 0x100);
    }

    #[test]
    fn language_code() {
        assert_eq!(format!("{}", IsoLanguageCode::default()), "und");
        // 'e' = 5, 'n' = 14, 'g' = 7.
        let eng = IsoLanguageCode((5 << 10) | (14 << 5) | 7);
        assert_eq!(format!("{}", eng), "eng");
    }
}
