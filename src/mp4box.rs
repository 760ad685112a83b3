//! Box headers, and readers / writers for the box structure.
//!
//! Every ISO BMFF box starts with a 32 bit size and a FourCC. A size of
//! 1 means a 64 bit size follows, a size of 0 means "to the end of the
//! enclosing container". Type `uuid` means a 16 byte extended type
//! follows. Full boxes then carry a version byte and 24 bits of flags.
//!
use std::fmt::Debug;

use crate::boxes::MP4Box;
use crate::error::Result;
use crate::serialize::{BoxBytes, FromBytes, ReadBytes, ToBytes, WriteBytes, MAX_BOXES_PER_CONTAINER};
use crate::types::{FourCC, Uuid};

/// Gets implemented for every box.
pub trait BoxInfo {
    /// The "fourcc" name of this box.
    fn fourcc(&self) -> FourCC;
    /// Highest version of this box we support, `None` for base boxes.
    fn max_version() -> Option<u8>
    where
        Self: Sized,
    {
        None
    }
    /// The extended type, for `uuid` boxes.
    fn user_type(&self) -> Option<&Uuid> {
        None
    }
}

/// Version and flags of a full box, derived from its content.
pub trait FullBox {
    /// Version of the box on the wire. `None` for base boxes.
    fn version(&self) -> Option<u8> {
        None
    }
    /// Flags word of the box on the wire.
    fn flags(&self) -> u32 {
        0
    }
}

/// The header of any box.
#[derive(Clone, Debug)]
pub struct BoxHeader {
    pub fourcc:      FourCC,
    pub uuid:        Option<Uuid>,
    pub version:     Option<u8>,
    pub flags:       u32,
    pub max_version: Option<u8>,
    /// Body bytes that follow the parsed header fields.
    pub(crate) body_size: u64,
    /// Offset of the box in the stream.
    pub(crate) offset: u64,
}

impl BoxHeader {
    /// Read the header, including the version/flags word of known full boxes.
    pub fn read<R: ReadBytes>(stream: &mut R) -> Result<BoxHeader> {
        let offset = stream.pos();
        let size1 = u32::from_bytes(stream)?;
        let fourcc = FourCC::from_bytes(stream)?;
        let mut body_size = match size1 {
            0 => stream.left(),
            1 => {
                let size = u64::from_bytes(stream)?;
                if size < 16 {
                    return Err(decerr!(
                        Malformed,
                        offset,
                        "{} box: large size {} smaller than header",
                        fourcc,
                        size
                    ));
                }
                size - 16
            },
            sz if sz < 8 => {
                return Err(decerr!(
                    Malformed,
                    offset,
                    "{} box: size {} smaller than header",
                    fourcc,
                    sz
                ));
            },
            sz => sz as u64 - 8,
        };

        let mut uuid = None;
        if fourcc == b"uuid" {
            if body_size < 16 {
                return Err(decerr!(Malformed, offset, "uuid box too small for extended type"));
            }
            uuid = Some(Uuid::from_bytes(stream)?);
            body_size -= 16;
        }

        let max_version = MP4Box::max_version_from_fourcc(fourcc);
        let mut version = None;
        let mut flags = 0;
        if max_version.is_some() {
            if body_size < 4 {
                return Err(decerr!(
                    Malformed,
                    offset,
                    "{} box too small for version and flags",
                    fourcc
                ));
            }
            let word = u32::from_bytes(stream)?;
            version = Some((word >> 24) as u8);
            flags = word & 0x00ff_ffff;
            body_size -= 4;
        }

        Ok(BoxHeader {
            fourcc,
            uuid,
            version,
            flags,
            max_version,
            body_size,
            offset,
        })
    }

    /// Look at the next box header without consuming it.
    ///
    /// Used to dispatch on the fourcc. Only the size, fourcc and (for
    /// known full boxes, when visible) the version are filled in.
    pub fn peek<R: ReadBytes>(stream: &mut R) -> Result<BoxHeader> {
        use std::convert::TryInto;

        let offset = stream.pos();
        let left = stream.left();
        if left < 8 {
            return Err(decerr!(Truncated, offset, "{} bytes left, no room for a box header", left));
        }
        let want = std::cmp::min(left, 21);
        let data = stream.peek(want)?;

        let size1 = u32::from_be_bytes(data[0..4].try_into().unwrap());
        let fourcc = FourCC(u32::from_be_bytes(data[4..8].try_into().unwrap()));
        let mut idx = 8;
        let body_size = match size1 {
            0 => left - 8,
            1 => {
                if data.len() < 16 {
                    return Err(decerr!(Truncated, offset, "{} box: short large size", fourcc));
                }
                let size = u64::from_be_bytes(data[8..16].try_into().unwrap());
                if size < 16 {
                    return Err(decerr!(
                        Malformed,
                        offset,
                        "{} box: large size {} smaller than header",
                        fourcc,
                        size
                    ));
                }
                idx = 16;
                size - 16
            },
            sz if sz < 8 => {
                return Err(decerr!(
                    Malformed,
                    offset,
                    "{} box: size {} smaller than header",
                    fourcc,
                    sz
                ));
            },
            sz => sz as u64 - 8,
        };

        let max_version = MP4Box::max_version_from_fourcc(fourcc);
        let version = match max_version {
            Some(_) if data.len() >= idx + 1 => Some(data[idx]),
            _ => None,
        };

        Ok(BoxHeader {
            fourcc,
            uuid: None,
            version,
            flags: 0,
            max_version,
            body_size,
            offset,
        })
    }
}

/// Reads one box.
///
/// Size-limited view over the parent stream. When dropped, it skips to
/// the end of the box, so a partially consumed child never
/// desynchronises the parent's walk.
pub struct BoxReader<'a> {
    pub header: BoxHeader,
    maxsize:    u64,
    inner:      Box<dyn ReadBytes + 'a>,
}

impl<'a> BoxReader<'a> {
    /// Read the box header, then return a size-limited reader.
    pub fn new(stream: &'a mut impl ReadBytes) -> Result<BoxReader<'a>> {
        let header = BoxHeader::read(stream)?;
        if header.body_size > stream.left() {
            return Err(decerr!(
                Truncated,
                header.offset,
                "{} box: {} byte body runs past the end of the buffer",
                header.fourcc,
                header.body_size
            ));
        }
        let maxsize = stream.pos() + header.body_size;
        log::trace!(
            "BoxReader::new: {} offset {} body {}",
            header.fourcc,
            header.offset,
            header.body_size
        );
        Ok(BoxReader {
            header,
            maxsize,
            inner: Box::new(stream),
        })
    }
}

impl<'a> Drop for BoxReader<'a> {
    fn drop(&mut self) {
        let pos = self.inner.pos();
        if pos < self.maxsize {
            let _ = self.inner.skip(self.maxsize - pos);
        }
    }
}

impl<'a> ReadBytes for BoxReader<'a> {
    fn read(&mut self, amount: u64) -> Result<&[u8]> {
        let amount = if amount == 0 { self.left() } else { amount };
        if amount == 0 {
            return Ok(b"");
        }
        if self.inner.pos() + amount > self.maxsize {
            return Err(decerr!(
                Truncated,
                self.inner.pos(),
                "read of {} bytes crosses the end of the {} box",
                amount,
                self.header.fourcc
            ));
        }
        self.inner.read(amount)
    }
    fn peek(&mut self, amount: u64) -> Result<&[u8]> {
        if self.inner.pos() + amount > self.maxsize {
            return Err(decerr!(
                Truncated,
                self.inner.pos(),
                "peek of {} bytes crosses the end of the {} box",
                amount,
                self.header.fourcc
            ));
        }
        self.inner.peek(amount)
    }
    fn skip(&mut self, amount: u64) -> Result<()> {
        if self.inner.pos() + amount > self.maxsize {
            return Err(decerr!(
                Truncated,
                self.inner.pos(),
                "skip of {} bytes crosses the end of the {} box",
                amount,
                self.header.fourcc
            ));
        }
        self.inner.skip(amount)
    }
    fn left(&mut self) -> u64 {
        let pos = self.inner.pos();
        if pos > self.maxsize {
            0
        } else {
            self.maxsize - pos
        }
    }
}

impl<'a> BoxBytes for BoxReader<'a> {
    fn pos(&mut self) -> u64 {
        self.inner.pos()
    }
    fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.maxsize {
            return Err(decerr!(Truncated, pos, "seek past the end of the {} box", self.header.fourcc));
        }
        self.inner.seek(pos)
    }
    fn size(&self) -> u64 {
        self.maxsize
    }
    fn version(&self) -> u8 {
        match self.header.version {
            Some(v) => v,
            None => self.inner.version(),
        }
    }
    fn flags(&self) -> u32 {
        if self.header.version.is_some() {
            self.header.flags
        } else {
            self.inner.flags()
        }
    }
    fn fourcc(&self) -> FourCC {
        self.header.fourcc
    }
}

/// Writes one box.
///
/// A provisional header is written up front; `finalize` patches the
/// size once the body has been written.
pub struct BoxWriter<'a> {
    offset:    u64,
    version:   Option<u8>,
    flags:     u32,
    inner:     Box<dyn WriteBytes + 'a>,
    finalized: bool,
}

impl<'a> BoxWriter<'a> {
    /// Write a provisional box header, then return a new stream.
    pub fn new<W, B>(stream: &'a mut W, b: &B) -> Result<BoxWriter<'a>>
    where
        W: WriteBytes,
        B: BoxInfo + FullBox + ?Sized,
    {
        let mut stream = stream;
        let offset = stream.pos();
        0u32.to_bytes(&mut stream)?;
        b.fourcc().to_bytes(&mut stream)?;
        if let Some(uuid) = b.user_type() {
            uuid.to_bytes(&mut stream)?;
        }
        let version = b.version();
        let flags = b.flags();
        if let Some(v) = version {
            let word = ((v as u32) << 24) | (flags & 0x00ff_ffff);
            word.to_bytes(&mut stream)?;
        }
        Ok(BoxWriter {
            offset,
            version,
            flags,
            inner: Box::new(stream),
            finalized: false,
        })
    }

    /// Patch the box size into the header.
    ///
    /// Done automatically when the writer is dropped, but calling it
    /// explicitly lets write errors propagate.
    pub fn finalize(&mut self) -> Result<()> {
        self.finalized = true;
        let pos = self.inner.pos();
        let size = pos - self.offset;
        if size > u32::MAX as u64 {
            return Err(decerr!(OutOfRange, "box of {} bytes needs a large size header", size));
        }
        self.inner.seek(self.offset)?;
        (size as u32).to_bytes(&mut self.inner)?;
        self.inner.seek(pos)?;
        Ok(())
    }
}

impl<'a> Drop for BoxWriter<'a> {
    fn drop(&mut self) {
        if !self.finalized {
            let _ = self.finalize();
        }
    }
}

impl<'a> WriteBytes for BoxWriter<'a> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write(data)
    }
    fn skip(&mut self, amount: u64) -> Result<()> {
        self.inner.skip(amount)
    }
}

impl<'a> BoxBytes for BoxWriter<'a> {
    fn pos(&mut self) -> u64 {
        self.inner.pos()
    }
    fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(pos)
    }
    fn size(&self) -> u64 {
        self.inner.size()
    }
    fn version(&self) -> u8 {
        match self.version {
            Some(v) => v,
            None => self.inner.version(),
        }
    }
    fn flags(&self) -> u32 {
        if self.version.is_some() {
            self.flags
        } else {
            self.inner.flags()
        }
    }
}

/// Read a collection of boxes from a stream.
pub fn read_boxes<R: ReadBytes>(mut stream: R) -> Result<Vec<MP4Box>> {
    let mut boxes = Vec::new();
    while stream.left() >= 8 {
        if boxes.len() >= MAX_BOXES_PER_CONTAINER {
            return Err(decerr!(
                Malformed,
                stream.pos(),
                "more than {} boxes in one container",
                MAX_BOXES_PER_CONTAINER
            ));
        }
        let b = MP4Box::from_bytes(&mut stream)?;
        boxes.push(b);
    }
    Ok(boxes)
}

/// Any unknown box we encounter is put into a GenericBox.
///
/// The raw body is preserved so the box round-trips, and the offset is
/// remembered so decode warnings can point at it.
#[derive(Clone)]
pub struct GenericBox {
    pub fourcc:  FourCC,
    pub uuid:    Option<Uuid>,
    pub version: Option<u8>,
    pub flags:   u32,
    pub data:    Vec<u8>,
    pub offset:  u64,
}

impl FromBytes for GenericBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<GenericBox> {
        let mut reader = BoxReader::new(stream)?;
        log::warn!(
            "GenericBox::from_bytes: unknown {} box at offset {}",
            reader.header.fourcc,
            reader.header.offset
        );
        let size = reader.left();
        let data = reader.read(size)?.to_vec();
        Ok(GenericBox {
            fourcc: reader.header.fourcc,
            uuid: reader.header.uuid.clone(),
            version: reader.header.version,
            flags: reader.header.flags,
            data,
            offset: reader.header.offset,
        })
    }
    fn min_size() -> usize {
        8
    }
}

impl ToBytes for GenericBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        writer.write(&self.data)?;
        writer.finalize()
    }
}

impl BoxInfo for GenericBox {
    #[inline]
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }
    fn user_type(&self) -> Option<&Uuid> {
        self.uuid.as_ref()
    }
}

impl FullBox for GenericBox {
    fn version(&self) -> Option<u8> {
        self.version
    }
    fn flags(&self) -> u32 {
        self.flags
    }
}

struct U8Array(u64);

impl Debug for U8Array {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[u8; {}]", &self.0)
    }
}

impl Debug for GenericBox {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut dbg = f.debug_struct("GenericBox");
        dbg.field("fourcc", &self.fourcc);
        if let Some(ref uuid) = self.uuid {
            dbg.field("uuid", uuid);
        }
        dbg.field("data", &U8Array(self.data.len() as u64));
        dbg.finish()
    }
}
