//
// ISO/IEC 14496-12:2015(E)
// 8.8.8 Track Fragment Run Box
//

use crate::boxes::prelude::*;

//  aligned(8) class TrackRunBox
//  extends FullBox('trun', version, tr_flags) {
//      unsigned int(32) sample_count;
//      // the following are optional fields
//      signed int(32) data_offset;
//      unsigned int(32) first_sample_flags;
//      // all fields in the following array are optional
//      {
//          unsigned int(32) sample_duration;
//          unsigned int(32) sample_size;
//          unsigned int(32) sample_flags
//          if (version == 0)
//              { unsigned int(32) sample_composition_time_offset; }
//          else
//              { signed int(32) sample_composition_time_offset; }
//      }[ sample_count ]
//  }

// If no per-sample field is present, an entry takes no bytes on the
// wire, so the sample count has to be bounded some other way.
const MAX_EMPTY_ENTRIES: u32 = 65536;

/// 8.8.8 Track Fragment Run Box (ISO/IEC 14496-12:2015(E))
///
/// The sample count on the wire is the length of `entries`. The
/// composition time offset is unsigned in version 0 and signed in
/// version 1; the version is picked at encode time, 1 iff any offset
/// is negative.
#[derive(Clone, Debug, Default)]
pub struct TrackRunBox {
    pub data_offset:        Option<i32>,
    pub first_sample_flags: Option<SampleFlags>,
    pub entries:            ArrayUnsized<TrackRunEntry>,
}

/// 8.8.8 Track Fragment Run Sample Entry (ISO/IEC 14496-12:2015(E))
#[derive(Clone, Debug, Default)]
pub struct TrackRunEntry {
    pub sample_duration:                Option<u32>,
    pub sample_size:                    Option<u32>,
    pub sample_flags:                   Option<SampleFlags>,
    pub sample_composition_time_offset: Option<i64>,
}

impl TrackRunBox {
    /// Number of samples in this run.
    pub fn sample_count(&self) -> u32 {
        self.entries.len() as u32
    }

    /// The flags that apply to sample `index`.
    ///
    /// When per-sample flags are absent, the first sample adopts
    /// `first_sample_flags` if present; the other samples have no flags.
    pub fn effective_sample_flags(&self, index: usize) -> Option<&SampleFlags> {
        match self.entries.get(index) {
            Some(entry) => match entry.sample_flags {
                Some(ref f) => Some(f),
                None if index == 0 => self.first_sample_flags.as_ref(),
                None => None,
            },
            None => None,
        }
    }
}

impl FromBytes for TrackRunBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<TrackRunBox> {
        let mut reader = BoxReader::new(stream)?;
        let offset = reader.header.offset;
        let stream = &mut reader;

        let flags = stream.flags();

        let sample_count = u32::from_bytes(stream)?;

        let data_offset = ((flags & 0x01) > 0).then(|| i32::from_bytes(stream)).transpose()?;
        let first_sample_flags =
            ((flags & 0x04) > 0).then(|| SampleFlags::from_bytes(stream)).transpose()?;

        let do_sample_dur = (flags & 0x0100) > 0;
        let do_sample_size = (flags & 0x0200) > 0;
        let do_sample_flags = (flags & 0x0400) > 0;
        let do_sample_comp = (flags & 0x0800) > 0;

        let entry_size = 4 * (do_sample_dur as u64
            + do_sample_size as u64
            + do_sample_flags as u64
            + do_sample_comp as u64);
        if entry_size > 0 {
            if (sample_count as u64) * entry_size > stream.left() {
                return Err(decerr!(
                    Truncated,
                    offset,
                    "trun: {} samples of {} bytes do not fit in the box",
                    sample_count,
                    entry_size
                ));
            }
        } else if sample_count > MAX_EMPTY_ENTRIES {
            return Err(decerr!(
                Malformed,
                offset,
                "trun: implausible sample count {} without per-sample fields",
                sample_count
            ));
        }

        let mut entries = ArrayUnsized::new();
        while (entries.len() as u32) < sample_count {
            let sample_duration = do_sample_dur.then(|| u32::from_bytes(stream)).transpose()?;
            let sample_size = do_sample_size.then(|| u32::from_bytes(stream)).transpose()?;
            let sample_flags = do_sample_flags.then(|| SampleFlags::from_bytes(stream)).transpose()?;
            let sample_composition_time_offset = if do_sample_comp {
                if stream.version() == 0 {
                    Some(u32::from_bytes(stream)? as i64)
                } else {
                    Some(i32::from_bytes(stream)? as i64)
                }
            } else {
                None
            };
            entries.push(TrackRunEntry {
                sample_duration,
                sample_size,
                sample_flags,
                sample_composition_time_offset,
            });
        }

        Ok(TrackRunBox {
            data_offset,
            first_sample_flags,
            entries,
        })
    }

    fn min_size() -> usize {
        16
    }
}

impl ToBytes for TrackRunBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        (self.entries.len() as u32).to_bytes(stream)?;

        self.data_offset.as_ref().map_or(Ok(()), |v| v.to_bytes(stream))?;
        self.first_sample_flags.as_ref().map_or(Ok(()), |v| v.to_bytes(stream))?;

        for e in self.entries.iter() {
            e.to_bytes(stream)?;
        }

        stream.finalize()
    }
}

impl BoxInfo for TrackRunBox {
    #[inline]
    fn fourcc(&self) -> FourCC {
        FourCC::new("trun")
    }
    #[inline]
    fn max_version() -> Option<u8> {
        Some(1)
    }
}

impl FullBox for TrackRunBox {
    fn version(&self) -> Option<u8> {
        for e in self.entries.iter() {
            if let Some(cto) = e.sample_composition_time_offset {
                if cto < 0 {
                    return Some(1);
                }
            }
        }
        Some(0)
    }
    fn flags(&self) -> u32 {
        self.data_offset.is_some() as u32 * 0x01
            | self.first_sample_flags.is_some() as u32 * 0x04
            | self.entries.iter().next().map(|e| e.flags()).unwrap_or(0)
    }
}

impl TrackRunEntry {
    fn flags(&self) -> u32 {
        self.sample_duration.is_some() as u32 * 0x0100
            | self.sample_size.is_some() as u32 * 0x0200
            | self.sample_flags.is_some() as u32 * 0x0400
            | self.sample_composition_time_offset.is_some() as u32 * 0x0800
    }
}

impl ToBytes for TrackRunEntry {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let flags = stream.flags();
        if (flags & 0x0100) > 0 {
            self.sample_duration.unwrap_or(0).to_bytes(stream)?;
        }
        if (flags & 0x0200) > 0 {
            self.sample_size.unwrap_or(0).to_bytes(stream)?;
        }
        if (flags & 0x0400) > 0 {
            self.sample_flags
                .as_ref()
                .unwrap_or(&SampleFlags::default())
                .to_bytes(stream)?;
        }
        if (flags & 0x0800) > 0 {
            let cto = self.sample_composition_time_offset.unwrap_or(0);
            if stream.version() == 0 {
                if cto < 0 || cto > u32::MAX as i64 {
                    return Err(decerr!(
                        OutOfRange,
                        "trun: composition time offset {} does not fit in version 0",
                        cto
                    ));
                }
                (cto as u32).to_bytes(stream)?;
            } else {
                if cto < i32::MIN as i64 || cto > i32::MAX as i64 {
                    return Err(decerr!(
                        OutOfRange,
                        "trun: composition time offset {} does not fit in 32 bits",
                        cto
                    ));
                }
                (cto as i32).to_bytes(stream)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemBuffer, SliceReader};

    fn roundtrip(trun: &TrackRunBox) -> (Vec<u8>, TrackRunBox) {
        let mut buf = MemBuffer::new();
        trun.to_bytes(&mut buf).unwrap();
        let data = buf.into_vec();
        let mut rdr = SliceReader::new(&data);
        let back = TrackRunBox::from_bytes(&mut rdr).unwrap();
        (data, back)
    }

    #[test]
    fn gop_with_per_sample_fields() {
        // I-B-B-P-P with data_offset + duration + size + flags (0x000701).
        let sizes = [50000u32, 5000, 5000, 10000, 10000];
        let mut trun = TrackRunBox::default();
        trun.data_offset = Some(256);
        for (i, &size) in sizes.iter().enumerate() {
            let mut flags = SampleFlags::default();
            match i {
                0 => {
                    flags.sample_depends_on = 2;
                },
                1 | 2 => {
                    flags.sample_depends_on = 1;
                    flags.sample_is_non_sync_sample = true;
                },
                _ => {
                    flags.sample_depends_on = 1;
                    flags.sample_is_depended_on = 1;
                    flags.sample_is_non_sync_sample = true;
                },
            }
            trun.entries.push(TrackRunEntry {
                sample_duration: Some(1000),
                sample_size: Some(size),
                sample_flags: Some(flags),
                sample_composition_time_offset: None,
            });
        }
        assert_eq!(trun.flags(), 0x000701);

        let (_, back) = roundtrip(&trun);
        assert_eq!(back.sample_count(), 5);
        assert_eq!(back.data_offset, Some(256));
        let first = back.effective_sample_flags(0).unwrap();
        assert!(first.is_sync());
        assert!(first.is_independent());
        for i in 3..5 {
            assert!(back.effective_sample_flags(i).unwrap().is_depended_upon());
        }
        let sizes_back: Vec<u32> = back.entries.iter().map(|e| e.sample_size.unwrap()).collect();
        assert_eq!(&sizes_back[..], &sizes[..]);
    }

    #[test]
    fn negative_composition_offset_needs_version_1() {
        let mut trun = TrackRunBox::default();
        trun.entries.push(TrackRunEntry {
            sample_duration: None,
            sample_size: None,
            sample_flags: None,
            sample_composition_time_offset: Some(-500),
        });
        assert_eq!(trun.version(), Some(1));

        let (_, back) = roundtrip(&trun);
        assert_eq!(back.entries[0].sample_composition_time_offset, Some(-500));
    }

    #[test]
    fn version_0_offset_is_unsigned() {
        let mut trun = TrackRunBox::default();
        trun.entries.push(TrackRunEntry {
            sample_duration: None,
            sample_size: None,
            sample_flags: None,
            sample_composition_time_offset: Some(0x9000_0000),
        });
        // Positive, so version 0, read back unsigned.
        assert_eq!(trun.version(), Some(0));
        let (_, back) = roundtrip(&trun);
        assert_eq!(back.entries[0].sample_composition_time_offset, Some(0x9000_0000));
    }

    #[test]
    fn first_sample_flags_adoption() {
        let mut trun = TrackRunBox::default();
        trun.first_sample_flags = Some(SampleFlags::from_bits(0x02000000));
        for _ in 0..3 {
            trun.entries.push(TrackRunEntry {
                sample_duration: Some(1000),
                sample_size: None,
                sample_flags: None,
                sample_composition_time_offset: None,
            });
        }
        let (_, back) = roundtrip(&trun);
        assert!(back.effective_sample_flags(0).unwrap().is_independent());
        assert!(back.effective_sample_flags(1).is_none());
        assert_eq!(back.first_sample_flags, Some(SampleFlags::from_bits(0x02000000)));
    }

    #[test]
    fn implausible_empty_entry_count() {
        // flags 0, sample_count huge: 12-byte header + count.
        let mut data = Vec::new();
        data.extend_from_slice(&16u32.to_be_bytes());
        data.extend_from_slice(b"trun");
        data.extend_from_slice(&0u32.to_be_bytes()); // version 0, no flags
        data.extend_from_slice(&0xffff_ffffu32.to_be_bytes());
        let mut rdr = SliceReader::new(&data);
        assert!(TrackRunBox::from_bytes(&mut rdr).is_err());
    }
}
