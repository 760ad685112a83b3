//
// ISO/IEC 14496-12:2015(E)
// 8.8.7 Track Fragment Header Box
//

use crate::boxes::prelude::*;

//  aligned(8) class TrackFragmentHeaderBox extends FullBox('tfhd', 0, tf_flags){
//      unsigned int(32) track_ID;
//      // all the following are optional fields
//      unsigned int(64) base_data_offset;
//      unsigned int(32) sample_description_index;
//      unsigned int(32) default_sample_duration;
//      unsigned int(32) default_sample_size;
//      unsigned int(32) default_sample_flags
//  }

const TFHD_KNOWN_FLAGS: u32 = 0x01 | 0x02 | 0x08 | 0x10 | 0x20 | 0x010000 | 0x020000;

/// 8.8.7 Track Fragment Header Box (ISO/IEC 14496-12:2015(E))
///
/// Optional fields are present on the wire iff their flag bit is set;
/// the flag word is derived from field presence when encoding, so the
/// two can never disagree. Flag bits we don't know are kept and
/// re-emitted as-is.
#[derive(Clone, Debug, Default)]
pub struct TrackFragmentHeaderBox {
    pub track_id:                 u32,
    pub duration_is_empty:        bool,
    pub default_base_is_moof:     bool,
    pub base_data_offset:         Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration:  Option<u32>,
    pub default_sample_size:      Option<u32>,
    pub default_sample_flags:     Option<SampleFlags>,
    pub other_flags:              u32,
}

impl TrackFragmentHeaderBox {
    /// The usual CMAF header: just a track id, offsets relative to the moof.
    pub fn new(track_id: u32) -> TrackFragmentHeaderBox {
        TrackFragmentHeaderBox {
            track_id,
            default_base_is_moof: true,
            ..TrackFragmentHeaderBox::default()
        }
    }
}

impl FromBytes for TrackFragmentHeaderBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<TrackFragmentHeaderBox> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;

        let flags = stream.flags();

        let track_id = u32::from_bytes(stream)?;

        let duration_is_empty = (flags & 0x010000) > 0;
        let default_base_is_moof = (flags & 0x020000) > 0;

        let base_data_offset = ((flags & 0x01) > 0).then(|| u64::from_bytes(stream)).transpose()?;
        let sample_description_index =
            ((flags & 0x02) > 0).then(|| u32::from_bytes(stream)).transpose()?;
        let default_sample_duration =
            ((flags & 0x08) > 0).then(|| u32::from_bytes(stream)).transpose()?;
        let default_sample_size = ((flags & 0x10) > 0).then(|| u32::from_bytes(stream)).transpose()?;
        let default_sample_flags =
            ((flags & 0x20) > 0).then(|| SampleFlags::from_bytes(stream)).transpose()?;

        Ok(TrackFragmentHeaderBox {
            track_id,
            duration_is_empty,
            default_base_is_moof,
            base_data_offset,
            sample_description_index,
            default_sample_duration,
            default_sample_size,
            default_sample_flags,
            other_flags: flags & !TFHD_KNOWN_FLAGS,
        })
    }

    fn min_size() -> usize {
        16
    }
}

impl ToBytes for TrackFragmentHeaderBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        self.track_id.to_bytes(stream)?;

        self.base_data_offset.as_ref().map_or(Ok(()), |x| x.to_bytes(stream))?;
        self.sample_description_index
            .as_ref()
            .map_or(Ok(()), |x| x.to_bytes(stream))?;
        self.default_sample_duration
            .as_ref()
            .map_or(Ok(()), |x| x.to_bytes(stream))?;
        self.default_sample_size.as_ref().map_or(Ok(()), |x| x.to_bytes(stream))?;
        self.default_sample_flags.as_ref().map_or(Ok(()), |x| x.to_bytes(stream))?;

        stream.finalize()
    }
}

impl BoxInfo for TrackFragmentHeaderBox {
    #[inline]
    fn fourcc(&self) -> FourCC {
        FourCC::new("tfhd")
    }
    #[inline]
    fn max_version() -> Option<u8> {
        Some(0)
    }
}

impl FullBox for TrackFragmentHeaderBox {
    fn version(&self) -> Option<u8> {
        Some(0)
    }
    fn flags(&self) -> u32 {
        self.base_data_offset.is_some() as u32 * 0x01
            | self.sample_description_index.is_some() as u32 * 0x02
            | self.default_sample_duration.is_some() as u32 * 0x08
            | self.default_sample_size.is_some() as u32 * 0x10
            | self.default_sample_flags.is_some() as u32 * 0x20
            | self.duration_is_empty as u32 * 0x010000
            | self.default_base_is_moof as u32 * 0x020000
            | self.other_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemBuffer, SliceReader};

    #[test]
    fn flags_follow_field_presence() {
        let mut tfhd = TrackFragmentHeaderBox::new(1);
        tfhd.default_sample_duration = Some(1000);
        assert_eq!(tfhd.flags(), 0x08 | 0x020000);
        tfhd.base_data_offset = Some(0);
        assert_eq!(tfhd.flags(), 0x01 | 0x08 | 0x020000);
    }

    #[test]
    fn unknown_flag_bits_survive() {
        let mut tfhd = TrackFragmentHeaderBox::new(7);
        tfhd.other_flags = 0x4000;
        let mut buf = MemBuffer::new();
        tfhd.to_bytes(&mut buf).unwrap();
        let data = buf.into_vec();

        let mut rdr = SliceReader::new(&data);
        let back = TrackFragmentHeaderBox::from_bytes(&mut rdr).unwrap();
        assert_eq!(back.track_id, 7);
        assert!(back.default_base_is_moof);
        assert_eq!(back.other_flags, 0x4000);

        let mut buf = MemBuffer::new();
        back.to_bytes(&mut buf).unwrap();
        assert_eq!(buf.into_vec(), data);
    }

    #[test]
    fn optional_fields_roundtrip() {
        let tfhd = TrackFragmentHeaderBox {
            track_id: 2,
            base_data_offset: Some(1024),
            default_sample_duration: Some(512),
            default_sample_size: Some(4096),
            default_sample_flags: Some(SampleFlags::from_bits(0x02000000)),
            ..TrackFragmentHeaderBox::default()
        };
        let mut buf = MemBuffer::new();
        tfhd.to_bytes(&mut buf).unwrap();
        let data = buf.into_vec();

        let mut rdr = SliceReader::new(&data);
        let back = TrackFragmentHeaderBox::from_bytes(&mut rdr).unwrap();
        assert_eq!(back.base_data_offset, Some(1024));
        assert_eq!(back.sample_description_index, None);
        assert_eq!(back.default_sample_duration, Some(512));
        assert_eq!(back.default_sample_size, Some(4096));
        assert_eq!(back.default_sample_flags, Some(SampleFlags::from_bits(0x02000000)));
    }
}
