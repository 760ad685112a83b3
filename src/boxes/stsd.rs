//
// ISO/IEC 14496-12:2015(E)
// 8.5.2 Sample Description Box
//

use crate::boxes::prelude::*;
use crate::mp4box::BoxHeader;

def_box! {
    /// 8.5.2 Sample Description Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    SampleDescriptionBox {
        entries:    ArraySized32<SampleEntry>,
    },
    fourcc => "stsd",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

impl SampleDescriptionBox {
    /// A sample description with a single entry.
    pub fn with_entry(entry: SampleEntry) -> SampleDescriptionBox {
        let mut entries = ArraySized32::new();
        entries.push(entry);
        SampleDescriptionBox { entries }
    }
}

/// Sample entry formats that get a VisualSampleEntry.
const VISUAL_ENTRY_TYPES: &[&[u8; 4]] = &[b"avc1", b"avc3", b"hev1", b"hvc1", b"vp09", b"av01"];

/// Sample entry formats that get an AudioSampleEntry.
const AUDIO_ENTRY_TYPES: &[&[u8; 4]] = &[b"mp4a", b"opus", b"Opus", b"ac-3", b"ec-3"];

/// An entry in the SampleDescriptionBox.
///
/// Dispatched on the FourCC family: video codecs get a
/// VisualSampleEntry, audio codecs an AudioSampleEntry, and any other
/// format is preserved as an opaque GenericSampleEntry.
#[derive(Clone, Debug)]
pub enum SampleEntry {
    Visual(VisualSampleEntry),
    Audio(AudioSampleEntry),
    Generic(GenericSampleEntry),
}

impl SampleEntry {
    /// The sample entry format.
    pub fn fourcc(&self) -> FourCC {
        match self {
            SampleEntry::Visual(ref e) => e.fourcc,
            SampleEntry::Audio(ref e) => e.fourcc,
            SampleEntry::Generic(ref e) => e.fourcc,
        }
    }

    /// Is this a video format.
    pub fn is_video(&self) -> bool {
        match self {
            SampleEntry::Visual(_) => true,
            _ => false,
        }
    }

    /// Is this an audio format.
    pub fn is_audio(&self) -> bool {
        match self {
            SampleEntry::Audio(_) => true,
            _ => false,
        }
    }
}

impl FromBytes for SampleEntry {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<SampleEntry> {
        let header = BoxHeader::peek(stream)?;
        let b = header.fourcc.to_be_bytes();
        let entry = if VISUAL_ENTRY_TYPES.iter().any(|t| *t == &b) {
            SampleEntry::Visual(VisualSampleEntry::from_bytes(stream)?)
        } else if AUDIO_ENTRY_TYPES.iter().any(|t| *t == &b) {
            SampleEntry::Audio(AudioSampleEntry::from_bytes(stream)?)
        } else {
            SampleEntry::Generic(GenericSampleEntry::from_bytes(stream)?)
        };
        Ok(entry)
    }

    fn min_size() -> usize {
        8
    }
}

impl ToBytes for SampleEntry {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        match self {
            SampleEntry::Visual(ref e) => e.to_bytes(stream),
            SampleEntry::Audio(ref e) => e.to_bytes(stream),
            SampleEntry::Generic(ref e) => e.to_bytes(stream),
        }
    }
}

/// 12.1.3 Visual Sample Entry (ISO/IEC 14496-12:2015(E))
///
/// Everything after the fixed fields is the codec configuration
/// (`avcC`, `hvcC`, `vpcC`, `av1C`, ...), kept verbatim.
#[derive(Clone, Debug)]
pub struct VisualSampleEntry {
    pub fourcc:               FourCC,
    pub data_reference_index: u16,
    pub width:                u16,
    pub height:               u16,
    pub horiz_resolution:     FixedFloat16_16,
    pub vert_resolution:      FixedFloat16_16,
    pub frame_count:          u16,
    pub compressor_name:      CompressorName,
    pub depth:                u16,
    pub pre_defined:          i16,
    pub codec_config:         Data,
}

impl VisualSampleEntry {
    pub fn new(format: &str, width: u16, height: u16, codec_config: impl Into<Data>) -> VisualSampleEntry {
        VisualSampleEntry {
            fourcc: FourCC::new(format),
            width,
            height,
            codec_config: codec_config.into(),
            ..VisualSampleEntry::default()
        }
    }
}

impl Default for VisualSampleEntry {
    fn default() -> VisualSampleEntry {
        VisualSampleEntry {
            fourcc:               FourCC::new("avc1"),
            data_reference_index: 1,
            width:                0,
            height:               0,
            horiz_resolution:     FixedFloat16_16::from_integer(72),
            vert_resolution:      FixedFloat16_16::from_integer(72),
            frame_count:          1,
            compressor_name:      CompressorName::default(),
            depth:                0x0018,
            pre_defined:          -1,
            codec_config:         Data::default(),
        }
    }
}

impl FromBytes for VisualSampleEntry {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<VisualSampleEntry> {
        let mut reader = BoxReader::new(stream)?;
        let fourcc = reader.header.fourcc;
        let stream = &mut reader;

        stream.skip(6)?;
        let data_reference_index = u16::from_bytes(stream)?;
        stream.skip(16)?;
        let width = u16::from_bytes(stream)?;
        let height = u16::from_bytes(stream)?;
        let horiz_resolution = FixedFloat16_16::from_bytes(stream)?;
        let vert_resolution = FixedFloat16_16::from_bytes(stream)?;
        stream.skip(4)?;
        let frame_count = u16::from_bytes(stream)?;
        let compressor_name = CompressorName::from_bytes(stream)?;
        let depth = u16::from_bytes(stream)?;
        let pre_defined = i16::from_bytes(stream)?;
        let codec_config = Data::from_bytes(stream)?;

        Ok(VisualSampleEntry {
            fourcc,
            data_reference_index,
            width,
            height,
            horiz_resolution,
            vert_resolution,
            frame_count,
            compressor_name,
            depth,
            pre_defined,
            codec_config,
        })
    }

    fn min_size() -> usize {
        86
    }
}

impl ToBytes for VisualSampleEntry {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        stream.skip(6)?;
        self.data_reference_index.to_bytes(stream)?;
        stream.skip(16)?;
        self.width.to_bytes(stream)?;
        self.height.to_bytes(stream)?;
        self.horiz_resolution.to_bytes(stream)?;
        self.vert_resolution.to_bytes(stream)?;
        stream.skip(4)?;
        self.frame_count.to_bytes(stream)?;
        self.compressor_name.to_bytes(stream)?;
        self.depth.to_bytes(stream)?;
        self.pre_defined.to_bytes(stream)?;
        self.codec_config.to_bytes(stream)?;

        stream.finalize()
    }
}

impl BoxInfo for VisualSampleEntry {
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }
}

impl FullBox for VisualSampleEntry {}

/// 12.2.3 Audio Sample Entry (ISO/IEC 14496-12:2015(E))
///
/// The sample rate is a 16.16 fixed point value; the integer Hz live in
/// the upper 16 bits. Trailing bytes are the codec configuration.
#[derive(Clone, Debug)]
pub struct AudioSampleEntry {
    pub fourcc:               FourCC,
    pub data_reference_index: u16,
    pub channel_count:        u16,
    pub sample_size:          u16,
    pub sample_rate:          FixedFloat16_16,
    pub codec_config:         Data,
}

impl AudioSampleEntry {
    pub fn new(
        format: &str,
        channel_count: u16,
        sample_rate_hz: u32,
        codec_config: impl Into<Data>,
    ) -> AudioSampleEntry {
        AudioSampleEntry {
            fourcc: FourCC::new(format),
            channel_count,
            sample_rate: FixedFloat16_16::from_integer(sample_rate_hz),
            codec_config: codec_config.into(),
            ..AudioSampleEntry::default()
        }
    }

    /// The sample rate in integer Hz.
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate.integer()
    }
}

impl Default for AudioSampleEntry {
    fn default() -> AudioSampleEntry {
        AudioSampleEntry {
            fourcc:               FourCC::new("mp4a"),
            data_reference_index: 1,
            channel_count:        2,
            sample_size:          16,
            sample_rate:          FixedFloat16_16::from_integer(48000),
            codec_config:         Data::default(),
        }
    }
}

impl FromBytes for AudioSampleEntry {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<AudioSampleEntry> {
        let mut reader = BoxReader::new(stream)?;
        let fourcc = reader.header.fourcc;
        let stream = &mut reader;

        stream.skip(6)?;
        let data_reference_index = u16::from_bytes(stream)?;
        stream.skip(8)?;
        let channel_count = u16::from_bytes(stream)?;
        let sample_size = u16::from_bytes(stream)?;
        stream.skip(4)?;
        let sample_rate = FixedFloat16_16::from_bytes(stream)?;
        let codec_config = Data::from_bytes(stream)?;

        Ok(AudioSampleEntry {
            fourcc,
            data_reference_index,
            channel_count,
            sample_size,
            sample_rate,
            codec_config,
        })
    }

    fn min_size() -> usize {
        36
    }
}

impl ToBytes for AudioSampleEntry {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        stream.skip(6)?;
        self.data_reference_index.to_bytes(stream)?;
        stream.skip(8)?;
        self.channel_count.to_bytes(stream)?;
        self.sample_size.to_bytes(stream)?;
        stream.skip(4)?;
        self.sample_rate.to_bytes(stream)?;
        self.codec_config.to_bytes(stream)?;

        stream.finalize()
    }
}

impl BoxInfo for AudioSampleEntry {
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }
}

impl FullBox for AudioSampleEntry {}

/// A sample entry format we don't know. The body is kept verbatim.
#[derive(Clone)]
pub struct GenericSampleEntry {
    pub fourcc: FourCC,
    pub data:   Data,
}

impl FromBytes for GenericSampleEntry {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<GenericSampleEntry> {
        let mut reader = BoxReader::new(stream)?;
        let fourcc = reader.header.fourcc;
        let data = Data::from_bytes(&mut reader)?;
        Ok(GenericSampleEntry { fourcc, data })
    }
    fn min_size() -> usize {
        8
    }
}

impl ToBytes for GenericSampleEntry {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        writer.write(self.data.bytes())?;
        writer.finalize()
    }
}

impl BoxInfo for GenericSampleEntry {
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }
}

impl FullBox for GenericSampleEntry {}

impl std::fmt::Debug for GenericSampleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut dbg = f.debug_struct("GenericSampleEntry");
        dbg.field("fourcc", &self.fourcc);
        dbg.field("data", &self.data);
        dbg.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemBuffer, SliceReader};

    fn roundtrip(stsd: &SampleDescriptionBox) -> (Vec<u8>, SampleDescriptionBox) {
        let mut buf = MemBuffer::new();
        stsd.to_bytes(&mut buf).unwrap();
        let data = buf.into_vec();
        let mut rdr = SliceReader::new(&data);
        let back = SampleDescriptionBox::from_bytes(&mut rdr).unwrap();
        (data, back)
    }

    #[test]
    fn visual_entry_dispatch() {
        let entry = VisualSampleEntry::new("avc1", 1280, 720, &[0x01u8, 0x42, 0xc0, 0x1e][..]);
        let stsd = SampleDescriptionBox::with_entry(SampleEntry::Visual(entry));
        let (data, back) = roundtrip(&stsd);

        assert_eq!(back.entries.len(), 1);
        match &back.entries[0] {
            SampleEntry::Visual(v) => {
                assert_eq!(v.fourcc, b"avc1");
                assert_eq!(v.width, 1280);
                assert_eq!(v.height, 720);
                assert_eq!(v.frame_count, 1);
                assert_eq!(v.depth, 0x0018);
                assert_eq!(v.pre_defined, -1);
                assert_eq!(v.codec_config.bytes(), &[0x01, 0x42, 0xc0, 0x1e]);
            },
            other => panic!("expected a visual entry, got {:?}", other),
        }

        // Re-encode is byte equal.
        let mut buf = MemBuffer::new();
        back.to_bytes(&mut buf).unwrap();
        assert_eq!(buf.into_vec(), data);
    }

    #[test]
    fn audio_entry_sample_rate() {
        let entry = AudioSampleEntry::new("opus", 2, 48000, Vec::new());
        let stsd = SampleDescriptionBox::with_entry(SampleEntry::Audio(entry));
        let (_, back) = roundtrip(&stsd);

        match &back.entries[0] {
            SampleEntry::Audio(a) => {
                assert_eq!(a.fourcc, b"opus");
                assert_eq!(a.channel_count, 2);
                assert_eq!(a.sample_rate_hz(), 48000);
            },
            other => panic!("expected an audio entry, got {:?}", other),
        }
    }

    #[test]
    fn unknown_entry_is_preserved() {
        let entry = GenericSampleEntry {
            fourcc: FourCC::new("zzz1"),
            data:   Data(vec![1, 2, 3, 4, 5, 6, 7, 8]),
        };
        let stsd = SampleDescriptionBox::with_entry(SampleEntry::Generic(entry));
        let (data, back) = roundtrip(&stsd);
        match &back.entries[0] {
            SampleEntry::Generic(g) => {
                assert_eq!(g.fourcc, b"zzz1");
                assert_eq!(g.data.len(), 8);
            },
            other => panic!("expected a generic entry, got {:?}", other),
        }
        let mut buf = MemBuffer::new();
        back.to_bytes(&mut buf).unwrap();
        assert_eq!(buf.into_vec(), data);
    }
}
