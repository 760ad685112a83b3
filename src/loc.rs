//! LOC objects (draft-ietf-moq-loc).
//!
//! A LOC object is a WebCodecs-style encoded frame plus a flat list of
//! header extensions. On the wire the extension block is a plain
//! concatenation of `[varint id] [value]` tuples: an even id carries a
//! single varint value, an odd id a varint length and that many raw
//! bytes. There is no outer framing; the block ends with the buffer.
//!
//! The MoQ identifiers (group, object, subgroup) travel in the
//! transport, not in the LOC wire format; they are kept on the object
//! as plain values.
//!
use crate::error::{Result, Warning};
use crate::io::{MemBuffer, SliceReader};
use crate::serialize::{BoxBytes, FromBytes, ReadBytes, ToBytes, WriteBytes};
use crate::types::Data;
use crate::varint::Varint;

/// Registered extension ids.
pub const CAPTURE_TIMESTAMP_ID: u64 = 2;
pub const VIDEO_FRAME_MARKING_ID: u64 = 4;
pub const AUDIO_LEVEL_ID: u64 = 6;
pub const VIDEO_CONFIG_ID: u64 = 13;

/// What kind of media a LOC object carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Wall-clock capture time, microseconds since the Unix epoch. Id 2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureTimestamp {
    pub micros: u64,
}

impl CaptureTimestamp {
    pub fn new(micros: u64) -> CaptureTimestamp {
        CaptureTimestamp { micros }
    }
}

/// Video frame marking bits (id 4).
///
/// Encoded in the low bits of a varint: bit 0 independent, bit 1
/// discardable, bit 2 base layer sync, bits 3-5 temporal id, bits 6-7
/// spatial id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VideoFrameMarking {
    pub independent:     bool,
    pub discardable:     bool,
    pub base_layer_sync: bool,
    pub temporal_id:     u8,
    pub spatial_id:      u8,
}

impl VideoFrameMarking {
    /// Temporal id must be 0-7, spatial id 0-3.
    pub fn new(
        independent: bool,
        discardable: bool,
        base_layer_sync: bool,
        temporal_id: u8,
        spatial_id: u8,
    ) -> Result<VideoFrameMarking> {
        if temporal_id > 7 {
            return Err(decerr!(OutOfRange, "temporal id {} > 7", temporal_id));
        }
        if spatial_id > 3 {
            return Err(decerr!(OutOfRange, "spatial id {} > 3", spatial_id));
        }
        Ok(VideoFrameMarking {
            independent,
            discardable,
            base_layer_sync,
            temporal_id,
            spatial_id,
        })
    }

    fn to_value(&self) -> u64 {
        self.independent as u64
            | (self.discardable as u64) << 1
            | (self.base_layer_sync as u64) << 2
            | ((self.temporal_id & 0x07) as u64) << 3
            | ((self.spatial_id & 0x03) as u64) << 6
    }

    fn from_value(value: u64) -> VideoFrameMarking {
        VideoFrameMarking {
            independent:     value & 0x01 > 0,
            discardable:     value & 0x02 > 0,
            base_layer_sync: value & 0x04 > 0,
            temporal_id:     ((value >> 3) & 0x07) as u8,
            spatial_id:      ((value >> 6) & 0x03) as u8,
        }
    }
}

/// Audio level indication (id 6).
///
/// Bit 0 is voice activity; bits 1-7 carry the level in -dBov, 0
/// being the loudest and 127 silence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AudioLevel {
    pub voice_activity: bool,
    pub level:          u8,
}

impl AudioLevel {
    /// Level must be 0-127.
    pub fn new(voice_activity: bool, level: u8) -> Result<AudioLevel> {
        if level > 127 {
            return Err(decerr!(OutOfRange, "audio level {} > 127", level));
        }
        Ok(AudioLevel {
            voice_activity,
            level,
        })
    }

    fn to_value(&self) -> u64 {
        ((self.level & 0x7f) as u64) << 1 | self.voice_activity as u64
    }

    fn from_value(value: u64) -> AudioLevel {
        AudioLevel {
            voice_activity: value & 0x01 > 0,
            level:          ((value >> 1) & 0x7f) as u8,
        }
    }
}

/// Opaque codec configuration (id 13), e.g. an `avcC` body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoConfig {
    pub data: Data,
}

impl VideoConfig {
    pub fn new(data: impl Into<Data>) -> VideoConfig {
        VideoConfig { data: data.into() }
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.bytes()
    }
}

/// The value of an extension we don't know.
///
/// Per the parity convention, an even id holds one varint and an odd
/// id a byte string. Both re-encode to the original form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnknownValue {
    Varint(u64),
    Bytes(Data),
}

/// One LOC header extension.
#[derive(Clone, Debug, PartialEq)]
pub enum LocHeaderExtension {
    CaptureTimestamp(CaptureTimestamp),
    VideoFrameMarking(VideoFrameMarking),
    AudioLevel(AudioLevel),
    VideoConfig(VideoConfig),
    Unknown { id: u64, value: UnknownValue },
}

impl LocHeaderExtension {
    /// The registered id of this extension.
    pub fn id(&self) -> u64 {
        match self {
            LocHeaderExtension::CaptureTimestamp(_) => CAPTURE_TIMESTAMP_ID,
            LocHeaderExtension::VideoFrameMarking(_) => VIDEO_FRAME_MARKING_ID,
            LocHeaderExtension::AudioLevel(_) => AUDIO_LEVEL_ID,
            LocHeaderExtension::VideoConfig(_) => VIDEO_CONFIG_ID,
            LocHeaderExtension::Unknown { id, .. } => *id,
        }
    }

    /// Even ids carry a varint value, odd ids a length-prefixed string.
    pub fn is_varint_valued(&self) -> bool {
        self.id() % 2 == 0
    }
}

impl FromBytes for LocHeaderExtension {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<LocHeaderExtension> {
        let id = Varint::from_bytes(stream)?.0;
        let ext = if id % 2 == 0 {
            // Even id: a single varint value, no length prefix.
            let value = Varint::from_bytes(stream)?.0;
            match id {
                CAPTURE_TIMESTAMP_ID => {
                    LocHeaderExtension::CaptureTimestamp(CaptureTimestamp { micros: value })
                },
                VIDEO_FRAME_MARKING_ID => {
                    LocHeaderExtension::VideoFrameMarking(VideoFrameMarking::from_value(value))
                },
                AUDIO_LEVEL_ID => LocHeaderExtension::AudioLevel(AudioLevel::from_value(value)),
                _ => LocHeaderExtension::Unknown {
                    id,
                    value: UnknownValue::Varint(value),
                },
            }
        } else {
            // Odd id: a varint length, then that many bytes.
            let len = Varint::from_bytes(stream)?.0;
            if len > stream.left() {
                return Err(decerr!(
                    Truncated,
                    stream.pos(),
                    "extension {}: {} byte value does not fit",
                    id,
                    len
                ));
            }
            let data = Data::read(stream, len as usize)?;
            match id {
                VIDEO_CONFIG_ID => LocHeaderExtension::VideoConfig(VideoConfig { data }),
                _ => LocHeaderExtension::Unknown {
                    id,
                    value: UnknownValue::Bytes(data),
                },
            }
        };
        Ok(ext)
    }

    fn min_size() -> usize {
        2
    }
}

impl ToBytes for LocHeaderExtension {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        Varint(self.id()).to_bytes(stream)?;
        match self {
            LocHeaderExtension::CaptureTimestamp(ts) => Varint(ts.micros).to_bytes(stream),
            LocHeaderExtension::VideoFrameMarking(m) => Varint(m.to_value()).to_bytes(stream),
            LocHeaderExtension::AudioLevel(l) => Varint(l.to_value()).to_bytes(stream),
            LocHeaderExtension::VideoConfig(c) => {
                Varint(c.data.len() as u64).to_bytes(stream)?;
                c.data.to_bytes(stream)
            },
            LocHeaderExtension::Unknown { value, .. } => match value {
                UnknownValue::Varint(v) => Varint(*v).to_bytes(stream),
                UnknownValue::Bytes(data) => {
                    Varint(data.len() as u64).to_bytes(stream)?;
                    data.to_bytes(stream)
                },
            },
        }
    }
}

/// A LOC media object: header extensions plus an opaque payload.
#[derive(Clone, Debug)]
pub struct LocObject {
    pub kind:        MediaKind,
    /// MoQ transport identifiers; not part of the LOC wire format.
    pub group_id:    u64,
    pub object_id:   u64,
    pub subgroup_id: u64,
    pub extensions:  Vec<LocHeaderExtension>,
    pub payload:     Data,
    /// Unknown extension ids met while decoding.
    pub warnings:    Vec<Warning>,
}

impl LocObject {
    pub fn new(kind: MediaKind, payload: impl Into<Data>) -> LocObject {
        LocObject {
            kind,
            group_id: 0,
            object_id: 0,
            subgroup_id: 0,
            extensions: Vec::new(),
            payload: payload.into(),
            warnings: Vec::new(),
        }
    }

    /// Set the MoQ transport location of this object.
    pub fn with_location(mut self, group_id: u64, subgroup_id: u64, object_id: u64) -> LocObject {
        self.group_id = group_id;
        self.subgroup_id = subgroup_id;
        self.object_id = object_id;
        self
    }

    /// Add a header extension.
    pub fn push_extension(&mut self, ext: LocHeaderExtension) {
        self.extensions.push(ext);
    }

    /// Serialize the header-extension block.
    pub fn encode_headers(&self) -> Result<Vec<u8>> {
        let mut buf = MemBuffer::new();
        for ext in &self.extensions {
            ext.to_bytes(&mut buf)?;
        }
        Ok(buf.into_vec())
    }

    /// Serialize into the split `(headers, payload)` form MoQ transports.
    pub fn encode(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        Ok((self.encode_headers()?, self.payload.0.clone()))
    }

    /// Serialize headers and payload as one buffer.
    pub fn encode_concatenated(&self) -> Result<Vec<u8>> {
        let mut out = self.encode_headers()?;
        out.extend_from_slice(self.payload.bytes());
        Ok(out)
    }

    /// Decode from the split `(headers, payload)` form.
    ///
    /// The extension block has no outer framing: it ends when the
    /// header buffer does. Unknown ids are kept and recorded as
    /// warnings; per the parity convention an unknown even id is
    /// assumed to hold exactly one varint.
    pub fn decode(headers: &[u8], payload: &[u8], kind: MediaKind) -> Result<LocObject> {
        let mut reader = SliceReader::new(headers);
        let mut extensions = Vec::new();
        let mut warnings = Vec::new();

        while reader.left() > 0 {
            let offset = reader.pos();
            let ext = LocHeaderExtension::from_bytes(&mut reader)?;
            if let LocHeaderExtension::Unknown { id, .. } = ext {
                warnings.push(Warning {
                    offset,
                    what: format!("unknown header extension id {}", id),
                });
            }
            extensions.push(ext);
        }

        Ok(LocObject {
            kind,
            group_id: 0,
            object_id: 0,
            subgroup_id: 0,
            extensions,
            payload: payload.into(),
            warnings,
        })
    }

    /// The capture timestamp extension value, if present.
    pub fn capture_timestamp(&self) -> Option<u64> {
        self.extensions.iter().find_map(|e| match e {
            LocHeaderExtension::CaptureTimestamp(ts) => Some(ts.micros),
            _ => None,
        })
    }

    /// The video frame marking extension, if present.
    pub fn frame_marking(&self) -> Option<&VideoFrameMarking> {
        self.extensions.iter().find_map(|e| match e {
            LocHeaderExtension::VideoFrameMarking(m) => Some(m),
            _ => None,
        })
    }

    /// The audio level extension, if present.
    pub fn audio_level(&self) -> Option<&AudioLevel> {
        self.extensions.iter().find_map(|e| match e {
            LocHeaderExtension::AudioLevel(l) => Some(l),
            _ => None,
        })
    }

    /// The video config extension value, if present.
    pub fn video_config(&self) -> Option<&Data> {
        self.extensions.iter().find_map(|e| match e {
            LocHeaderExtension::VideoConfig(c) => Some(&c.data),
            _ => None,
        })
    }

    /// Can this object be decoded without referencing other objects?
    ///
    /// Audio frames always can. For video we only claim independence
    /// when a frame marking extension says so.
    pub fn is_independent_frame(&self) -> bool {
        match self.frame_marking() {
            Some(m) => m.independent,
            None => self.kind == MediaKind::Audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_video_frame_roundtrip() {
        let payload = vec![0xabu8; 8192];
        let mut obj = LocObject::new(MediaKind::Video, payload.clone()).with_location(7, 0, 3);
        obj.push_extension(LocHeaderExtension::CaptureTimestamp(CaptureTimestamp::new(
            1_234_567_890_000,
        )));
        obj.push_extension(LocHeaderExtension::VideoFrameMarking(
            VideoFrameMarking::new(true, false, true, 0, 0).unwrap(),
        ));
        obj.push_extension(LocHeaderExtension::VideoConfig(VideoConfig::new(
            &[0x01u8, 0x42, 0xc0, 0x1e][..],
        )));

        let (headers, body) = obj.encode().unwrap();
        let back = LocObject::decode(&headers, &body, MediaKind::Video).unwrap();

        assert!(back.is_independent_frame());
        assert_eq!(back.capture_timestamp(), Some(1_234_567_890_000));
        assert_eq!(back.video_config().unwrap().bytes(), &[0x01, 0x42, 0xc0, 0x1e]);
        assert_eq!(back.payload.bytes(), &payload[..]);
        let marking = back.frame_marking().unwrap();
        assert!(marking.base_layer_sync);
        assert!(!marking.discardable);
        assert_eq!(marking.temporal_id, 0);
        assert_eq!(marking.spatial_id, 0);

        // Split and concatenated forms agree.
        let concat = obj.encode_concatenated().unwrap();
        assert_eq!(concat.len(), headers.len() + body.len());
        assert_eq!(&concat[..headers.len()], &headers[..]);
    }

    #[test]
    fn audio_level_wire_format() {
        let mut obj = LocObject::new(MediaKind::Audio, vec![0u8; 160]);
        obj.push_extension(LocHeaderExtension::AudioLevel(AudioLevel::new(true, 45).unwrap()));

        let headers = obj.encode_headers().unwrap();
        // Id 6, then varint (45 << 1) | 1 = 91 = 0x5b.
        assert_eq!(headers, vec![0x06, 0x5b]);

        let back = LocObject::decode(&headers, &[], MediaKind::Audio).unwrap();
        let level = back.audio_level().unwrap();
        assert!(level.voice_activity);
        assert_eq!(level.level, 45);
        assert!(back.is_independent_frame());
    }

    #[test]
    fn parity_rules() {
        // Even id: no length prefix. Odd id: length prefix.
        let mut obj = LocObject::new(MediaKind::Video, Vec::new());
        obj.push_extension(LocHeaderExtension::CaptureTimestamp(CaptureTimestamp::new(63)));
        obj.push_extension(LocHeaderExtension::VideoConfig(VideoConfig::new(vec![9u8; 3])));
        let headers = obj.encode_headers().unwrap();
        // [id 2][varint 63] [id 13][len 3][3 bytes]
        assert_eq!(headers, vec![0x02, 0x3f, 0x0d, 0x03, 9, 9, 9]);
    }

    #[test]
    fn unknown_extensions_roundtrip() {
        // Unknown even id 8 (one varint), unknown odd id 9 (bytes).
        let headers = vec![0x08, 0x2a, 0x09, 0x02, 0xaa, 0xbb];
        let obj = LocObject::decode(&headers, &[], MediaKind::Video).unwrap();

        assert_eq!(obj.extensions.len(), 2);
        assert_eq!(obj.warnings.len(), 2);
        match &obj.extensions[0] {
            LocHeaderExtension::Unknown { id: 8, value: UnknownValue::Varint(42) } => {},
            other => panic!("expected unknown varint extension, got {:?}", other),
        }
        match &obj.extensions[1] {
            LocHeaderExtension::Unknown { id: 9, value: UnknownValue::Bytes(d) } => {
                assert_eq!(d.bytes(), &[0xaa, 0xbb]);
            },
            other => panic!("expected unknown bytes extension, got {:?}", other),
        }

        // And they re-encode to the original block.
        assert_eq!(obj.encode_headers().unwrap(), headers);
    }

    #[test]
    fn truncated_extension_value() {
        // Odd id 13 declares 10 bytes but only 2 follow.
        let headers = vec![0x0d, 0x0a, 0x01, 0x02];
        assert!(LocObject::decode(&headers, &[], MediaKind::Video).is_err());
    }

    #[test]
    fn marking_and_level_domains() {
        assert!(VideoFrameMarking::new(true, false, false, 8, 0).is_err());
        assert!(VideoFrameMarking::new(true, false, false, 0, 4).is_err());
        assert!(AudioLevel::new(false, 128).is_err());
        let m = VideoFrameMarking::new(false, true, false, 7, 3).unwrap();
        assert_eq!(m, VideoFrameMarking::from_value(m.to_value()));
    }

    #[test]
    fn video_without_marking_is_not_independent() {
        let obj = LocObject::new(MediaKind::Video, vec![1u8, 2, 3]);
        assert!(!obj.is_independent_frame());
    }
}
