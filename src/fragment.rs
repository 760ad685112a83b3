//! CMAF fragments and initialization segments.
//!
//! A CMAF chunk is the `styp` + `moof` + `mdat` triad; the matching
//! initialization segment is `ftyp` + `moov`. Both are plain
//! concatenations of top-level boxes, so decoding is a box walk over
//! the buffer and encoding writes the members in order.
//!
use crate::boxes::*;
use crate::error::{Result, Warning};
use crate::io::{MemBuffer, SliceReader};
use crate::mp4box::BoxInfo;
use crate::serialize::{BoxBytes, FromBytes, ReadBytes, ToBytes, WriteBytes};
use crate::types::{Data, Duration_, FixedFloat16_16, FixedFloat8_8, VersionSizedUint};

// Walk a decoded box tree and report every GenericBox as a warning.
fn collect_unknown(boxes: &[MP4Box], warnings: &mut Vec<Warning>) {
    for b in boxes {
        match b {
            MP4Box::GenericBox(g) => {
                warnings.push(Warning {
                    offset: g.offset,
                    what:   format!("unknown {} box", g.fourcc),
                });
            },
            MP4Box::MovieFragmentBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::TrackFragmentBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::MovieBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::MovieExtendsBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::TrackBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::MediaBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::MediaInformationBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::SampleTableBox(b) => collect_unknown(&b.boxes, warnings),
            MP4Box::DataInformationBox(b) => collect_unknown(&b.boxes, warnings),
            _ => {},
        }
    }
}

/// One CMAF fragment: `styp`, `moof`, `mdat`.
#[derive(Clone, Debug)]
pub struct Fragment {
    pub styp:     SegmentTypeBox,
    pub moof:     MovieFragmentBox,
    pub mdat:     MediaDataBox,
    /// Non-fatal oddities met while decoding (unknown boxes, etc).
    pub warnings: Vec<Warning>,
}

impl Fragment {
    /// Build a minimal one-track fragment around an opaque payload.
    ///
    /// The `styp` is the CMAF one, the `tfhd` uses moof-relative
    /// offsets, and the `tfdt` carries `base_media_decode_time`.
    pub fn build(
        track_id: u32,
        sequence_number: u32,
        base_media_decode_time: u64,
        payload: impl Into<Data>,
    ) -> Fragment {
        let traf = TrackFragmentBox {
            boxes: vec![
                TrackFragmentHeaderBox::new(track_id).to_mp4box(),
                TrackFragmentBaseMediaDecodeTimeBox {
                    base_media_decode_time: VersionSizedUint(base_media_decode_time),
                }
                .to_mp4box(),
            ],
        };
        let moof = MovieFragmentBox {
            boxes: vec![
                MovieFragmentHeaderBox { sequence_number }.to_mp4box(),
                traf.to_mp4box(),
            ],
        };
        Fragment {
            styp: SegmentTypeBox::cmaf(),
            moof,
            mdat: MediaDataBox { data: payload.into() },
            warnings: Vec::new(),
        }
    }

    /// Decode a fragment from a byte buffer.
    ///
    /// The three member boxes may come in any order; unknown top-level
    /// boxes are skipped and recorded as warnings. Duplicates are an
    /// error, and so is a missing member.
    pub fn parse(data: &[u8]) -> Result<Fragment> {
        let mut reader = SliceReader::new(data);
        let mut styp = None;
        let mut moof = None;
        let mut mdat = None;
        let mut warnings = Vec::new();

        while reader.left() >= 8 {
            let offset = reader.pos();
            match MP4Box::from_bytes(&mut reader)? {
                MP4Box::SegmentTypeBox(b) => {
                    if styp.is_some() {
                        return Err(decerr!(Malformed, offset, "second styp box"));
                    }
                    styp = Some(b);
                },
                MP4Box::MovieFragmentBox(b) => {
                    if moof.is_some() {
                        return Err(decerr!(Malformed, offset, "second moof box"));
                    }
                    collect_unknown(&b.boxes, &mut warnings);
                    moof = Some(b);
                },
                MP4Box::MediaDataBox(b) => {
                    if mdat.is_some() {
                        return Err(decerr!(Malformed, offset, "second mdat box"));
                    }
                    mdat = Some(b);
                },
                MP4Box::GenericBox(g) => {
                    warnings.push(Warning {
                        offset: g.offset,
                        what:   format!("unknown {} box", g.fourcc),
                    });
                },
                other => {
                    warnings.push(Warning {
                        offset,
                        what: format!("unexpected {} box at the top level", other.fourcc()),
                    });
                },
            }
        }

        let styp = styp.ok_or_else(|| decerr!(InvariantViolation, "fragment has no styp box"))?;
        let moof = moof.ok_or_else(|| decerr!(InvariantViolation, "fragment has no moof box"))?;
        let mdat = mdat.ok_or_else(|| decerr!(InvariantViolation, "fragment has no mdat box"))?;

        Ok(Fragment {
            styp,
            moof,
            mdat,
            warnings,
        })
    }

    /// Serialize as `styp` + `moof` + `mdat`.
    pub fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        self.styp.to_bytes(stream)?;
        self.moof.to_bytes(stream)?;
        self.mdat.to_bytes(stream)
    }

    /// Serialize into a freshly allocated buffer.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = MemBuffer::new();
        self.to_bytes(&mut buf)?;
        Ok(buf.into_vec())
    }

    /// The `mfhd` sequence number.
    pub fn sequence_number(&self) -> u32 {
        self.moof
            .movie_fragment_header()
            .map(|h| h.sequence_number)
            .unwrap_or(0)
    }

    /// The `tfdt` of the first track fragment, or -1 if there is none.
    pub fn base_media_decode_time(&self) -> i64 {
        self.moof
            .track_fragments()
            .first()
            .and_then(|traf| traf.track_fragment_decode_time())
            .map(|tfdt| tfdt.base_media_decode_time.0 as i64)
            .unwrap_or(-1)
    }

    /// The raw media payload.
    pub fn payload(&self) -> &[u8] {
        self.mdat.bytes()
    }

    /// Check the structural invariants, with the first violation as reason.
    pub fn validate(&self) -> Result<()> {
        if self.moof.movie_fragment_header().is_none() {
            return Err(decerr!(InvariantViolation, "moof has no mfhd box"));
        }
        let trafs = self.moof.track_fragments();
        if trafs.is_empty() {
            return Err(decerr!(InvariantViolation, "moof has no traf boxes"));
        }
        for (idx, traf) in trafs.iter().enumerate() {
            let num_tfhd = iter_box!(&traf.boxes, TrackFragmentHeaderBox).count();
            if num_tfhd != 1 {
                return Err(decerr!(
                    InvariantViolation,
                    "traf {} has {} tfhd boxes",
                    idx,
                    num_tfhd
                ));
            }
            let num_tfdt = iter_box!(&traf.boxes, TrackFragmentBaseMediaDecodeTimeBox).count();
            if num_tfdt > 1 {
                return Err(decerr!(
                    InvariantViolation,
                    "traf {} has {} tfdt boxes",
                    idx,
                    num_tfdt
                ));
            }
        }
        Ok(())
    }

    /// Like [`validate`](Fragment::validate), but logs every problem it finds.
    pub fn is_valid(&self) -> bool {
        self.moof.is_valid()
    }
}

/// Per-track parameters for [`InitSegment::build`].
#[derive(Clone, Debug)]
pub struct TrackConfig {
    pub track_id:  u32,
    pub timescale: u32,
    pub entry:     SampleEntry,
}

/// An initialization segment: `ftyp` + `moov`.
///
/// The builder produces structurally correct but minimally populated
/// headers for fragmented profiles; the sample tables are empty and the
/// per-sample information lives in the fragments.
#[derive(Clone, Debug)]
pub struct InitSegment {
    pub ftyp:     FileTypeBox,
    pub moov:     MovieBox,
    /// Non-fatal oddities met while decoding (unknown boxes, etc).
    pub warnings: Vec<Warning>,
}

impl InitSegment {
    /// Build an init segment describing the given tracks.
    pub fn build(tracks: &[TrackConfig]) -> InitSegment {
        let next_track_id = tracks.iter().map(|t| t.track_id).max().unwrap_or(0) + 1;
        let mut moov_boxes = vec![MovieHeaderBox {
            next_track_id,
            ..MovieHeaderBox::default()
        }
        .to_mp4box()];

        let mut mvex_boxes = Vec::new();
        for track in tracks {
            moov_boxes.push(build_track(track).to_mp4box());
            mvex_boxes.push(
                TrackExtendsBox {
                    track_id: track.track_id,
                    ..TrackExtendsBox::default()
                }
                .to_mp4box(),
            );
        }
        moov_boxes.push(MovieExtendsBox { boxes: mvex_boxes }.to_mp4box());

        InitSegment {
            ftyp:     FileTypeBox::fragmented(),
            moov:     MovieBox { boxes: moov_boxes },
            warnings: Vec::new(),
        }
    }

    /// Decode an init segment from a byte buffer.
    pub fn parse(data: &[u8]) -> Result<InitSegment> {
        let mut reader = SliceReader::new(data);
        let mut ftyp = None;
        let mut moov = None;
        let mut warnings = Vec::new();

        while reader.left() >= 8 {
            let offset = reader.pos();
            match MP4Box::from_bytes(&mut reader)? {
                MP4Box::FileTypeBox(b) => {
                    if ftyp.is_some() {
                        return Err(decerr!(Malformed, offset, "second ftyp box"));
                    }
                    ftyp = Some(b);
                },
                MP4Box::MovieBox(b) => {
                    if moov.is_some() {
                        return Err(decerr!(Malformed, offset, "second moov box"));
                    }
                    collect_unknown(&b.boxes, &mut warnings);
                    moov = Some(b);
                },
                MP4Box::GenericBox(g) => {
                    warnings.push(Warning {
                        offset: g.offset,
                        what:   format!("unknown {} box", g.fourcc),
                    });
                },
                other => {
                    warnings.push(Warning {
                        offset,
                        what: format!("unexpected {} box at the top level", other.fourcc()),
                    });
                },
            }
        }

        let ftyp = ftyp.ok_or_else(|| decerr!(InvariantViolation, "init segment has no ftyp box"))?;
        let moov = moov.ok_or_else(|| decerr!(InvariantViolation, "init segment has no moov box"))?;

        Ok(InitSegment {
            ftyp,
            moov,
            warnings,
        })
    }

    /// Serialize as `ftyp` + `moov`.
    pub fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        self.ftyp.to_bytes(stream)?;
        self.moov.to_bytes(stream)
    }

    /// Serialize into a freshly allocated buffer.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = MemBuffer::new();
        self.to_bytes(&mut buf)?;
        Ok(buf.into_vec())
    }

    /// Check the structural invariants, with the first violation as reason.
    pub fn validate(&self) -> Result<()> {
        if self.moov.movie_header().is_none() {
            return Err(decerr!(InvariantViolation, "moov has no mvhd box"));
        }
        let tracks = self.moov.tracks();
        if tracks.is_empty() {
            return Err(decerr!(InvariantViolation, "moov has no trak boxes"));
        }
        for track in &tracks {
            let id = track.track_id().unwrap_or(0);
            let media = track
                .media()
                .ok_or_else(|| decerr!(InvariantViolation, "trak {} has no mdia box", id))?;
            if track.track_header().is_none() {
                return Err(decerr!(InvariantViolation, "trak {} has no tkhd box", id));
            }
            if media.handler().is_none() {
                return Err(decerr!(InvariantViolation, "trak {} has no hdlr box", id));
            }
            let minf = media
                .media_info()
                .ok_or_else(|| decerr!(InvariantViolation, "trak {} has no minf box", id))?;
            if first_box!(&minf.boxes, SampleTableBox).is_none() {
                return Err(decerr!(InvariantViolation, "trak {} has no stbl box", id));
            }
        }
        Ok(())
    }

    /// Like [`validate`](InitSegment::validate), but logs every problem it finds.
    pub fn is_valid(&self) -> bool {
        self.moov.is_valid()
    }
}

// One trak for the init segment.
fn build_track(config: &TrackConfig) -> TrackBox {
    let mut tkhd = TrackHeaderBox {
        track_id: config.track_id,
        ..TrackHeaderBox::default()
    };

    let handler;
    let header;
    match &config.entry {
        SampleEntry::Visual(v) => {
            tkhd.width = FixedFloat16_16::from_integer(v.width as u32);
            tkhd.height = FixedFloat16_16::from_integer(v.height as u32);
            handler = HandlerBox::new("vide", "VideoHandler");
            header = VideoMediaHeaderBox::default().to_mp4box();
        },
        SampleEntry::Audio(_) => {
            tkhd.volume = FixedFloat8_8::from_integer(1);
            handler = HandlerBox::new("soun", "SoundHandler");
            header = SoundMediaHeaderBox::default().to_mp4box();
        },
        SampleEntry::Generic(_) => {
            handler = HandlerBox::new("meta", "DataHandler");
            header = NullMediaHeaderBox::default().to_mp4box();
        },
    }

    let stbl = SampleTableBox::fragmented(SampleDescriptionBox::with_entry(config.entry.clone()));
    let minf = MediaInformationBox {
        boxes: vec![header, DataInformationBox::default().to_mp4box(), stbl.to_mp4box()],
    };

    let mdhd = MediaHeaderBox {
        timescale: config.timescale,
        duration: Duration_::default(),
        ..MediaHeaderBox::default()
    };

    let mdia = MediaBox {
        boxes: vec![mdhd.to_mp4box(), handler.to_mp4box(), minf.to_mp4box()],
    };

    TrackBox {
        boxes: vec![tkhd.to_mp4box(), mdia.to_mp4box()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_video_fragment() {
        let mut payload = Vec::new();
        for _ in 0..4 {
            payload.extend((0u16..256).map(|b| b as u8));
        }
        let frag = Fragment::build(1, 42, 42 * 1000, payload.clone());
        let data = frag.serialize().unwrap();

        let back = Fragment::parse(&data).unwrap();
        assert_eq!(back.sequence_number(), 42);
        assert_eq!(back.base_media_decode_time(), 42000);
        assert_eq!(back.payload().len(), 1024);
        assert_eq!(back.payload(), &payload[..]);
        assert!(back.validate().is_ok());
        assert!(back.warnings.is_empty());

        // Total length is the sum of the three box sizes.
        let total = back.styp.clone().to_mp4box().size()
            + back.moof.clone().to_mp4box().size()
            + back.mdat.clone().to_mp4box().size();
        assert_eq!(data.len() as u64, total);
    }

    #[test]
    fn missing_mdat_is_rejected() {
        let frag = Fragment::build(1, 1, 0, vec![0u8; 16]);
        let mut data = frag.serialize().unwrap();
        // Chop off the mdat.
        let mdat_len = frag.mdat.clone().to_mp4box().size() as usize;
        data.truncate(data.len() - mdat_len);
        match Fragment::parse(&data) {
            Err(crate::Error::InvariantViolation { .. }) => {},
            other => panic!("expected InvariantViolation, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unknown_top_level_box_is_a_warning() {
        let frag = Fragment::build(1, 1, 0, vec![0u8; 16]);
        let mut data = frag.serialize().unwrap();
        // Append a "free"-style unknown box.
        data.extend_from_slice(&12u32.to_be_bytes());
        data.extend_from_slice(b"zzzz");
        data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        let back = Fragment::parse(&data).unwrap();
        assert!(back.validate().is_ok());
        assert_eq!(back.warnings.len(), 1);
        assert!(back.warnings[0].what.contains("zzzz"));
    }

    #[test]
    fn init_segment_roundtrip() {
        let video = TrackConfig {
            track_id:  1,
            timescale: 90000,
            entry:     SampleEntry::Visual(VisualSampleEntry::new(
                "avc1",
                1920,
                1080,
                &[0x01u8, 0x64, 0x00, 0x28][..],
            )),
        };
        let audio = TrackConfig {
            track_id:  2,
            timescale: 48000,
            entry:     SampleEntry::Audio(AudioSampleEntry::new("opus", 2, 48000, Vec::new())),
        };
        let init = InitSegment::build(&[video, audio]);
        assert!(init.validate().is_ok());

        let data = init.serialize().unwrap();
        let back = InitSegment::parse(&data).unwrap();
        assert!(back.validate().is_ok());
        assert!(back.warnings.is_empty());

        let tracks = back.moov.tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_id(), Some(1));
        assert_eq!(tracks[1].track_id(), Some(2));
        assert!(tracks[0].media().unwrap().handler().unwrap().is_video());
        assert!(tracks[1].media().unwrap().handler().unwrap().is_audio());

        // Re-encode is byte equal.
        assert_eq!(back.serialize().unwrap(), data);
    }
}
