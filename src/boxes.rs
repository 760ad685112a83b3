//! All the boxes we know.
//!
//! This module does not only contain boxes, but also the types that are
//! used in the boxes, and the `MP4Box` enum that ties them together.
//!
use std::fmt::Debug;

pub(crate) mod misc;
pub(crate) mod prelude;

pub use self::misc::*;
use self::prelude::*;

use crate::mp4box::{BoxHeader, GenericBox};

def_boxes! {
    FileTypeBox, b"ftyp";
    SegmentTypeBox, b"styp";
    MovieFragmentHeaderBox, b"mfhd";
    TrackFragmentBaseMediaDecodeTimeBox, b"tfdt";
    MovieHeaderBox, b"mvhd";
    MediaHeaderBox, b"mdhd";
    SoundMediaHeaderBox, b"smhd";
    NullMediaHeaderBox, b"nmhd";
    MovieExtendsBox, b"mvex";
    TrackExtendsBox, b"trex";

    // Below are boxes that are defined in boxes/ *.rs
    DataInformationBox, b"dinf" => dinf;
    DataReferenceBox, b"dref";
    DataEntryUrlBox, b"url ";

    HandlerBox, b"hdlr" => hdlr;
    MediaBox, b"mdia" => mdia;
    MediaDataBox, b"mdat" => mdat;
    MediaInformationBox, b"minf" => minf;
    VideoMediaHeaderBox, b"vmhd";

    MovieBox, b"moov" => moov;
    MovieFragmentBox, b"moof" => moof;

    SampleDescriptionBox, b"stsd" => stsd;
    SampleTableBox, b"stbl" => stbl;
    TimeToSampleBox, b"stts";
    SampleToChunkBox, b"stsc";
    SampleSizeBox, b"stsz";
    ChunkOffsetBox, b"stco";

    TrackBox, b"trak" => trak;
    TrackHeaderBox, b"tkhd" => tkhd;
    TrackFragmentBox, b"traf" => traf;
    TrackFragmentHeaderBox, b"tfhd" => tfhd;
    TrackRunBox, b"trun" => trun;
}
