use crate::boxes::prelude::*;

def_box! {
    /// 4.3 File Type Box (ISO/IEC 14496-12:2015(E))
    FileTypeBox {
        major_brand:        FourCC,
        minor_version:      u32,
        compatible_brands:  Vec<FourCC>,
    },
    fourcc => "ftyp",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl FileTypeBox {
    /// The `ftyp` box of a fragmented-profile initialization segment.
    pub fn fragmented() -> FileTypeBox {
        FileTypeBox {
            major_brand:       FourCC::new("iso6"),
            minor_version:     0,
            compatible_brands: vec![FourCC::new("cmfc"), FourCC::new("iso6")],
        }
    }
}

def_box! {
    /// 8.16.2 Segment Type Box (ISO/IEC 14496-12:2015(E))
    SegmentTypeBox {
        major_brand:        FourCC,
        minor_version:      u32,
        compatible_brands:  Vec<FourCC>,
    },
    fourcc => "styp",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl SegmentTypeBox {
    /// The `styp` box of a CMAF chunk: `cmf2` with `cmfc` and `iso6`.
    pub fn cmaf() -> SegmentTypeBox {
        SegmentTypeBox {
            major_brand:       FourCC::new("cmf2"),
            minor_version:     0,
            compatible_brands: vec![FourCC::new("cmfc"), FourCC::new("iso6")],
        }
    }
}

impl Default for SegmentTypeBox {
    fn default() -> SegmentTypeBox {
        SegmentTypeBox::cmaf()
    }
}

def_box! {
    /// 8.8.5 Movie Fragment Header Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    MovieFragmentHeaderBox {
        sequence_number:    u32,
    },
    fourcc => "mfhd",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

def_box! {
    /// 8.8.12 Track Fragment Base Media Decode Time Box (ISO/IEC 14496-12:2015(E))
    ///
    /// Always written as version 1. Both versions are accepted on read.
    #[derive(Default)]
    TrackFragmentBaseMediaDecodeTimeBox {
        base_media_decode_time: VersionSizedUint,
    },
    fourcc => "tfdt",
    version => [1],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

def_box! {
    /// 8.2.2 Movie Header Box (ISO/IEC 14496-12:2015(E))
    MovieHeaderBox {
        cr_time:    Time,
        mod_time:   Time,
        timescale:  u32,
        duration:   Duration_,
        pref_rate:  FixedFloat16_16,
        pref_vol:   FixedFloat8_8,
        skip:       10,
        matrix:     Matrix,
        // The next 6 32-bit values are "pre_defined" in ISO/IEC 14496-12:2015,
        // but they appear to be the following:
        preview_time:       u32,
        preview_duration:   u32,
        poster_time:        u32,
        selection_time:     u32,
        selection_duration: u32,
        current_time:       u32,
        //
        next_track_id: u32,
    },
    fourcc => "mvhd",
    version => [1, cr_time, mod_time, duration],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

impl Default for MovieHeaderBox {
    fn default() -> MovieHeaderBox {
        MovieHeaderBox {
            cr_time:            Time::default(),
            mod_time:           Time::default(),
            timescale:          1000,
            duration:           Duration_::default(),
            pref_rate:          FixedFloat16_16::from_integer(1),
            pref_vol:           FixedFloat8_8::from_integer(1),
            matrix:             Matrix::unity(),
            preview_time:       0,
            preview_duration:   0,
            poster_time:        0,
            selection_time:     0,
            selection_duration: 0,
            current_time:       0,
            next_track_id:      2,
        }
    }
}

def_box! {
    /// 8.4.2 Media Header Box (ISO/IEC 14496-12:2015(E))
    MediaHeaderBox {
        cr_time:    Time,
        mod_time:   Time,
        timescale:  u32,
        duration:   Duration_,
        language:   IsoLanguageCode,
        quality:    u16,
    },
    fourcc => "mdhd",
    version => [1, cr_time, mod_time, duration],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

impl Default for MediaHeaderBox {
    fn default() -> MediaHeaderBox {
        MediaHeaderBox {
            cr_time:   Time::default(),
            mod_time:  Time::default(),
            timescale: 1000,
            duration:  Duration_::default(),
            language:  IsoLanguageCode::default(),
            quality:   0,
        }
    }
}

def_box! {
    /// 12.2.2 Sound Media Header Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    SoundMediaHeaderBox {
        balance:        u16,
        skip:           2,
    },
    fourcc => "smhd",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

def_box! {
    /// 8.4.5.2 Null Media Header Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    NullMediaHeaderBox {
    },
    fourcc => "nmhd",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

def_box! {
    /// 8.8.1 Movie Extends Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    MovieExtendsBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "mvex",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

def_box! {
    /// 8.8.3 Track Extends Box (ISO/IEC 14496-12:2015(E))
    TrackExtendsBox {
        track_id:                           u32,
        default_sample_description_index:   u32,
        default_sample_duration:            u32,
        default_sample_size:                u32,
        default_sample_flags:               SampleFlags,
    },
    fourcc => "trex",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

// Default needs to set sample_description_index to 1.
impl Default for TrackExtendsBox {
    fn default() -> TrackExtendsBox {
        TrackExtendsBox {
            track_id: 0,
            default_sample_description_index: 1,
            default_sample_duration: 0,
            default_sample_size: 0,
            default_sample_flags: SampleFlags::default(),
        }
    }
}
