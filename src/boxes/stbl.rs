use crate::boxes::prelude::*;
use crate::boxes::SampleDescriptionBox;

def_box! {
    /// 8.5.1 Sample Table Box (ISO/IEC 14496-12:2015(E))
    ///
    /// For the fragmented profiles we support, the sample tables other
    /// than the SampleDescriptionBox are present but empty. The actual
    /// sample information lives in each fragment's `trun`.
    #[derive(Default)]
    SampleTableBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "stbl",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl SampleTableBox {
    declare_box_methods!(SampleDescriptionBox, sample_description, sample_description_mut);

    /// A sample table with empty tables, for fragmented files.
    pub fn fragmented(stsd: SampleDescriptionBox) -> SampleTableBox {
        SampleTableBox {
            boxes: vec![
                stsd.to_mp4box(),
                TimeToSampleBox::default().to_mp4box(),
                SampleToChunkBox::default().to_mp4box(),
                SampleSizeBox::default().to_mp4box(),
                ChunkOffsetBox::default().to_mp4box(),
            ],
        }
    }

    /// Check if this SampleTableBox has its mandatory children.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if first_box!(&self.boxes, SampleDescriptionBox).is_none() {
            log::error!("SampleTableBox: no SampleDescriptionBox present");
            valid = false;
        }
        if first_box!(&self.boxes, TimeToSampleBox).is_none() {
            log::error!("SampleTableBox: no TimeToSampleBox present");
            valid = false;
        }
        if first_box!(&self.boxes, SampleToChunkBox).is_none() {
            log::error!("SampleTableBox: no SampleToChunkBox present");
            valid = false;
        }
        if first_box!(&self.boxes, ChunkOffsetBox).is_none() {
            log::error!("SampleTableBox: no ChunkOffsetBox present");
            valid = false;
        }
        valid
    }
}

def_box! {
    /// 8.6.1.2 Time To Sample Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    TimeToSampleBox {
        entries:        ArraySized32<TimeToSampleEntry>,
    },
    fourcc => "stts",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

def_struct! {
    /// Entry in TimeToSampleBox.
    #[derive(Default)]
    TimeToSampleEntry,
        count:  u32,
        delta:  u32,
}

def_box! {
    /// 8.7.4 Sample To Chunk Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    SampleToChunkBox {
        entries:        ArraySized32<SampleToChunkEntry>,
    },
    fourcc => "stsc",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

def_struct! {
    /// Entry in SampleToChunkBox.
    #[derive(Default)]
    SampleToChunkEntry,
        first_chunk:                u32,
        samples_per_chunk:          u32,
        sample_description_index:   u32,
}

def_box! {
    /// 8.7.3.2 Sample Size Box (ISO/IEC 14496-12:2015(E))
    ///
    /// The per-sample table is only on the wire when sample_size is 0.
    #[derive(Default)]
    SampleSizeBox {
        sample_size:    u32,
        count:          u32,
        entries:        ArrayUnsized<u32>,
    },
    fourcc => "stsz",
    version => [0],
    impls => [ boxinfo, debug, fullbox ],
}

impl FromBytes for SampleSizeBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<SampleSizeBox> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;
        let sample_size = u32::from_bytes(stream)?;
        let count = u32::from_bytes(stream)?;
        let mut entries = ArrayUnsized::new();
        if sample_size == 0 {
            while (entries.len() as u32) < count && stream.left() >= 4 {
                entries.push(u32::from_bytes(stream)?);
            }
        }
        Ok(SampleSizeBox {
            sample_size,
            count,
            entries,
        })
    }
    fn min_size() -> usize {
        12
    }
}

impl ToBytes for SampleSizeBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;
        self.sample_size.to_bytes(stream)?;
        if self.sample_size == 0 {
            (self.entries.len() as u32).to_bytes(stream)?;
            for e in self.entries.iter() {
                e.to_bytes(stream)?;
            }
        } else {
            self.count.to_bytes(stream)?;
        }
        stream.finalize()
    }
}

def_box! {
    /// 8.7.5 Chunk Offset Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    ChunkOffsetBox {
        entries:        ArraySized32<u32>,
    },
    fourcc => "stco",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}
