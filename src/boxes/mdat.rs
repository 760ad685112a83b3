use crate::boxes::prelude::*;

def_box! {
    /// 8.1.1 Media Data Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    MediaDataBox {
        data:   Data,
    },
    fourcc => "mdat",
    version => [],
    impls => [ basebox, boxinfo, debug ],
}

impl MediaDataBox {
    pub fn new(data: impl Into<Data>) -> MediaDataBox {
        MediaDataBox { data: data.into() }
    }

    /// Length of the payload in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// The payload.
    pub fn bytes(&self) -> &[u8] {
        self.data.bytes()
    }
}

impl FromBytes for MediaDataBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> Result<MediaDataBox> {
        let mut reader = BoxReader::new(stream)?;
        let size = reader.left();
        let data = Data::read(&mut reader, size as usize)?;
        Ok(MediaDataBox { data })
    }
    fn min_size() -> usize {
        8
    }
}

impl ToBytes for MediaDataBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> Result<()> {
        // The header is written by hand: an mdat can need a large size.
        let fourcc = FourCC::new("mdat");
        let len = self.data.len() as u64;
        if len + 8 > u32::MAX as u64 {
            1u32.to_bytes(stream)?;
            fourcc.to_bytes(stream)?;
            (len + 16).to_bytes(stream)?;
        } else {
            ((len + 8) as u32).to_bytes(stream)?;
            fourcc.to_bytes(stream)?;
        }
        self.data.to_bytes(stream)
    }
}
