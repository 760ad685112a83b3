use crate::boxes::prelude::*;

def_box! {
    /// 8.7.1 Data Information Box (ISO/IEC 14496-12:2015(E))
    DataInformationBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "dinf",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl Default for DataInformationBox {
    fn default() -> DataInformationBox {
        DataInformationBox {
            boxes: vec![DataReferenceBox::default().to_mp4box()],
        }
    }
}

def_box! {
    /// 8.7.2 Data Reference Box (ISO/IEC 14496-12:2015(E))
    DataReferenceBox {
        flags:          DataEntryFlags,
        entries:        ArraySized32<MP4Box>,
    },
    fourcc => "dref",
    version => [0, flags],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

impl Default for DataReferenceBox {
    fn default() -> DataReferenceBox {
        let mut entries = ArraySized32::new();
        entries.push(DataEntryUrlBox::default().to_mp4box());
        DataReferenceBox {
            flags: DataEntryFlags(0),
            entries,
        }
    }
}

def_box! {
    /// 8.7.2 Data Entry Url Box (ISO/IEC 14496-12:2015(E))
    ///
    /// With flag bit 0 set it is a self-reference and the location is empty.
    #[derive(Default)]
    DataEntryUrlBox {
        flags:          DataEntryFlags,
        location:       ZString,
    },
    fourcc => "url ",
    version => [0, flags],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

impl_flags!(
    /// 0x01 if the data is in the same file (default).
    DataEntryFlags
);

impl DataEntryFlags {
    pub fn get_in_same_file(&self) -> bool {
        self.get(0)
    }
    pub fn set_in_same_file(&mut self, on: bool) {
        self.set(0, on)
    }
}

impl std::fmt::Debug for DataEntryFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut v = vec!["["];
        if self.get_in_same_file() {
            v.push("in_same_file");
        }
        v.push("]");
        write!(f, "DataEntryFlags({})", v.join(" "))
    }
}

impl Default for DataEntryFlags {
    fn default() -> Self {
        Self(0x01)
    }
}
