use crate::boxes::prelude::*;
use crate::boxes::{DataInformationBox, SampleTableBox};

def_box! {
    /// 8.4.4 Media Information Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    MediaInformationBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "minf",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl MediaInformationBox {
    declare_box_methods!(DataInformationBox, data_information, data_information_mut);
    declare_box_methods!(SampleTableBox, sample_table, sample_table_mut);

    /// Check if this MediaInformationBox has its mandatory children.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if first_box!(&self.boxes, DataInformationBox).is_none() {
            log::error!("MediaInformationBox: no DataInformationBox present");
            valid = false;
        }
        match first_box!(&self.boxes, SampleTableBox) {
            Some(st) => {
                if !st.is_valid() {
                    valid = false;
                }
            },
            None => {
                log::error!("MediaInformationBox: no SampleTableBox present");
                valid = false;
            },
        }
        valid
    }
}

def_box! {
    /// 12.1.2 Video Media Header Box (ISO/IEC 14496-12:2015(E))
    VideoMediaHeaderBox {
        flags:          VideoMediaHeaderFlags,
        graphics_mode:  u16,
        opcolor:        OpColor,
    },
    fourcc => "vmhd",
    version => [0, flags],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

impl Default for VideoMediaHeaderBox {
    fn default() -> VideoMediaHeaderBox {
        VideoMediaHeaderBox {
            flags:         VideoMediaHeaderFlags::default(),
            graphics_mode: 0,
            opcolor:       OpColor::default(),
        }
    }
}

impl_flags!(
    /// Always 0x01.
    VideoMediaHeaderFlags,
    debug
);

impl Default for VideoMediaHeaderFlags {
    fn default() -> Self {
        Self(0x01)
    }
}

def_struct! {
    /// OpColor
    #[derive(Default)]
    OpColor,
        red:    u16,
        green:  u16,
        blue:   u16,
}
