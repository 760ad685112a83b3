use crate::boxes::prelude::*;
use crate::boxes::{HandlerBox, MediaHeaderBox, MediaInformationBox};

def_box! {
    /// 8.4.1 Media Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    MediaBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "mdia",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl MediaBox {
    /// Get a reference to the MediaHeaderBox.
    pub fn media_header(&self) -> Option<&MediaHeaderBox> {
        first_box!(&self.boxes, MediaHeaderBox)
    }

    /// Get a reference to the HandlerBox.
    pub fn handler(&self) -> Option<&HandlerBox> {
        first_box!(&self.boxes, HandlerBox)
    }

    /// Get a reference to the MediaInformationBox.
    pub fn media_info(&self) -> Option<&MediaInformationBox> {
        first_box!(&self.boxes, MediaInformationBox)
    }

    /// Check if this MediaBox has its header, handler, and mediainfo boxes.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if self.media_header().is_none() {
            log::error!("MediaBox: no MediaHeaderBox present");
            valid = false;
        }
        if self.handler().is_none() {
            log::error!("MediaBox: no HandlerBox present");
            valid = false;
        }
        match self.media_info() {
            Some(mi) => {
                if !mi.is_valid() {
                    valid = false;
                }
            },
            None => {
                log::error!("MediaBox: no MediaInformationBox present");
                valid = false;
            },
        }
        valid
    }
}
