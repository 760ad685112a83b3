use crate::boxes::prelude::*;
use crate::boxes::{MediaBox, TrackHeaderBox};

def_box! {
    /// 8.3.1 Track Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    TrackBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "trak",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl TrackBox {
    /// Get a reference to this track's TrackHeaderBox.
    pub fn track_header(&self) -> Option<&TrackHeaderBox> {
        first_box!(&self.boxes, TrackHeaderBox)
    }

    /// Get a reference to this track's MediaBox.
    pub fn media(&self) -> Option<&MediaBox> {
        first_box!(&self.boxes, MediaBox)
    }

    /// Get the track id.
    pub fn track_id(&self) -> Option<u32> {
        self.track_header().map(|th| th.track_id)
    }

    /// Check if this track has its header and media boxes.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if self.track_header().is_none() {
            log::error!("TrackBox: no TrackHeaderBox present");
            valid = false;
        }
        match self.media() {
            Some(m) => {
                if !m.is_valid() {
                    valid = false;
                }
            },
            None => {
                log::error!("TrackBox: no MediaBox present");
                valid = false;
            },
        }
        valid
    }
}
