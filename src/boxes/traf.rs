use crate::boxes::prelude::*;
use crate::boxes::{TrackFragmentBaseMediaDecodeTimeBox, TrackFragmentHeaderBox, TrackRunBox};

def_box! {
    /// 8.8.6 Track Fragment Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    TrackFragmentBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "traf",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl TrackFragmentBox {
    declare_box_methods_opt!(
        TrackFragmentHeaderBox,
        track_fragment_header,
        track_fragment_header_mut
    );
    declare_box_methods_opt!(
        TrackFragmentBaseMediaDecodeTimeBox,
        track_fragment_decode_time,
        track_fragment_decode_time_mut
    );

    /// List of Track Run Boxes.
    pub fn track_run_boxes(&self) -> Vec<&TrackRunBox> {
        self.boxes
            .iter()
            .filter_map(|b| match b {
                MP4Box::TrackRunBox(ref t) => Some(t),
                _ => None,
            })
            .collect::<Vec<_>>()
    }

    /// Check the traf: exactly one tfhd, at most one tfdt.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        let num_tfhd = iter_box!(&self.boxes, TrackFragmentHeaderBox).count();
        if num_tfhd != 1 {
            log::error!("TrackFragmentBox: {} TrackFragmentHeaderBoxes present", num_tfhd);
            valid = false;
        }
        let num_tfdt = iter_box!(&self.boxes, TrackFragmentBaseMediaDecodeTimeBox).count();
        if num_tfdt > 1 {
            log::error!(
                "TrackFragmentBox: {} TrackFragmentBaseMediaDecodeTimeBoxes present",
                num_tfdt
            );
            valid = false;
        }
        valid
    }
}
