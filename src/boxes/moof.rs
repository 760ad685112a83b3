use crate::boxes::prelude::*;
use crate::boxes::{MovieFragmentHeaderBox, TrackFragmentBox};

def_box! {
    /// 8.8.4 Movie Fragment Box (ISO/IEC 14496-12:2015(E))
    ///
    /// Contains:
    /// - `1  ` MovieFragmentHeaderBox
    /// - `1+ ` TrackFragmentBox
    ///
    #[derive(Default)]
    MovieFragmentBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "moof",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl MovieFragmentBox {
    /// Get a reference to the MovieFragmentHeaderBox.
    pub fn movie_fragment_header(&self) -> Option<&MovieFragmentHeaderBox> {
        first_box!(&self.boxes, MovieFragmentHeaderBox)
    }

    /// Get a reference to the list of track fragments.
    pub fn track_fragments(&self) -> Vec<&TrackFragmentBox> {
        self.boxes
            .iter()
            .filter_map(|b| match b {
                MP4Box::TrackFragmentBox(ref t) => Some(t),
                _ => None,
            })
            .collect::<Vec<_>>()
    }

    /// Check if this MovieFragmentBox has its mandatory children.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if self.movie_fragment_header().is_none() {
            log::error!("MovieFragmentBox: no MovieFragmentHeaderBox present");
            valid = false;
        }
        let trafs = self.track_fragments();
        if trafs.is_empty() {
            log::error!("MovieFragmentBox: no TrackFragmentBox present");
            valid = false;
        }
        for traf in &trafs {
            if !traf.is_valid() {
                valid = false;
            }
        }
        valid
    }
}
