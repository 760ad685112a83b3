use crate::boxes::prelude::*;
use crate::boxes::{MovieHeaderBox, TrackBox};

def_box! {
    /// 8.2.1 Movie Box (ISO/IEC 14496-12:2015(E))
    #[derive(Default)]
    MovieBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "moov",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl MovieBox {
    /// Get a reference to the list of tracks.
    pub fn tracks(&self) -> Vec<&TrackBox> {
        self.boxes
            .iter()
            .filter_map(|b| match b {
                MP4Box::TrackBox(ref t) => Some(t),
                _ => None,
            })
            .collect::<Vec<_>>()
    }

    /// Get a reference to the MovieHeaderBox.
    pub fn movie_header(&self) -> Option<&MovieHeaderBox> {
        first_box!(&self.boxes, MovieHeaderBox)
    }

    /// Get the track by id.
    pub fn track_by_id(&self, track_id: u32) -> Option<&TrackBox> {
        self.tracks().into_iter().find(|t| t.track_id() == Some(track_id))
    }

    /// Check if this MovieBox has its mandatory children.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if self.tracks().is_empty() {
            log::error!("MovieBox: no TrackBoxes present");
            valid = false;
        }
        if self.movie_header().is_none() {
            log::error!("MovieBox: no MovieHeaderBox present");
            valid = false;
        }
        for t in &self.tracks() {
            if !t.is_valid() {
                valid = false;
            }
        }
        valid
    }
}
