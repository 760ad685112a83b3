use crate::boxes::prelude::*;

def_box! {
    /// 8.3.2 Track Header Box (ISO/IEC 14496-12:2015(E))
    ///
    /// Volume defaults to 1.0 for audio tracks and 0 otherwise.
    TrackHeaderBox {
        flags:      TrackFlags,
        cr_time:    Time,
        mod_time:   Time,
        track_id:   u32,
        skip:       4,
        duration:   Duration_,
        skip:       8,
        layer:      u16,
        alt_group:  u16,
        volume:     FixedFloat8_8,
        skip:       2,
        matrix:     Matrix,
        width:      FixedFloat16_16,
        height:     FixedFloat16_16,
    },
    fourcc => "tkhd",
    version => [1, flags, cr_time, mod_time, duration],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

impl Default for TrackHeaderBox {
    fn default() -> TrackHeaderBox {
        let mut flags = TrackFlags(0);
        flags.set_enabled(true);
        flags.set_in_movie(true);
        TrackHeaderBox {
            flags,
            cr_time: Time::default(),
            mod_time: Time::default(),
            track_id: 1,
            duration: Duration_::default(),
            layer: 0,
            alt_group: 0,
            volume: FixedFloat8_8(0),
            matrix: Matrix::unity(),
            width: FixedFloat16_16(0),
            height: FixedFloat16_16(0),
        }
    }
}

impl_flags!(
    /// Track: enabled/in_movie/preview
    TrackFlags
);

impl TrackFlags {
    pub fn get_enabled(&self) -> bool {
        self.get(0)
    }
    pub fn set_enabled(&mut self, on: bool) {
        self.set(0, on)
    }
    pub fn get_in_movie(&self) -> bool {
        self.get(1)
    }
    pub fn set_in_movie(&mut self, on: bool) {
        self.set(1, on)
    }
    pub fn get_in_preview(&self) -> bool {
        self.get(2)
    }
    pub fn set_in_preview(&mut self, on: bool) {
        self.set(2, on)
    }
}

impl std::fmt::Debug for TrackFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut v = vec!["["];
        if self.get_enabled() {
            v.push("enabled");
        }
        if self.get_in_movie() {
            v.push("in_movie");
        }
        if self.get_in_preview() {
            v.push("in_preview");
        }
        v.push("]");
        write!(f, "TrackFlags({})", v.join(" "))
    }
}
