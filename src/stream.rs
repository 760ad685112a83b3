//! Re-synchronise a concatenated byte stream to fragment boundaries.
//!
//! A stream recorded off a MoQ track is just CMAF fragments back to
//! back, sometimes with junk in between. The scanner finds each
//! fragment by looking for a plausible `styp` box header, then walks
//! the box sizes to find where the fragment ends.
//!
use std::convert::TryInto;

use crate::error::Result;
use crate::fragment::Fragment;

/// Iterator over the fragments in a concatenated buffer.
///
/// Yields one `Result<Fragment>` per fragment found. Junk between
/// fragments is skipped byte-wise until the next plausible `styp`.
pub struct FragmentScanner<'a> {
    data: &'a [u8],
    pos:  usize,
}

impl<'a> FragmentScanner<'a> {
    pub fn new(data: &'a [u8]) -> FragmentScanner<'a> {
        FragmentScanner { data, pos: 0 }
    }

    // Size and fourcc of the box at `pos`, if the header is plausible.
    fn box_at(&self, pos: usize) -> Option<(usize, &'a [u8])> {
        if pos + 8 > self.data.len() {
            return None;
        }
        let size = u32::from_be_bytes(self.data[pos..pos + 4].try_into().unwrap()) as usize;
        if size < 8 || pos + size > self.data.len() {
            return None;
        }
        Some((size, &self.data[pos + 4..pos + 8]))
    }

    // Find the next offset >= pos where a plausible styp box starts.
    fn find_styp(&self, mut pos: usize) -> Option<usize> {
        while pos + 8 <= self.data.len() {
            match self.data[pos + 4..].iter().position(|&b| b == b's') {
                Some(rel) => {
                    let candidate = pos + rel;
                    if self.box_at(candidate).map(|(_, fourcc)| fourcc) == Some(b"styp") {
                        return Some(candidate);
                    }
                    pos = candidate + 1;
                },
                None => return None,
            }
        }
        None
    }

    // Walk the boxes after the styp at `start`. The fragment ends at
    // the end of the first mdat, at a second styp, or at the end of
    // the buffer. Without an mdat there is no complete fragment.
    fn delimit(&self, start: usize) -> Option<usize> {
        let (styp_size, _) = self.box_at(start)?;
        let mut pos = start + styp_size;
        loop {
            match self.box_at(pos) {
                Some((size, fourcc)) => {
                    if fourcc == b"styp" {
                        return None;
                    }
                    pos += size;
                    if fourcc == b"mdat" {
                        return Some(pos);
                    }
                },
                None => return None,
            }
        }
    }
}

impl<'a> Iterator for FragmentScanner<'a> {
    type Item = Result<Fragment>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(start) = self.find_styp(self.pos) {
            match self.delimit(start) {
                Some(end) => {
                    self.pos = end;
                    return Some(Fragment::parse(&self.data[start..end]));
                },
                None => {
                    // No mdat before the next boundary: not a complete
                    // fragment, keep looking after this styp.
                    self.pos = start + 8;
                },
            }
        }
        None
    }
}

/// Scan a concatenated buffer for CMAF fragments.
pub fn scan_fragments(data: &[u8]) -> FragmentScanner<'_> {
    FragmentScanner::new(data)
}
