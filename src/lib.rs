//! Read and write CMAF fragments and MoQ LOC objects.
//!
//! This crate is the container layer of a Media-over-QUIC pipeline. It
//! codes two wire formats:
//!
//! - CMAF chunks: the `styp` + `moof` + `mdat` box triad of ISO/IEC
//!   14496-12, plus the matching `ftyp` + `moov` initialization
//!   segment.
//! - LOC objects (draft-ietf-moq-loc): an encoded frame with a list of
//!   varint-tagged header extensions.
//!
//! Everything is byte slices in and typed trees out, or the other way
//! around. There is no I/O and no shared state; the transport that
//! moves the bytes and the codecs that fill the payloads live
//! elsewhere.
//!
//! ```
//! use moqlib::{Fragment, scan_fragments};
//!
//! fn main() -> Result<(), moqlib::Error> {
//!     let one = Fragment::build(1, 1, 0, vec![0u8; 256]).serialize()?;
//!     let two = Fragment::build(1, 2, 1000, vec![1u8; 256]).serialize()?;
//!     let stream = [one, two].concat();
//!
//!     for fragment in scan_fragments(&stream) {
//!         let fragment = fragment?;
//!         println!("fragment {}", fragment.sequence_number());
//!     }
//!     Ok(())
//! }
//! ```
//!
#[macro_use]
mod error;
#[macro_use]
#[doc(hidden)]
pub mod macros;
#[macro_use]
pub mod serialize;
#[macro_use]
pub mod types;
pub mod boxes;
pub mod fragment;
pub mod io;
pub mod loc;
pub mod mp4box;
pub mod stream;
pub mod varint;

pub use crate::error::{Error, Result, Warning};
pub use crate::fragment::{Fragment, InitSegment, TrackConfig};
pub use crate::loc::{LocHeaderExtension, LocObject, MediaKind};
pub use crate::stream::{scan_fragments, FragmentScanner};
pub use crate::varint::Varint;
