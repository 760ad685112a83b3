//
// Stream scanner tests: re-synchronising concatenated fragments.
//

use moqlib::{scan_fragments, Fragment};

fn fragment_bytes(seq: u32, fill: u8, len: usize) -> Vec<u8> {
    Fragment::build(1, seq, seq as u64 * 1000, vec![fill; len])
        .serialize()
        .unwrap()
}

#[test]
fn two_back_to_back_fragments() {
    let mut stream = fragment_bytes(1, 0xaa, 512);
    stream.extend(fragment_bytes(2, 0xbb, 256));

    let frags: Vec<Fragment> = scan_fragments(&stream).map(|f| f.unwrap()).collect();
    assert_eq!(frags.len(), 2);
    assert_eq!(frags[0].sequence_number(), 1);
    assert_eq!(frags[1].sequence_number(), 2);
    assert!(frags[0].validate().is_ok());
    assert!(frags[1].validate().is_ok());
    assert_eq!(frags[0].payload().len(), 512);
    assert_eq!(frags[1].payload().len(), 256);
}

#[test]
fn junk_between_fragments_is_skipped() {
    let mut stream = fragment_bytes(1, 0x11, 128);
    stream.extend_from_slice(b"this is not a box at all");
    stream.extend(fragment_bytes(2, 0x22, 128));

    let frags: Vec<Fragment> = scan_fragments(&stream).map(|f| f.unwrap()).collect();
    assert_eq!(frags.len(), 2);
    assert_eq!(frags[0].sequence_number(), 1);
    assert_eq!(frags[1].sequence_number(), 2);
}

#[test]
fn leading_junk_is_skipped() {
    let mut stream = vec![0u8; 37];
    stream.extend(fragment_bytes(5, 0x55, 64));

    let frags: Vec<Fragment> = scan_fragments(&stream).map(|f| f.unwrap()).collect();
    assert_eq!(frags.len(), 1);
    assert_eq!(frags[0].sequence_number(), 5);
}

#[test]
fn styp_without_mdat_yields_nothing() {
    // A lone styp followed by a moof but no mdat.
    let frag = fragment_bytes(1, 0, 32);
    let mdat_start = frag
        .windows(4)
        .position(|w| w == b"mdat")
        .unwrap()
        - 4;
    let cut = &frag[..mdat_start];

    let frags: Vec<_> = scan_fragments(cut).collect();
    assert!(frags.is_empty());
}

#[test]
fn incomplete_first_fragment_does_not_hide_the_second() {
    // First styp's mdat is truncated away; the second fragment is intact.
    let first = fragment_bytes(1, 0x33, 300);
    let mdat_start = first.windows(4).position(|w| w == b"mdat").unwrap() - 4;
    let mut stream = first[..mdat_start].to_vec();
    stream.extend(fragment_bytes(2, 0x44, 64));

    let frags: Vec<Fragment> = scan_fragments(&stream).map(|f| f.unwrap()).collect();
    assert_eq!(frags.len(), 1);
    assert_eq!(frags[0].sequence_number(), 2);
}

#[test]
fn payload_containing_styp_pattern_is_not_resynced_on() {
    // The mdat payload embeds a fake styp header. The declared box
    // sizes must win over the pattern match.
    let mut payload = Vec::new();
    payload.extend_from_slice(&16u32.to_be_bytes());
    payload.extend_from_slice(b"styp");
    payload.extend_from_slice(&[0u8; 8]);
    payload.resize(256, 0);

    let mut stream = Fragment::build(1, 1, 0, payload).serialize().unwrap();
    stream.extend(fragment_bytes(2, 0x99, 32));

    let frags: Vec<Fragment> = scan_fragments(&stream).map(|f| f.unwrap()).collect();
    assert_eq!(frags.len(), 2);
    assert_eq!(frags[0].sequence_number(), 1);
    assert_eq!(frags[1].sequence_number(), 2);
}

#[test]
fn trailing_partial_fragment_is_ignored() {
    let mut stream = fragment_bytes(1, 0x77, 64);
    let second = fragment_bytes(2, 0x88, 64);
    stream.extend_from_slice(&second[..second.len() / 2]);

    let frags: Vec<Fragment> = scan_fragments(&stream).map(|f| f.unwrap()).collect();
    assert_eq!(frags.len(), 1);
    assert_eq!(frags[0].sequence_number(), 1);
}
