//
// CMAF fragment round-trip and boundary tests.
//

use moqlib::boxes::*;
use moqlib::io::SliceReader;
use moqlib::mp4box::read_boxes;
use moqlib::types::VersionSizedUint;
use moqlib::{Fragment, InitSegment, TrackConfig};

fn test_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// Position of the version byte of the first box with this fourcc.
fn version_byte(data: &[u8], fourcc: &[u8; 4]) -> Option<u8> {
    data.windows(4)
        .position(|w| w == fourcc)
        .map(|idx| data[idx + 4])
}

#[test]
fn empty_mdat_roundtrips() {
    let frag = Fragment::build(1, 9, 9000, Vec::new());
    let data = frag.serialize().unwrap();
    let back = Fragment::parse(&data).unwrap();
    assert_eq!(back.payload().len(), 0);
    assert!(back.validate().is_ok());
    assert_eq!(back.serialize().unwrap(), data);
}

#[test]
fn one_mib_mdat_roundtrips_byte_for_byte() {
    let payload = test_payload(1 << 20);
    let frag = Fragment::build(1, 1, 0, payload.clone());
    let data = frag.serialize().unwrap();
    let back = Fragment::parse(&data).unwrap();
    assert_eq!(back.payload(), &payload[..]);
    assert_eq!(back.serialize().unwrap(), data);
}

#[test]
fn eight_mib_payload_in_a_single_call() {
    let payload = test_payload(8 << 20);
    let frag = Fragment::build(1, 77, 0, payload.clone());
    let data = frag.serialize().unwrap();
    let back = Fragment::parse(&data).unwrap();
    assert_eq!(back.payload().len(), 8 << 20);
    assert_eq!(back.sequence_number(), 77);
}

#[test]
fn first_four_bytes_are_the_box_size() {
    let frag = Fragment::build(1, 5, 0, test_payload(64));
    let data = frag.serialize().unwrap();
    let styp_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as u64;
    assert_eq!(styp_size, frag.styp.to_mp4box().size());
}

#[test]
fn styp_carries_the_cmaf_brands() {
    let frag = Fragment::build(1, 1, 0, Vec::new());
    assert_eq!(frag.styp.major_brand, b"cmf2");
    assert_eq!(frag.styp.minor_version, 0);
    assert_eq!(frag.styp.compatible_brands.len(), 2);
    assert_eq!(frag.styp.compatible_brands[0], b"cmfc");
    assert_eq!(frag.styp.compatible_brands[1], b"iso6");
}

#[test]
fn tfdt_is_always_written_as_version_1() {
    // Small value still gets version 1.
    let frag = Fragment::build(1, 1, 1000, Vec::new());
    let data = frag.serialize().unwrap();
    assert_eq!(version_byte(&data, b"tfdt"), Some(1));

    // And values beyond 32 bits survive.
    let big = 1u64 << 33;
    let frag = Fragment::build(1, 2, big, Vec::new());
    let data = frag.serialize().unwrap();
    assert_eq!(version_byte(&data, b"tfdt"), Some(1));
    let back = Fragment::parse(&data).unwrap();
    assert_eq!(back.base_media_decode_time(), big as i64);
}

#[test]
fn version_0_tfdt_is_accepted_on_read() {
    let frag = Fragment::build(1, 3, 5000, Vec::new());
    let mut data = frag.serialize().unwrap();

    // Rewrite the tfdt by hand as version 0: 4 byte decode time.
    let idx = data.windows(4).position(|w| w == b"tfdt").unwrap();
    let start = idx - 4;
    let old_size = u32::from_be_bytes([data[start], data[start + 1], data[start + 2], data[start + 3]]);
    assert_eq!(old_size, 20); // 8 header + 4 version/flags + 8 time
    let mut v0 = Vec::new();
    v0.extend_from_slice(&16u32.to_be_bytes());
    v0.extend_from_slice(b"tfdt");
    v0.extend_from_slice(&0u32.to_be_bytes());
    v0.extend_from_slice(&5000u32.to_be_bytes());
    data.splice(start..start + 20, v0);

    // The enclosing traf and moof sizes shrank by 4.
    let moof_idx = data.windows(4).position(|w| w == b"moof").unwrap() - 4;
    let moof_size = u32::from_be_bytes([
        data[moof_idx],
        data[moof_idx + 1],
        data[moof_idx + 2],
        data[moof_idx + 3],
    ]);
    data[moof_idx..moof_idx + 4].copy_from_slice(&(moof_size - 4).to_be_bytes());
    let traf_idx = data.windows(4).position(|w| w == b"traf").unwrap() - 4;
    let traf_size = u32::from_be_bytes([
        data[traf_idx],
        data[traf_idx + 1],
        data[traf_idx + 2],
        data[traf_idx + 3],
    ]);
    data[traf_idx..traf_idx + 4].copy_from_slice(&(traf_size - 4).to_be_bytes());

    let back = Fragment::parse(&data).unwrap();
    assert_eq!(back.base_media_decode_time(), 5000);
}

#[test]
fn truncated_fragment_reports_truncated() {
    let frag = Fragment::build(1, 1, 0, test_payload(512));
    let data = frag.serialize().unwrap();
    match Fragment::parse(&data[..data.len() - 100]) {
        Err(moqlib::Error::Truncated { .. }) => {},
        other => panic!("expected Truncated, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn absurd_box_size_reports_malformed() {
    let mut data = Vec::new();
    data.extend_from_slice(&4u32.to_be_bytes()); // size 4 < 8
    data.extend_from_slice(b"styp");
    data.extend_from_slice(&[0u8; 16]);
    match Fragment::parse(&data) {
        Err(moqlib::Error::Malformed { .. }) => {},
        other => panic!("expected Malformed, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn multi_traf_fragment_roundtrips() {
    let mut frag = Fragment::build(1, 10, 100, test_payload(256));
    let extra_traf = TrackFragmentBox {
        boxes: vec![
            TrackFragmentHeaderBox::new(2).to_mp4box(),
            TrackFragmentBaseMediaDecodeTimeBox {
                base_media_decode_time: VersionSizedUint(200),
            }
            .to_mp4box(),
        ],
    };
    frag.moof.boxes.push(extra_traf.to_mp4box());
    assert!(frag.validate().is_ok());

    let data = frag.serialize().unwrap();
    let back = Fragment::parse(&data).unwrap();
    assert_eq!(back.moof.track_fragments().len(), 2);
    // First traf still drives the fragment decode time.
    assert_eq!(back.base_media_decode_time(), 100);
    assert_eq!(back.serialize().unwrap(), data);
}

#[test]
fn fragment_without_tfdt_has_sentinel_decode_time() {
    let mut frag = Fragment::build(1, 4, 0, Vec::new());
    // Drop the tfdt from the traf.
    let traf = TrackFragmentBox {
        boxes: vec![TrackFragmentHeaderBox::new(1).to_mp4box()],
    };
    frag.moof.boxes[1] = traf.to_mp4box();

    let data = frag.serialize().unwrap();
    let back = Fragment::parse(&data).unwrap();
    assert!(back.validate().is_ok());
    assert_eq!(back.base_media_decode_time(), -1);
}

#[test]
fn unknown_box_inside_moof_is_kept_and_reported() {
    let frag = Fragment::build(1, 6, 0, test_payload(32));
    let mut data = frag.serialize().unwrap();

    // Splice an unknown box into the moof, after the mfhd.
    let mut unknown = Vec::new();
    unknown.extend_from_slice(&12u32.to_be_bytes());
    unknown.extend_from_slice(b"wxyz");
    unknown.extend_from_slice(&[1, 2, 3, 4]);

    let moof_idx = data.windows(4).position(|w| w == b"moof").unwrap() - 4;
    let moof_size = u32::from_be_bytes([
        data[moof_idx],
        data[moof_idx + 1],
        data[moof_idx + 2],
        data[moof_idx + 3],
    ]);
    let mfhd_end = moof_idx + 8 + 16; // moof header + mfhd box
    for (i, b) in unknown.iter().enumerate() {
        data.insert(mfhd_end + i, *b);
    }
    data[moof_idx..moof_idx + 4].copy_from_slice(&(moof_size + 12).to_be_bytes());

    let back = Fragment::parse(&data).unwrap();
    assert!(back.validate().is_ok());
    assert_eq!(back.warnings.len(), 1);
    assert!(back.warnings[0].what.contains("wxyz"));
    assert_eq!(back.warnings[0].offset, mfhd_end as u64);

    // The unknown box is preserved on re-encode.
    assert_eq!(back.serialize().unwrap(), data);
}

#[test]
fn uuid_box_roundtrips_with_its_extended_type() {
    let frag = Fragment::build(1, 8, 0, Vec::new());
    let mut data = frag.serialize().unwrap();

    // An unknown uuid box inside the moof: header, usertype, payload.
    let mut unknown = Vec::new();
    unknown.extend_from_slice(&28u32.to_be_bytes());
    unknown.extend_from_slice(b"uuid");
    unknown.extend_from_slice(&[0x42u8; 16]);
    unknown.extend_from_slice(&[9, 9, 9, 9]);

    let moof_idx = data.windows(4).position(|w| w == b"moof").unwrap() - 4;
    let moof_size = u32::from_be_bytes([
        data[moof_idx],
        data[moof_idx + 1],
        data[moof_idx + 2],
        data[moof_idx + 3],
    ]);
    let mfhd_end = moof_idx + 8 + 16;
    for (i, b) in unknown.iter().enumerate() {
        data.insert(mfhd_end + i, *b);
    }
    data[moof_idx..moof_idx + 4].copy_from_slice(&(moof_size + 28).to_be_bytes());

    let back = Fragment::parse(&data).unwrap();
    assert_eq!(back.warnings.len(), 1);
    assert_eq!(back.serialize().unwrap(), data);
}

#[test]
fn init_segment_with_empty_sample_tables() {
    let init = InitSegment::build(&[TrackConfig {
        track_id:  1,
        timescale: 90000,
        entry:     SampleEntry::Visual(VisualSampleEntry::new("avc1", 640, 360, Vec::new())),
    }]);
    let data = init.serialize().unwrap();

    // Walk the top level with the generic box reader.
    let boxes = read_boxes(SliceReader::new(&data)).unwrap();
    assert_eq!(boxes.len(), 2);

    let back = InitSegment::parse(&data).unwrap();
    let tracks = back.moov.tracks();
    let stbl = tracks[0]
        .media()
        .unwrap()
        .media_info()
        .unwrap()
        .sample_table();
    assert!(stbl.is_valid());
    assert_eq!(stbl.sample_description().entries.len(), 1);
}
