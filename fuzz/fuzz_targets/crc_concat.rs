#![no_main]

use libfuzzer_sys::fuzz_target;
use blockstage::crc64;

fuzz_target!(|input: (u64, u64, u64, usize, Vec<u8>)| {
    let (initial_ab, initial_a, initial_b, split, data) = input;
    let (a, b) = data.split_at(split % (data.len() + 1));

    let crc_a = crc64::compute(a, initial_a);
    let crc_b = crc64::compute(b, initial_b);
    let combined = crc64::concat(
        initial_ab,
        initial_a,
        crc_a,
        a.len() as u64,
        initial_b,
        crc_b,
        b.len() as u64,
    );

    assert_eq!(combined, crc64::compute(&data, initial_ab));
});
