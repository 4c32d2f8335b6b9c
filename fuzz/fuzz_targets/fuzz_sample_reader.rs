#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use terraseq::dtc::{Reader, SampleFormat};

fuzz_target!(|data: &[u8]| {
    for format in [
        SampleFormat::TwentyThreeAndMe,
        SampleFormat::Ancestry,
        SampleFormat::FtdnaV2,
        SampleFormat::FtdnaV1,
    ] {
        // Iterate all records - should never panic
        for result in Reader::new(Cursor::new(data), format).take(1000) {
            if let Ok(record) = result {
                let _ = format!("{}", record);
                let _ = record.call();
            }
        }
    }
});
