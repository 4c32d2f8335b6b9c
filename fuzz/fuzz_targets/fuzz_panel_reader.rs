#![no_main]

use libfuzzer_sys::fuzz_target;
use terraseq::panel::{PanelLayout, read_panel};

fuzz_target!(|data: &[u8]| {
    for layout in [PanelLayout::Bim, PanelLayout::Snp] {
        // A byte slice never fails to read; bad lines are only counted.
        let panel = read_panel(data, layout).unwrap();
        assert!(panel.records.iter().all(|r| !r.id.is_empty()));
    }
});
