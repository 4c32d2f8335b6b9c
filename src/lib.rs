#![doc = include_str!("../README.md")]

pub mod align;
pub mod cli;
pub mod conversion;
pub mod dtc;
pub mod format;
pub mod panel;
pub mod report;
pub mod smart_reader;
pub mod strand;

pub use align::{AlignmentConfig, AlignmentStatistics, AlignmentSummary, SampleIndex, align_file};
pub use conversion::{ConversionConfig, ConversionSummary, convert_file};
pub use dtc::SampleFormat;
pub use format::OutputFormat;
