// Core building blocks: constants, layout calculation, checksums, on-disk
// records and allocation bitmaps

pub mod bitmap;
pub mod checksum;
pub mod constants;
pub mod structures;
pub mod types;
