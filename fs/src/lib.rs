// MiniVSFS: a minimal persistent filesystem image format and the two batch
// workflows over it - formatting a fresh image and appending one file to an
// existing image.
//
// The on-disk layout is fixed and positional: superblock (block 0), inode
// bitmap (1), data bitmap (2), inode table, data region. All records are
// little-endian with explicit byte offsets; see core::structures.

pub mod core;
pub mod directory;
pub mod image;

pub mod appender;
pub mod formatter;


pub use crate::appender::{append_file, AppendSummary};
pub use crate::core::types::{FilesystemLayout, FilesystemParams, VsfsError, VsfsResult};
pub use crate::formatter::{format_image, FormatSummary};
pub use crate::image::Image;
