// Common types for MiniVSFS: error taxonomy, formatter parameters and the
// derived image layout

use thiserror::Error;

use crate::core::constants::*;

/// Result type for MiniVSFS operations
pub type VsfsResult<T> = Result<T, VsfsError>;

/// Errors that can occur while building or amending an image.
/// Every variant is fatal to the running workflow; there are no retries.
#[derive(Debug, Error)]
pub enum VsfsError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Resources exhausted: {0}")]
    ResourceExhausted(String),

    #[error("File too large: {0}")]
    FileTooLarge(String),

    #[error("Directory full: {0}")]
    DirectoryFull(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Formatter parameters, as accepted on the command line
#[derive(Debug, Clone, Copy)]
pub struct FilesystemParams {
    /// Total image size in KiB (180..=4096, multiple of 4)
    pub size_kib: u64,
    /// Number of inodes (128..=512)
    pub inode_count: u64,
}

/// Region layout derived from the parameters. Placement is positional and
/// never changes after format: superblock, inode bitmap, data bitmap, inode
/// table, data region.
#[derive(Debug, Clone, Copy)]
pub struct FilesystemLayout {
    pub total_blocks: u64,
    pub inode_count: u64,
    pub inode_table_blocks: u64,
    pub data_region_start: u64,
    pub data_region_blocks: u64,
}

impl FilesystemLayout {
    /// Calculate layout from parameters, validating all bounds
    pub fn from_params(params: &FilesystemParams) -> VsfsResult<Self> {
        if params.size_kib < MIN_SIZE_KIB || params.size_kib > MAX_SIZE_KIB {
            return Err(VsfsError::Configuration(format!(
                "size-kib must be in {}..={}, got {}",
                MIN_SIZE_KIB, MAX_SIZE_KIB, params.size_kib
            )));
        }
        if params.size_kib % 4 != 0 {
            return Err(VsfsError::Configuration(format!(
                "size-kib must be a multiple of 4, got {}",
                params.size_kib
            )));
        }
        if params.inode_count < MIN_INODES || params.inode_count > MAX_INODES {
            return Err(VsfsError::Configuration(format!(
                "inodes must be in {}..={}, got {}",
                MIN_INODES, MAX_INODES, params.inode_count
            )));
        }

        let total_blocks = params.size_kib * 1024 / BLOCK_SIZE as u64;
        let inode_table_blocks =
            (params.inode_count * INODE_SIZE as u64 + BLOCK_SIZE as u64 - 1) / BLOCK_SIZE as u64;
        let data_region_start = INODE_TABLE_BLOCK + inode_table_blocks;

        if total_blocks <= data_region_start {
            return Err(VsfsError::Configuration(format!(
                "image too small for layout: {} blocks total, {} reserved for metadata",
                total_blocks, data_region_start
            )));
        }

        Ok(Self {
            total_blocks,
            inode_count: params.inode_count,
            inode_table_blocks,
            data_region_start,
            data_region_blocks: total_blocks - data_region_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_golden_scenario() {
        // 180 KiB / 128 inodes is the smallest supported image
        let layout = FilesystemLayout::from_params(&FilesystemParams {
            size_kib: 180,
            inode_count: 128,
        })
        .unwrap();

        assert_eq!(layout.total_blocks, 45);
        assert_eq!(layout.inode_table_blocks, 4);
        assert_eq!(layout.data_region_start, 7);
        assert_eq!(layout.data_region_blocks, 38);
    }

    #[test]
    fn test_layout_max_parameters() {
        let layout = FilesystemLayout::from_params(&FilesystemParams {
            size_kib: 4096,
            inode_count: 512,
        })
        .unwrap();

        assert_eq!(layout.total_blocks, 1024);
        assert_eq!(layout.inode_table_blocks, 16);
        assert_eq!(layout.data_region_start, 19);
        assert_eq!(layout.data_region_blocks, 1005);
    }

    #[test]
    fn test_layout_rejects_bad_parameters() {
        let cases = [
            (176, 128),  // below minimum size
            (4100, 128), // above maximum size
            (182, 128),  // not a multiple of 4
            (180, 127),  // too few inodes
            (180, 513),  // too many inodes
        ];
        for (size_kib, inode_count) in cases {
            let result = FilesystemLayout::from_params(&FilesystemParams {
                size_kib,
                inode_count,
            });
            assert!(
                matches!(result, Err(VsfsError::Configuration(_))),
                "expected Configuration error for size_kib={} inodes={}",
                size_kib,
                inode_count
            );
        }
    }
}
