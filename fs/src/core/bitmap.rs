// Allocation bitmaps: one bit per inode or per data block, 1 = allocated.
// Each bitmap occupies exactly one block at the stated size bounds.

use crate::core::constants::BLOCK_SIZE;

/// A one-block allocation bitmap over a flat byte buffer.
/// Bits are addressed LSB-first within each byte.
#[derive(Debug, Clone)]
pub struct Bitmap {
    data: Vec<u8>,
}

impl Bitmap {
    /// Create an empty bitmap occupying a full block
    pub fn new() -> Self {
        Self {
            data: vec![0u8; BLOCK_SIZE as usize],
        }
    }

    /// Load a bitmap block read from an image
    pub fn from_block(block: &[u8]) -> Self {
        let mut data = vec![0u8; BLOCK_SIZE as usize];
        let len = block.len().min(data.len());
        data[..len].copy_from_slice(&block[..len]);
        Self { data }
    }

    /// Mark a bit as allocated
    pub fn set(&mut self, index: u64) {
        let byte_index = (index / 8) as usize;
        if byte_index < self.data.len() {
            self.data[byte_index] |= 1 << (index % 8);
        }
    }

    /// Check whether a bit is allocated
    pub fn is_set(&self, index: u64) -> bool {
        let byte_index = (index / 8) as usize;
        if byte_index >= self.data.len() {
            return false;
        }
        (self.data[byte_index] >> (index % 8)) & 1 != 0
    }

    /// First-fit scan: lowest clear bit below `limit`, if any
    pub fn find_first_clear(&self, limit: u64) -> Option<u64> {
        (0..limit).find(|&i| !self.is_set(i))
    }

    /// Bitmap block bytes as stored on disk
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the lowest free inode, returned as a 1-based inode number.
/// Bit i of the inode bitmap tracks inode i + 1.
pub fn find_free_inode(bitmap: &Bitmap, inode_count: u64) -> Option<u32> {
    bitmap.find_first_clear(inode_count).map(|i| i as u32 + 1)
}

/// Find the lowest free data block, returned as a 0-based index relative to
/// the data region; callers add data_region_start for the absolute address.
pub fn find_free_block(bitmap: &Bitmap, data_region_blocks: u64) -> Option<u64> {
    bitmap.find_first_clear(data_region_blocks)
}
