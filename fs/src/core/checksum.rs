// Integrity layer: IEEE CRC32 for superblock and inodes, single-byte XOR
// for directory entries. Every mutation of a checksummed structure must be
// followed by the matching finalize before the buffer is persisted.

use crate::core::constants::{BLOCK_SIZE, DIRENT_SIZE, INODE_SIZE};

/// Byte offset of the u32 checksum field inside the superblock record
pub const SUPERBLOCK_CRC_OFFSET: usize = 112;

/// Byte offset of the u64 checksum field inside an inode record
pub const INODE_CRC_OFFSET: usize = 120;

/// IEEE CRC32: reflected polynomial 0xEDB88320, seeded with 0xFFFFFFFF,
/// result inverted. crc32fast implements exactly this variant.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Compute the superblock checksum over a full encoded block.
/// Covers bytes [0, block_size - 4) with the checksum field itself treated
/// as zero during the computation.
pub fn superblock_checksum(block: &[u8]) -> u32 {
    debug_assert_eq!(block.len(), BLOCK_SIZE as usize);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&block[..SUPERBLOCK_CRC_OFFSET]);
    hasher.update(&[0u8; 4]);
    hasher.update(&block[SUPERBLOCK_CRC_OFFSET + 4..BLOCK_SIZE as usize - 4]);
    hasher.finalize()
}

/// Compute the inode checksum: CRC32 over the first 120 bytes, with the
/// trailing 8-byte checksum field treated as zero. Stored widened to u64.
pub fn inode_checksum(record: &[u8]) -> u64 {
    debug_assert_eq!(record.len(), INODE_SIZE as usize);
    crc32(&record[..INODE_CRC_OFFSET]) as u64
}

/// Compute the directory entry checksum: XOR of the first 63 bytes
pub fn dirent_checksum(record: &[u8]) -> u8 {
    debug_assert_eq!(record.len(), DIRENT_SIZE as usize);
    record[..DIRENT_SIZE as usize - 1]
        .iter()
        .fold(0u8, |acc, b| acc ^ b)
}
