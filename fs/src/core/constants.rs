// MiniVSFS on-disk constants
// All multi-byte fields on disk are little-endian

/// Magic number in superblock byte 0 ("FSVM" on disk)
pub const VSFS_MAGIC: u32 = 0x4D56_5346;

/// Format version written by the formatter
pub const VSFS_VERSION: u32 = 1;

/// Fixed block size; the format supports nothing else
pub const BLOCK_SIZE: u32 = 4096;

/// On-disk inode record size
pub const INODE_SIZE: u32 = 128;

/// On-disk directory entry record size
pub const DIRENT_SIZE: u32 = 64;

/// Direct block pointers per inode, the hard file-size ceiling
pub const NDIRECT: usize = 12;

/// Inode number of the root directory
pub const ROOT_INO: u32 = 1;

/// Directory entries that fit in the root directory's single block
pub const DIRENTS_PER_BLOCK: u64 = (BLOCK_SIZE / DIRENT_SIZE) as u64;

// Fixed region placement: blocks 0/1/2 hold the superblock and the two
// bitmaps, the inode table starts right after
pub const INODE_BITMAP_BLOCK: u64 = 1;
pub const DATA_BITMAP_BLOCK: u64 = 2;
pub const INODE_TABLE_BLOCK: u64 = 3;

// Formatter parameter bounds
pub const MIN_SIZE_KIB: u64 = 180;
pub const MAX_SIZE_KIB: u64 = 4096;
pub const MIN_INODES: u64 = 128;
pub const MAX_INODES: u64 = 512;

// Inode mode bits
pub const MODE_DIR: u16 = 0x4000;
pub const MODE_FILE: u16 = 0x8000;

// Directory entry type tags
pub const DIRENT_TYPE_FILE: u8 = 1;
pub const DIRENT_TYPE_DIR: u8 = 2;

/// Project id stamped into every inode this toolchain creates
pub const DEFAULT_PROJECT_ID: u32 = 1234;

/// Maximum directory entry name length (the name field is 58 bytes,
/// always NUL-terminated)
pub const MAX_NAME_LEN: usize = 57;
