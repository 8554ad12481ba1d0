// MiniVSFS on-disk structures
// CRITICAL: layout is byte-exact and little-endian; records are encoded and
// decoded field by field, never by reinterpreting in-memory structs.

use byteorder::{ByteOrder, LittleEndian};
use static_assertions::const_assert_eq;

use crate::core::checksum::{
    self, dirent_checksum, inode_checksum, superblock_checksum, SUPERBLOCK_CRC_OFFSET,
};
use crate::core::constants::*;
use crate::core::types::{FilesystemLayout, VsfsError, VsfsResult};

/// Meaningful bytes of the superblock record; the rest of block 0 is zero
pub const SUPERBLOCK_SIZE: usize = 116;

const_assert_eq!(SUPERBLOCK_CRC_OFFSET + 4, SUPERBLOCK_SIZE);
const_assert_eq!(checksum::INODE_CRC_OFFSET + 8, INODE_SIZE as usize);

/// Superblock, block 0 of the image
#[derive(Debug, Clone, Copy)]
pub struct Superblock {
    /* 0x00 */ pub magic: u32,               // Must be VSFS_MAGIC
    /* 0x04 */ pub version: u32,
    /* 0x08 */ pub block_size: u32,
    /* 0x0C */ pub total_blocks: u64,
    /* 0x14 */ pub inode_count: u64,
    /* 0x1C */ pub inode_bitmap_start: u64,
    /* 0x24 */ pub inode_bitmap_blocks: u64,
    /* 0x2C */ pub data_bitmap_start: u64,
    /* 0x34 */ pub data_bitmap_blocks: u64,
    /* 0x3C */ pub inode_table_start: u64,
    /* 0x44 */ pub inode_table_blocks: u64,
    /* 0x4C */ pub data_region_start: u64,
    /* 0x54 */ pub data_region_blocks: u64,
    /* 0x5C */ pub root_inode: u64,
    /* 0x64 */ pub mtime_epoch: u64,
    /* 0x6C */ pub flags: u32,
    /* 0x70 */ pub checksum: u32,            // CRC32 over block bytes [0, 4092)
}

impl Superblock {
    /// Build the superblock for a freshly formatted image
    pub fn for_layout(layout: &FilesystemLayout, now: u64) -> Self {
        Self {
            magic: VSFS_MAGIC,
            version: VSFS_VERSION,
            block_size: BLOCK_SIZE,
            total_blocks: layout.total_blocks,
            inode_count: layout.inode_count,
            inode_bitmap_start: INODE_BITMAP_BLOCK,
            inode_bitmap_blocks: 1,
            data_bitmap_start: DATA_BITMAP_BLOCK,
            data_bitmap_blocks: 1,
            inode_table_start: INODE_TABLE_BLOCK,
            inode_table_blocks: layout.inode_table_blocks,
            data_region_start: layout.data_region_start,
            data_region_blocks: layout.data_region_blocks,
            root_inode: ROOT_INO as u64,
            mtime_epoch: now,
            flags: 0,
            checksum: 0,
        }
    }

    /// Encode into a full zero-padded block, including the stored checksum
    pub fn encode_block(&self) -> Vec<u8> {
        let mut block = vec![0u8; BLOCK_SIZE as usize];
        LittleEndian::write_u32(&mut block[0x00..], self.magic);
        LittleEndian::write_u32(&mut block[0x04..], self.version);
        LittleEndian::write_u32(&mut block[0x08..], self.block_size);
        LittleEndian::write_u64(&mut block[0x0C..], self.total_blocks);
        LittleEndian::write_u64(&mut block[0x14..], self.inode_count);
        LittleEndian::write_u64(&mut block[0x1C..], self.inode_bitmap_start);
        LittleEndian::write_u64(&mut block[0x24..], self.inode_bitmap_blocks);
        LittleEndian::write_u64(&mut block[0x2C..], self.data_bitmap_start);
        LittleEndian::write_u64(&mut block[0x34..], self.data_bitmap_blocks);
        LittleEndian::write_u64(&mut block[0x3C..], self.inode_table_start);
        LittleEndian::write_u64(&mut block[0x44..], self.inode_table_blocks);
        LittleEndian::write_u64(&mut block[0x4C..], self.data_region_start);
        LittleEndian::write_u64(&mut block[0x54..], self.data_region_blocks);
        LittleEndian::write_u64(&mut block[0x5C..], self.root_inode);
        LittleEndian::write_u64(&mut block[0x64..], self.mtime_epoch);
        LittleEndian::write_u32(&mut block[0x6C..], self.flags);
        LittleEndian::write_u32(&mut block[0x70..], self.checksum);
        block
    }

    /// Recompute and store the checksum; must follow every field mutation
    pub fn finalize_checksum(&mut self) {
        let block = self.encode_block();
        self.checksum = superblock_checksum(&block);
    }

    /// Decode block 0 of an image, rejecting bad magic and a checksum
    /// mismatch as an invalid image
    pub fn decode_block(block: &[u8]) -> VsfsResult<Self> {
        if block.len() < BLOCK_SIZE as usize {
            return Err(VsfsError::InvalidImage(format!(
                "superblock block truncated: {} bytes",
                block.len()
            )));
        }

        let sb = Self {
            magic: LittleEndian::read_u32(&block[0x00..]),
            version: LittleEndian::read_u32(&block[0x04..]),
            block_size: LittleEndian::read_u32(&block[0x08..]),
            total_blocks: LittleEndian::read_u64(&block[0x0C..]),
            inode_count: LittleEndian::read_u64(&block[0x14..]),
            inode_bitmap_start: LittleEndian::read_u64(&block[0x1C..]),
            inode_bitmap_blocks: LittleEndian::read_u64(&block[0x24..]),
            data_bitmap_start: LittleEndian::read_u64(&block[0x2C..]),
            data_bitmap_blocks: LittleEndian::read_u64(&block[0x34..]),
            inode_table_start: LittleEndian::read_u64(&block[0x3C..]),
            inode_table_blocks: LittleEndian::read_u64(&block[0x44..]),
            data_region_start: LittleEndian::read_u64(&block[0x4C..]),
            data_region_blocks: LittleEndian::read_u64(&block[0x54..]),
            root_inode: LittleEndian::read_u64(&block[0x5C..]),
            mtime_epoch: LittleEndian::read_u64(&block[0x64..]),
            flags: LittleEndian::read_u32(&block[0x6C..]),
            checksum: LittleEndian::read_u32(&block[0x70..]),
        };

        if sb.magic != VSFS_MAGIC {
            return Err(VsfsError::InvalidImage(format!(
                "bad magic number: 0x{:08X}",
                sb.magic
            )));
        }
        if sb.block_size != BLOCK_SIZE {
            return Err(VsfsError::InvalidImage(format!(
                "unsupported block size: {}",
                sb.block_size
            )));
        }
        let expected = superblock_checksum(&block[..BLOCK_SIZE as usize]);
        if sb.checksum != expected {
            return Err(VsfsError::InvalidImage(format!(
                "superblock checksum mismatch: stored 0x{:08X}, computed 0x{:08X}",
                sb.checksum, expected
            )));
        }

        Ok(sb)
    }
}

/// Inode, one 128-byte record in the inode table
#[derive(Debug, Clone, Copy)]
pub struct Inode {
    /* 0x00 */ pub mode: u16,                // MODE_DIR or MODE_FILE
    /* 0x02 */ pub links: u16,
    /* 0x04 */ pub uid: u32,
    /* 0x08 */ pub gid: u32,
    /* 0x0C */ pub size_bytes: u64,
    /* 0x14 */ pub atime: u64,
    /* 0x1C */ pub mtime: u64,
    /* 0x24 */ pub ctime: u64,
    /* 0x2C */ pub direct: [u32; NDIRECT],   // Absolute block numbers, 0 = unused
    /* 0x5C */ pub reserved: [u32; 3],
    /* 0x68 */ pub proj_id: u32,
    /* 0x6C */ pub uid16_gid16: u32,
    /* 0x70 */ pub xattr_ptr: u64,
    /* 0x78 */ pub inode_crc: u64,           // CRC32 over bytes [0, 120), widened
}

impl Default for Inode {
    fn default() -> Self {
        Self {
            mode: 0,
            links: 0,
            uid: 0,
            gid: 0,
            size_bytes: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            direct: [0; NDIRECT],
            reserved: [0; 3],
            proj_id: 0,
            uid16_gid16: 0,
            xattr_ptr: 0,
            inode_crc: 0,
        }
    }
}

impl Inode {
    pub fn encode(&self) -> [u8; INODE_SIZE as usize] {
        let mut record = [0u8; INODE_SIZE as usize];
        LittleEndian::write_u16(&mut record[0x00..], self.mode);
        LittleEndian::write_u16(&mut record[0x02..], self.links);
        LittleEndian::write_u32(&mut record[0x04..], self.uid);
        LittleEndian::write_u32(&mut record[0x08..], self.gid);
        LittleEndian::write_u64(&mut record[0x0C..], self.size_bytes);
        LittleEndian::write_u64(&mut record[0x14..], self.atime);
        LittleEndian::write_u64(&mut record[0x1C..], self.mtime);
        LittleEndian::write_u64(&mut record[0x24..], self.ctime);
        for (i, block) in self.direct.iter().enumerate() {
            LittleEndian::write_u32(&mut record[0x2C + i * 4..], *block);
        }
        for (i, word) in self.reserved.iter().enumerate() {
            LittleEndian::write_u32(&mut record[0x5C + i * 4..], *word);
        }
        LittleEndian::write_u32(&mut record[0x68..], self.proj_id);
        LittleEndian::write_u32(&mut record[0x6C..], self.uid16_gid16);
        LittleEndian::write_u64(&mut record[0x70..], self.xattr_ptr);
        LittleEndian::write_u64(&mut record[0x78..], self.inode_crc);
        record
    }

    pub fn decode(record: &[u8]) -> VsfsResult<Self> {
        if record.len() < INODE_SIZE as usize {
            return Err(VsfsError::InvalidImage(format!(
                "inode record truncated: {} bytes",
                record.len()
            )));
        }

        let mut direct = [0u32; NDIRECT];
        for (i, block) in direct.iter_mut().enumerate() {
            *block = LittleEndian::read_u32(&record[0x2C + i * 4..]);
        }
        let mut reserved = [0u32; 3];
        for (i, word) in reserved.iter_mut().enumerate() {
            *word = LittleEndian::read_u32(&record[0x5C + i * 4..]);
        }

        Ok(Self {
            mode: LittleEndian::read_u16(&record[0x00..]),
            links: LittleEndian::read_u16(&record[0x02..]),
            uid: LittleEndian::read_u32(&record[0x04..]),
            gid: LittleEndian::read_u32(&record[0x08..]),
            size_bytes: LittleEndian::read_u64(&record[0x0C..]),
            atime: LittleEndian::read_u64(&record[0x14..]),
            mtime: LittleEndian::read_u64(&record[0x1C..]),
            ctime: LittleEndian::read_u64(&record[0x24..]),
            direct,
            reserved,
            proj_id: LittleEndian::read_u32(&record[0x68..]),
            uid16_gid16: LittleEndian::read_u32(&record[0x6C..]),
            xattr_ptr: LittleEndian::read_u64(&record[0x70..]),
            inode_crc: LittleEndian::read_u64(&record[0x78..]),
        })
    }

    /// Recompute and store the checksum; must follow every field mutation
    pub fn finalize_checksum(&mut self) {
        let mut record = self.encode();
        record[checksum::INODE_CRC_OFFSET..].fill(0);
        self.inode_crc = inode_checksum(&record);
    }
}

/// Directory entry, one 64-byte record inside a directory data block.
/// Inode number 0 marks an empty, reusable slot.
#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
    /* 0x00 */ pub inode_no: u32,
    /* 0x04 */ pub entry_type: u8,           // DIRENT_TYPE_FILE or DIRENT_TYPE_DIR
    /* 0x05 */ pub name: [u8; 58],           // NUL-padded, at most 57 name bytes
    /* 0x3F */ pub checksum: u8,             // XOR of bytes [0, 63)
}

impl DirEntry {
    /// Build an entry with its checksum finalized; the name is truncated to
    /// 57 bytes and NUL-padded
    pub fn new(inode_no: u32, entry_type: u8, name: &str) -> Self {
        let mut name_buf = [0u8; 58];
        let bytes = name.as_bytes();
        let len = bytes.len().min(MAX_NAME_LEN);
        name_buf[..len].copy_from_slice(&bytes[..len]);

        let mut entry = Self {
            inode_no,
            entry_type,
            name: name_buf,
            checksum: 0,
        };
        entry.finalize_checksum();
        entry
    }

    pub fn encode(&self) -> [u8; DIRENT_SIZE as usize] {
        let mut record = [0u8; DIRENT_SIZE as usize];
        LittleEndian::write_u32(&mut record[0x00..], self.inode_no);
        record[0x04] = self.entry_type;
        record[0x05..0x3F].copy_from_slice(&self.name);
        record[0x3F] = self.checksum;
        record
    }

    pub fn decode(record: &[u8]) -> VsfsResult<Self> {
        if record.len() < DIRENT_SIZE as usize {
            return Err(VsfsError::InvalidImage(format!(
                "directory entry truncated: {} bytes",
                record.len()
            )));
        }
        let mut name = [0u8; 58];
        name.copy_from_slice(&record[0x05..0x3F]);
        Ok(Self {
            inode_no: LittleEndian::read_u32(&record[0x00..]),
            entry_type: record[0x04],
            name,
            checksum: record[0x3F],
        })
    }

    /// Recompute and store the checksum; must follow every field mutation
    pub fn finalize_checksum(&mut self) {
        let mut record = self.encode();
        record[DIRENT_SIZE as usize - 1] = 0;
        self.checksum = dirent_checksum(&record);
    }

    /// Entry name up to the first NUL
    pub fn name_str(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        std::str::from_utf8(&self.name[..len]).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FilesystemParams;

    fn test_layout() -> FilesystemLayout {
        FilesystemLayout::from_params(&FilesystemParams {
            size_kib: 180,
            inode_count: 128,
        })
        .unwrap()
    }

    #[test]
    fn test_superblock_round_trip() {
        let mut sb = Superblock::for_layout(&test_layout(), 1_700_000_000);
        sb.finalize_checksum();

        let block = sb.encode_block();
        let decoded = Superblock::decode_block(&block).unwrap();

        assert_eq!(decoded.magic, VSFS_MAGIC);
        assert_eq!(decoded.total_blocks, 45);
        assert_eq!(decoded.data_region_start, 7);
        assert_eq!(decoded.data_region_blocks, 38);
        assert_eq!(decoded.root_inode, ROOT_INO as u64);
        assert_eq!(decoded.checksum, sb.checksum);
    }

    #[test]
    fn test_superblock_rejects_bad_magic() {
        let mut sb = Superblock::for_layout(&test_layout(), 0);
        sb.magic = 0xDEADBEEF;
        sb.finalize_checksum();
        let block = sb.encode_block();
        assert!(matches!(
            Superblock::decode_block(&block),
            Err(VsfsError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_superblock_rejects_corruption() {
        let mut sb = Superblock::for_layout(&test_layout(), 0);
        sb.finalize_checksum();
        let mut block = sb.encode_block();
        // Flip a byte inside the checksummed range
        block[0x0C] ^= 0xFF;
        assert!(matches!(
            Superblock::decode_block(&block),
            Err(VsfsError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_superblock_checksum_idempotent() {
        let mut sb = Superblock::for_layout(&test_layout(), 42);
        sb.finalize_checksum();
        let first = sb.checksum;
        sb.finalize_checksum();
        assert_eq!(sb.checksum, first);
    }

    #[test]
    fn test_inode_round_trip() {
        let mut inode = Inode {
            mode: MODE_FILE,
            links: 1,
            size_bytes: 5000,
            atime: 10,
            mtime: 20,
            ctime: 30,
            proj_id: DEFAULT_PROJECT_ID,
            ..Inode::default()
        };
        inode.direct[0] = 8;
        inode.direct[1] = 9;
        inode.finalize_checksum();

        let decoded = Inode::decode(&inode.encode()).unwrap();
        assert_eq!(decoded.mode, MODE_FILE);
        assert_eq!(decoded.size_bytes, 5000);
        assert_eq!(decoded.direct[..2], [8, 9]);
        assert_eq!(decoded.direct[2..], [0; 10]);
        assert_eq!(decoded.inode_crc, inode.inode_crc);
    }

    #[test]
    fn test_inode_checksum_idempotent() {
        let mut inode = Inode {
            mode: MODE_DIR,
            links: 2,
            ..Inode::default()
        };
        inode.finalize_checksum();
        let first = inode.inode_crc;
        inode.finalize_checksum();
        assert_eq!(inode.inode_crc, first);
        // The stored checksum is a widened u32
        assert!(inode.inode_crc <= u32::MAX as u64);
    }

    #[test]
    fn test_dirent_name_truncation() {
        let long = "x".repeat(80);
        let entry = DirEntry::new(7, DIRENT_TYPE_FILE, &long);
        assert_eq!(entry.name_str().len(), MAX_NAME_LEN);
        // Final name byte stays NUL
        assert_eq!(entry.name[57], 0);
    }

    #[test]
    fn test_dirent_round_trip() {
        let entry = DirEntry::new(3, DIRENT_TYPE_FILE, "hello.txt");
        let decoded = DirEntry::decode(&entry.encode()).unwrap();
        assert_eq!(decoded.inode_no, 3);
        assert_eq!(decoded.entry_type, DIRENT_TYPE_FILE);
        assert_eq!(decoded.name_str(), "hello.txt");
        assert_eq!(decoded.checksum, entry.checksum);
    }
}
