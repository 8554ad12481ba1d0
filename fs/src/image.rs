// Image codec: whole-image load and store.
//
// The image file is the sole durable store. Every region is loaded fully
// into memory, mutated there, and rewritten in full at its declared block
// offset; there is no streaming or partial I/O. Output is staged to a
// temporary file and atomically renamed into place so a failed run never
// leaves a partial image behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::core::bitmap::Bitmap;
use crate::core::constants::*;
use crate::core::structures::{Inode, Superblock};
use crate::core::types::{VsfsError, VsfsResult};

/// A fully materialized image: superblock plus the four regions behind it
pub struct Image {
    pub superblock: Superblock,
    pub inode_bitmap: Bitmap,
    pub data_bitmap: Bitmap,
    pub inode_table: Vec<u8>,
    pub data_region: Vec<u8>,
}

fn region_range(file_len: usize, start_block: u64, blocks: u64) -> VsfsResult<(usize, usize)> {
    let begin = start_block
        .checked_mul(BLOCK_SIZE as u64)
        .ok_or_else(|| VsfsError::InvalidImage("region offset overflow".into()))?;
    let len = blocks
        .checked_mul(BLOCK_SIZE as u64)
        .ok_or_else(|| VsfsError::InvalidImage("region length overflow".into()))?;
    let end = begin
        .checked_add(len)
        .ok_or_else(|| VsfsError::InvalidImage("region end overflow".into()))?;
    if end as usize > file_len {
        return Err(VsfsError::InvalidImage(format!(
            "region [{}, {}) extends past end of image ({} bytes)",
            begin, end, file_len
        )));
    }
    Ok((begin as usize, end as usize))
}

impl Image {
    /// Load a complete image from disk, validating the superblock and the
    /// exact file length before slicing out the regions
    pub fn load(path: &Path) -> VsfsResult<Self> {
        let bytes = fs::read(path)?;
        if bytes.len() < BLOCK_SIZE as usize {
            return Err(VsfsError::InvalidImage(format!(
                "image too small for a superblock: {} bytes",
                bytes.len()
            )));
        }

        let superblock = Superblock::decode_block(&bytes[..BLOCK_SIZE as usize])?;

        let expected_len = superblock.total_blocks * BLOCK_SIZE as u64;
        if bytes.len() as u64 != expected_len {
            return Err(VsfsError::InvalidImage(format!(
                "image length {} does not match superblock ({} blocks = {} bytes)",
                bytes.len(),
                superblock.total_blocks,
                expected_len
            )));
        }

        let (ib_start, ib_end) = region_range(
            bytes.len(),
            superblock.inode_bitmap_start,
            superblock.inode_bitmap_blocks,
        )?;
        let (db_start, db_end) = region_range(
            bytes.len(),
            superblock.data_bitmap_start,
            superblock.data_bitmap_blocks,
        )?;
        let (it_start, it_end) = region_range(
            bytes.len(),
            superblock.inode_table_start,
            superblock.inode_table_blocks,
        )?;
        let (dr_start, dr_end) = region_range(
            bytes.len(),
            superblock.data_region_start,
            superblock.data_region_blocks,
        )?;

        debug!(
            "loaded image {}: {} blocks, {} inodes, data region at block {}",
            path.display(),
            superblock.total_blocks,
            superblock.inode_count,
            superblock.data_region_start
        );

        Ok(Self {
            superblock,
            inode_bitmap: Bitmap::from_block(&bytes[ib_start..ib_end]),
            data_bitmap: Bitmap::from_block(&bytes[db_start..db_end]),
            inode_table: bytes[it_start..it_end].to_vec(),
            data_region: bytes[dr_start..dr_end].to_vec(),
        })
    }

    /// Write the complete image to `path`. The regions are emitted in
    /// placement order into a temp file beside the destination, the final
    /// length is verified against the superblock, and only then is the file
    /// renamed into place.
    pub fn save(&self, path: &Path) -> VsfsResult<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut staged = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };

        staged.write_all(&self.superblock.encode_block())?;
        staged.write_all(self.inode_bitmap.as_bytes())?;
        staged.write_all(self.data_bitmap.as_bytes())?;
        staged.write_all(&self.inode_table)?;
        staged.write_all(&self.data_region)?;
        staged.flush()?;

        let expected = self.superblock.total_blocks * BLOCK_SIZE as u64;
        let written = staged.as_file().metadata()?.len();
        if written != expected {
            return Err(VsfsError::InvalidImage(format!(
                "staged image is {} bytes, expected {}",
                written, expected
            )));
        }

        staged
            .persist(path)
            .map_err(|e| VsfsError::Io(e.error))?;

        debug!("wrote image {} ({} bytes)", path.display(), expected);
        Ok(())
    }

    /// Decode one inode record out of the table
    pub fn read_inode(&self, inode_no: u32) -> VsfsResult<Inode> {
        let offset = self.inode_offset(inode_no)?;
        Inode::decode(&self.inode_table[offset..offset + INODE_SIZE as usize])
    }

    /// Encode one inode record into the table
    pub fn write_inode(&mut self, inode_no: u32, inode: &Inode) -> VsfsResult<()> {
        let offset = self.inode_offset(inode_no)?;
        self.inode_table[offset..offset + INODE_SIZE as usize].copy_from_slice(&inode.encode());
        Ok(())
    }

    fn inode_offset(&self, inode_no: u32) -> VsfsResult<usize> {
        if inode_no == 0 || inode_no as u64 > self.superblock.inode_count {
            return Err(VsfsError::InvalidImage(format!(
                "inode number {} out of range (1..={})",
                inode_no, self.superblock.inode_count
            )));
        }
        Ok((inode_no as usize - 1) * INODE_SIZE as usize)
    }

    /// Mutable view of one data-region block, addressed relative to the
    /// start of the data region
    pub fn data_block_mut(&mut self, rel_block: u64) -> VsfsResult<&mut [u8]> {
        let begin = rel_block as usize * BLOCK_SIZE as usize;
        let end = begin + BLOCK_SIZE as usize;
        if end > self.data_region.len() {
            return Err(VsfsError::InvalidImage(format!(
                "data block {} outside data region ({} blocks)",
                rel_block, self.superblock.data_region_blocks
            )));
        }
        Ok(&mut self.data_region[begin..end])
    }

    /// Shared view of one data-region block
    pub fn data_block(&self, rel_block: u64) -> VsfsResult<&[u8]> {
        let begin = rel_block as usize * BLOCK_SIZE as usize;
        let end = begin + BLOCK_SIZE as usize;
        if end > self.data_region.len() {
            return Err(VsfsError::InvalidImage(format!(
                "data block {} outside data region ({} blocks)",
                rel_block, self.superblock.data_region_blocks
            )));
        }
        Ok(&self.data_region[begin..end])
    }
}
