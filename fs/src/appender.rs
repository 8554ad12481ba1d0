// Append workflow: inject one file into an existing image and emit a new
// image at a separate path. The input image is never modified.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::core::bitmap::{find_free_block, find_free_inode};
use crate::core::constants::*;
use crate::core::structures::{DirEntry, Inode};
use crate::core::types::{VsfsError, VsfsResult};
use crate::directory;
use crate::formatter::unix_now;
use crate::image::Image;

/// What the appender did, for the CLI summary
#[derive(Debug, Clone)]
pub struct AppendSummary {
    pub inode_no: u32,
    pub size_bytes: u64,
    /// Absolute block numbers, in allocation order
    pub blocks: Vec<u32>,
}

/// Append the file at `source` to the image at `input`, writing the result
/// to `output`
pub fn append_file(input: &Path, output: &Path, source: &Path) -> VsfsResult<AppendSummary> {
    let mut image = Image::load(input)?;

    let content = fs::read(source)?;
    let size_bytes = content.len() as u64;
    let needed_blocks = (size_bytes + BLOCK_SIZE as u64 - 1) / BLOCK_SIZE as u64;
    if needed_blocks > NDIRECT as u64 {
        return Err(VsfsError::FileTooLarge(format!(
            "{} is {} bytes, needs {} blocks but inodes hold {} direct pointers",
            source.display(),
            size_bytes,
            needed_blocks,
            NDIRECT
        )));
    }

    let inode_no = find_free_inode(&image.inode_bitmap, image.superblock.inode_count)
        .ok_or_else(|| VsfsError::ResourceExhausted("no free inodes available".into()))?;

    // Claim data blocks first-fit, marking each bit as it is taken so the
    // next scan moves past it. Pointers store absolute block numbers.
    let mut blocks = Vec::with_capacity(needed_blocks as usize);
    for chunk_index in 0..needed_blocks {
        let rel = find_free_block(&image.data_bitmap, image.superblock.data_region_blocks)
            .ok_or_else(|| {
                VsfsError::ResourceExhausted("not enough free data blocks".into())
            })?;
        image.data_bitmap.set(rel);
        blocks.push((image.superblock.data_region_start + rel) as u32);

        let begin = (chunk_index * BLOCK_SIZE as u64) as usize;
        let end = (begin + BLOCK_SIZE as usize).min(content.len());
        let block = image.data_block_mut(rel)?;
        block[..end - begin].copy_from_slice(&content[begin..end]);
    }
    debug!(
        "{}: {} bytes in {} block(s) {:?}",
        source.display(),
        size_bytes,
        needed_blocks,
        blocks
    );

    let now = unix_now();
    let mut inode = Inode {
        mode: MODE_FILE,
        links: 1,
        size_bytes,
        atime: now,
        mtime: now,
        ctime: now,
        proj_id: DEFAULT_PROJECT_ID,
        ..Inode::default()
    };
    inode.direct[..blocks.len()].copy_from_slice(&blocks);
    inode.finalize_checksum();
    image.write_inode(inode_no, &inode)?;
    image.inode_bitmap.set(inode_no as u64 - 1);

    let name = source.to_string_lossy();
    directory::insert_entry(
        &mut image,
        DirEntry::new(inode_no, DIRENT_TYPE_FILE, &name),
    )?;

    image.save(output)?;

    info!(
        "appended {} as inode {} into {}",
        source.display(),
        inode_no,
        output.display()
    );

    Ok(AppendSummary {
        inode_no,
        size_bytes,
        blocks,
    })
}
