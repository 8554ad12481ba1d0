// Root directory management.
//
// The root directory owns exactly one data block and can never grow past
// it; its logical size is always a whole number of entry records. Slots
// whose inode number is 0 are reusable.

use crate::core::constants::*;
use crate::core::structures::DirEntry;
use crate::core::types::{VsfsError, VsfsResult};
use crate::image::Image;

/// Resolve the root directory's single data block, relative to the start of
/// the data region
fn root_block_index(image: &Image) -> VsfsResult<u64> {
    let root = image.read_inode(ROOT_INO)?;
    let first = root.direct[0] as u64;
    if first < image.superblock.data_region_start {
        return Err(VsfsError::InvalidImage(format!(
            "root directory block {} precedes the data region",
            first
        )));
    }
    Ok(first - image.superblock.data_region_start)
}

/// Insert an entry into the root directory.
///
/// The first empty slot is reused; otherwise the directory grows by one
/// record, up to the one-block ceiling. On success the entry checksum is
/// final, the root link count is bumped and the root inode checksum is
/// recomputed.
pub fn insert_entry(image: &mut Image, entry: DirEntry) -> VsfsResult<()> {
    let rel_block = root_block_index(image)?;
    let mut root = image.read_inode(ROOT_INO)?;
    let entry_count = root.size_bytes / DIRENT_SIZE as u64;

    let mut slot = None;
    {
        let block = image.data_block(rel_block)?;
        for i in 0..entry_count {
            let offset = i as usize * DIRENT_SIZE as usize;
            let existing = DirEntry::decode(&block[offset..offset + DIRENT_SIZE as usize])?;
            if existing.inode_no == 0 {
                slot = Some(i);
                break;
            }
        }
    }

    let slot = match slot {
        Some(i) => i,
        None => {
            if entry_count >= DIRENTS_PER_BLOCK {
                return Err(VsfsError::DirectoryFull(format!(
                    "root directory holds {} entries, the single-block maximum",
                    entry_count
                )));
            }
            root.size_bytes += DIRENT_SIZE as u64;
            entry_count
        }
    };

    let offset = slot as usize * DIRENT_SIZE as usize;
    let block = image.data_block_mut(rel_block)?;
    block[offset..offset + DIRENT_SIZE as usize].copy_from_slice(&entry.encode());

    root.links += 1;
    root.finalize_checksum();
    image.write_inode(ROOT_INO, &root)?;
    Ok(())
}

/// All live entries of the root directory, in slot order
pub fn live_entries(image: &Image) -> VsfsResult<Vec<DirEntry>> {
    let rel_block = root_block_index(image)?;
    let root = image.read_inode(ROOT_INO)?;
    let entry_count = root.size_bytes / DIRENT_SIZE as u64;

    let block = image.data_block(rel_block)?;
    let mut entries = Vec::new();
    for i in 0..entry_count {
        let offset = i as usize * DIRENT_SIZE as usize;
        let entry = DirEntry::decode(&block[offset..offset + DIRENT_SIZE as usize])?;
        if entry.inode_no != 0 {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Look up a live entry by name
pub fn find_entry(image: &Image, name: &str) -> VsfsResult<Option<DirEntry>> {
    Ok(live_entries(image)?
        .into_iter()
        .find(|e| e.name_str() == name))
}
