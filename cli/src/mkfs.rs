use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use minivsfs_fs::{format_image, FilesystemParams};

#[derive(Parser)]
#[command(name = "minivsfs-mkfs")]
#[command(about = "Create a fresh MiniVSFS image", long_about = None)]
struct Cli {
    /// Path of the image file to create
    #[arg(long)]
    image: PathBuf,

    /// Image size in KiB (180-4096, multiple of 4)
    #[arg(long = "size-kib")]
    size_kib: u64,

    /// Number of inodes (128-512)
    #[arg(long)]
    inodes: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let params = FilesystemParams {
        size_kib: cli.size_kib,
        inode_count: cli.inodes,
    };
    let summary = format_image(&cli.image, &params)
        .with_context(|| format!("formatting {}", cli.image.display()))?;

    println!("File system created successfully: {}", cli.image.display());
    println!(
        "  Size: {} KiB, Inodes: {}, Blocks: {}",
        summary.size_kib, summary.inode_count, summary.total_blocks
    );
    Ok(())
}
