use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use minivsfs_fs::append_file;

#[derive(Parser)]
#[command(name = "minivsfs-append")]
#[command(about = "Add one file to a MiniVSFS image, writing a new image", long_about = None)]
struct Cli {
    /// Existing image to read (left unmodified)
    #[arg(long)]
    input: PathBuf,

    /// Path of the new image to write
    #[arg(long)]
    output: PathBuf,

    /// File to add to the root directory
    #[arg(long)]
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let summary = append_file(&cli.input, &cli.output, &cli.file)
        .with_context(|| format!("appending {}", cli.file.display()))?;

    println!(
        "File '{}' added successfully to inode {}",
        cli.file.display(),
        summary.inode_no
    );
    println!("Output image: {}", cli.output.display());
    Ok(())
}
