pub mod args;

use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use mini_mkfs::{fs::format_with_progress, BlockDevice, FileDisk, Geometry, BLOCK_SIZE};

use crate::cli::args::Args;

/// 日志输出到 stderr，RUST_LOG 优先于 -v
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run(args: &Args) -> Result<()> {
    // 文件句柄在 disk 离开作用域时释放，无论成功还是失败
    let disk = FileDisk::open(&args.image)
        .with_context(|| format!("cannot open image {}", args.image.display()))?;

    let options = args.format_options();
    let pb = if options.zero {
        zero_progress_bar(disk.block_count())?
    } else {
        ProgressBar::hidden()
    };

    let geometry = format_with_progress(&disk, &options, |done, _| pb.set_position(done))
        .with_context(|| format!("failed to format {}", args.image.display()))?;
    pb.finish_and_clear();

    print_summary(&args.image, &geometry);
    Ok(())
}

fn zero_progress_bar(total_blocks: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total_blocks);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.green/black}] {pos:>8}/{len} blocks {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("zeroing");
    Ok(pb)
}

fn print_summary(image: &Path, geometry: &Geometry) {
    println!(
        "✅ {} {}",
        "Formatted".green().bold(),
        image.display().to_string().cyan()
    );
    println!(
        "{}: {} bytes, {} blocks of {} bytes",
        "Size".blue(),
        geometry.size_bytes(),
        geometry.total_blocks,
        BLOCK_SIZE
    );
    println!(
        "{}: {} total, {} free",
        "Inodes".blue(),
        geometry.inode_count,
        geometry.free_inodes()
    );
    println!(
        "{}: {} metadata, {} free",
        "Blocks".blue(),
        geometry.metadata_blocks(),
        geometry.free_blocks()
    );

    println!("{}", "Layout".bright_yellow().bold());
    for region in geometry.regions() {
        println!(
            "  {:<13} {:>10} .. {:<10} ({} blocks)",
            region.name,
            region.start,
            region.end(),
            region.blocks
        );
    }
}
