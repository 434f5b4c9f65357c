use std::path::PathBuf;

use clap::{ArgAction, Parser};

use mini_mkfs::{FormatOptions, BLOCK_SIZE};

#[derive(Parser, Debug)]
#[command(
    name = "mkfs-minifs",
    version,
    about = "Format an image file into a MiniFS file system",
    after_help = format!(
        "The image file must exist and its size must be a multiple of the block size ({} bytes).",
        BLOCK_SIZE
    )
)]
pub struct Args {
    /// Image file to format
    pub image: PathBuf,

    /// Number of inodes
    #[arg(short = 'i', long = "inodes", value_name = "NUM", value_parser = clap::value_parser!(u64).range(1..))]
    pub inodes: u64,

    /// Overwrite an existing MiniFS file system
    #[arg(short, long)]
    pub force: bool,

    /// Zero out image contents before formatting
    #[arg(short, long)]
    pub zero: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions::new(self.inodes)
            .force(self.force)
            .zero(self.zero)
    }
}
