pub mod bitmap;
pub mod config;
pub mod error;
pub mod format;
pub mod inode_table;
pub mod layout;
pub mod super_block;

pub use config::FormatOptions;
pub use error::{FormatError, Result};
pub use format::{format, format_with_progress, initialize};
pub use layout::{plan, Geometry, Region};
pub use super_block::{has_signature, is_formatted, SuperBlock};
