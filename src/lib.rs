//! MiniFS 格式化工具库。
//!
//! 把一个定长镜像划分为超级块、数据块位图、inode 位图、inode 表和数据区，
//! 并创建空的根目录。驱动挂载之后的读写不在这里。

pub mod disk;
pub mod fs;

pub use disk::{BlockDevice, FileDisk, MemDisk, BLOCK_SIZE};
pub use fs::{format, plan, FormatError, FormatOptions, Geometry};
