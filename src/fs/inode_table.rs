use bitflags::bitflags;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        config::{INODES_PER_BLOCK, INODE_SIZE, NO_EXTENTS},
        error::{FormatError, Result},
        layout::Geometry,
    },
};

/// inode 编码后的有效长度，记录剩余部分是填充
pub const INODE_ENCODED_SIZE: usize = 40;

bitflags! {
    /// 文件类型和权限位，取值与 POSIX st_mode 一致
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mode: u32 {
        const S_IFDIR = 0o040000;
        const S_IFREG = 0o100000;

        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;

        const ALL_RWX = 0o777;
    }
}

/// 修改时间，秒 + 纳秒
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl Timespec {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            sec: now.timestamp(),
            nsec: now.timestamp_subsec_nanos() as i64,
        }
    }
}

/// 盘上 inode 记录，每条占 INODE_SIZE 字节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub mode: u32,         // 类型 + 权限
    pub links: u32,        // 硬链接数
    pub size: u64,         // 文件大小（字节）
    pub mtime: Timespec,   // 最后修改时间
    pub extent_table: u32, // extent 表所在块，NO_EXTENTS 表示没有
    pub extent_count: u32, // extent 个数
}

impl Inode {
    /// 空的根目录：rwx 全开，"." 和 ".." 都指向自己，所以链接数为 2
    pub fn root_directory(mtime: Timespec) -> Self {
        Self {
            mode: (Mode::S_IFDIR | Mode::ALL_RWX).bits(),
            links: 2,
            size: 0,
            mtime,
            extent_table: NO_EXTENTS,
            extent_count: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_bits_retain(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.mode().contains(Mode::S_IFDIR)
    }

    pub fn has_extents(&self) -> bool {
        self.extent_table != NO_EXTENTS
    }
}

/// inode 表区域：第 i 条记录位于 `start_block + i / 32` 块内偏移 `(i % 32) * 128`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeTable {
    pub start_block: u64,
    pub blocks: u64,
    pub total_inodes: u64,
}

impl InodeTable {
    pub fn new(start_block: u64, blocks: u64, total_inodes: u64) -> Self {
        Self {
            start_block,
            blocks,
            total_inodes,
        }
    }

    pub fn from_geometry(geometry: &Geometry) -> Self {
        Self::new(
            geometry.inode_table_start,
            geometry.inode_table_blocks,
            geometry.inode_count,
        )
    }

    /// inode 所在的块号和块内偏移
    pub fn locate(&self, ino: u64) -> Result<(u64, usize)> {
        if ino >= self.total_inodes {
            return Err(FormatError::InvalidInode(ino));
        }
        let block_id = self.start_block + ino / INODES_PER_BLOCK;
        let offset = (ino % INODES_PER_BLOCK) as usize * INODE_SIZE;
        Ok((block_id, offset))
    }

    /// 只改写目标记录所在的 128 字节，同一块里的其他记录保持原样
    pub fn write_inode(&self, disk: &dyn BlockDevice, ino: u64, inode: &Inode) -> Result<()> {
        let (block_id, offset) = self.locate(ino)?;
        let bytes = bincode::serialize(inode)?;

        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(block_id, &mut block)?;

        let slot = &mut block[offset..offset + INODE_SIZE];
        slot.fill(0);
        slot[..bytes.len()].copy_from_slice(&bytes);

        disk.write_block(block_id, &block)?;
        Ok(())
    }

    pub fn read_inode(&self, disk: &dyn BlockDevice, ino: u64) -> Result<Inode> {
        let (block_id, offset) = self.locate(ino)?;
        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(block_id, &mut block)?;
        Ok(bincode::deserialize(&block[offset..offset + INODE_ENCODED_SIZE])?)
    }
}
