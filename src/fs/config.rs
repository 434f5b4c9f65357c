use crate::disk::BLOCK_SIZE;

/// 魔数，用于识别 MiniFS 镜像
pub const MINIFS_MAGIC: u64 = 0xC5C3_69A1_C5C3_69A1;

/// 超级块固定在第 0 块
pub const SUPER_BLOCK_BLOCK_ID: u64 = 0;

/// 数据块位图紧跟在超级块之后
pub const DATA_BITMAP_START_BLOCK_ID: u64 = 1;

// 每个 inode 记录 128 字节，一个 4KB 块可以存 32 个 inode
pub const INODE_SIZE: usize = 128;
pub const INODES_PER_BLOCK: u64 = (BLOCK_SIZE / INODE_SIZE) as u64;

/// 根目录的 inode 编号
pub const ROOT_INO: u32 = 0;

/// extent_table 的哨兵值：inode 还没有任何 extent
pub const NO_EXTENTS: u32 = u32::MAX;

/// 块号和 inode 号在盘上都是 32 位
pub const MAX_BLOCKS: u64 = u32::MAX as u64;
pub const MAX_INODES: u64 = u32::MAX as u64;

/// 一次格式化的运行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub inode_count: u64, // 需要的 inode 数量
    pub force: bool,      // 允许覆盖已有的 MiniFS
    pub zero: bool,       // 格式化前先把整个镜像清零
}

impl FormatOptions {
    pub fn new(inode_count: u64) -> Self {
        Self {
            inode_count,
            force: false,
            zero: false,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn zero(mut self, zero: bool) -> Self {
        self.zero = zero;
        self
    }
}
