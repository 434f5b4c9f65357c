use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        config::{MINIFS_MAGIC, SUPER_BLOCK_BLOCK_ID},
        error::{FormatError, Result},
        layout::Geometry,
    },
};

/// 超级块编码后的长度：6 个 u64 + 4 个 u32
pub const SUPER_BLOCK_ENCODED_SIZE: usize = 6 * 8 + 4 * 4;

/// 盘上超级块。
///
/// 字段顺序就是盘上顺序，bincode 按定长小端编码，不带填充。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub magic: u64, // 魔数，用于识别文件系统
    pub size: u64,  // 镜像总字节数
    /** 总量和空闲量 */
    pub inode_count: u64,      // inode 总数
    pub block_count: u64,      // 块总数
    pub free_inode_count: u64, // 空闲 inode 数
    pub free_block_count: u64, // 空闲块数
    /** 各区域起始块号 */
    pub data_bitmap: u32,
    pub inode_bitmap: u32,
    pub inode_table: u32,
    pub first_data: u32,
}

impl SuperBlock {
    /// 根据规划结果生成超级块，根目录已经占用一个 inode
    pub fn from_geometry(geometry: &Geometry) -> Self {
        // plan() 保证块号不超过 u32
        Self {
            magic: MINIFS_MAGIC,
            size: geometry.size_bytes(),
            inode_count: geometry.inode_count,
            block_count: geometry.total_blocks,
            free_inode_count: geometry.free_inodes(),
            free_block_count: geometry.free_blocks(),
            data_bitmap: geometry.data_bitmap_start as u32,
            inode_bitmap: geometry.inode_bitmap_start as u32,
            inode_table: geometry.inode_table_start as u32,
            first_data: geometry.data_start as u32,
        }
    }

    pub fn encode(&self) -> Result<Block> {
        let bytes = bincode::serialize(self)?;
        let mut block: Block = [0; BLOCK_SIZE];
        block[..bytes.len()].copy_from_slice(&bytes);
        Ok(block)
    }

    pub fn decode(block: &Block) -> Result<Self> {
        if !has_signature(block) {
            return Err(FormatError::NotFormatted);
        }
        Ok(bincode::deserialize(&block[..SUPER_BLOCK_ENCODED_SIZE])?)
    }

    /// 写入第 0 块，这是格式化过程中唯一一次写第 0 块
    pub fn sync(&self, disk: &dyn BlockDevice) -> Result<()> {
        disk.write_block(SUPER_BLOCK_BLOCK_ID, &self.encode()?)?;
        Ok(())
    }

    pub fn load(disk: &dyn BlockDevice) -> Result<Self> {
        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(SUPER_BLOCK_BLOCK_ID, &mut block)?;
        Self::decode(&block)
    }
}

/// 判断一段字节开头是否是 MiniFS 魔数，不足 8 字节一律视为未格式化
pub fn has_signature(bytes: &[u8]) -> bool {
    match bytes.get(..8) {
        Some(head) => {
            let mut magic = [0u8; 8];
            magic.copy_from_slice(head);
            u64::from_le_bytes(magic) == MINIFS_MAGIC
        }
        None => false,
    }
}

/// 检查设备上是否已经有 MiniFS
pub fn is_formatted(disk: &dyn BlockDevice) -> Result<bool> {
    let mut block: Block = [0; BLOCK_SIZE];
    disk.read_block(SUPER_BLOCK_BLOCK_ID, &mut block)?;
    Ok(has_signature(&block))
}
