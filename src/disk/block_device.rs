use std::io::{Error, ErrorKind, Result};

use crate::disk::types::{Block, BLOCK_SIZE};

pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()>;

    /// 设备包含的块总数
    fn block_count(&self) -> u64;

    /// 把缓冲的写入落盘
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn size_bytes(&self) -> u64 {
        self.block_count() * BLOCK_SIZE as u64
    }

    /// 将 [start, start + count) 范围内的块全部清零
    fn zero_blocks(&self, start: u64, count: u64) -> Result<()> {
        let zero: Block = [0; BLOCK_SIZE];
        for block_id in start..start + count {
            self.write_block(block_id, &zero)?;
        }
        Ok(())
    }
}

/// 越界访问统一报 InvalidInput，避免文件被悄悄扩展
pub(crate) fn check_block_range(block_id: u64, block_count: u64) -> Result<()> {
    if block_id >= block_count {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("block {} out of range (device has {} blocks)", block_id, block_count),
        ));
    }
    Ok(())
}
