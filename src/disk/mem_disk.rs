use std::{
    io::{Error, ErrorKind, Result},
    sync::{Mutex, MutexGuard},
};

use crate::disk::{
    block_device::{check_block_range, BlockDevice},
    types::{Block, BLOCK_SIZE},
};

/// 内存中的块设备，整块镜像平铺存放在一个 Vec<u8> 里
#[derive(Debug)]
pub struct MemDisk {
    bytes: Mutex<Vec<u8>>,
    block_count: u64,
}

impl MemDisk {
    /// 创建全零镜像
    pub fn new(block_count: u64) -> Self {
        Self {
            bytes: Mutex::new(vec![0u8; block_count as usize * BLOCK_SIZE]),
            block_count,
        }
    }

    /// 接管一段已有的镜像字节，长度必须是块大小的正整数倍
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() || bytes.len() % BLOCK_SIZE != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "image size {} is not a positive multiple of the block size {}",
                    bytes.len(),
                    BLOCK_SIZE
                ),
            ));
        }
        let block_count = (bytes.len() / BLOCK_SIZE) as u64;
        Ok(Self {
            bytes: Mutex::new(bytes),
            block_count,
        })
    }

    /// 当前镜像内容的拷贝
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(self.lock()?.clone())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<u8>>> {
        self.bytes
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "memory image lock poisoned"))
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        check_block_range(block_id, self.block_count)?;
        let bytes = self.lock()?;
        let start = block_id as usize * BLOCK_SIZE;
        buf.copy_from_slice(&bytes[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        check_block_range(block_id, self.block_count)?;
        let mut bytes = self.lock()?;
        let start = block_id as usize * BLOCK_SIZE;
        bytes[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }
}
