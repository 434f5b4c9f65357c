use crate::disk::{Block, BlockDevice, BITS_PER_BLOCK, BLOCK_SIZE};

/// 盘上的一个位图区域（inode 位图或数据块位图）。
///
/// 位序固定为高位优先：第 i 位在第 `i / 8` 个字节，掩码 `0x80 >> (i % 8)`。
/// 读取位图的驱动必须使用同样的位序。
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub bits: Vec<u8>,    // 整块大小的位图数据
    pub total_bits: u64,  // 有效位数（inode 数或数据块数）
    pub start_block: u64, // 位图在磁盘中的起始块号
    pub blocks: u64,      // 位图占用的块数
}

impl Bitmap {
    /// 创建一个全零位图，覆盖 `blocks` 个整块
    pub fn new(total_bits: u64, start_block: u64, blocks: u64) -> Self {
        debug_assert!(total_bits <= blocks * BITS_PER_BLOCK);
        Self {
            bits: vec![0; blocks as usize * BLOCK_SIZE],
            total_bits,
            start_block,
            blocks,
        }
    }

    pub fn set(&mut self, index: u64) {
        if index >= self.total_bits {
            return; // 防止越界
        }
        let (byte, mask) = Self::position(index);
        self.bits[byte] |= mask;
    }

    pub fn clear(&mut self, index: u64) {
        if index >= self.total_bits {
            return;
        }
        let (byte, mask) = Self::position(index);
        self.bits[byte] &= !mask;
    }

    pub fn is_set(&self, index: u64) -> bool {
        if index >= self.total_bits {
            return false;
        }
        let (byte, mask) = Self::position(index);
        self.bits[byte] & mask != 0
    }

    pub fn count_set(&self) -> u64 {
        self.bits.iter().map(|b| b.count_ones() as u64).sum()
    }

    fn position(index: u64) -> (usize, u8) {
        ((index / 8) as usize, 0x80 >> (index % 8))
    }

    /// 从磁盘读取整个位图区域
    pub fn load(
        disk: &dyn BlockDevice,
        start_block: u64,
        blocks: u64,
        total_bits: u64,
    ) -> std::io::Result<Self> {
        let mut bits = Vec::with_capacity(blocks as usize * BLOCK_SIZE);
        let mut block_buf: Block = [0; BLOCK_SIZE];

        for i in 0..blocks {
            disk.read_block(start_block + i, &mut block_buf)?;
            bits.extend_from_slice(&block_buf);
        }

        Ok(Self {
            bits,
            total_bits,
            start_block,
            blocks,
        })
    }

    /// 将位图整块写回磁盘（包括尾部未使用的位，它们始终为 0）
    pub fn sync(&self, disk: &dyn BlockDevice) -> std::io::Result<()> {
        let mut block_buf: Block = [0; BLOCK_SIZE];
        for (i, chunk) in self.bits.chunks_exact(BLOCK_SIZE).enumerate() {
            block_buf.copy_from_slice(chunk);
            disk.write_block(self.start_block + i as u64, &block_buf)?;
        }
        Ok(())
    }
}
