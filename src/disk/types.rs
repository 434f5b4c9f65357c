/// 每个逻辑块（Block）的大小：4KB
/// 镜像以“块”为最小寻址单位，所有区域大小都是整块。
pub const BLOCK_SIZE: usize = 4096;

/// 一个块可以记录的位图位数
pub const BITS_PER_BLOCK: u64 = (BLOCK_SIZE * 8) as u64;

/// 定义一个逻辑块类型（每块 4KB 的字节数组）
/// 所有设备读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];
