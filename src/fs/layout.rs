//! 布局规划：根据镜像大小和 inode 数量算出每个区域的起始块和块数。
//!
//! 区域按固定顺序紧密排列：
//!
//! ```text
//! | 超级块 | 数据块位图 | inode 位图 | inode 表 | 数据区 |
//!     0      1..          ..          ..         ..total_blocks
//! ```
//!
//! 规划是纯计算，不做任何 I/O。

use tracing::debug;

use crate::{
    disk::{BITS_PER_BLOCK, BLOCK_SIZE},
    fs::{
        config::{DATA_BITMAP_START_BLOCK_ID, INODES_PER_BLOCK, MAX_BLOCKS, MAX_INODES},
        error::{FormatError, Result},
    },
};

/// 规划结果：所有区域的位置和大小（单位：块）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub total_blocks: u64,
    pub inode_count: u64,

    pub data_bitmap_start: u64,
    pub data_bitmap_blocks: u64,

    pub inode_bitmap_start: u64,
    pub inode_bitmap_blocks: u64,

    pub inode_table_start: u64,
    pub inode_table_blocks: u64,

    pub data_start: u64,
    pub data_blocks: u64, // 格式化后全部空闲
}

/// 一个连续区域，用于展示和校验
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub start: u64,
    pub blocks: u64,
}

impl Region {
    pub fn end(&self) -> u64 {
        self.start + self.blocks
    }
}

impl Geometry {
    pub fn size_bytes(&self) -> u64 {
        self.total_blocks * BLOCK_SIZE as u64
    }

    /// 超级块 + 两个位图 + inode 表
    pub fn metadata_blocks(&self) -> u64 {
        1 + self.data_bitmap_blocks + self.inode_bitmap_blocks + self.inode_table_blocks
    }

    pub fn free_blocks(&self) -> u64 {
        self.data_blocks
    }

    /// 根目录占用 0 号 inode
    pub fn free_inodes(&self) -> u64 {
        self.inode_count - 1
    }

    pub fn regions(&self) -> [Region; 5] {
        [
            Region {
                name: "superblock",
                start: 0,
                blocks: 1,
            },
            Region {
                name: "data bitmap",
                start: self.data_bitmap_start,
                blocks: self.data_bitmap_blocks,
            },
            Region {
                name: "inode bitmap",
                start: self.inode_bitmap_start,
                blocks: self.inode_bitmap_blocks,
            },
            Region {
                name: "inode table",
                start: self.inode_table_start,
                blocks: self.inode_table_blocks,
            },
            Region {
                name: "data",
                start: self.data_start,
                blocks: self.data_blocks,
            },
        ]
    }

    /// 校验布局自洽：区域首尾相接、覆盖整个镜像、每个区域非空且容量足够。
    ///
    /// plan() 的结果总是合法的；手工构造的 Geometry 在写盘前必须先过这一步。
    pub fn validate(&self) -> Result<()> {
        if self.inode_count == 0 {
            return Err(FormatError::ZeroInodes);
        }
        if self.inode_count > MAX_INODES {
            return Err(FormatError::InvalidGeometry("inode count exceeds 32-bit range"));
        }
        if self.total_blocks > MAX_BLOCKS {
            return Err(FormatError::ImageTooLarge {
                blocks: self.total_blocks,
            });
        }
        if self.data_bitmap_start != DATA_BITMAP_START_BLOCK_ID {
            return Err(FormatError::InvalidGeometry("data bitmap must start at block 1"));
        }

        let regions = self.regions();
        if regions.iter().any(|r| r.blocks == 0) {
            return Err(FormatError::InvalidGeometry("empty region"));
        }
        if regions.windows(2).any(|pair| pair[0].end() != pair[1].start) {
            return Err(FormatError::InvalidGeometry("regions are not contiguous"));
        }
        if regions[4].end() != self.total_blocks {
            return Err(FormatError::InvalidGeometry("regions do not cover the image"));
        }

        if self.inode_table_blocks * INODES_PER_BLOCK < self.inode_count {
            return Err(FormatError::InvalidGeometry("inode table too small"));
        }
        if self.inode_bitmap_blocks * BITS_PER_BLOCK < self.inode_count {
            return Err(FormatError::InvalidGeometry("inode bitmap too small"));
        }
        if self.data_bitmap_blocks * BITS_PER_BLOCK < self.data_blocks {
            return Err(FormatError::InvalidGeometry("data bitmap too small"));
        }
        Ok(())
    }
}

/// 计算镜像布局。
///
/// 数据块位图只需要覆盖数据区本身：它自己占用的块不需要记录。
/// 设剩余块数为 `r`，位图块数 `d` 要满足 `d * BITS_PER_BLOCK >= r - d`，
/// 取最小值 `d = ceil(r / (BITS_PER_BLOCK + 1))`。
pub fn plan(image_size_bytes: u64, inode_count: u64) -> Result<Geometry> {
    let block_size = BLOCK_SIZE as u64;
    if image_size_bytes == 0 || image_size_bytes % block_size != 0 {
        return Err(FormatError::MisalignedImage {
            size: image_size_bytes,
        });
    }

    let total_blocks = image_size_bytes / block_size;
    if total_blocks > MAX_BLOCKS {
        return Err(FormatError::ImageTooLarge {
            blocks: total_blocks,
        });
    }

    if inode_count == 0 {
        return Err(FormatError::ZeroInodes);
    }
    if inode_count > MAX_INODES {
        return Err(FormatError::TooManyInodes {
            requested: inode_count,
            max: max_inodes(total_blocks),
        });
    }

    let inode_table_blocks = inode_count.div_ceil(INODES_PER_BLOCK);
    let inode_bitmap_blocks = inode_count.div_ceil(BITS_PER_BLOCK);

    let inode_overhead = 1 + inode_bitmap_blocks + inode_table_blocks;
    if inode_overhead > total_blocks {
        return Err(FormatError::TooManyInodes {
            requested: inode_count,
            max: max_inodes(total_blocks),
        });
    }

    // 至少要留下 1 个位图块和 1 个数据块
    let remaining = total_blocks - inode_overhead;
    if remaining < 2 {
        return Err(FormatError::InsufficientSpace {
            total_blocks,
            required: inode_overhead + 2,
        });
    }

    let data_bitmap_blocks = remaining.div_ceil(BITS_PER_BLOCK + 1);
    let data_blocks = remaining - data_bitmap_blocks;

    let data_bitmap_start = DATA_BITMAP_START_BLOCK_ID;
    let inode_bitmap_start = data_bitmap_start + data_bitmap_blocks;
    let inode_table_start = inode_bitmap_start + inode_bitmap_blocks;
    let data_start = inode_table_start + inode_table_blocks;

    let geometry = Geometry {
        total_blocks,
        inode_count,
        data_bitmap_start,
        data_bitmap_blocks,
        inode_bitmap_start,
        inode_bitmap_blocks,
        inode_table_start,
        inode_table_blocks,
        data_start,
        data_blocks,
    };
    debug!(?geometry, "planned layout");
    debug_assert!(geometry.validate().is_ok());

    Ok(geometry)
}

/// plan() 能接受的最大 inode 数：除超级块外还要留 1 个数据块位图块和 1 个数据块
fn max_inodes(total_blocks: u64) -> u64 {
    let available = total_blocks.saturating_sub(1 + 2);
    // k 个 inode 表块需要 ceil(k / 1024) 个位图块
    let table_blocks_per_bitmap_block = BITS_PER_BLOCK / INODES_PER_BLOCK;
    let bitmap_blocks = available.div_ceil(table_blocks_per_bitmap_block + 1);
    let table_blocks = available - bitmap_blocks;
    (table_blocks * INODES_PER_BLOCK).min(MAX_INODES)
}

#[cfg(test)]
mod tests {
    use super::*;

    const B: u64 = BLOCK_SIZE as u64;

    fn assert_consistent(g: &Geometry) {
        let regions = g.regions();
        let covered: u64 = regions.iter().map(|r| r.blocks).sum();
        assert_eq!(covered, g.total_blocks, "{:?}", g);

        // 起始块严格递增，且首尾相接
        for pair in regions.windows(2) {
            assert!(pair[0].start < pair[1].start, "{:?}", g);
            assert_eq!(pair[0].end(), pair[1].start, "{:?}", g);
        }
        assert_eq!(regions[4].end(), g.total_blocks);

        assert!(g.data_bitmap_blocks > 0);
        assert!(g.inode_bitmap_blocks > 0);
        assert!(g.inode_table_blocks > 0);
        assert!(g.data_blocks > 0);
        assert_eq!(g.free_blocks(), g.total_blocks - g.metadata_blocks());
        g.validate().unwrap();
    }

    #[test]
    fn sixteen_blocks_eight_inodes() {
        let g = plan(16 * B, 8).unwrap();
        assert_eq!(g.total_blocks, 16);
        assert_eq!(g.data_bitmap_start, 1);
        assert_eq!(g.data_bitmap_blocks, 1);
        assert_eq!(g.inode_bitmap_start, 2);
        assert_eq!(g.inode_bitmap_blocks, 1);
        assert_eq!(g.inode_table_start, 3);
        assert_eq!(g.inode_table_blocks, 1);
        assert_eq!(g.data_start, 4);
        assert_eq!(g.data_blocks, 12);
        assert_eq!(g.free_inodes(), 7);
        assert_consistent(&g);
    }

    #[test]
    fn smallest_image_leaves_one_data_block() {
        let g = plan(5 * B, 1).unwrap();
        assert_eq!(g.free_blocks(), 1);
        assert_consistent(&g);

        match plan(4 * B, 1) {
            Err(FormatError::InsufficientSpace {
                total_blocks,
                required,
            }) => {
                assert_eq!(total_blocks, 4);
                assert_eq!(required, 5);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn tiny_images_are_insufficient() {
        for blocks in 1..=2 {
            assert!(plan(blocks * B, 1).is_err());
        }
        assert!(matches!(
            plan(3 * B, 1),
            Err(FormatError::InsufficientSpace { .. })
        ));
    }

    #[test]
    fn rejects_invalid_requests() {
        assert!(matches!(plan(16 * B, 0), Err(FormatError::ZeroInodes)));
        assert!(matches!(
            plan(0, 8),
            Err(FormatError::MisalignedImage { size: 0 })
        ));
        assert!(matches!(
            plan(16 * B + 512, 8),
            Err(FormatError::MisalignedImage { .. })
        ));
        assert!(matches!(
            plan(16 * B, MAX_INODES + 1),
            Err(FormatError::TooManyInodes { .. })
        ));
        assert!(matches!(
            plan((MAX_BLOCKS + 1) * B, 8),
            Err(FormatError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn inode_table_larger_than_image() {
        // 16 块的镜像放不下 1000 个 inode（需要 32 个表块）
        match plan(16 * B, 1000) {
            Err(FormatError::TooManyInodes { requested, max }) => {
                assert_eq!(requested, 1000);
                assert_eq!(max, 384);
                assert!(plan(16 * B, max).is_ok());
                assert!(plan(16 * B, max + 1).is_err());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn reported_max_inodes_always_plans() {
        for &blocks in &[5u64, 6, 16, 100, 1028, 1029, 40_000, 1 << 20] {
            let max = max_inodes(blocks);
            let g = plan(blocks * B, max).unwrap();
            assert_consistent(&g);
            assert!(plan(blocks * B, max + 1).is_err(), "{} blocks", blocks);
        }
    }

    #[test]
    fn regions_cover_image_for_many_sizes() {
        let sizes = [5, 6, 7, 64, 100, 1000, 32_768, 32_770, 65_541, 200_000];
        let inode_counts = [1, 7, 32, 33, 100, 1024, 32_768, 32_769];

        for &blocks in &sizes {
            for &inodes in &inode_counts {
                match plan(blocks * B, inodes) {
                    Ok(g) => {
                        assert_eq!(g.total_blocks, blocks);
                        assert_eq!(g.inode_count, inodes);
                        assert_consistent(&g);
                    }
                    Err(FormatError::InsufficientSpace { .. })
                    | Err(FormatError::TooManyInodes { .. }) => {}
                    Err(e) => panic!("unexpected error for {} blocks / {} inodes: {}", blocks, inodes, e),
                }
            }
        }
    }

    #[test]
    fn data_bitmap_is_minimal_and_covers_data() {
        for &blocks in &[6u64, 1000, 32_771, 32_772, 65_543, 65_544, 1 << 20] {
            let g = plan(blocks * B, 32).unwrap();
            let d = g.data_bitmap_blocks;
            assert!(d * BITS_PER_BLOCK >= g.data_blocks, "{:?}", g);

            // 少一个位图块就不够覆盖（多出来的那块会变成数据块）
            let smaller = d - 1;
            assert!(smaller * BITS_PER_BLOCK < g.data_blocks + 1, "{:?}", g);
        }
    }

    #[test]
    fn inode_bitmap_uses_one_bit_per_inode() {
        assert_eq!(plan(100_000 * B, BITS_PER_BLOCK).unwrap().inode_bitmap_blocks, 1);
        assert_eq!(
            plan(100_000 * B, BITS_PER_BLOCK + 1).unwrap().inode_bitmap_blocks,
            2
        );
    }

    #[test]
    fn validate_rejects_hand_built_layouts() {
        let good = plan(16 * B, 8).unwrap();
        good.validate().unwrap();

        let no_inodes = Geometry {
            inode_count: 0,
            ..good
        };
        assert!(matches!(no_inodes.validate(), Err(FormatError::ZeroInodes)));

        let gap = Geometry {
            inode_table_start: good.inode_table_start + 1,
            data_start: good.data_start + 1,
            data_blocks: good.data_blocks - 1,
            ..good
        };
        assert!(matches!(gap.validate(), Err(FormatError::InvalidGeometry(_))));

        let short = Geometry {
            data_blocks: good.data_blocks - 1,
            ..good
        };
        assert!(matches!(short.validate(), Err(FormatError::InvalidGeometry(_))));

        let small_table = Geometry {
            inode_count: INODES_PER_BLOCK + 1,
            ..good
        };
        assert!(matches!(
            small_table.validate(),
            Err(FormatError::InvalidGeometry("inode table too small"))
        ));

        let empty_bitmap = Geometry {
            data_bitmap_blocks: 0,
            inode_bitmap_start: 1,
            inode_table_start: 2,
            data_start: 3,
            data_blocks: 13,
            ..good
        };
        assert!(matches!(
            empty_bitmap.validate(),
            Err(FormatError::InvalidGeometry("empty region"))
        ));
    }

    #[test]
    fn max_inodes_fills_available_blocks() {
        assert_eq!(max_inodes(1), 0);
        assert_eq!(max_inodes(4), 0);
        assert_eq!(max_inodes(5), INODES_PER_BLOCK);
        assert_eq!(max_inodes(1028), 1024 * INODES_PER_BLOCK);
    }
}
