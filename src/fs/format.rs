use tracing::{debug, info};

use crate::{
    disk::{BlockDevice, BITS_PER_BLOCK},
    fs::{
        bitmap::Bitmap,
        config::{FormatOptions, ROOT_INO},
        error::{FormatError, Result},
        inode_table::{Inode, InodeTable, Timespec},
        layout::{plan, Geometry},
        super_block::{is_formatted, SuperBlock},
    },
};

/// 清零整个镜像时每次上报进度的块数
const ZERO_CHUNK_BLOCKS: u64 = 256;

/// 按照规划结果初始化元数据。
///
/// 先清零两个位图并写根目录 inode，最后写超级块。
/// 写入不是事务性的：中途失败会留下半初始化的镜像，但不会带魔数。
pub fn initialize(disk: &dyn BlockDevice, geometry: &Geometry) -> Result<()> {
    // 写任何东西之前确认布局自洽且和设备一致，所有区域都在设备范围内
    geometry.validate()?;
    if geometry.total_blocks != disk.block_count() {
        return Err(FormatError::GeometryMismatch {
            expected: geometry.total_blocks,
            actual: disk.block_count(),
        });
    }

    // 位图逐块清零，不在内存里整体构造
    disk.zero_blocks(geometry.data_bitmap_start, geometry.data_bitmap_blocks)?;
    debug!(
        start = geometry.data_bitmap_start,
        blocks = geometry.data_bitmap_blocks,
        "data bitmap cleared"
    );

    disk.zero_blocks(geometry.inode_bitmap_start, geometry.inode_bitmap_blocks)?;
    // 只有第一块需要置位，重写它即可
    let mut first_inode_bitmap_block = Bitmap::new(
        geometry.inode_count.min(BITS_PER_BLOCK),
        geometry.inode_bitmap_start,
        1,
    );
    first_inode_bitmap_block.set(ROOT_INO as u64);
    first_inode_bitmap_block.sync(disk)?;
    debug!(
        start = geometry.inode_bitmap_start,
        blocks = geometry.inode_bitmap_blocks,
        "inode bitmap seeded with root inode"
    );

    let inode_table = InodeTable::from_geometry(geometry);
    let root = Inode::root_directory(Timespec::now());
    inode_table.write_inode(disk, ROOT_INO as u64, &root)?;
    debug!(mtime = root.mtime.sec, "root directory inode written");

    SuperBlock::from_geometry(geometry).sync(disk)?;
    disk.flush()?;

    Ok(())
}

/// 格式化设备，返回使用的布局
pub fn format(disk: &dyn BlockDevice, options: &FormatOptions) -> Result<Geometry> {
    format_with_progress(disk, options, |_, _| {})
}

/// 同 [`format`]，清零镜像时通过 `on_zeroed(已清零块数, 总块数)` 上报进度。
///
/// 顺序：存在性检查 → 规划 → 可选清零 → 初始化。
/// 规划失败或镜像已格式化（且没有 force）时不写任何字节。
pub fn format_with_progress<F>(
    disk: &dyn BlockDevice,
    options: &FormatOptions,
    mut on_zeroed: F,
) -> Result<Geometry>
where
    F: FnMut(u64, u64),
{
    if !options.force && is_formatted(disk)? {
        return Err(FormatError::AlreadyFormatted);
    }

    let geometry = plan(disk.size_bytes(), options.inode_count)?;

    if options.zero {
        let total = disk.block_count();
        let mut done = 0;
        while done < total {
            let count = ZERO_CHUNK_BLOCKS.min(total - done);
            disk.zero_blocks(done, count)?;
            done += count;
            on_zeroed(done, total);
        }
        debug!(blocks = total, "image zeroed");
    }

    initialize(disk, &geometry)?;

    info!(
        blocks = geometry.total_blocks,
        inodes = geometry.inode_count,
        free_blocks = geometry.free_blocks(),
        "formatted image"
    );

    Ok(geometry)
}
