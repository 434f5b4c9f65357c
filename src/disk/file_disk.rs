use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::{Mutex, MutexGuard},
};

use tracing::debug;

use crate::disk::{
    block_device::{check_block_range, BlockDevice},
    types::{Block, BLOCK_SIZE},
};

/// 基于镜像文件的块设备。
///
/// 文件句柄归 `FileDisk` 独占，drop 时释放且只释放一次。
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    block_count: u64,
}

impl FileDisk {
    /// 打开一个已存在的镜像文件，大小必须是块大小的正整数倍
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len();
        if len == 0 || len % BLOCK_SIZE as u64 != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "image size {} is not a positive multiple of the block size {}",
                    len, BLOCK_SIZE
                ),
            ));
        }

        let block_count = len / BLOCK_SIZE as u64;
        debug!(path = %path.display(), block_count, "opened image file");

        Ok(Self {
            file: Mutex::new(file),
            block_count,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "image file lock poisoned"))
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        check_block_range(block_id, self.block_count)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        check_block_range(block_id, self.block_count)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }

    fn flush(&self) -> Result<()> {
        let mut file = self.lock()?;
        file.flush()?;
        file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_misaligned_image() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.as_file().set_len(BLOCK_SIZE as u64 + 1).unwrap();

        let err = FileDisk::open(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn rejects_empty_image() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        assert!(FileDisk::open(tmp.path()).is_err());
    }

    #[test]
    fn block_read_write_and_bounds() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.as_file().set_len(4 * BLOCK_SIZE as u64).unwrap();

        let disk = FileDisk::open(tmp.path()).unwrap();
        assert_eq!(disk.block_count(), 4);
        assert_eq!(disk.size_bytes(), 4 * BLOCK_SIZE as u64);

        let mut block: Block = [0; BLOCK_SIZE];
        block[0] = 0xAB;
        block[BLOCK_SIZE - 1] = 0xCD;
        disk.write_block(3, &block).unwrap();

        let mut back: Block = [0; BLOCK_SIZE];
        disk.read_block(3, &mut back).unwrap();
        assert_eq!(back[0], 0xAB);
        assert_eq!(back[BLOCK_SIZE - 1], 0xCD);

        assert!(disk.write_block(4, &block).is_err());
        assert!(disk.read_block(4, &mut back).is_err());
        disk.flush().unwrap();

        // 越界写入不能扩展文件
        assert_eq!(tmp.as_file().metadata().unwrap().len(), 4 * BLOCK_SIZE as u64);
    }
}
