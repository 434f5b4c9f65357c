use thiserror::Error;

/// 格式化错误类型
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("number of inodes must be greater than zero")]
    ZeroInodes,

    #[error("{requested} inodes do not fit in this image (at most {max})")]
    TooManyInodes { requested: u64, max: u64 },

    #[error("image size {size} is not a positive multiple of the block size")]
    MisalignedImage { size: u64 },

    #[error("image has {blocks} blocks, more than a 32-bit block number can address")]
    ImageTooLarge { blocks: u64 },

    #[error("image has {total_blocks} blocks but at least {required} are required")]
    InsufficientSpace { total_blocks: u64, required: u64 },

    #[error("image already contains a MiniFS file system; use --force to overwrite")]
    AlreadyFormatted,

    #[error("image does not contain a MiniFS file system")]
    NotFormatted,

    #[error("invalid inode: {0}")]
    InvalidInode(u64),

    #[error("inconsistent layout: {0}")]
    InvalidGeometry(&'static str),

    #[error("layout expects {expected} blocks but the device has {actual}")]
    GeometryMismatch { expected: u64, actual: u64 },

    // 底层 I/O 错误，直接上抛，不重试
    #[error("disk I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

/// 格式化统一结果类型
pub type Result<T> = std::result::Result<T, FormatError>;
