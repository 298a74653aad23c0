use thiserror::Error;

/// 镜像生成错误类型
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("Disk I/O error: {0}")]
    Io(#[from] std::io::Error), // 底层 I/O 错误，原样向上传递

    #[error("Record encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Filesystem is too big for the disk: needs {required} sectors, disk has {capacity}")]
    CapacityExceeded { required: u64, capacity: u32 },

    #[error("File name '{name}' is too long (at most {max} bytes)")]
    NameTooLong { name: String, max: usize },

    #[error("Invalid file name: {0:?}")]
    InvalidName(String), // 空名或包含 NUL

    #[error("File '{name}' is too large: {size} bytes")]
    FileTooLarge { name: String, size: u64 },

    #[error("Too many programs: {count} given, at most {max} supported")]
    TooManyFiles { count: usize, max: usize },

    #[error("Invalid program spec '{0}', expected NAME:FILE")]
    InvalidProgramSpec(String),

    #[error("Layout plan is inconsistent: {0}")]
    Corrupted(String), // 计划内部指针不一致

    #[error("{kind} record is {len} bytes, larger than one sector")]
    RecordOverflow { kind: &'static str, len: usize },
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
