use std::ops::RangeInclusive;

/// 超级块魔数，内核挂载时校验
pub const MAGIC_CONSTANT: u32 = 0xde00_1337;

/// 超级块总在区域起点
pub const SUPER_BLOCK_SECTOR: u32 = 0;

/// 空指针
pub const NULL_POINTER: u32 = 0;

// 文件名字段定长 256 字节，末尾至少保留一个 NUL
pub const MAX_EXECNAME_LEN: usize = 256;

// 与内核的程序表大小一致
pub const MAX_USER_APPS: usize = 128;

/// 不小于该值的剩余扇区才会被随机切分
pub const MIN_CHUNK_SECTORS: u32 = 8;

/// 每个文件附带一段空闲区，长度随机取自该区间
pub const FREE_RUN_SECTORS: RangeInclusive<u32> = 1..=4;

pub const DEFAULT_NUM_SECTORS: u32 = 634_966;
pub const DEFAULT_SKIP_SECTORS: u64 = 1;
pub const DEFAULT_OUTPUT: &str = "hd.img";
