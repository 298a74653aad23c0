/// 扇区大小（字节）
/// 镜像中所有块都以扇区为最小寻址单位。
pub const SECTOR_SIZE: usize = 512;

/// 一个扇区的字节数组
pub type Sector = [u8; SECTOR_SIZE];

/// 全零扇区，用于填充空闲区域
pub const ZERO_SECTOR: Sector = [0; SECTOR_SIZE];
