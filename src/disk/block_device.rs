use std::io::Result;

/// 以扇区为单位寻址的只写设备。
/// `buf` 的长度必须是 `SECTOR_SIZE` 的整数倍，从 `sector` 开始连续写入。
pub trait BlockDevice {
    fn write_sectors(&mut self, sector: u64, buf: &[u8]) -> Result<()>;
}
