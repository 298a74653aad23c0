use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Result, Seek, SeekFrom, Write},
    path::Path,
};

use log::trace;

use crate::disk::{block_device::BlockDevice, types::SECTOR_SIZE};

/// 以文件（或任意可寻址句柄）为后端的扇区设备。
/// 所有扇区号都相对于 `skip` 之后的区域起点。
#[derive(Debug)]
pub struct FileDisk<F = File> {
    file: F,
    skip: u64,
}

/// `sector` 扇区的字节偏移，溢出时报 `InvalidInput`
fn sector_bytes(sector: u64, extra: u64) -> Result<u64> {
    sector
        .checked_add(extra)
        .and_then(|s| s.checked_mul(SECTOR_SIZE as u64))
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("sector {} + {} is beyond any addressable device", sector, extra),
            )
        })
}

impl FileDisk<File> {
    /// 打开（必要时创建）镜像文件。
    /// 普通文件长度不足 `skip + total_sectors` 个扇区时会被扩展。
    pub fn open(path: &Path, skip: u64, total_sectors: u64) -> Result<Self> {
        let required = sector_bytes(skip, total_sectors)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let metadata = file.metadata()?;
        if metadata.is_file() && metadata.len() < required {
            file.set_len(required)?;
        }

        Ok(Self::new(file, skip))
    }
}

impl<F> FileDisk<F> {
    pub fn new(file: F, skip: u64) -> Self {
        Self { file, skip }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> F {
        self.file
    }
}

impl<F: Write + Seek> BlockDevice for FileDisk<F> {
    fn write_sectors(&mut self, sector: u64, buf: &[u8]) -> Result<()> {
        debug_assert_eq!(buf.len() % SECTOR_SIZE, 0);
        let offset = sector_bytes(self.skip, sector)?;
        trace!("write {} sector(s) at {}", buf.len() / SECTOR_SIZE, sector);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        Ok(())
    }
}
