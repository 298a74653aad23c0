use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    disk::{Sector, SECTOR_SIZE},
    fs::error::{FileSystemError, Result},
};

/// 记录编码选项：定长整数、小端、无长度前缀。
/// 字段顺序即 serde 派生时的声明顺序。
fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

/// 固定布局的单扇区记录
pub trait SectorRecord: Serialize + DeserializeOwned {
    const KIND: &'static str;

    /// 编码为一个完整扇区，未使用的尾部（保留区）填零
    fn encode(&self) -> Result<Sector> {
        let bytes = options().serialize(self)?;
        if bytes.len() > SECTOR_SIZE {
            return Err(FileSystemError::RecordOverflow {
                kind: Self::KIND,
                len: bytes.len(),
            });
        }

        let mut sector = [0u8; SECTOR_SIZE];
        sector[..bytes.len()].copy_from_slice(&bytes);
        Ok(sector)
    }

    fn decode(sector: &[u8]) -> Result<Self> {
        Ok(options().deserialize(sector)?)
    }
}
