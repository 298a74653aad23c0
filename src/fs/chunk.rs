use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fs::{codec::SectorRecord, config::MIN_CHUNK_SECTORS};

/// 块节点：指向一段连续的文件内容（ChunkData）
///
/// 布局：next:4, length:4, data:4, 其余 500 字节保留。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkNode {
    pub next: u32,   // 同一文件的下一个块节点
    pub length: u32, // 内容长度（扇区）
    pub data: u32,   // 内容起始扇区
}

impl SectorRecord for ChunkNode {
    const KIND: &'static str = "chunk node";
}

/// 把 `sectors` 个扇区切成若干段，按生成顺序返回各段长度。
///
/// 剩余不少于 `MIN_CHUNK_SECTORS` 时在 `[MIN_CHUNK_SECTORS, 剩余]` 中均匀取值，
/// 否则最后一段吃掉全部剩余。
pub fn split_into_chunks<R: Rng + ?Sized>(mut sectors: u32, rng: &mut R) -> Vec<u32> {
    let mut chunks = Vec::new();
    while sectors > 0 {
        let length = if sectors >= MIN_CHUNK_SECTORS {
            rng.random_range(MIN_CHUNK_SECTORS..=sectors)
        } else {
            sectors
        };
        chunks.push(length);
        sectors -= length;
    }
    chunks
}
