use serde::{Deserialize, Serialize};

use crate::fs::{codec::SectorRecord, config::MAGIC_CONSTANT};

/// 超级块：镜像的唯一入口，固定位于区域首扇区
///
/// 布局：magic:4, first_file:4, first_free:4, 其余 500 字节保留。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub magic: u32,      // 魔数，用于识别文件系统
    pub first_file: u32, // 文件链表头所在扇区
    pub first_free: u32, // 空闲链表头所在扇区
}

impl SuperBlock {
    pub fn new(first_file: u32, first_free: u32) -> Self {
        Self {
            magic: MAGIC_CONSTANT,
            first_file,
            first_free,
        }
    }
}

impl SectorRecord for SuperBlock {
    const KIND: &'static str = "superblock";
}
