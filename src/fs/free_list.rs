use serde::{Deserialize, Serialize};

use crate::fs::codec::SectorRecord;

/// 空闲块头。占 `run_length` 个扇区：一个头扇区，后面紧跟 `run_length - 1` 个零扇区。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBlock {
    pub next: u32,       // 下一个空闲块，0 表示链尾
    pub run_length: u32, // 连续空闲扇区数（含头扇区）
}

impl FreeBlock {
    pub fn new(next: u32, run_length: u32) -> Self {
        Self { next, run_length }
    }

    /// 头扇区之后需要补零的扇区数
    pub fn filler_sectors(&self) -> u32 {
        self.run_length.saturating_sub(1)
    }
}

impl SectorRecord for FreeBlock {
    const KIND: &'static str = "free block";
}
