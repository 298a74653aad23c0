use rand::{rngs::StdRng, SeedableRng};

use crate::disk::SECTOR_SIZE;

/// 存放 `bytes` 字节所需的扇区数（向上取整）
pub fn sectors_for(bytes: u64) -> u64 {
    bytes.div_ceil(SECTOR_SIZE as u64)
}

/// 给定种子时结果可复现，否则从系统熵源取种子
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
