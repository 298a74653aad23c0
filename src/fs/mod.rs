//! 镜像生成引擎：先规划布局，再按计划写出每个块。

pub mod chunk;
pub mod codec;
pub mod config;
pub mod error;
pub mod file_header;
pub mod free_list;
#[cfg(test)]
pub mod image_reader;
pub mod layout;
pub mod super_block;
pub mod user_file;
pub mod writer;

pub use error::FileSystemError;
pub use layout::{plan, BlockRecord, Plan, PlanSummary};
pub use user_file::{FileEntry, UserFile};
pub use writer::execute;
