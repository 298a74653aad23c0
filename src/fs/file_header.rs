use std::fmt;

use bitflags::bitflags;
use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::fs::{
    codec::SectorRecord,
    config::MAX_EXECNAME_LEN,
    error::{FileSystemError, Result},
};

bitflags! {
    /// 文件属性位
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FileFlags: u32 {
        const WRITABLE = 1;
    }
}

/// 定长文件名，NUL 填充，且总以 NUL 结尾
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FileName([u8; MAX_EXECNAME_LEN]);

impl FileName {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() || name.contains('\0') {
            return Err(FileSystemError::InvalidName(name.to_string()));
        }
        // 留一个字节给结尾的 NUL
        if name.len() >= MAX_EXECNAME_LEN {
            return Err(FileSystemError::NameTooLong {
                name: name.to_string(),
                max: MAX_EXECNAME_LEN - 1,
            });
        }

        let mut bytes = [0u8; MAX_EXECNAME_LEN];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self(bytes))
    }

    /// 第一个 NUL 之前的部分
    pub fn as_bytes(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_EXECNAME_LEN);
        &self.0[..end]
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

// 按定长元组编码，bincode 下不带长度前缀
impl Serialize for FileName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(MAX_EXECNAME_LEN)?;
        for byte in &self.0 {
            tuple.serialize_element(byte)?;
        }
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for FileName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FileNameVisitor;

        impl<'de> Visitor<'de> for FileNameVisitor {
            type Value = FileName;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} bytes of file name", MAX_EXECNAME_LEN)
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<FileName, A::Error> {
                let mut bytes = [0u8; MAX_EXECNAME_LEN];
                for (i, slot) in bytes.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                Ok(FileName(bytes))
            }
        }

        deserializer.deserialize_tuple(MAX_EXECNAME_LEN, FileNameVisitor)
    }
}

/// 文件节点，文件链表中的一项
///
/// 布局：next:4, name:256, size:4, flags:4, first_chunk:4, 其余 240 字节保留。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub next: u32,        // 下一个文件节点
    pub name: FileName,   // 文件名
    pub size: u32,        // 文件大小（字节）
    pub flags: FileFlags, // 是否可写
    pub first_chunk: u32, // 第一个块节点，空文件为 0
}

impl SectorRecord for FileHeader {
    const KIND: &'static str = "file header";
}
