//! 只读遍历镜像，按内核的方式从超级块出发顺着指针恢复文件。

use std::collections::HashSet;

use crate::{
    disk::SECTOR_SIZE,
    fs::{
        chunk::ChunkNode,
        codec::SectorRecord,
        config::{MAGIC_CONSTANT, NULL_POINTER, SUPER_BLOCK_SECTOR},
        error::{FileSystemError, Result},
        file_header::FileHeader,
        free_list::FreeBlock,
        super_block::SuperBlock,
    },
};

pub struct ImageReader<'a> {
    image: &'a [u8],
}

impl<'a> ImageReader<'a> {
    pub fn new(image: &'a [u8]) -> Self {
        Self { image }
    }

    fn sectors(&self, offset: u32, count: u32) -> Result<&'a [u8]> {
        let start = offset as usize * SECTOR_SIZE;
        let end = start + count as usize * SECTOR_SIZE;
        self.image.get(start..end).ok_or_else(|| {
            FileSystemError::Corrupted(format!("sector {} is outside the image", offset))
        })
    }

    fn record<T: SectorRecord>(&self, offset: u32) -> Result<T> {
        T::decode(self.sectors(offset, 1)?)
    }

    /// 顺着 next 指针走链表，检测环
    fn walk<T: SectorRecord>(&self, head: u32, next: fn(&T) -> u32) -> Result<Vec<(u32, T)>> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut ptr = head;
        while ptr != NULL_POINTER {
            if !seen.insert(ptr) {
                return Err(FileSystemError::Corrupted(format!(
                    "{} list loops at sector {}",
                    T::KIND,
                    ptr
                )));
            }
            let item: T = self.record(ptr)?;
            let following = next(&item);
            items.push((ptr, item));
            ptr = following;
        }
        Ok(items)
    }

    pub fn super_block(&self) -> Result<SuperBlock> {
        let sb: SuperBlock = self.record(SUPER_BLOCK_SECTOR)?;
        if sb.magic != MAGIC_CONSTANT {
            return Err(FileSystemError::Corrupted(format!(
                "bad magic {:#x}",
                sb.magic
            )));
        }
        Ok(sb)
    }

    pub fn file_headers(&self) -> Result<Vec<FileHeader>> {
        let head = self.super_block()?.first_file;
        Ok(self
            .walk(head, |h: &FileHeader| h.next)?
            .into_iter()
            .map(|(_, h)| h)
            .collect())
    }

    pub fn free_runs(&self) -> Result<Vec<(u32, FreeBlock)>> {
        let head = self.super_block()?.first_free;
        self.walk(head, |f: &FreeBlock| f.next)
    }

    /// 块链上的全部内容，包含最后一段的补零
    pub fn raw_chunks(&self, header: &FileHeader) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        for (_, node) in self.walk(header.first_chunk, |n: &ChunkNode| n.next)? {
            bytes.extend_from_slice(self.sectors(node.data, node.length)?);
        }
        Ok(bytes)
    }

    pub fn read_file(&self, header: &FileHeader) -> Result<Vec<u8>> {
        let mut bytes = self.raw_chunks(header)?;
        if bytes.len() < header.size as usize {
            return Err(FileSystemError::Corrupted(format!(
                "{} has {} byte(s) of chunks for {} byte(s)",
                header.name,
                bytes.len(),
                header.size
            )));
        }
        bytes.truncate(header.size as usize);
        Ok(bytes)
    }

    /// 文件链表顺序的 (文件名, 内容)
    pub fn files(&self) -> Result<Vec<(String, Vec<u8>)>> {
        self.file_headers()?
            .iter()
            .map(|h| -> Result<(String, Vec<u8>)> {
                Ok((h.name.to_string(), self.read_file(h)?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        let image = vec![0u8; SECTOR_SIZE];
        assert!(ImageReader::new(&image).super_block().is_err());
    }

    #[test]
    fn detects_free_list_cycles() {
        let mut image = SuperBlock::new(0, 1).encode().unwrap().to_vec();
        image.extend_from_slice(&FreeBlock::new(1, 1).encode().unwrap());

        let err = ImageReader::new(&image).free_runs().unwrap_err();
        assert!(matches!(err, FileSystemError::Corrupted(_)));
    }
}
