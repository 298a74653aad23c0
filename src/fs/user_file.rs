use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use crate::fs::{
    error::{FileSystemError, Result},
    file_header::FileName,
};

/// 规划器看到的文件信息：名字和声明大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntry {
    pub name: FileName,
    pub size: u32,
}

impl FileEntry {
    pub fn new(name: &str, size: u64) -> Result<Self> {
        let name = FileName::new(name)?;
        let size = u32::try_from(size).map_err(|_| FileSystemError::FileTooLarge {
            name: name.to_string(),
            size,
        })?;
        Ok(Self { name, size })
    }
}

/// 待打包的程序文件，内容只能顺序向前读取一次
#[derive(Debug)]
pub struct UserFile<R = BufReader<File>> {
    entry: FileEntry,
    reader: R,
    remaining: u32, // 按声明大小计，尚未交出的字节数
}

impl UserFile<BufReader<File>> {
    pub fn open(name: &str, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Self::from_reader(name, size, BufReader::new(file))
    }
}

impl<R: Read> UserFile<R> {
    pub fn from_reader(name: &str, size: u64, reader: R) -> Result<Self> {
        let entry = FileEntry::new(name, size)?;
        Ok(Self {
            entry,
            reader,
            remaining: entry.size,
        })
    }

    pub fn entry(&self) -> FileEntry {
        self.entry
    }

    pub fn size(&self) -> u32 {
        self.entry.size
    }

    /// 取接下来的 `len` 个字节；源数据不足时用 0 补齐。
    /// 实际文件比声明短也按补零处理，不报错。
    pub fn take_padded(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let wanted = len.min(self.remaining as usize);
        let mut buf = Vec::with_capacity(len);
        (&mut self.reader)
            .take(wanted as u64)
            .read_to_end(&mut buf)?;

        self.remaining -= wanted as u32;
        buf.resize(len, 0);
        Ok(buf)
    }
}
