use std::{collections::HashMap, io::Read};

use indicatif::ProgressBar;
use log::{debug, info};

use crate::{
    disk::{BlockDevice, SECTOR_SIZE, ZERO_SECTOR},
    fs::{
        codec::SectorRecord,
        config::NULL_POINTER,
        error::{FileSystemError, Result},
        layout::{BlockRecord, Plan},
        user_file::UserFile,
    },
};

// 空闲区补零时每次最多写这么多扇区
const ZERO_BATCH_SECTORS: u32 = 128;

/// 把计划写到设备上。
///
/// 先按链表顺序从各文件读出内容，再按物理顺序逐块编码写出。
/// 设备写失败直接返回，已写的部分不回滚。
pub fn execute<R: Read, D: BlockDevice>(
    plan: &Plan,
    files: &mut [UserFile<R>],
    disk: &mut D,
    progress: &ProgressBar,
) -> Result<()> {
    let mut contents = materialize(plan, files)?;
    info!("materialized {} chunk(s)", contents.len());

    progress.set_length(plan.total_sectors());
    for block in plan.blocks() {
        let sector = u64::from(block.offset);
        match &block.record {
            BlockRecord::SuperBlock(sb) => disk.write_sectors(sector, &sb.encode()?)?,
            BlockRecord::File { header, .. } => disk.write_sectors(sector, &header.encode()?)?,
            BlockRecord::ChunkNode(node) => disk.write_sectors(sector, &node.encode()?)?,
            BlockRecord::Free(free) => {
                disk.write_sectors(sector, &free.encode()?)?;
                write_zeros(disk, sector + 1, free.filler_sectors())?;
            }
            BlockRecord::ChunkData { .. } => {
                let data = contents.remove(&block.offset).ok_or_else(|| {
                    FileSystemError::Corrupted(format!(
                        "{} at sector {} is not referenced by any chunk node",
                        block.label, block.offset
                    ))
                })?;
                disk.write_sectors(sector, &data)?;
            }
        }
        progress.inc(u64::from(block.sectors()));
    }

    info!("wrote {} sector(s)", plan.total_sectors());
    Ok(())
}

/// 顺着每个文件的块链读出内容，按内容块偏移存放。
/// 读取顺序与内核遍历块链的顺序一致。
fn materialize<R: Read>(plan: &Plan, files: &mut [UserFile<R>]) -> Result<HashMap<u32, Vec<u8>>> {
    let mut contents = HashMap::new();

    for block in plan.blocks() {
        let BlockRecord::File { source, header } = &block.record else {
            continue;
        };
        let file = files.get_mut(*source).ok_or_else(|| {
            FileSystemError::Corrupted(format!("no source for {}", header.name))
        })?;

        let mut ptr = header.first_chunk;
        while ptr != NULL_POINTER {
            let node = plan.chunk_node_at(ptr).ok_or_else(|| {
                FileSystemError::Corrupted(format!(
                    "chunk pointer {} of {} does not name a chunk node",
                    ptr, header.name
                ))
            })?;

            let data = file.take_padded(node.length as usize * SECTOR_SIZE)?;
            debug!(
                "{}: {} sector(s) into chunk at {}",
                header.name, node.length, node.data
            );
            if contents.insert(node.data, data).is_some() {
                return Err(FileSystemError::Corrupted(format!(
                    "chunk at sector {} is shared",
                    node.data
                )));
            }
            ptr = node.next;
        }
    }

    Ok(contents)
}

fn write_zeros<D: BlockDevice>(disk: &mut D, start: u64, sectors: u32) -> Result<()> {
    let batch = ZERO_SECTOR.repeat(sectors.min(ZERO_BATCH_SECTORS) as usize);
    let mut written = 0;
    while written < sectors {
        let count = (sectors - written).min(ZERO_BATCH_SECTORS);
        disk.write_sectors(
            start + u64::from(written),
            &batch[..count as usize * SECTOR_SIZE],
        )?;
        written += count;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disk::FileDisk,
        fs::{
            config::MAGIC_CONSTANT, image_reader::ImageReader, layout::plan, user_file::FileEntry,
        },
    };
    use rand::{rngs::StdRng, SeedableRng};
    use std::io::{self, Cursor};

    fn pattern(len: usize, salt: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31) ^ salt).collect()
    }

    fn sources(specs: &[(&str, Vec<u8>)]) -> Vec<UserFile<Cursor<Vec<u8>>>> {
        specs
            .iter()
            .map(|(name, bytes)| {
                UserFile::from_reader(name, bytes.len() as u64, Cursor::new(bytes.clone()))
                    .unwrap()
            })
            .collect()
    }

    /// 在给定的初始内容上规划并写出镜像
    fn build_on(
        sink: Vec<u8>,
        specs: &[(&str, Vec<u8>)],
        capacity: u32,
        skip: u64,
        seed: u64,
    ) -> Vec<u8> {
        let mut files = sources(specs);
        let entries: Vec<FileEntry> = files.iter().map(|f| f.entry()).collect();
        let plan = plan(&entries, capacity, &mut StdRng::seed_from_u64(seed)).unwrap();

        let mut disk = FileDisk::new(Cursor::new(sink), skip);
        execute(&plan, &mut files, &mut disk, &ProgressBar::hidden()).unwrap();
        disk.into_inner().into_inner()
    }

    fn build(specs: &[(&str, Vec<u8>)], capacity: u32, skip: u64, seed: u64) -> Vec<u8> {
        build_on(Vec::new(), specs, capacity, skip, seed)
    }

    #[test]
    fn round_trips_edge_sizes() {
        let specs = vec![
            ("empty", Vec::new()),
            ("exact", pattern(512, 1)),
            ("short", pattern(511, 2)),
            ("large", pattern(40_123, 3)),
        ];
        for seed in 0..8 {
            let image = build(&specs, 300, 0, seed);
            let reader = ImageReader::new(&image);

            let mut found = reader.files().unwrap();
            found.sort_by(|a, b| a.0.cmp(&b.0));
            let mut expected: Vec<(String, Vec<u8>)> = specs
                .iter()
                .map(|(n, b)| (n.to_string(), b.clone()))
                .collect();
            expected.sort_by(|a, b| a.0.cmp(&b.0));
            assert_eq!(found, expected, "seed {}", seed);
        }
    }

    #[test]
    fn hello_example() {
        let content = pattern(513, 9);
        let image = build(&[("hello", content.clone())], 100, 0, 4);
        let reader = ImageReader::new(&image);

        let sb = reader.super_block().unwrap();
        assert_eq!(sb.magic, MAGIC_CONSTANT);

        let headers = reader.file_headers().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name.to_string(), "hello");
        assert_eq!(headers[0].size, 513);

        // 物理上补齐到扇区边界，多出的部分全为 0
        let raw = reader.raw_chunks(&headers[0]).unwrap();
        assert_eq!(raw.len(), 1024);
        assert_eq!(&raw[..513], &content[..]);
        assert!(raw[513..].iter().all(|&b| b == 0));
    }

    #[test]
    fn image_stays_inside_capacity() {
        let image = build(&[("a", pattern(3000, 0))], 64, 0, 1);
        assert_eq!(image.len(), 63 * SECTOR_SIZE);
    }

    #[test]
    fn free_runs_overwrite_stale_bytes() {
        let specs = [("a", pattern(100, 0)), ("b", pattern(100, 1))];
        // 400 扇区时尾部空闲块远长于一批补零
        for capacity in [40u32, 400] {
            let sink = vec![0xFF; capacity as usize * SECTOR_SIZE];
            let image = build_on(sink, &specs, capacity, 0, 2);
            let reader = ImageReader::new(&image);

            let runs = reader.free_runs().unwrap();
            assert_eq!(runs.len(), 3);
            for (offset, free) in &runs {
                let start = (*offset as usize + 1) * SECTOR_SIZE;
                let end = (offset + free.run_length) as usize * SECTOR_SIZE;
                assert!(
                    image[start..end].iter().all(|&b| b == 0),
                    "filler after sector {} not zeroed",
                    offset
                );
            }

            let (_, trailing) = runs.last().unwrap();
            if capacity == 400 {
                assert!(trailing.filler_sectors() > ZERO_BATCH_SECTORS);
            }
            // 容量最后一个扇区不属于镜像，保持原样
            assert!(image[(capacity as usize - 1) * SECTOR_SIZE..]
                .iter()
                .all(|&b| b == 0xFF));
        }
    }

    #[test]
    fn chunk_padding_overwrites_stale_bytes() {
        let content = pattern(513, 9);
        let image = build_on(vec![0xFF; 100 * SECTOR_SIZE], &[("hello", content.clone())], 100, 0, 4);
        let reader = ImageReader::new(&image);

        let headers = reader.file_headers().unwrap();
        let raw = reader.raw_chunks(&headers[0]).unwrap();
        assert_eq!(&raw[..513], &content[..]);
        assert!(raw[513..].iter().all(|&b| b == 0));
    }

    #[test]
    fn skip_offsets_the_whole_image() {
        let image = build(&[("a", pattern(10, 0))], 20, 3, 0);
        assert!(image[..3 * SECTOR_SIZE].iter().all(|&b| b == 0));

        let reader = ImageReader::new(&image[3 * SECTOR_SIZE..]);
        assert_eq!(reader.files().unwrap()[0].1, pattern(10, 0));
    }

    #[test]
    fn short_source_is_zero_padded() {
        // 声明 1000 字节，实际只有 10 字节
        let mut files = vec![
            UserFile::from_reader("trunc", 1000, Cursor::new(pattern(10, 5))).unwrap(),
        ];
        let entries = vec![files[0].entry()];
        let plan = plan(&entries, 50, &mut StdRng::seed_from_u64(0)).unwrap();
        let mut disk = FileDisk::new(Cursor::new(Vec::<u8>::new()), 0);
        execute(&plan, &mut files, &mut disk, &ProgressBar::hidden()).unwrap();

        let image = disk.into_inner().into_inner();
        let (_, bytes) = ImageReader::new(&image).files().unwrap().remove(0);
        assert_eq!(bytes.len(), 1000);
        assert_eq!(&bytes[..10], &pattern(10, 5)[..]);
        assert!(bytes[10..].iter().all(|&b| b == 0));
    }

    struct FailingDisk;

    impl BlockDevice for FailingDisk {
        fn write_sectors(&mut self, _: u64, _: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "write refused"))
        }
    }

    #[test]
    fn sink_errors_propagate_unchanged() {
        let mut files = sources(&[("a", pattern(10, 0))]);
        let entries = vec![files[0].entry()];
        let plan = plan(&entries, 20, &mut StdRng::seed_from_u64(0)).unwrap();

        let err = execute(&plan, &mut files, &mut FailingDisk, &ProgressBar::hidden()).unwrap_err();
        match err {
            FileSystemError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn oversized_plan_writes_nothing() {
        let mut files = sources(&[("huge", pattern(20 * 512, 0))]);
        let entries: Vec<FileEntry> = files.iter().map(|f| f.entry()).collect();
        let mut disk = FileDisk::new(Cursor::new(Vec::<u8>::new()), 0);

        let result = plan(&entries, 10, &mut StdRng::seed_from_u64(0))
            .and_then(|plan| execute(&plan, &mut files, &mut disk, &ProgressBar::hidden()));

        assert!(matches!(
            result,
            Err(FileSystemError::CapacityExceeded { capacity: 10, .. })
        ));
        assert!(disk.into_inner().into_inner().is_empty());
    }
}
