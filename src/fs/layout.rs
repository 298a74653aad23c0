//! 布局规划。
//!
//! 所有块先放进一个以 `BlockId` 索引的 arena，逻辑链接只记录 id；
//! 打乱物理顺序、分配扇区偏移之后，才把链接解析成磁盘上的扇区指针。

use std::collections::HashMap;

use log::{debug, info};
use rand::{seq::SliceRandom, Rng};

use crate::{
    fs::{
        chunk::{split_into_chunks, ChunkNode},
        config::{FREE_RUN_SECTORS, MAX_USER_APPS, NULL_POINTER, SUPER_BLOCK_SECTOR},
        error::{FileSystemError, Result},
        file_header::{FileFlags, FileHeader},
        free_list::FreeBlock,
        super_block::SuperBlock,
        user_file::FileEntry,
    },
    utils::sectors_for,
};

/// arena 中块的稳定编号，与物理位置无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BlockId(usize);

/// 解析前的块：链接以 `BlockId` 表示
#[derive(Debug, Clone)]
enum Node {
    SuperBlock,
    Free {
        next: Option<BlockId>,
        run_length: u32,
    },
    FileHeader {
        source: usize,
        next: Option<BlockId>,
        first_chunk: Option<BlockId>,
    },
    ChunkNode {
        next: Option<BlockId>,
        length: u32,
        data: BlockId,
    },
    ChunkData {
        length: u32,
    },
}

impl Node {
    fn sectors(&self) -> u32 {
        match self {
            Node::Free { run_length, .. } => *run_length,
            Node::ChunkData { length } => *length,
            _ => 1,
        }
    }
}

/// 解析后的块：指针已是扇区偏移，可以直接编码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRecord {
    SuperBlock(SuperBlock),
    Free(FreeBlock),
    File { source: usize, header: FileHeader },
    ChunkNode(ChunkNode),
    ChunkData { length: u32 },
}

impl BlockRecord {
    pub fn sectors(&self) -> u32 {
        match self {
            BlockRecord::Free(free) => free.run_length,
            BlockRecord::ChunkData { length } => *length,
            _ => 1,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BlockRecord::SuperBlock(_) => "superblock",
            BlockRecord::Free(_) => "free",
            BlockRecord::File { .. } => "file",
            BlockRecord::ChunkNode(_) => "chunk node",
            BlockRecord::ChunkData { .. } => "chunk data",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub offset: u32,
    pub record: BlockRecord,
    pub label: String, // 人读的描述，只用于日志和布局清单
}

impl PlacedBlock {
    pub fn sectors(&self) -> u32 {
        self.record.sectors()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub files: usize,
    pub chunks: usize,
    pub used_sectors: u32,  // 尾部空闲块之前的扇区数
    pub trailing_free: u32, // 尾部空闲块长度
    pub capacity: u32,
}

/// 规划结果：按物理顺序（即偏移递增）排列的块
#[derive(Debug, Clone)]
pub struct Plan {
    blocks: Vec<PlacedBlock>,
    by_offset: HashMap<u32, usize>,
    capacity: u32,
}

impl Plan {
    pub fn blocks(&self) -> &[PlacedBlock] {
        &self.blocks
    }

    pub fn block_at(&self, offset: u32) -> Option<&PlacedBlock> {
        self.by_offset.get(&offset).map(|&i| &self.blocks[i])
    }

    pub fn super_block(&self) -> Option<SuperBlock> {
        match self.blocks.first().map(|b| &b.record) {
            Some(BlockRecord::SuperBlock(sb)) => Some(*sb),
            _ => None,
        }
    }

    pub fn chunk_node_at(&self, offset: u32) -> Option<ChunkNode> {
        match self.block_at(offset).map(|b| &b.record) {
            Some(BlockRecord::ChunkNode(node)) => Some(*node),
            _ => None,
        }
    }

    /// 占用的扇区总数（含尾部空闲块），总是严格小于容量
    pub fn total_sectors(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.sectors())).sum()
    }

    pub fn summary(&self) -> PlanSummary {
        let count = |pred: fn(&BlockRecord) -> bool| {
            self.blocks.iter().filter(|b| pred(&b.record)).count()
        };
        let trailing_free = match self.blocks.last().map(|b| &b.record) {
            Some(BlockRecord::Free(free)) => free.run_length,
            _ => 0,
        };

        PlanSummary {
            files: count(|r| matches!(r, BlockRecord::File { .. })),
            chunks: count(|r| matches!(r, BlockRecord::ChunkNode(_))),
            used_sectors: (self.total_sectors() - u64::from(trailing_free)) as u32,
            trailing_free,
            capacity: self.capacity,
        }
    }
}

/// 规划器内部状态
struct LayoutBuilder {
    nodes: Vec<Node>,
    labels: Vec<String>,
}

impl LayoutBuilder {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn push(&mut self, node: Node, label: String) -> BlockId {
        self.nodes.push(node);
        self.labels.push(label);
        BlockId(self.nodes.len() - 1)
    }

    fn node_mut(&mut self, id: BlockId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// 为一个文件生成内容块和块节点，按生成顺序串成链，返回链头
    fn add_chunks<R: Rng + ?Sized>(&mut self, file: &FileEntry, rng: &mut R) -> Option<BlockId> {
        let lengths = split_into_chunks(sectors_for(u64::from(file.size)) as u32, rng);
        debug!("{}: {} byte(s) in chunks {:?}", file.name, file.size, lengths);

        let mut chain = Vec::with_capacity(lengths.len());
        for (i, &length) in lengths.iter().enumerate() {
            let data = self.push(
                Node::ChunkData { length },
                format!("chunk {} of {}", i, file.name),
            );
            let node = self.push(
                Node::ChunkNode {
                    next: None,
                    length,
                    data,
                },
                format!("chunk node for chunk {} of {}", i, file.name),
            );
            chain.push(node);
        }

        // 第一个生成的块是链头，读取顺序与切分顺序一致
        for pair in chain.windows(2) {
            if let Node::ChunkNode { next, .. } = self.node_mut(pair[0]) {
                *next = Some(pair[1]);
            }
        }
        chain.first().copied()
    }

    /// 已分配的扇区偏移；未分配说明计划内部不一致
    fn placed(&self, offsets: &[Option<u32>], id: BlockId) -> Result<u32> {
        offsets.get(id.0).copied().flatten().ok_or_else(|| {
            FileSystemError::Corrupted(format!("{} was never placed", self.labels[id.0]))
        })
    }

    fn pointer(&self, offsets: &[Option<u32>], link: Option<BlockId>) -> Result<u32> {
        match link {
            Some(id) => self.placed(offsets, id),
            None => Ok(NULL_POINTER),
        }
    }

    fn resolve(
        &self,
        id: BlockId,
        offsets: &[Option<u32>],
        heads: (Option<BlockId>, Option<BlockId>),
        files: &[FileEntry],
    ) -> Result<BlockRecord> {
        let ptr = |link| self.pointer(offsets, link);
        Ok(match &self.nodes[id.0] {
            Node::SuperBlock => SuperBlock::new(ptr(heads.0)?, ptr(heads.1)?).into(),
            Node::Free { next, run_length } => FreeBlock::new(ptr(*next)?, *run_length).into(),
            Node::FileHeader {
                source,
                next,
                first_chunk,
            } => BlockRecord::File {
                source: *source,
                header: FileHeader {
                    next: ptr(*next)?,
                    name: files[*source].name,
                    size: files[*source].size,
                    flags: FileFlags::WRITABLE,
                    first_chunk: ptr(*first_chunk)?,
                },
            },
            Node::ChunkNode { next, length, data } => BlockRecord::ChunkNode(ChunkNode {
                next: ptr(*next)?,
                length: *length,
                data: ptr(Some(*data))?,
            }),
            Node::ChunkData { length } => BlockRecord::ChunkData { length: *length },
        })
    }
}

impl From<SuperBlock> for BlockRecord {
    fn from(sb: SuperBlock) -> Self {
        BlockRecord::SuperBlock(sb)
    }
}

impl From<FreeBlock> for BlockRecord {
    fn from(free: FreeBlock) -> Self {
        BlockRecord::Free(free)
    }
}

/// 规划整个镜像。
///
/// 文件链表和空闲链表都以头插法构建，因此文件链表是处理顺序的逆序。
/// 除超级块（偏移 0）和尾部空闲块（最后）外，所有块的物理位置随机。
/// 放不下时返回 [`FileSystemError::CapacityExceeded`]，此时尚未写任何东西。
pub fn plan<R: Rng + ?Sized>(files: &[FileEntry], capacity: u32, rng: &mut R) -> Result<Plan> {
    if files.len() > MAX_USER_APPS {
        return Err(FileSystemError::TooManyFiles {
            count: files.len(),
            max: MAX_USER_APPS,
        });
    }

    let mut builder = LayoutBuilder::new();

    // 尾部空闲块最先创建：它是空闲链表的链尾，长度等偏移算完才知道
    let last_free = builder.push(
        Node::Free {
            next: None,
            run_length: 0,
        },
        "the last free block".to_string(),
    );

    let mut file_head = None;
    let mut free_head = Some(last_free);

    for (source, file) in files.iter().enumerate() {
        let first_chunk = builder.add_chunks(file, rng);

        file_head = Some(builder.push(
            Node::FileHeader {
                source,
                next: file_head,
                first_chunk,
            },
            format!("file node for {}", file.name),
        ));

        let run_length = rng.random_range(FREE_RUN_SECTORS);
        free_head = Some(builder.push(
            Node::Free {
                next: free_head,
                run_length,
            },
            format!("{} sectors of free space", run_length),
        ));
    }

    // 打乱物理顺序，之后逻辑结构只能靠指针恢复
    let mut order: Vec<BlockId> = (0..builder.nodes.len())
        .map(BlockId)
        .filter(|&id| id != last_free)
        .collect();
    order.shuffle(rng);

    // 超级块在打乱之后插到最前，保证偏移为 0
    let super_block = builder.push(Node::SuperBlock, "superblock".to_string());
    order.insert(0, super_block);

    // 尾部空闲块至少一个扇区，且总长度必须严格小于容量
    let used: u64 = order
        .iter()
        .map(|id| u64::from(builder.nodes[id.0].sectors()))
        .sum();
    if u64::from(capacity) <= used + 1 {
        return Err(FileSystemError::CapacityExceeded {
            required: used + 2,
            capacity,
        });
    }

    let mut offsets: Vec<Option<u32>> = vec![None; builder.nodes.len()];
    let mut cursor: u32 = 0;
    for &id in &order {
        offsets[id.0] = Some(cursor);
        cursor += builder.nodes[id.0].sectors();
    }
    debug_assert_eq!(offsets[super_block.0], Some(SUPER_BLOCK_SECTOR));

    let trailing = capacity - cursor - 1;
    if let Node::Free { run_length, .. } = builder.node_mut(last_free) {
        *run_length = trailing;
    }
    offsets[last_free.0] = Some(cursor);
    order.push(last_free);

    let heads = (file_head, free_head);
    let blocks = order
        .iter()
        .map(|&id| -> Result<PlacedBlock> {
            Ok(PlacedBlock {
                offset: builder.placed(&offsets, id)?,
                record: builder.resolve(id, &offsets, heads, files)?,
                label: builder.labels[id.0].clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    for block in &blocks {
        debug!(
            "sector {:>8}: {:<10} x{:<6} {}",
            block.offset,
            block.record.kind(),
            block.sectors(),
            block.label
        );
    }

    let by_offset = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (b.offset, i))
        .collect();

    let plan = Plan {
        blocks,
        by_offset,
        capacity,
    };
    let summary = plan.summary();
    info!(
        "planned {} file(s) in {} chunk(s): {} sector(s) used, {} trailing free, capacity {}",
        summary.files, summary.chunks, summary.used_sectors, summary.trailing_free, capacity
    );
    Ok(plan)
}
