use std::path::Path;

use colored::*;

use crate::fs::{BlockRecord, Plan, PlanSummary};

/// 每个块的指针字段，布局清单里用
fn pointers(record: &BlockRecord) -> String {
    match record {
        BlockRecord::SuperBlock(sb) => {
            format!("file -> {}, free -> {}", sb.first_file, sb.first_free)
        }
        BlockRecord::Free(free) => format!("next -> {}", free.next),
        BlockRecord::File { header, .. } => format!(
            "next -> {}, chunk -> {}, {} bytes",
            header.next, header.first_chunk, header.size
        ),
        BlockRecord::ChunkNode(node) => format!("next -> {}, data -> {}", node.next, node.data),
        BlockRecord::ChunkData { .. } => String::new(),
    }
}

fn colored_kind(record: &BlockRecord) -> ColoredString {
    let kind = format!("{:<10}", record.kind());
    match record {
        BlockRecord::SuperBlock(_) => kind.bright_yellow().bold(),
        BlockRecord::Free(_) => kind.bright_black(),
        BlockRecord::File { .. } => kind.green(),
        BlockRecord::ChunkNode(_) => kind.cyan(),
        BlockRecord::ChunkData { .. } => kind.blue(),
    }
}

pub fn print_layout(plan: &Plan) {
    println!("{}", "📐 Planned layout".bright_cyan().bold());
    println!(
        "{}",
        format!(
            "{:>8}  {:>7}  {:<10}  {:<36}  {}",
            "sector", "length", "kind", "pointers", "description"
        )
        .bright_black()
    );
    for block in plan.blocks() {
        println!(
            "{:>8}  {:>7}  {}  {:<36}  {}",
            block.offset,
            block.sectors(),
            colored_kind(&block.record),
            pointers(&block.record),
            block.label.bright_black()
        );
    }
}

pub fn print_summary(summary: &PlanSummary) {
    println!(
        "{}\n{}: {}\n{}: {}\n{}: {} / {}\n{}: {}\n",
        "📊 Filesystem Info".bright_yellow().bold(),
        "Files".blue(),
        summary.files,
        "Chunks".blue(),
        summary.chunks,
        "Used sectors".blue(),
        summary.used_sectors,
        summary.capacity,
        "Trailing free".blue(),
        summary.trailing_free,
    );
}

pub fn print_written(output: &Path, skip: u64) {
    println!(
        "{} {} {}",
        "✅ Image written to".green(),
        output.display().to_string().cyan(),
        format!("(starting at sector {})", skip).bright_black()
    );
}
