use std::path::PathBuf;

use clap::Parser;

use crate::fs::{
    config::{DEFAULT_NUM_SECTORS, DEFAULT_OUTPUT, DEFAULT_SKIP_SECTORS},
    FileSystemError,
};

/// fs-packer - build the flat program filesystem image the kernel loads at boot
#[derive(Debug, Parser)]
#[command(name = "fs-packer", version, about, long_about = None)]
pub struct Cli {
    /// Programs to pack, each given as NAME:FILE.
    #[arg(value_name = "NAME:FILE", value_parser = parse_program)]
    pub programs: Vec<ProgramSpec>,

    /// Directory in which program files are located.
    #[arg(short = 'd', long = "search-dir", default_value = ".")]
    pub search_dir: PathBuf,

    /// Output image or device.
    #[arg(short, long = "out", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Number of sectors the filesystem may occupy.
    #[arg(short = 'n', long = "num-sectors", default_value_t = DEFAULT_NUM_SECTORS)]
    pub num_sectors: u32,

    /// Sector of the output at which the filesystem starts.
    #[arg(short, long, default_value_t = DEFAULT_SKIP_SECTORS)]
    pub skip: u64,

    /// Seed for chunk sizes and block placement (random if omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the planned layout without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// 一个待打包程序：镜像内的名字和相对 search dir 的路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSpec {
    pub name: String,
    pub file: PathBuf,
}

pub fn parse_program(input: &str) -> Result<ProgramSpec, FileSystemError> {
    match input.split_once(':') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() && !file.contains(':') => {
            Ok(ProgramSpec {
                name: name.to_string(),
                file: PathBuf::from(file),
            })
        }
        _ => Err(FileSystemError::InvalidProgramSpec(input.to_string())),
    }
}
