use clap::Parser;

use crate::cli::{args::Cli, run};

mod cli;
mod disk;
mod fs;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 默认 info，--verbose 打开 debug，RUST_LOG 可覆盖
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("fs_packer", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_target(false)
        .init();

    run(&cli)
}
