pub mod args;
pub mod report;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::{
    cli::args::Cli,
    disk::FileDisk,
    fs::{self, FileEntry, UserFile},
    utils::seeded_rng,
};

/// 规划并写出镜像
pub fn run(cli: &Cli) -> Result<()> {
    let mut files = Vec::with_capacity(cli.programs.len());
    for program in &cli.programs {
        let path = cli.search_dir.join(&program.file);
        let file = UserFile::open(&program.name, &path)
            .with_context(|| format!("cannot load {} from {}", program.name, path.display()))?;
        info!("{}: {} byte(s) from {}", program.name, file.size(), path.display());
        files.push(file);
    }

    let entries: Vec<FileEntry> = files.iter().map(|f| f.entry()).collect();
    let mut rng = seeded_rng(cli.seed);
    let plan = fs::plan(&entries, cli.num_sectors, &mut rng)?;

    if cli.dry_run {
        report::print_layout(&plan);
        report::print_summary(&plan.summary());
        return Ok(());
    }

    let mut disk = FileDisk::open(&cli.output, cli.skip, u64::from(cli.num_sectors))
        .with_context(|| format!("cannot open {}", cli.output.display()))?;

    let progress = ProgressBar::new(plan.total_sectors());
    progress.set_style(
        ProgressStyle::with_template("[{bar:40.green/black}] {pos:>8}/{len} sectors {msg}")?
            .progress_chars("#>-"),
    );
    fs::execute(&plan, &mut files, &mut disk, &progress)?;
    progress.finish_with_message("done");

    report::print_summary(&plan.summary());
    report::print_written(&cli.output, cli.skip);
    Ok(())
}
