use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sfs::{FileDisk, FileSystem, FsConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod shell;

#[derive(Parser)]
#[command(name = "sfs")]
#[command(about = "Simple single-image file system", long_about = None)]
struct Cli {
    /// Disk image holding file content. Created if it does not exist.
    disk_file: PathBuf,

    /// Directory the file system is served at.
    mount_point: PathBuf,

    /// Maximum number of storage units the image may hold in use.
    #[arg(long)]
    max_blocks: Option<u64>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    if !cli.mount_point.is_dir() {
        eprintln!("usage: sfs [--max-blocks N] <DISK_FILE> <MOUNT_POINT>");
        eprintln!("mount point {} is not a directory", cli.mount_point.display());
        return Ok(ExitCode::from(2));
    }

    let disk = FileDisk::open(&cli.disk_file)
        .with_context(|| format!("failed to open disk image {}", cli.disk_file.display()))?;
    let config = FsConfig { max_blocks: cli.max_blocks };
    let fs = FileSystem::mount(Arc::new(disk), config);
    info!(disk = %cli.disk_file.display(), mount_point = %cli.mount_point.display(), "file system ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    shell::run(&fs, stdin.lock(), stdout.lock())?;

    fs.unmount().context("failed to unmount")?;
    Ok(ExitCode::SUCCESS)
}
