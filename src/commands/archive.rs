// Archive command - pack a report directory

use anyhow::{Context, Result};

use crate::archive;
use crate::cli::args::ArchiveArgs;
use crate::utils::FileUtils;

pub async fn handle_archive(args: &ArchiveArgs) -> Result<()> {
    let dir = args.dir.clone();
    let path = tokio::task::spawn_blocking(move || archive::build_archive(&dir))
        .await
        .context("Archive task failed")?
        .with_context(|| format!("Failed to archive {}", args.dir.display()))?;

    println!(
        "{} ({} bytes from {} bytes of report)",
        path.display(),
        FileUtils::file_size(&path).unwrap_or(0),
        FileUtils::tree_size(&args.dir)
    );
    Ok(())
}
