//! Crash-safe file replacement shared by the progress and snapshot stores.

use std::io;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Replace `path` with `content` through `temp_path`.
///
/// The data is fsynced before the rename and the parent directory after it,
/// so once this returns the new content survives a crash.
pub(crate) async fn write_atomic(
    path: &Path,
    temp_path: &Path,
    content: &[u8],
) -> io::Result<()> {
    let mut file = tokio::fs::File::create(temp_path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(temp_path, path).await?;

    if let Some(parent) = path.parent() {
        sync_dir(parent).await?;
    }

    Ok(())
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> io::Result<()> {
    // An empty parent means the current directory
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    tokio::fs::File::open(dir).await?.sync_all().await
}

// Directories cannot be opened for syncing on Windows
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
