use std::path::Path;

use tracing::trace;

/// Move a file, falling back to copy-and-delete when the source and
/// destination are on different filesystems.
pub async fn move_file(from: &Path, to: &Path) -> Result<(), std::io::Error> {
    trace!(?from, ?to, "Moving file");

    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}
