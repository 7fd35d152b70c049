//! Clip download to local scratch space.

use std::path::Path;

use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Download a clip URL to `dest`.
pub async fn download_clip(
    http: &reqwest::Client,
    url: &str,
    dest: impl AsRef<Path>,
) -> MediaResult<()> {
    let dest = dest.as_ref();

    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(MediaError::DownloadFailed(format!(
            "{} returned status {}",
            url, status
        )));
    }

    let bytes = resp.bytes().await?;
    tokio::fs::write(dest, &bytes).await?;
    debug!(url, bytes = bytes.len(), dest = %dest.display(), "Clip downloaded");
    Ok(())
}
