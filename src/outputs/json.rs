//! JSON snapshots of rendered pages.
//!
//! [`JsonSnapshotSink`] decorates another sink: everything is passed through,
//! and every rendered [`PageView`] is additionally serialized to
//! `{json_output_dir}/{category}/page-{n}.json`. A later render of the same
//! page overwrites the earlier snapshot.

use super::RenderSink;
use crate::models::PageView;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the snapshot for `view` under `json_output_dir`.
pub fn snapshot_path(json_output_dir: &Path, view: &PageView) -> PathBuf {
    json_output_dir
        .join(view.query.category.as_str())
        .join(format!("page-{}.json", view.query.page))
}

/// Serialize `view` into its snapshot file, creating the category directory.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_page(
    view: &PageView,
    json_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(view)?;
    let path = snapshot_path(json_output_dir, view);
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote page snapshot");
    Ok(path)
}

/// Pass-through sink that also snapshots pages to disk.
#[derive(Debug)]
pub struct JsonSnapshotSink<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: RenderSink> JsonSnapshotSink<S> {
    /// Wrap `inner`, failing early if `dir` is not writable.
    pub async fn create(inner: S, dir: &str) -> Result<Self, Box<dyn Error>> {
        ensure_writable_dir(dir).await?;
        Ok(Self {
            inner,
            dir: PathBuf::from(dir),
        })
    }

    #[cfg(test)]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RenderSink> RenderSink for JsonSnapshotSink<S> {
    fn loading(&mut self, active: bool) {
        self.inner.loading(active);
    }

    async fn render(&mut self, view: &PageView) {
        self.inner.render(view).await;
        if let Err(e) = write_page(view, &self.dir).await {
            error!(error = %e, "Failed to write page snapshot");
        }
    }

    fn notify(&mut self, message: &str) {
        self.inner.notify(message);
    }
}
