use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::path::{Path, PathBuf};

/// Process-wide scratch directory for staged inputs and produced outputs.
///
/// Every file placed here carries a fresh random token in its name, so
/// concurrent requests never collide and nothing derived from a client
/// filename ever touches the filesystem. The directory is recreated
/// fresh at startup and removed at shutdown.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create the workspace directory, discarding anything a previous
    /// process left behind. Safe to call when the directory is absent.
    pub async fn create(root: PathBuf) -> Result<Self> {
        if tokio::fs::metadata(&root).await.is_ok() {
            tracing::warn!("Removing stale workspace at {}", root.display());
            if let Err(e) = tokio::fs::remove_dir_all(&root).await {
                tracing::warn!("Could not clear stale workspace: {}", e);
            }
        }

        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create workspace at {}", root.display()))?;

        tracing::info!("📁 Workspace ready at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute a collision-free staging path for the given extension.
    ///
    /// Pure path computation: no I/O, no locks. The 8-byte random token
    /// gives concurrent callers distinct paths without coordination.
    pub fn allocate(&self, extension: &str) -> StagedFile {
        let mut token = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut token);
        let path = self
            .root
            .join(format!("input_{}.{}", hex::encode(token), extension));

        StagedFile {
            path,
            extension: extension.to_string(),
            created_at: Utc::now(),
            released: false,
        }
    }

    /// Wrap an existing file inside the workspace (e.g. a converter
    /// output located next to its staged input) so it participates in
    /// the same release discipline.
    pub fn adopt(&self, path: PathBuf, extension: &str) -> StagedFile {
        debug_assert!(path.starts_with(&self.root));
        StagedFile {
            path,
            extension: extension.to_string(),
            created_at: Utc::now(),
            released: false,
        }
    }

    /// Remove the entire workspace directory. Best-effort: failures are
    /// logged, never raised. Must only run once in-flight requests have
    /// drained.
    pub async fn teardown(&self) {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => tracing::info!("🧹 Workspace removed at {}", self.root.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Workspace teardown failed: {}", e),
        }
    }
}

/// Ownership-scoped handle to a file inside the [`Workspace`].
///
/// Release is explicit on every normal exit path; the `Drop` fallback
/// unlinks the file if a panic unwinds past the handler so staged data
/// never outlives its request.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    extension: String,
    created_at: DateTime<Utc>,
    released: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The path a converter producing `extension` output next to this
    /// file will write to.
    pub fn sibling_with_extension(&self, extension: &str) -> PathBuf {
        self.path.with_extension(extension)
    }

    /// Delete the underlying file if present. Idempotent: an
    /// already-absent file is not an error.
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!("Released {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to release {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.released {
            // Unwind path: handler died before releasing
            if std::fs::remove_file(&self.path).is_ok() {
                tracing::debug!("Dropped unreleased staged file {}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn temp_workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::create(dir.path().join("ws")).await.unwrap();
        (dir, ws)
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        let _ws = Workspace::create(root.clone()).await.unwrap();
        let ws = Workspace::create(root.clone()).await.unwrap();
        assert!(ws.root().is_dir());
    }

    #[tokio::test]
    async fn test_create_clears_stale_contents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("orphan.pdf"), b"stale").unwrap();

        let ws = Workspace::create(root).await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(ws.root()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_allocate_yields_distinct_paths() {
        let (_dir, ws) = temp_workspace().await;
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let staged = ws.allocate("docx");
            assert!(seen.insert(staged.path().to_path_buf()));
            assert!(staged.path().starts_with(ws.root()));
        }
    }

    #[tokio::test]
    async fn test_allocate_concurrently_yields_distinct_paths() {
        let (_dir, ws) = temp_workspace().await;
        let mut handles = Vec::new();
        for _ in 0..64 {
            let ws = ws.clone();
            handles.push(tokio::spawn(async move {
                ws.allocate("docx").path().to_path_buf()
            }));
        }
        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
    }

    #[tokio::test]
    async fn test_release_removes_file_and_is_idempotent() {
        let (_dir, ws) = temp_workspace().await;
        let staged = ws.allocate("docx");
        let path = staged.path().to_path_buf();
        tokio::fs::write(&path, b"content").await.unwrap();

        staged.release().await;
        assert!(!path.exists());

        // Releasing a handle whose file is already gone is not an error
        let ghost = ws.adopt(path.clone(), "docx");
        ghost.release().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_unreleased_file() {
        let (_dir, ws) = temp_workspace().await;
        let path = {
            let staged = ws.allocate("docx");
            std::fs::write(staged.path(), b"content").unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sibling_with_extension() {
        let (_dir, ws) = temp_workspace().await;
        let staged = ws.allocate("docx");
        let pdf = staged.sibling_with_extension("pdf");
        assert_eq!(pdf.extension().unwrap(), "pdf");
        assert_eq!(pdf.file_stem(), staged.path().file_stem());
    }

    #[tokio::test]
    async fn test_teardown_removes_workspace() {
        let (_dir, ws) = temp_workspace().await;
        let staged = ws.allocate("docx");
        tokio::fs::write(staged.path(), b"content").await.unwrap();
        staged.release().await;

        ws.teardown().await;
        assert!(!ws.root().exists());

        // Second teardown is a no-op
        ws.teardown().await;
    }
}
