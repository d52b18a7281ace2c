// src/services/storage.rs
// DOCUMENTATION: Upload directory management
// PURPOSE: Session directories, staged uploads, safe path resolution and retention

use crate::config::Config;
use crate::errors::DashboardError;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use uuid::Uuid;

/// Video container formats accepted for upload
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["mp4", "avi", "mov", "mkv", "webm"];

/// Directory under the root where in-flight uploads are written
const STAGING_DIR: &str = ".staging";

/// True when the file name carries an allowed video extension
pub fn is_allowed_video(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Reduce a client-supplied file name to a safe single path component
/// DOCUMENTATION: Keeps ASCII letters, digits, '.', '-' and '_'; whitespace
/// becomes '_'; directory parts and leading dots are dropped
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let trimmed = cleaned.trim_start_matches(|c: char| c == '.' || c == '_');
    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Upload store
/// DOCUMENTATION: Owns the uploads root; every path handed out or served
/// stays inside it
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_file_bytes: u64,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_file_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_file_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.upload_dir.clone(), config.max_upload_bytes)
    }

    /// Per-file upload limit in bytes
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Create the root and staging directories
    pub async fn init(&self) -> Result<(), DashboardError> {
        fs::create_dir_all(self.root.join(STAGING_DIR)).await?;
        Ok(())
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    /// Fresh private directory for one in-flight upload
    pub async fn create_staging(&self) -> Result<PathBuf, DashboardError> {
        let dir = self
            .root
            .join(STAGING_DIR)
            .join(Uuid::new_v4().to_string());
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Move staged files into the session directory and drop the staging dir
    /// DOCUMENTATION: Existing files with the same name are replaced
    pub async fn commit(
        &self,
        staging: &Path,
        session_id: &str,
        file_names: &[&str],
    ) -> Result<PathBuf, DashboardError> {
        let session_dir = self.session_dir(session_id);
        fs::create_dir_all(&session_dir).await?;

        for name in file_names {
            fs::rename(staging.join(name), session_dir.join(name)).await?;
        }

        self.discard(staging).await;
        Ok(session_dir)
    }

    /// Remove a staging directory, logging rather than failing
    pub async fn discard(&self, staging: &Path) {
        if let Err(e) = fs::remove_dir_all(staging).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove staging dir {}: {}", staging.display(), e);
            }
        }
    }

    /// Resolve a client-supplied relative path to a file inside the root
    /// DOCUMENTATION: Anything that is absolute, climbs with "..", names a
    /// hidden component, escapes through a symlink or is not a regular file
    /// is reported as not found
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, DashboardError> {
        let not_found = || DashboardError::NotFound(format!("Image not found: {}", relative));

        if relative.is_empty() {
            return Err(not_found());
        }

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    if part.to_string_lossy().starts_with('.') {
                        return Err(not_found());
                    }
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(not_found())
                }
            }
        }

        let root = std::fs::canonicalize(&self.root)?;
        let candidate = std::fs::canonicalize(root.join(relative)).map_err(|_| not_found())?;

        if !candidate.starts_with(&root) || !candidate.is_file() {
            return Err(not_found());
        }

        Ok(candidate)
    }

    /// Delete session and staging directories older than `retention`
    ///
    /// # Returns
    /// Number of directories removed
    pub async fn sweep_expired(&self, retention: Duration) -> Result<usize, DashboardError> {
        let now = SystemTime::now();
        let mut removed = 0;

        for dir in [self.root.clone(), self.root.join(STAGING_DIR)] {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                if entry.file_name() == STAGING_DIR {
                    continue;
                }

                let metadata = entry.metadata().await?;
                if !metadata.is_dir() {
                    continue;
                }

                let age = metadata
                    .modified()
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .unwrap_or_default();

                if age >= retention {
                    match fs::remove_dir_all(entry.path()).await {
                        Ok(()) => removed += 1,
                        Err(e) => log::warn!(
                            "Failed to remove expired session {}: {}",
                            entry.path().display(),
                            e
                        ),
                    }
                }
            }
        }

        Ok(removed)
    }
}

/// Start background retention sweep
/// DOCUMENTATION: Periodically removes expired session directories
pub fn start_cleanup_task(store: Arc<UploadStore>, interval_seconds: u64, retention: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));

        loop {
            interval.tick().await;
            match store.sweep_expired(retention).await {
                Ok(0) => log::debug!("Upload sweep: nothing expired"),
                Ok(count) => log::info!("Upload sweep: removed {} expired sessions", count),
                Err(e) => log::error!("Upload sweep failed: {}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions() {
        assert!(is_allowed_video("clip.mp4"));
        assert!(is_allowed_video("CLIP.MOV"));
        assert!(is_allowed_video("a.b.webm"));
        assert!(!is_allowed_video("clip.gif"));
        assert!(!is_allowed_video("mp4"));
        assert!(!is_allowed_video(""));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Scroll Test.mp4"), "My_Scroll_Test.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\rec.mkv"), "rec.mkv");
        assert_eq!(sanitize_filename("..hidden.mov"), "hidden.mov");
        assert_eq!(sanitize_filename("日本.mp4"), "mp4");
        assert_eq!(sanitize_filename(""), "video");
    }

    #[test]
    fn test_resolve_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(root.join("s1/comparison")).unwrap();
        std::fs::write(root.join("s1/comparison/dash.png"), b"png").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let store = UploadStore::new(&root, 1024);

        assert!(store.resolve("s1/comparison/dash.png").is_ok());
        assert!(matches!(
            store.resolve("../secret.txt"),
            Err(DashboardError::NotFound(_))
        ));
        assert!(matches!(
            store.resolve("s1/../../secret.txt"),
            Err(DashboardError::NotFound(_))
        ));
        assert!(store
            .resolve(dir.path().join("secret.txt").to_str().unwrap())
            .is_err());
        // Directories and missing files are not served
        assert!(store.resolve("s1/comparison").is_err());
        assert!(store.resolve("s1/missing.png").is_err());
        assert!(store.resolve("").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), root.join("link.png")).unwrap();

        let store = UploadStore::new(&root, 1024);
        assert!(store.resolve("link.png").is_err());
    }

    #[tokio::test]
    async fn test_staging_commit_moves_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"), 1024);
        store.init().await.unwrap();

        let staging = store.create_staging().await.unwrap();
        fs::write(staging.join("video1_a.mp4"), b"one").await.unwrap();
        fs::write(staging.join("video2_b.mp4"), b"two").await.unwrap();

        let session = store
            .commit(&staging, "run1", &["video1_a.mp4", "video2_b.mp4"])
            .await
            .unwrap();

        assert_eq!(session, store.session_dir("run1"));
        assert!(session.join("video1_a.mp4").is_file());
        assert!(session.join("video2_b.mp4").is_file());
        assert!(!staging.exists());
    }

    #[test]
    fn test_sweep_removes_expired_sessions() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join("uploads");
            let store = UploadStore::new(&root, 1024);
            store.init().await.unwrap();
            fs::create_dir_all(store.session_dir("old")).await.unwrap();
            fs::write(root.join("stray.txt"), b"x").await.unwrap();

            // A day of retention keeps fresh sessions
            assert_eq!(store.sweep_expired(Duration::from_secs(86_400)).await.unwrap(), 0);
            assert!(store.session_dir("old").exists());

            let removed = store.sweep_expired(Duration::ZERO).await.unwrap();
            assert_eq!(removed, 1);
            assert!(!store.session_dir("old").exists());
            // Files at the root and the staging dir itself survive
            assert!(root.join("stray.txt").exists());
            assert!(root.join(STAGING_DIR).exists());
        });
    }
}
