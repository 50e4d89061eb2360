//! Upload persistence for beat assets. Audio and cover images land in
//! separate subdirectories under the configured root with generated
//! filenames; the returned URL is what gets stored on the beat row and
//! served back through the static-file route.

use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;

const AUDIO_DIR: &str = "audio";
const IMAGE_DIR: &str = "images";

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    public_base_url: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub async fn save_audio(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, ServiceError> {
        self.save(AUDIO_DIR, original_name, data).await
    }

    pub async fn save_image(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, ServiceError> {
        self.save(IMAGE_DIR, original_name, data).await
    }

    async fn save(
        &self,
        subdir: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, ServiceError> {
        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            ServiceError::InternalError(format!("failed to create upload directory: {}", e))
        })?;

        let filename = format!("{}.{}", Uuid::new_v4(), sanitized_extension(original_name));
        let path = dir.join(&filename);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| ServiceError::InternalError(format!("failed to store upload: {}", e)))?;

        info!(path = %path.display(), bytes = data.len(), "upload stored");

        let url = format!(
            "{}/uploads/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            subdir,
            filename
        );
        Ok(StoredFile { url, path })
    }
}

/// File extension from the client-supplied name, restricted to short
/// alphanumeric suffixes so path components stay inert.
fn sanitized_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_audio_under_audio_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path(), "http://localhost:8080");

        let stored = store.save_audio("track.mp3", b"ID3data").await.unwrap();
        assert!(stored.path.starts_with(tmp.path().join("audio")));
        assert!(stored.url.starts_with("http://localhost:8080/uploads/audio/"));
        assert!(stored.url.ends_with(".mp3"));
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"ID3data");
    }

    #[tokio::test]
    async fn odd_extensions_fall_back_to_bin() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path(), "http://localhost:8080");

        let stored = store
            .save_image("../../evil/../name.!!", b"png")
            .await
            .unwrap();
        assert!(stored.url.ends_with(".bin"));
        assert!(stored.path.starts_with(tmp.path().join("images")));
    }
}
