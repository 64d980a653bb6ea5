use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use rand::Rng;

use crate::errors::AppError;

/// Largest accepted profile picture.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix under which stored pictures are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// An image part received in a request, not yet written to disk.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub original_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Disk area holding profile pictures.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    /// Opens the upload area, creating the directory when missing.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!("Storing uploads in {}", dir.display());
        Ok(Self { dir, max_bytes: MAX_UPLOAD_BYTES })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Checks size and content, writes the image under a fresh name and
    /// returns its public path.
    pub async fn save(&self, image: &UploadedImage) -> Result<String, AppError> {
        // Validate file size (max 5MiB)
        if image.bytes.len() > self.max_bytes {
            return Err(too_large(self.max_bytes));
        }

        // Validate file type from its content
        let kind = infer::get(&image.bytes)
            .filter(|kind| matches!(kind.matcher_type(), infer::MatcherType::Image))
            .ok_or_else(|| AppError::Validation("Not an image! Please upload an image.".to_string()))?;

        // Generate a unique file name
        let file_name = generate_file_name(image.original_name.as_deref(), kind.extension());

        // Write the file to the upload directory
        tokio::fs::write(self.dir.join(&file_name), &image.bytes).await?;
        info!("Stored profile picture {} ({} bytes)", file_name, image.bytes.len());

        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Deletes the file behind a public path. Missing files are ignored and
    /// other failures only logged, since the record change already happened.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|name| self.resolve(name))
        else {
            warn!("Refusing to remove unexpected upload path {}", public_path);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Removed profile picture {}", public_path),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
        }
    }

    /// Maps a bare file name to its location on disk. Anything that could
    /// escape the upload directory yields `None`.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let is_plain = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\'])
            && !file_name.contains("..");
        is_plain.then(|| self.dir.join(file_name))
    }
}

pub fn too_large(max_bytes: usize) -> AppError {
    AppError::Validation(format!(
        "Image exceeds the {} MiB size limit",
        max_bytes / (1024 * 1024)
    ))
}

/// `{unix-millis}-{random}.{ext}`, keeping the client's extension when it
/// is a plain alphanumeric one.
pub fn generate_file_name(original_name: Option<&str>, sniffed_extension: &str) -> String {
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| sniffed_extension.to_string());

    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, extension)
}
