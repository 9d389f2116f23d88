//! Output paths, scratch files and artifact lifecycle
//!
//! Files created during a capture are owned by guards: a [`PendingOutput`]
//! removes a partially written screenshot unless the capture commits it, and a
//! [`ScratchFile`] always removes itself. Dropping a request future therefore
//! never leaves files behind.

use crate::{CaptureError, DeliveryMode};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAX_FILE_NAME_LEN: usize = 255;

/// Random 128-bit token rendered as 32 lowercase hex characters.
pub fn unique_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Collision-resistant default name for an artifact.
pub fn generate_file_name() -> String {
    format!("screenshot_{}.png", unique_token())
}

/// Name rules shared by caller-chosen outputs and deletions: a flat, visible
/// file name without separators, parent references or control characters.
pub fn validate_artifact_name(name: &str) -> Result<(), CaptureError> {
    if name.is_empty() {
        return Err(CaptureError::invalid_input("file name must not be empty"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(CaptureError::invalid_input(format!(
            "file name '{name}' must not contain path separators or '..'"
        )));
    }
    if name.starts_with('.') {
        return Err(CaptureError::invalid_input(format!(
            "file name '{name}' must not start with '.'"
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(CaptureError::invalid_input(
            "file name must not contain control characters",
        ));
    }
    Ok(())
}

/// Turn a caller supplied name into a safe flat file name ending in `.png`.
///
/// Names breaking [`validate_artifact_name`] are rejected; shell-hostile
/// punctuation is replaced with `_`.
pub fn sanitize_output_name(requested: &str) -> Result<String, CaptureError> {
    let name = requested.trim();
    validate_artifact_name(name)?;

    let mut sanitized = sanitize_filename(name);
    if !sanitized.ends_with(".png") {
        sanitized.push_str(".png");
    }

    if sanitized.len() > MAX_FILE_NAME_LEN {
        return Err(CaptureError::invalid_input(format!(
            "output_filename is longer than {MAX_FILE_NAME_LEN} bytes"
        )));
    }

    Ok(sanitized)
}

pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// A screenshot file written by a successful capture, not yet handed out.
#[derive(Debug, Clone)]
pub struct CapturedArtifact {
    pub path: PathBuf,
    pub file_name: String,
}

impl CapturedArtifact {
    pub async fn read_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            CaptureError::storage(format!("failed to read {}: {e}", self.path.display()))
        })
    }
}

/// An artifact after the boundary's delivery decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Persisted { file_name: String, file_url: String },
    Inline { file_name: String, bytes: Vec<u8> },
}

impl Artifact {
    pub fn file_name(&self) -> &str {
        match self {
            Artifact::Persisted { file_name, .. } | Artifact::Inline { file_name, .. } => file_name,
        }
    }
}

/// Guard over one capture's output.
///
/// The engine writes to a hidden staging file unique to this capture; only
/// [`PendingOutput::commit`] moves it to the final name. Dropping the guard
/// removes the staging file and never touches an artifact already stored
/// under the final name.
#[derive(Debug)]
pub struct PendingOutput {
    staging: PathBuf,
    path: PathBuf,
    file_name: String,
    committed: bool,
}

impl PendingOutput {
    /// Where the engine writes.
    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Final location once committed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Move the finished file into place, replacing any artifact of the same name.
    pub async fn commit(mut self) -> Result<CapturedArtifact, CaptureError> {
        tokio::fs::rename(&self.staging, &self.path)
            .await
            .map_err(|e| {
                CaptureError::storage(format!(
                    "failed to move output into {}: {e}",
                    self.path.display()
                ))
            })?;
        self.committed = true;

        Ok(CapturedArtifact {
            path: self.path.clone(),
            file_name: self.file_name.clone(),
        })
    }
}

impl Drop for PendingOutput {
    fn drop(&mut self) {
        if !self.committed {
            remove_quietly(&self.staging);
        }
    }
}

/// Per-call HTML scratch file, removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Write `contents` verbatim to a freshly named file under `dir`.
    pub async fn create(dir: &Path, contents: impl AsRef<[u8]>) -> Result<Self, CaptureError> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            CaptureError::storage(format!(
                "failed to create scratch directory {}: {e}",
                dir.display()
            ))
        })?;

        let scratch = Self {
            path: dir.join(format!("scratch_{}.html", unique_token())),
        };

        // Guard exists before the write so a failed write is cleaned up too.
        tokio::fs::write(&scratch.path, contents.as_ref()).await.map_err(|e| {
            CaptureError::storage(format!(
                "failed to write scratch file {}: {e}",
                scratch.path.display()
            ))
        })?;

        debug!("Wrote scratch file {}", scratch.path.display());
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Flat directory of persisted screenshots.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the serving directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), CaptureError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            CaptureError::storage(format!(
                "failed to create directory {}: {e}",
                self.root.display()
            ))
        })
    }

    /// Pick the output file for one capture and guard it.
    pub async fn resolve_output_path(
        &self,
        requested: Option<&str>,
    ) -> Result<PendingOutput, CaptureError> {
        let file_name = match requested {
            Some(name) => sanitize_output_name(name)?,
            None => generate_file_name(),
        };

        self.ensure_dir().await?;

        Ok(PendingOutput {
            staging: self.root.join(format!(".partial_{}.png", unique_token())),
            path: self.root.join(&file_name),
            file_name,
            committed: false,
        })
    }

    pub async fn finalize(
        &self,
        artifact: CapturedArtifact,
        mode: DeliveryMode,
    ) -> Result<Artifact, CaptureError> {
        match mode {
            DeliveryMode::Persist => Ok(Artifact::Persisted {
                file_url: format!("/static/{}", artifact.file_name),
                file_name: artifact.file_name,
            }),
            DeliveryMode::Inline => {
                let read = artifact.read_bytes().await;
                remove_quietly(&artifact.path);
                Ok(Artifact::Inline {
                    bytes: read?,
                    file_name: artifact.file_name,
                })
            }
        }
    }

    /// Remove a persisted artifact by its file name.
    pub async fn delete(&self, file_name: &str) -> Result<(), CaptureError> {
        validate_artifact_name(file_name)?;

        let path = self.root.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted artifact {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CaptureError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(CaptureError::storage(format!("Error deleting file: {e}"))),
        }
    }
}
