//! Artifact resources: feedback documents exposed as revocable handles.
//!
//! A successful exchange produces one [`FeedbackArtifact`]. The
//! [`ArtifactStore`] owns it and hands out a [`ResourceHandle`] — an opaque
//! `blob:` URL in the spirit of a browser object URL. Resolving a handle
//! yields the artifact until the handle is revoked, after which the bytes are
//! released.
//!
//! The store itself has no policy about *when* to revoke; the session revokes
//! the previous handle when a new submission starts and revokes everything
//! when it ends.

use crate::error::FeedbackError;
use crate::transfer::ServiceResponse;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// MIME type of a Word (OOXML) document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// File name every feedback document is offered under.
pub const SUGGESTED_FILENAME: &str = "feedback.docx";

const URL_PREFIX: &str = "blob:tutor-feedback/";

/// The document returned by the feedback service.
#[derive(Clone, PartialEq, Eq)]
pub struct FeedbackArtifact {
    bytes: Vec<u8>,
    server_filename: Option<String>,
    server_content_type: Option<String>,
}

impl FeedbackArtifact {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            server_filename: None,
            server_content_type: None,
        }
    }

    fn from_response(response: ServiceResponse) -> Self {
        Self {
            bytes: response.bytes,
            server_filename: response.filename,
            server_content_type: response.content_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Always [`DOCX_MIME`], whatever the service claimed.
    pub fn mime_type(&self) -> &'static str {
        DOCX_MIME
    }

    /// Always [`SUGGESTED_FILENAME`].
    pub fn suggested_filename(&self) -> &'static str {
        SUGGESTED_FILENAME
    }

    /// File name the service put in `Content-Disposition`, for information only.
    pub fn server_filename(&self) -> Option<&str> {
        self.server_filename.as_deref()
    }

    /// `Content-Type` the service sent, for information only.
    pub fn server_content_type(&self) -> Option<&str> {
        self.server_content_type.as_deref()
    }

    /// Self-contained `data:` URL with the document base64-encoded.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", DOCX_MIME, STANDARD.encode(&self.bytes))
    }

    /// Write the document to `path` and return where it landed.
    ///
    /// If `path` is an existing directory the file is created inside it as
    /// [`SUGGESTED_FILENAME`]. Uses atomic write (temp file + rename) so a
    /// crash never leaves a half-written document behind.
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<PathBuf, FeedbackError> {
        let path = path.as_ref();
        let target = if tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            path.join(SUGGESTED_FILENAME)
        } else {
            path.to_path_buf()
        };

        let write_err = |source: std::io::Error| FeedbackError::OutputWriteFailed {
            path: target.clone(),
            source,
        };

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = target.with_extension("docx.tmp");
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &target).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }

        info!("Saved feedback ({} bytes) to {}", self.bytes.len(), target.display());
        Ok(target)
    }
}

impl std::fmt::Debug for FeedbackArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackArtifact")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("server_filename", &self.server_filename)
            .field("server_content_type", &self.server_content_type)
            .finish()
    }
}

/// Revocable reference to an artifact held by an [`ArtifactStore`].
///
/// Cheap to clone; holding one does not keep the bytes alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    id: Uuid,
    url: String,
}

impl ResourceHandle {
    fn issue() -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            url: format!("{URL_PREFIX}{id}"),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// `blob:tutor-feedback/<uuid>`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Name the document should be downloaded as.
    pub fn filename(&self) -> &'static str {
        SUGGESTED_FILENAME
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Registry of live artifacts, keyed by handle.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    live: HashMap<Uuid, Arc<FeedbackArtifact>>,
    issued: u64,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a service response as an artifact and issue a handle for it.
    pub fn publish(&mut self, response: ServiceResponse) -> ResourceHandle {
        self.insert(FeedbackArtifact::from_response(response))
    }

    /// Register an already-built artifact and issue a handle for it.
    pub fn insert(&mut self, artifact: FeedbackArtifact) -> ResourceHandle {
        let handle = ResourceHandle::issue();
        debug!("Issued {} for {} bytes", handle, artifact.len());
        self.live.insert(handle.id, Arc::new(artifact));
        self.issued += 1;
        handle
    }

    /// The artifact behind `handle`, unless it was revoked.
    pub fn resolve(&self, handle: &ResourceHandle) -> Result<Arc<FeedbackArtifact>, FeedbackError> {
        self.live
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| FeedbackError::HandleRevoked {
                url: handle.url.clone(),
            })
    }

    /// Release `handle`. Returns `false` if it was already revoked.
    pub fn revoke(&mut self, handle: &ResourceHandle) -> bool {
        let removed = self.live.remove(&handle.id).is_some();
        if removed {
            debug!("Revoked {}", handle);
        }
        removed
    }

    /// Release every live handle; returns how many were released.
    pub fn revoke_all(&mut self) -> usize {
        let n = self.live.len();
        self.live.clear();
        n
    }

    pub fn is_live(&self, handle: &ResourceHandle) -> bool {
        self.live.contains_key(&handle.id)
    }

    /// Number of handles that still resolve.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of handles ever issued by this store.
    pub fn issued_count(&self) -> u64 {
        self.issued
    }
}
