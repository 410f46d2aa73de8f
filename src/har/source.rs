use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use super::parser::{self, Har};
use crate::error::Result;

/// Seam for whatever produces the traffic recording. Browser automation
/// lives entirely behind this boundary; the pipeline only ever sees the
/// transcript it yields.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn produce(&self) -> Result<Har>;
}

/// Replays a capture that was recorded ahead of time.
pub struct FileTranscriptSource {
    path: PathBuf,
}

impl FileTranscriptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TranscriptSource for FileTranscriptSource {
    async fn produce(&self) -> Result<Har> {
        info!("loading transcript from {}", self.path.display());
        parser::parse_file(&self.path)
    }
}
