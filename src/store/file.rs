//! JSON file thread store
//!
//! One pretty-printed JSON document per thread. Writes go to a temporary
//! file first and are renamed into place, so a crash never leaves a
//! half-written thread behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::agent::state::{ConversationState, ThreadId};
use crate::core::{LeadflowError, Result};
use crate::store::ThreadStore;

const PREFIX: &str = "thread_";
const EXTENSION: &str = ".json";

/// Thread store backed by a directory
#[derive(Debug, Clone)]
pub struct FileThreadStore {
    dir: PathBuf,
}

impl FileThreadStore {
    /// Open (and create if needed) the store directory
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            LeadflowError::store(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, thread_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", PREFIX, encode_id(thread_id), EXTENSION))
    }
}

/// Make a thread id safe as a file name, reversibly
fn encode_id(thread_id: &str) -> String {
    let mut out = String::with_capacity(thread_id.len());
    for byte in thread_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

fn decode_id(encoded: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(encoded.len());
    let mut chars = encoded.bytes();
    while let Some(byte) = chars.next() {
        if byte == b'_' {
            let hi = chars.next()?;
            let lo = chars.next()?;
            let hex = std::str::from_utf8(&[hi, lo]).ok()?.to_string();
            bytes.push(u8::from_str_radix(&hex, 16).ok()?);
        } else {
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).ok()
}

#[async_trait]
impl ThreadStore for FileThreadStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>> {
        let path = self.path_for(thread_id);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LeadflowError::store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let state = serde_json::from_str(&json).map_err(|e| {
            LeadflowError::store(format!("Corrupt thread file {}: {}", path.display(), e))
        })?;
        Ok(Some(state))
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        let path = self.path_for(&state.thread_id);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(state)?;
        fs::write(&tmp, json)
            .await
            .map_err(|e| LeadflowError::store(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            LeadflowError::store(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!(thread = %state.thread_id, path = %path.display(), "thread saved");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ThreadId>> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| LeadflowError::store(format!("Failed to list {}: {}", self.dir.display(), e)))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some(encoded) = name
                .strip_prefix(PREFIX)
                .and_then(|rest| rest.strip_suffix(EXTENSION))
            {
                if let Some(id) = decode_id(encoded) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
