//! File-backed channel shared by processes on one machine.

use super::{
    ChannelError, ChannelNotice, ChannelResult, ContextId, DEFAULT_MAX_PAYLOAD_BYTES,
    SharedChannel, Subscription, check_payload_size,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What is stored on disk for a key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    origin: ContextId,
    /// Unique per write. Sequence numbers restart after a corrupt file, so
    /// subscribers track this instead.
    write_id: Uuid,
    sequence: u64,
    value: String,
}

/// Channel stored as a JSON file under a base directory.
///
/// Each key maps to `<base>/<key>.json`. Writes go to a temporary file and
/// are renamed into place, so readers never observe a partial value.
/// Subscribers detect changes by polling the stored write id.
pub struct FileChannel {
    key: String,
    path: PathBuf,
    max_payload_bytes: usize,
}

impl FileChannel {
    /// Open a channel in `base_path`, creating the directory if needed.
    pub fn new(base_path: impl AsRef<Path>, key: impl Into<String>) -> ChannelResult<Self> {
        let base_path = base_path.as_ref();
        if !base_path.exists() {
            fs::create_dir_all(base_path).map_err(|e| {
                ChannelError::Io(format!("Failed to create channel directory: {}", e))
            })?;
        }
        let key = key.into();
        let path = base_path.join(format!("{}.json", sanitize_key(&key)));
        Ok(Self {
            key,
            path,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        })
    }

    /// Open a channel in the default location.
    ///
    /// On Unix: `~/.local/share/inkmirror/channel/`
    /// On Windows: `%LOCALAPPDATA%\inkmirror\channel\`
    pub fn default_location(key: impl Into<String>) -> ChannelResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| ChannelError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkmirror").join("channel"), key)
    }

    /// Set the largest accepted value, in bytes.
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn read_envelope(path: &Path) -> ChannelResult<Option<Envelope>> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ChannelError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };
    serde_json::from_str(&json).map(Some).map_err(|e| {
        ChannelError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl SharedChannel for FileChannel {
    fn key(&self) -> &str {
        &self.key
    }

    fn publish(&self, origin: ContextId, payload: &str) -> ChannelResult<()> {
        check_payload_size(payload, self.max_payload_bytes)?;

        // A corrupt file is overwritten rather than blocking every writer.
        let previous = read_envelope(&self.path).ok().flatten();
        let envelope = Envelope {
            origin,
            write_id: Uuid::new_v4(),
            sequence: previous.map_or(1, |e| e.sequence.wrapping_add(1)),
            value: payload.to_string(),
        };
        let json = serde_json::to_string(&envelope)
            .map_err(|e| ChannelError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension(format!("{}.tmp", origin));
        fs::write(&tmp, json).map_err(|e| {
            ChannelError::Io(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ChannelError::Io(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    fn read(&self) -> ChannelResult<Option<String>> {
        Ok(read_envelope(&self.path)?.map(|e| e.value))
    }

    fn subscribe(&self, origin: ContextId) -> ChannelResult<Box<dyn Subscription>> {
        let last_write = match read_envelope(&self.path) {
            Ok(envelope) => envelope.map(|e| e.write_id),
            Err(e) => {
                log::warn!("Channel {} unreadable at subscribe: {}", self.key, e);
                None
            }
        };
        Ok(Box::new(FileSubscription {
            path: self.path.clone(),
            origin,
            last_write,
        }))
    }
}

struct FileSubscription {
    path: PathBuf,
    origin: ContextId,
    last_write: Option<Uuid>,
}

impl Subscription for FileSubscription {
    fn poll(&mut self) -> Vec<ChannelNotice> {
        let envelope = match read_envelope(&self.path) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Skipping unreadable channel file: {}", e);
                return Vec::new();
            }
        };
        if self.last_write == Some(envelope.write_id) {
            return Vec::new();
        }
        self.last_write = Some(envelope.write_id);
        if envelope.origin == self.origin {
            return Vec::new();
        }
        vec![ChannelNotice {
            origin: envelope.origin,
            sequence: envelope.sequence,
            value: envelope.value,
        }]
    }
}
