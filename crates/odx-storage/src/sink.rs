//! Record sinks

use std::path::PathBuf;

use async_trait::async_trait;
use odx_core::Record;
use serde::Serialize;
use tracing::{debug, info};

use crate::{Result, StorageError};

/// Durable destination for transformed records.
///
/// A write must be complete (or have failed) when the future resolves.
#[async_trait]
pub trait RecordSink: Send {
    async fn write(&mut self, id: &str, record: &Record) -> Result<()>;
}

/// Writes each record to `<dir>/<id>.json`, overwriting any previous file.
pub struct JsonFileSink {
    dir: PathBuf,
    prepared: bool,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prepared: false,
        }
    }

    /// File path for a record id, rejecting ids that would escape the output directory.
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.contains('/')
            || id.contains('\\')
            || id.contains('\0')
        {
            return Err(StorageError::InvalidRecordId(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn prepare(&mut self) -> Result<()> {
        if self.prepared {
            return Ok(());
        }

        let exists = tokio::fs::try_exists(&self.dir).await.unwrap_or(false);
        if !exists {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|source| StorageError::Io {
                    path: self.dir.display().to_string(),
                    source,
                })?;
            info!(dir = %self.dir.display(), "Created output directory");
        }

        self.prepared = true;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for JsonFileSink {
    async fn write(&mut self, id: &str, record: &Record) -> Result<()> {
        let path = self.path_for(id)?;
        self.prepare().await?;

        let content = to_pretty_json(record)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StorageError::Io {
                path: path.display().to_string(),
                source,
            })?;

        debug!(path = %path.display(), "Saved record");
        Ok(())
    }
}

/// Serialize with 4-space indentation.
pub fn to_pretty_json(record: &Record) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut serializer)?;
    Ok(buf)
}
