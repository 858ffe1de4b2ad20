//! JSON-file repository backend.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::repository::{check_key, Document, Repository};

/// Stores one pretty-printed JSON document per key in a single directory.
///
/// ```text
/// root/
/// +-- {encoded_key}.json
/// +-- .{uuid}.tmp        (in-flight writes only)
/// ```
///
/// Writes go to a temporary file that is synced and then renamed over the
/// target, so a crash leaves either the old or the new document, never a
/// torn one.
#[derive(Debug)]
pub struct JsonFileRepository<T> {
    root: PathBuf,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> JsonFileRepository<T> {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            _document: PhantomData,
        }
    }

    /// Create the storage directory if needed.
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }

    async fn read_document(&self, key: &str, path: &Path) -> Result<Option<T>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Serialization {
                key: key.to_string(),
                source,
            })
    }
}

#[async_trait]
impl<T: Document> Repository<T> for JsonFileRepository<T> {
    async fn get(&self, key: &str) -> Result<Option<T>> {
        check_key(key)?;
        self.read_document(key, &self.document_path(key)).await
    }

    async fn put(&self, key: &str, document: &T) -> Result<()> {
        check_key(key)?;

        let bytes =
            serde_json::to_vec_pretty(document).map_err(|source| StorageError::Serialization {
                key: key.to_string(),
                source,
            })?;

        let target = self.document_path(key);
        let temp = self.root.join(format!(".{}.tmp", Uuid::new_v4().simple()));

        let mut file = fs::File::create(&temp)
            .await
            .map_err(|e| StorageError::io(&temp, e))?;
        let written = async {
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::io(&temp, e));
        }

        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::io(&target, e));
        }

        tracing::debug!(target: "bookworm-db", key, path = %target.display(), "document written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        check_key(key)?;

        let path = self.document_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn list(&self) -> Result<Vec<T>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.root, e)),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.root, e))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(encoded) = name.strip_suffix(".json") else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let Some(key) = decode_key(encoded) else {
                tracing::warn!(target: "bookworm-db", file = name, "skipping file with undecodable name");
                continue;
            };
            if let Some(document) = self.read_document(&key, &entry.path()).await? {
                documents.push(document);
            }
        }

        Ok(documents)
    }
}

/// Percent-encode a key into a file name. A leading `.` is escaped too, so
/// documents never collide with hidden or temporary files.
fn encode_key(key: &str) -> String {
    let encoded = urlencoding::encode(key).into_owned();
    if let Some(rest) = encoded.strip_prefix('.') {
        return format!("%2E{rest}");
    }
    encoded
}

fn decode_key(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|key| key.into_owned())
}
