//! Directory-backed page store
//!
//! Each page lands in its own file named after its URL. File names are
//! claimed per run: if two different URLs sanitize to the same name, the
//! second one gets a hash suffix instead of overwriting the first.

use crate::storage::traits::{PageStore, StorageError, StorageResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use url::Url;

/// Length of the hex hash suffix used to break name collisions
const HASH_SUFFIX_LEN: usize = 12;

/// Longest file name most filesystems accept, in bytes
const MAX_FILE_NAME_LEN: usize = 255;

const EXTENSION: &str = ".html";

/// Derives a file name from a URL
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, the result is
/// lower-cased and `.html` is appended. Names that would exceed 255 bytes
/// are cut short and end in a hash of the full URL instead.
///
/// # Example
///
/// ```
/// use shoreline::storage::sanitize_key;
///
/// assert_eq!(
///     sanitize_key("https://example.test/docs/intro"),
///     "https___example_test_docs_intro.html"
/// );
/// ```
pub fn sanitize_key(url: &str) -> String {
    let stem = sanitized_stem(url);
    if stem.len() + EXTENSION.len() <= MAX_FILE_NAME_LEN {
        format!("{}{}", stem, EXTENSION)
    } else {
        suffixed_key(url, HASH_SUFFIX_LEN)
    }
}

/// Sanitized URL without extension; ASCII only
fn sanitized_stem(url: &str) -> String {
    url.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// File name ending in `hash_len` hex digits of the URL's SHA-256
///
/// The stem is shortened as needed to stay within [`MAX_FILE_NAME_LEN`].
fn suffixed_key(url: &str, hash_len: usize) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let hash = &digest[..hash_len.min(digest.len())];

    let mut stem = sanitized_stem(url);
    stem.truncate(MAX_FILE_NAME_LEN - EXTENSION.len() - hash.len() - 1);
    format!("{}_{}{}", stem, hash, EXTENSION)
}

/// [`PageStore`] writing one file per URL into a directory
#[derive(Debug)]
pub struct FilePageStore {
    dir: PathBuf,
    /// File name -> URL that claimed it in this run
    claims: Mutex<HashMap<String, String>>,
}

impl FilePageStore {
    /// Creates a store rooted at `dir`
    ///
    /// The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            claims: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the file name reserved for `url`, claiming one if needed
    ///
    /// The same URL always gets the same name within a run, and no two
    /// URLs share a name.
    pub fn file_name_for(&self, url: &Url) -> StorageResult<String> {
        let url = url.as_str();
        let mut claims = self
            .claims
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let candidates = [
            sanitize_key(url),
            suffixed_key(url, HASH_SUFFIX_LEN),
            suffixed_key(url, usize::MAX),
        ];

        for candidate in candidates {
            match claims.get(&candidate) {
                Some(owner) if owner == url => return Ok(candidate),
                Some(owner) => {
                    tracing::debug!("File name {} already used by {}", candidate, owner);
                }
                None => {
                    claims.insert(candidate.clone(), url.to_string());
                    return Ok(candidate);
                }
            }
        }

        Err(StorageError::KeyExhausted(url.to_string()))
    }
}

#[async_trait]
impl PageStore for FilePageStore {
    async fn persist(&self, url: &Url, content: &[u8]) -> StorageResult<PathBuf> {
        let name = self.file_name_for(url)?;
        let path = self.dir.join(name);

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Saved {} to {}", url, path.display());
        Ok(path)
    }
}
