use crate::error::CallbackError;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// The directory under which every store key is resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageRoot {
    path: PathBuf,
}

impl StorageRoot {
    /// Use the given directory as the storage root. Nothing is created until [`Self::create`].
    #[inline]
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }

    /// The root directory.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the root directory and any missing parents.
    pub async fn create(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.path).await
    }

    /// Resolve a client-supplied key to a path under this root.
    ///
    /// Exactly one leading separator is stripped, so `/etc/passwd` and `etc/passwd` resolve to
    /// the same path. Keys that are empty, contain `..`, or would otherwise leave the root are
    /// rejected.
    pub fn resolve(&self, key: impl Into<String>) -> Result<StoreKey, CallbackError> {
        let key = key.into();
        let relative = strip_one_separator(&key);

        let mut path = self.path.clone();
        let mut depth = 0_usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(CallbackError::InvalidArgument(format!(
                        "key `{key}` must not contain `..`"
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(CallbackError::InvalidArgument(format!(
                        "key `{key}` resolves outside of the storage root"
                    )));
                }
            }
        }

        if depth == 0 {
            return Err(CallbackError::InvalidArgument(format!(
                "key `{key}` does not name an object"
            )));
        }

        Ok(StoreKey { key, path })
    }
}

impl<T> From<T> for StorageRoot
where
    T: Into<PathBuf>,
{
    fn from(path: T) -> Self {
        Self::new(path)
    }
}

/// Strip a single leading separator. `/` is accepted on every platform.
fn strip_one_separator(key: &str) -> &str {
    key.strip_prefix(MAIN_SEPARATOR)
        .or_else(|| key.strip_prefix('/'))
        .unwrap_or(key)
}

/// A key paired with the path it resolves to under a [`StorageRoot`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    key: String,
    path: PathBuf,
}

impl StoreKey {
    /// The key exactly as the client sent it.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Where the object for this key lives.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
