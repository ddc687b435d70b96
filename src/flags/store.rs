//! Flat-file flag store
//!
//! Each flag lives in its own file named after the uppercase code, directly
//! under the flags root. The store only ever reads.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::code::FlagCode;

/// Failure to produce flag text for a valid code
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("cannot resolve flags directory: {0}")]
    Root(#[source] io::Error),
    #[error("no flag file at {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid UTF-8", .0.display())]
    Encoding(PathBuf),
}

/// Read-only view over a directory of flag files
#[derive(Debug, Clone, Default)]
pub struct FlagStore {
    dir: Option<PathBuf>,
}

impl FlagStore {
    /// `None` resolves against the working directory on every lookup.
    pub const fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Directory flag files are resolved against
    pub fn root(&self) -> io::Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }

    /// Path of the file backing `code`
    pub fn path_for(&self, code: &FlagCode) -> Result<PathBuf, LookupError> {
        let root = self.root().map_err(LookupError::Root)?;
        Ok(root.join(code.as_str()))
    }

    /// Read and trim the flag text for `code`
    pub async fn lookup(&self, code: &FlagCode) -> Result<String, LookupError> {
        let path = self.path_for(code)?;

        match fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => return Err(LookupError::NotFound(path)),
            Err(source) => return Err(LookupError::Io { path, source }),
        }

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(source) => return Err(LookupError::Io { path, source }),
        };

        let text = String::from_utf8(bytes).map_err(|_| LookupError::Encoding(path.clone()))?;
        Ok(trim_flag(&text).to_string())
    }

    /// Whether the flags root is an existing directory
    pub async fn is_ready(&self) -> bool {
        match self.root() {
            Ok(root) => is_dir(&root).await,
            Err(_) => false,
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

/// Strip surrounding whitespace, including a leading byte-order mark
pub fn trim_flag(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::code::CodeParam;
    use tempfile::TempDir;

    fn code(raw: &str) -> FlagCode {
        FlagCode::parse(CodeParam::One(raw.to_string())).unwrap()
    }

    fn store_with(files: &[(&str, &[u8])]) -> (TempDir, FlagStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let store = FlagStore::new(Some(dir.path().to_path_buf()));
        (dir, store)
    }

    #[tokio::test]
    async fn test_lookup_trims_content() {
        let (_dir, store) = store_with(&[("FR", "🇫🇷\n".as_bytes())]);
        assert_eq!(store.lookup(&code("fr")).await.unwrap(), "🇫🇷");
    }

    #[tokio::test]
    async fn test_lookup_trims_surrounding_whitespace_and_bom() {
        let (_dir, store) = store_with(&[("JP", "\u{feff}  🇯🇵 \r\n\t".as_bytes())]);
        assert_eq!(store.lookup(&code("jp")).await.unwrap(), "🇯🇵");
    }

    #[tokio::test]
    async fn test_lookup_content_is_opaque() {
        let (_dir, store) = store_with(&[("XX", b"not a flag at all\n")]);
        assert_eq!(store.lookup(&code("xx")).await.unwrap(), "not a flag at all");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, store) = store_with(&[]);
        let err = store.lookup(&code("zz")).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(ref p) if p.ends_with("ZZ")));
    }

    #[tokio::test]
    async fn test_lowercase_file_is_not_matched() {
        let (_dir, store) = store_with(&[("us", "🇺🇸".as_bytes())]);
        // Only the uppercase file name is looked up; on case-insensitive
        // filesystems the lowercase file would still be found.
        if !store.root().unwrap().join("US").exists() {
            assert!(matches!(
                store.lookup(&code("us")).await,
                Err(LookupError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let (_dir, store) = store_with(&[("DE", &[0xff, 0xfe, 0x00])]);
        assert!(matches!(
            store.lookup(&code("de")).await,
            Err(LookupError::Encoding(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_named_like_code() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("IT")).unwrap();
        let store = FlagStore::new(Some(dir.path().to_path_buf()));
        assert!(matches!(
            store.lookup(&code("it")).await,
            Err(LookupError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlagStore::new(Some(dir.path().join("nope")));
        assert!(matches!(
            store.lookup(&code("us")).await,
            Err(LookupError::NotFound(_))
        ));
        assert!(!store.is_ready().await);
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent() {
        let (_dir, store) = store_with(&[("US", "🇺🇸\n".as_bytes())]);
        let first = store.lookup(&code("us")).await.unwrap();
        let second = store.lookup(&code("US")).await.unwrap();
        assert_eq!(first, second);
        assert!(store.is_ready().await);
    }

    #[test]
    fn test_path_for_uses_uppercase_name() {
        let store = FlagStore::new(Some(PathBuf::from("/srv/flags")));
        assert_eq!(
            store.path_for(&code("gb")).unwrap(),
            PathBuf::from("/srv/flags/GB")
        );
    }

    #[test]
    fn test_default_root_is_working_directory() {
        let store = FlagStore::default();
        assert_eq!(store.root().unwrap(), std::env::current_dir().unwrap());
    }
}
