//! Boot-time asset cache over the removable media tree.
//!
//! **Why**: the device serves the same small set of face images, sound cues
//! and web assets for its whole uptime. Reading them once at boot removes
//! storage I/O from the render path and lets the HTTP thread serve static
//! content without touching the card at all.
//!
//! **Used by**: sequencer (face/cue bytes), server (static content, status)
//!
//! The cache is a closed snapshot: single-level scans over a fixed folder
//! list at startup, exact-key lookup afterwards, no eviction or refresh.
//! An empty cache is a legal outcome - every lookup misses and callers treat
//! that as 404 / skip-render, not as an error.

use anyhow::{Context, Result, bail};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Folders scanned at boot, relative to the media root. Hardware source
/// trees first, then their served-path mirrors under /www.
pub const CACHE_FOLDERS: &[&str] = &[
    "/mood_matrix",
    "/sounds",
    "/www/assets/mm",
    "/www/assets/sounds",
];

/// Content type assigned by file extension at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Png,
    Webp,
    Wav,
    OctetStream,
}

impl ContentType {
    /// Map a file name to its content type, or None for unsupported
    /// extensions (which the scan skips entirely).
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Wav => "audio/wav",
            Self::OctetStream => "application/octet-stream",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Webp)
    }
}

/// One cached file: normalized key, full contents, content type.
#[derive(Debug, Clone)]
pub struct CachedAsset {
    /// Normalized case-sensitive path key, e.g. `/sounds/bell.png`
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: ContentType,
}

/// Immutable in-memory snapshot of the servable media files.
#[derive(Debug, Default)]
pub struct AssetCache {
    assets: Vec<CachedAsset>,
}

impl AssetCache {
    /// Build the cache by scanning `folders` (single level, no recursion)
    /// under `root`.
    ///
    /// A folder that is missing or not a directory is logged and skipped;
    /// an unreadable file is logged and skipped. A missing `root` is storage
    /// failure and aborts boot.
    pub fn load(root: &Path, folders: &[&str]) -> Result<Self> {
        if !root.is_dir() {
            bail!("media root {} is not a directory", root.display());
        }

        let mut cache = Self::default();
        for folder in folders {
            cache.scan_folder(root, folder);
        }

        info!(
            "Asset cache ready: {} assets, {} bytes",
            cache.len(),
            cache.total_bytes()
        );
        Ok(cache)
    }

    fn scan_folder(&mut self, root: &Path, folder: &str) {
        let dir = root.join(folder.trim_start_matches('/'));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{} is not a readable directory: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(content_type) = ContentType::from_name(name) else {
                continue;
            };

            match fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))
            {
                Ok(bytes) => {
                    let key = format!("{}/{}", folder, name);
                    info!("Cached {} ({} bytes)", key, bytes.len());
                    self.assets.push(CachedAsset {
                        key,
                        bytes,
                        content_type,
                    });
                }
                Err(e) => warn!("{:#}", e),
            }
        }
    }

    /// Exact-match lookup. No side effects on miss.
    pub fn find(&self, key: &str) -> Option<&CachedAsset> {
        self.assets.iter().find(|a| a.key == key)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.assets.iter().map(|a| a.bytes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Unique temp media root per test (tests run in parallel)
    fn temp_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("moodbox_assets_{}", tag));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn test_load_and_find_by_exact_key() {
        let root = temp_root("find");
        fs::create_dir_all(root.join("mood_matrix")).unwrap();
        fs::write(root.join("mood_matrix/happy.png"), b"png-bytes").unwrap();
        fs::write(root.join("mood_matrix/calm.webp"), b"webp-bytes").unwrap();

        let cache = AssetCache::load(&root, &["/mood_matrix"]).unwrap();
        assert_eq!(cache.len(), 2);

        let happy = cache.find("/mood_matrix/happy.png").unwrap();
        assert_eq!(happy.bytes, b"png-bytes");
        assert_eq!(happy.content_type, ContentType::Png);
        assert_eq!(happy.content_type.mime(), "image/png");

        let calm = cache.find("/mood_matrix/calm.webp").unwrap();
        assert_eq!(calm.content_type, ContentType::Webp);

        assert!(cache.find("/mood_matrix/absent.png").is_none());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_unsupported_extensions_and_subdirs_skipped() {
        let root = temp_root("skip");
        fs::create_dir_all(root.join("sounds/nested")).unwrap();
        fs::write(root.join("sounds/bell.wav"), b"RIFF....").unwrap();
        fs::write(root.join("sounds/readme.txt"), b"nope").unwrap();
        fs::write(root.join("sounds/nested/inner.png"), b"nope").unwrap();

        let cache = AssetCache::load(&root, &["/sounds"]).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.find("/sounds/bell.wav").unwrap().content_type,
            ContentType::Wav
        );
        assert!(cache.find("/sounds/readme.txt").is_none());
        assert!(cache.find("/sounds/nested/inner.png").is_none());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_folder_is_not_fatal() {
        let root = temp_root("missing");
        let cache = AssetCache::load(&root, &["/no_such_folder"]).unwrap();
        assert!(cache.is_empty());
        assert!(cache.find("/no_such_folder/x.png").is_none());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let root = std::env::temp_dir().join("moodbox_assets_definitely_absent");
        let _ = fs::remove_dir_all(&root);
        assert!(AssetCache::load(&root, CACHE_FOLDERS).is_err());
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(ContentType::from_name("A.PNG"), Some(ContentType::Png));
        assert_eq!(ContentType::from_name("b.Webp"), Some(ContentType::Webp));
        assert_eq!(ContentType::from_name("c.WAV"), Some(ContentType::Wav));
        assert_eq!(ContentType::from_name("noext"), None);
    }
}
