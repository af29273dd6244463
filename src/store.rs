//! Filesystem-backed page store
//!
//! Fetched pages live at `<data-dir>/<site>/<slug>.json`. The file
//! body is the JSON list of sites the page referenced, not the page
//! itself; the file's modification time is forced to the sitemap's
//! last-modified timestamp (truncated to whole seconds) and read back
//! on later sitemap passes as the freshness baseline. The data
//! directory doubles as the crawl's restart state: its subdirectory
//! names are the sites already visited.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use thiserror::Error;

use crate::crawler::Site;

/// Errors that can occur while reading or writing the page store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON encoding error for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

fn io_err(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Store for fetched pages, one directory per site
#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    /// Creates a store rooted at the given data directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the data directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prepares the data directory and reports the sites it holds
    ///
    /// When the directory already exists, every subdirectory name is
    /// returned as an already-visited site (sorted, for deterministic
    /// seeding). Otherwise the directory is created and the list is
    /// empty. Plain files under the root are ignored.
    pub fn bootstrap(&self) -> StoreResult<Vec<Site>> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;
            return Ok(Vec::new());
        }

        let mut sites = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| io_err(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.root, e))?;
            let file_type = entry.file_type().map_err(|e| io_err(&entry.path(), e))?;
            if !file_type.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => sites.push(name),
                Err(name) => {
                    tracing::debug!("Ignoring non-UTF-8 entry in data dir: {:?}", name);
                }
            }
        }
        sites.sort();
        Ok(sites)
    }

    /// Path of a site's directory
    pub fn site_dir(&self, site: &str) -> PathBuf {
        self.root.join(site)
    }

    /// Path of a page's stored site list
    pub fn page_path(&self, site: &str, slug: &str) -> PathBuf {
        self.root.join(site).join(format!("{slug}.json"))
    }

    /// Creates a site's directory if it does not exist yet
    ///
    /// Creation is non-recursive: a site names exactly one directory
    /// directly under the root, and a path-like name fails the call.
    pub fn ensure_site_dir(&self, site: &str) -> StoreResult<()> {
        let dir = self.site_dir(site);
        if !dir.exists() {
            fs::create_dir(&dir).map_err(|e| io_err(&dir, e))?;
        }
        Ok(())
    }

    /// Returns a stored page's baseline in epoch seconds
    ///
    /// `None` means the page has never been stored (or was removed out
    /// of band), so the next sitemap pass treats it as missing.
    pub fn modified_secs(&self, site: &str, slug: &str) -> StoreResult<Option<u64>> {
        let path = self.page_path(site, slug);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path, e)),
        };
        let modified = metadata.modified().map_err(|e| io_err(&path, e))?;
        let secs = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Some(secs))
    }

    /// Writes a page's referenced-site list and stamps its baseline
    ///
    /// The file body is the pretty-printed JSON array of sites. The
    /// modification time is set to `date_ms / 1000` epoch seconds, so
    /// later sitemap passes compare against the sitemap-declared
    /// timestamp rather than the wall-clock fetch time. Overwrites any
    /// previous version of the page.
    pub fn write_page(
        &self,
        site: &str,
        slug: &str,
        sites: &[Site],
        date_ms: u64,
    ) -> StoreResult<()> {
        let path = self.page_path(site, slug);
        let body = serde_json::to_vec_pretty(sites).map_err(|e| StoreError::Json {
            path: path.clone(),
            source: e,
        })?;

        let mut file = File::create(&path).map_err(|e| io_err(&path, e))?;
        file.write_all(&body).map_err(|e| io_err(&path, e))?;

        let mtime = UNIX_EPOCH + Duration::from_secs(date_ms / 1000);
        file.set_modified(mtime).map_err(|e| io_err(&path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bootstrap_creates_missing_data_dir() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path().join("data"));

        let sites = store.bootstrap().unwrap();

        assert!(sites.is_empty());
        assert!(store.root().is_dir());
    }

    #[test]
    fn bootstrap_lists_site_dirs_sorted_and_skips_files() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("data");
        fs::create_dir_all(root.join("b.example.org")).unwrap();
        fs::create_dir_all(root.join("a.example.org")).unwrap();
        fs::write(root.join("notes.txt"), "stray file").unwrap();

        let store = PageStore::new(&root);
        let sites = store.bootstrap().unwrap();

        assert_eq!(sites, vec!["a.example.org", "b.example.org"]);
    }

    #[test]
    fn bootstrap_of_existing_empty_dir_reports_no_sites() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());

        assert!(store.bootstrap().unwrap().is_empty());
    }

    #[test]
    fn page_path_layout() {
        let store = PageStore::new("data");
        assert_eq!(
            store.page_path("wiki.example.org", "welcome-visitors"),
            PathBuf::from("data/wiki.example.org/welcome-visitors.json")
        );
    }

    #[test]
    fn ensure_site_dir_is_idempotent() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());

        store.ensure_site_dir("wiki.example.org").unwrap();
        store.ensure_site_dir("wiki.example.org").unwrap();

        assert!(store.site_dir("wiki.example.org").is_dir());
    }

    #[test]
    fn path_like_site_names_cannot_escape_the_data_root() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("data");
        let store = PageStore::new(&root);
        store.bootstrap().unwrap();

        let escape = "evil.example/../..";
        assert!(matches!(
            store.ensure_site_dir(escape),
            Err(StoreError::Io { .. })
        ));
        assert!(matches!(
            store.write_page(escape, "owned", &[], 1_000_000),
            Err(StoreError::Io { .. })
        ));

        assert!(!root.join("evil.example").exists());
        assert!(!tmp.path().join("owned.json").exists());
    }

    #[test]
    fn modified_secs_of_unknown_page_is_none() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());
        store.ensure_site_dir("wiki.example.org").unwrap();

        let baseline = store.modified_secs("wiki.example.org", "missing").unwrap();

        assert_eq!(baseline, None);
    }

    #[test]
    fn write_page_stamps_truncated_sitemap_date() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());
        store.ensure_site_dir("wiki.example.org").unwrap();

        let sites = vec!["other.example.org".to_string()];
        store
            .write_page("wiki.example.org", "welcome", &sites, 1_234_999)
            .unwrap();

        // 1_234_999 ms truncates to 1234 whole seconds
        let baseline = store.modified_secs("wiki.example.org", "welcome").unwrap();
        assert_eq!(baseline, Some(1234));
    }

    #[test]
    fn write_page_body_is_the_site_list() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());
        store.ensure_site_dir("wiki.example.org").unwrap();

        let sites = vec!["a.example".to_string(), "b.example".to_string()];
        store
            .write_page("wiki.example.org", "welcome", &sites, 5_000_000)
            .unwrap();

        let body = fs::read_to_string(store.page_path("wiki.example.org", "welcome")).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, sites);
    }

    #[test]
    fn write_page_with_no_sites_stores_empty_list() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());
        store.ensure_site_dir("wiki.example.org").unwrap();

        store
            .write_page("wiki.example.org", "lonely", &[], 2_000_000)
            .unwrap();

        let body = fs::read_to_string(store.page_path("wiki.example.org", "lonely")).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&body).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn write_page_overwrites_previous_version() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());
        store.ensure_site_dir("wiki.example.org").unwrap();

        store
            .write_page(
                "wiki.example.org",
                "welcome",
                &["old.example".to_string()],
                1_000_000,
            )
            .unwrap();
        store
            .write_page(
                "wiki.example.org",
                "welcome",
                &["new.example".to_string()],
                2_000_000,
            )
            .unwrap();

        let body = fs::read_to_string(store.page_path("wiki.example.org", "welcome")).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, vec!["new.example"]);
        assert_eq!(
            store.modified_secs("wiki.example.org", "welcome").unwrap(),
            Some(2000)
        );
    }

    #[test]
    fn write_page_into_missing_site_dir_fails_with_path() {
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());

        let result = store.write_page("never-created.example", "welcome", &[], 1_000_000);

        match result {
            Err(StoreError::Io { path, .. }) => {
                assert!(path.ends_with("never-created.example/welcome.json"));
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
