//! Fetching sample pose files from a remote data repository.
//!
//! Files are downloaded into a local cache on first use and verified
//! against the SHA-256 digests in the repository's `metadata.yaml`. A file
//! whose digest does not match is fetched again once; if it still does not
//! match it is removed and an error is returned.
//!
//! The fetcher is generic over its [`Transport`] so that it can be driven
//! without a network. With the `remote` feature, [`UreqTransport`] and
//! [`SampleFetcher::remote`] provide the real HTTP client.

mod registry;
mod transport;

use std::cell::OnceCell;
use std::env;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::PoseError;
use crate::ir::PoseDataset;

pub use registry::{Companion, Contributor, SampleEntry, SampleRegistry};
pub use transport::Transport;
#[cfg(feature = "remote")]
pub use transport::UreqTransport;

/// Where sample files are served from.
pub const DEFAULT_BASE_URL: &str =
    "https://gin.g-node.org/neuroinformatics/movement-test-data/raw/master";

/// Overrides the default cache directory.
pub const DATA_DIR_ENV: &str = "POSETRACKS_DATA_DIR";

/// Name of the registry file, both remotely and in the cache.
pub const REGISTRY_FILE: &str = "metadata.yaml";

const POSES_DIR: &str = "poses";

/// The cache directory: `$POSETRACKS_DATA_DIR` if set, else
/// `~/.posetracks/data`.
pub fn default_cache_dir() -> Result<PathBuf, PoseError> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".posetracks").join("data"))
        .ok_or_else(|| PoseError::Download {
            name: REGISTRY_FILE.to_string(),
            message: format!("cannot determine a home directory; set {}", DATA_DIR_ENV),
        })
}

/// Hex-encoded SHA-256 digest of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String, PoseError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Downloads, caches and loads sample pose files.
pub struct SampleFetcher<T> {
    base_url: String,
    cache_dir: PathBuf,
    transport: T,
    registry: OnceCell<SampleRegistry>,
}

#[cfg(feature = "remote")]
impl SampleFetcher<UreqTransport> {
    /// A fetcher for [`DEFAULT_BASE_URL`] caching into [`default_cache_dir`].
    pub fn remote() -> Result<Self, PoseError> {
        Ok(Self::new(UreqTransport::default(), default_cache_dir()?))
    }
}

impl<T: Transport> SampleFetcher<T> {
    pub fn new(transport: T, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: cache_dir.into(),
            transport,
            registry: OnceCell::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The registry, downloaded on first use and read from the cache after.
    pub fn registry(&self) -> Result<&SampleRegistry, PoseError> {
        if let Some(registry) = self.registry.get() {
            return Ok(registry);
        }

        let path = self.cache_dir.join(REGISTRY_FILE);
        if !path.is_file() {
            fs::create_dir_all(&self.cache_dir)?;
            self.download(REGISTRY_FILE, REGISTRY_FILE, &path)?;
            info!(path = %path.display(), "Fetched sample registry");
        }

        let text = fs::read_to_string(&path)?;
        let registry = SampleRegistry::from_yaml_str(&text, &path)?;
        debug!(entries = registry.len(), "Loaded sample registry");
        Ok(self.registry.get_or_init(|| registry))
    }

    /// Names of the sample pose files available, sorted.
    pub fn list_datasets(&self) -> Result<Vec<String>, PoseError> {
        Ok(self.registry()?.pose_names())
    }

    /// The local path of the sample file `name`, downloading it if needed.
    ///
    /// # Errors
    /// Returns `Download` for a name the registry does not list, for
    /// transport failures, and when the digest still does not match after
    /// one re-fetch.
    pub fn fetch_sample_data_path(&self, name: &str) -> Result<PathBuf, PoseError> {
        let entry = self.entry(name)?;
        let dir = self.cache_dir.join(POSES_DIR);
        let path = dir.join(&entry.file_name);

        let mut downloads_left = 2;
        if path.is_file() {
            if self.digest_matches(entry, &path)? {
                debug!(path = %path.display(), "Using cached sample file");
                return Ok(path);
            }
            warn!(path = %path.display(), "Cached sample file failed verification; fetching again");
            downloads_left = 1;
        } else {
            fs::create_dir_all(&dir)?;
        }

        let remote = format!("{}/{}", POSES_DIR, entry.file_name);
        let mut actual = String::new();
        while downloads_left > 0 {
            downloads_left -= 1;
            self.download(name, &remote, &path)?;
            actual = sha256_file(&path)?;
            if actual.eq_ignore_ascii_case(&entry.sha256sum) {
                info!(path = %path.display(), "Fetched sample file");
                return Ok(path);
            }
            warn!(
                name,
                expected = %entry.sha256sum,
                actual = %actual,
                "Downloaded sample file failed verification"
            );
        }

        let _ = fs::remove_file(&path);
        Err(PoseError::Download {
            name: name.to_string(),
            message: format!(
                "SHA-256 mismatch after re-fetching: expected {}, got {}",
                entry.sha256sum, actual
            ),
        })
    }

    /// Fetches the sample file `name` and loads it with the source software
    /// and frame rate the registry records for it.
    pub fn fetch_dataset(&self, name: &str) -> Result<PoseDataset, PoseError> {
        let entry = self.entry(name)?;
        let vendor = entry.vendor()?;
        let fps = entry.fps;
        let path = self.fetch_sample_data_path(name)?;
        crate::load::from_file(&path, vendor, fps)
    }

    fn entry(&self, name: &str) -> Result<&SampleEntry, PoseError> {
        let registry = self.registry()?;
        match registry.get(name) {
            Some(entry) if entry.is_poses() => Ok(entry),
            Some(entry) => Err(PoseError::Download {
                name: name.to_string(),
                message: format!(
                    "not a pose file (type {})",
                    entry.kind.as_deref().unwrap_or("unknown")
                ),
            }),
            None => Err(PoseError::Download {
                name: name.to_string(),
                message: format!(
                    "not in the sample registry; available: {}",
                    registry.pose_names().join(", ")
                ),
            }),
        }
    }

    fn digest_matches(&self, entry: &SampleEntry, path: &Path) -> Result<bool, PoseError> {
        Ok(sha256_file(path)?.eq_ignore_ascii_case(&entry.sha256sum))
    }

    fn download(&self, name: &str, remote: &str, dest: &Path) -> Result<(), PoseError> {
        let url = format!("{}/{}", self.base_url, remote);
        debug!(url = %url, dest = %dest.display(), "Downloading");
        self.transport
            .download(&url, dest)
            .map_err(|message| PoseError::Download {
                name: name.to_string(),
                message: format!("failed to download {}: {}", url, message),
            })
    }
}
