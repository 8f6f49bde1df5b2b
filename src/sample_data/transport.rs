//! How sample files reach the cache.

use std::path::Path;

/// Downloads remote files.
///
/// The fetcher owns caching and checksum verification; a transport only
/// moves bytes. Errors are reported as messages and wrapped by the caller.
pub trait Transport {
    /// Downloads `url` into `dest`, replacing any existing file.
    fn download(&self, url: &str, dest: &Path) -> Result<(), String>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn download(&self, url: &str, dest: &Path) -> Result<(), String> {
        (**self).download(url, dest)
    }
}

#[cfg(feature = "remote")]
pub use self::remote::UreqTransport;

#[cfg(feature = "remote")]
mod remote {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;
    use std::time::Duration;

    use tracing::debug;

    use super::Transport;

    /// Largest file the transport accepts.
    const MAX_DOWNLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

    /// A blocking HTTP transport built on `ureq`.
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        /// Creates a transport whose requests time out after `timeout`.
        pub fn new(timeout: Duration) -> Self {
            let config = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build();
            Self {
                agent: config.into(),
            }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new(Duration::from_secs(300))
        }
    }

    impl Transport for UreqTransport {
        fn download(&self, url: &str, dest: &Path) -> Result<(), String> {
            let mut response = self
                .agent
                .get(url)
                .call()
                .map_err(|source| source.to_string())?;

            // Stream into a sibling file and rename, so an interrupted
            // download never looks like a complete one.
            let partial = dest.with_extension("part");
            let copy = || -> io::Result<u64> {
                let mut writer = BufWriter::new(File::create(&partial)?);
                let mut reader = response
                    .body_mut()
                    .with_config()
                    .limit(MAX_DOWNLOAD_BYTES)
                    .reader();
                let bytes = io::copy(&mut reader, &mut writer)?;
                writer.flush()?;
                Ok(bytes)
            };

            match copy() {
                Ok(bytes) => {
                    debug!(url, bytes, "Downloaded");
                    fs::rename(&partial, dest).map_err(|source| source.to_string())
                }
                Err(source) => {
                    let _ = fs::remove_file(&partial);
                    Err(source.to_string())
                }
            }
        }
    }
}
