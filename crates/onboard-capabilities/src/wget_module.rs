use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use url::Url;

use crate::{module_error::ModuleError, path_containment::contain_name, staged_file::StagedFile};

pub const WGET_MODULE_NAME: &str = "fdo.wget";
const WGET_TEMP_PREFIX: &str = ".fdo.wget_";

/// Fetches owner-named URLs into the configured wget directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WgetModule {
    dir: PathBuf,
    timeout: Duration,
}

impl WgetModule {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn name_to_path(&self, name: &str) -> Result<PathBuf, ModuleError> {
        Ok(contain_name(&self.dir, name)?)
    }

    /// Downloads `url`; without an explicit name the last URL segment is used.
    pub async fn fetch(
        &self,
        url: &str,
        name: Option<&str>,
        expected_sha384: Option<Vec<u8>>,
    ) -> Result<PathBuf, ModuleError> {
        let url = Url::parse(url).map_err(|_| ModuleError::InvalidUrl(url.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ModuleError::InvalidUrl(url.to_string()));
        }
        let name = match name.map(str::trim).filter(|value| !value.is_empty()) {
            Some(name) => name.to_string(),
            None => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default()
                .to_string(),
        };
        let destination = self.name_to_path(&name)?;
        let mut staged = StagedFile::create(&self.dir, WGET_TEMP_PREFIX, destination)?;
        if let Some(digest) = expected_sha384 {
            staged = staged.expect_sha384(digest);
        }

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        tracing::debug!(url = %url, destination = %staged.destination().display(), "remote fetch started");
        let mut response = client.get(url.clone()).send().await?.error_for_status()?;
        if let Some(length) = response.content_length() {
            staged = staged.expect_length(length);
        }
        while let Some(chunk) = response.chunk().await? {
            staged.write_chunk(&chunk)?;
        }
        staged.commit()
    }
}
