//! Fixed configuration record passed to every extractor call

use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorOptions {
    pub quiet: bool,
    /// Only set when the file actually exists
    pub cookie_file: Option<PathBuf>,
    /// Skip unavailable entries instead of aborting
    pub ignore_errors: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            quiet: true,
            cookie_file: None,
            ignore_errors: true,
        }
    }
}

impl ExtractorOptions {
    /// Build the record, silently ignoring a cookie file that is not on disk
    pub fn with_cookies(cookie_file: Option<&Path>) -> Self {
        let cookie_file = cookie_file.and_then(|path| {
            if path.is_file() {
                Some(path.to_path_buf())
            } else {
                debug!("Cookie file {:?} not found, continuing without it", path);
                None
            }
        });

        Self {
            cookie_file,
            ..Self::default()
        }
    }

    /// Command line flags shared by info, playlist and download invocations
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--no-warnings".to_string()];
        if self.quiet {
            args.push("--quiet".to_string());
        }
        if self.ignore_errors {
            args.push("--ignore-errors".to_string());
        }
        if let Some(cookies) = &self.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
        args
    }
}
