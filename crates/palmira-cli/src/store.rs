//! Directory-backed [`ResultStore`] for saved scraping results.

use std::path::{Path, PathBuf};

use palmira_scraper::{ResultStore, ScraperError};

pub(crate) struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl ResultStore for DirectoryStore {
    /// Writes `contents` to `<dir>/<filename>`, creating `dir` if needed.
    /// `filename` must be a bare file name.
    fn store(&self, filename: &str, contents: &str) -> Result<(), ScraperError> {
        let persist_error = |reason: String| ScraperError::Persist {
            filename: filename.to_owned(),
            reason,
        };

        if Path::new(filename).file_name().and_then(|n| n.to_str()) != Some(filename) {
            return Err(persist_error(
                "file name must not contain path components".to_owned(),
            ));
        }

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| persist_error(format!("creating {}: {e}", self.dir.display())))?;
        std::fs::write(self.dir.join(filename), contents)
            .map_err(|e| persist_error(e.to_string()))
    }
}
