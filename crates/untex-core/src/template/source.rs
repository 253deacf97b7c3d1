//! Where a template comes from

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TemplateError;
use crate::fs::FileSystem;

/// Built-in template used when the document names none
pub const DEFAULT_TEMPLATE: &str = include_str!("../../assets/default.xml");

/// Location of a template document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The built-in [`DEFAULT_TEMPLATE`]
    Default,
    /// Fetched over HTTP(S)
    Remote(String),
    /// Read through the filesystem capability
    Local(PathBuf),
}

impl TemplateSource {
    /// Classify a template name
    ///
    /// Empty selects the default, `http://`/`https://` a remote URL, anything
    /// else a local path. Relative local paths are joined onto `base_dir`.
    pub fn from_name(name: &str, base_dir: &Path) -> Self {
        let name = name.trim();
        if name.is_empty() {
            TemplateSource::Default
        } else if name.starts_with("http://") || name.starts_with("https://") {
            TemplateSource::Remote(name.to_string())
        } else {
            TemplateSource::Local(crate::include::resolve_import_path(base_dir, name))
        }
    }

    /// Fetch the template document text
    pub fn read(&self, fs: &dyn FileSystem) -> Result<String, TemplateError> {
        match self {
            TemplateSource::Default => Ok(DEFAULT_TEMPLATE.to_string()),
            TemplateSource::Local(path) => {
                debug!("Reading template {}", path.display());
                let bytes = fs.read_file(path).map_err(|source| TemplateError::Read {
                    path: path.clone(),
                    source,
                })?;
                String::from_utf8(bytes).map_err(|_| {
                    TemplateError::Malformed(format!("{} is not valid UTF-8", path.display()))
                })
            }
            TemplateSource::Remote(url) => fetch(url),
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Default => write!(f, "(built-in)"),
            TemplateSource::Remote(url) => write!(f, "{}", url),
            TemplateSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(feature = "remote-templates")]
fn fetch(url: &str) -> Result<String, TemplateError> {
    debug!("Fetching template {}", url);

    let fetch_error = |message: String| TemplateError::Fetch {
        url: url.to_string(),
        message,
    };

    let response = reqwest::blocking::get(url).map_err(|e| fetch_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("server returned {}", status)));
    }

    response.text().map_err(|e| fetch_error(e.to_string()))
}

#[cfg(not(feature = "remote-templates"))]
fn fetch(url: &str) -> Result<String, TemplateError> {
    Err(TemplateError::RemoteDisabled(url.to_string()))
}
