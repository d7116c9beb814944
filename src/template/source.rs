use std::path::PathBuf;

use crate::error::StartError;

/// Where the configuration template comes from.
///
/// Loaded again on every start, so a template file replaced on disk between
/// starts is picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template text held in memory.
    Inline(String),
    /// Template file, read with UTF-8 decoding.
    File(PathBuf),
}

impl TemplateSource {
    /// Returns the template text.
    pub async fn load(&self) -> Result<String, StartError> {
        match self {
            TemplateSource::Inline(text) => Ok(text.clone()),
            TemplateSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| StartError::ConfigRead {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

impl From<String> for TemplateSource {
    fn from(text: String) -> Self {
        TemplateSource::Inline(text)
    }
}

impl From<&str> for TemplateSource {
    fn from(text: &str) -> Self {
        TemplateSource::Inline(text.to_string())
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        TemplateSource::File(path)
    }
}
