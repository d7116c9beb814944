use std::path::{Path, PathBuf};

use crate::{error::StartError, worker::WorkerParameters};

/// Every placeholder token understood by [`render`].
pub const PLACEHOLDERS: [&str; 10] = [
    "$algo$",
    "$url$",
    "$username$",
    "$pass$",
    "$legacythreads$",
    "$legacyintensity$",
    "$legacyalgo$",
    "$urlhost$",
    "$urlport$",
    "$cpuconfig$",
];

/// Final configuration text for one worker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    text: String,
}

/// Substitutes every placeholder in `template` from `params`.
///
/// One left-to-right pass: substituted values are never scanned again, so a
/// `$token$` inside a username or password reaches the config verbatim.
/// A `$` that does not open a known token is copied as is.
pub fn render(template: &str, params: &WorkerParameters) -> RenderedConfig {
    let legacy_threads = params.legacy_threads().to_string();
    let legacy_intensity = params.legacy_intensity().to_string();
    let values: [(&str, &str); 10] = [
        ("$algo$", params.algo()),
        ("$url$", params.url()),
        ("$username$", params.username()),
        ("$pass$", params.password()),
        ("$legacythreads$", legacy_threads.as_str()),
        ("$legacyintensity$", legacy_intensity.as_str()),
        ("$legacyalgo$", params.algo()),
        ("$urlhost$", params.pool().host()),
        ("$urlport$", params.pool().port_or_empty()),
        ("$cpuconfig$", params.cpu_config()),
    ];

    let mut text = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('$') {
        text.push_str(&rest[..start]);
        let tail = &rest[start..];
        let candidate = tail[1..].find('$').map(|end| &tail[..end + 2]);
        match candidate.and_then(|c| values.iter().find(|(token, _)| *token == c)) {
            Some(&(token, value)) => {
                text.push_str(value);
                rest = &tail[token.len()..];
            }
            None => {
                text.push('$');
                rest = &tail[1..];
            }
        }
    }
    text.push_str(rest);
    RenderedConfig { text }
}

impl RenderedConfig {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Writes the config as `dir/file_name`, replacing any previous file.
    pub async fn write_to(&self, dir: &Path, file_name: &str) -> Result<PathBuf, StartError> {
        let path = dir.join(file_name);
        tokio::fs::write(&path, self.text.as_bytes())
            .await
            .map_err(|source| StartError::ConfigWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
