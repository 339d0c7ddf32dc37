//! Persistence for the project configuration file (`.hdl-project`).
//!
//! The file is JSON with four optional sections; unknown keys are ignored
//! and missing keys leave the corresponding project state untouched.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const DOT_FILENAME: &str = ".hdl-project";

#[derive(Debug, Error)]
pub enum DotfileError {
    #[error("dotfile does not exist")]
    Missing,
    #[error("failed to read dotfile: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DotFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_suppressions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_paths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros: Option<Vec<MacroEntry>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MacroEntry {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl DotFile {
    /// Macro entries as `NAME=VALUE` defines. Entries without a name are
    /// skipped; an empty value normalises to `1`.
    pub fn defines(&self) -> Vec<String> {
        let mut defines = Vec::new();
        for entry in self.macros.iter().flatten() {
            let Some(name) = entry.name.as_deref().filter(|n| !n.is_empty()) else {
                warn!("skipping macro entry without a name");
                continue;
            };
            let value = entry
                .value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or("1");
            defines.push(format!("{name}={value}"));
        }
        defines
    }

    /// Inverse of [`DotFile::defines`]: split `NAME` / `NAME=VALUE` strings
    /// back into entries for serialization.
    pub fn set_defines(&mut self, defines: &[String]) {
        let macros = defines
            .iter()
            .map(|define| match define.split_once('=') {
                Some((name, value)) => MacroEntry {
                    name: Some(name.to_string()),
                    value: Some(value.to_string()),
                },
                None => MacroEntry {
                    name: Some(define.clone()),
                    value: Some("1".to_string()),
                },
            })
            .collect();
        self.macros = Some(macros);
    }
}

/// Read the dotfile. A corrupt file is reported as an empty configuration
/// so the caller can overwrite it with fresh state.
pub fn load(path: &Path) -> Result<DotFile, DotfileError> {
    if !path.exists() {
        return Err(DotfileError::Missing);
    }
    let contents = fs::read_to_string(path)?;
    match serde_json::from_str(&contents) {
        Ok(dotfile) => Ok(dotfile),
        Err(err) => {
            warn!(%err, "failed to parse dotfile; overwriting with new");
            Ok(DotFile::default())
        }
    }
}

/// Write the dotfile. Not atomic: a concurrent reader can observe a
/// truncated file.
pub fn save(path: &Path, dotfile: &DotFile) -> Result<(), io::Error> {
    let contents = serde_json::to_string_pretty(dotfile).map_err(io::Error::other)?;
    fs::write(path, contents)
}
