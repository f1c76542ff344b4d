//! `pack.json`: entry, output location and copied assets.
//!
//! ```json
//! {
//!   "entry": "static/main.js",
//!   "output": { "path": "dist", "filename": "main.js" },
//!   "copy": ["static/index.html"]
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the descriptor.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DESCRIPTOR_FILE: &str = "pack.json";

fn default_output_path() -> PathBuf {
    PathBuf::from("dist")
}

fn default_filename() -> String {
    "main.js".to_string()
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid descriptor {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("entry {} does not exist", .0.display())]
    MissingEntry(PathBuf),
    #[error("entry {} is not a file", .0.display())]
    EntryNotFile(PathBuf),
    #[error("output filename {0:?} must be a bare file name")]
    InvalidFilename(String),
    #[error("asset {} does not exist", .0.display())]
    MissingAsset(PathBuf),
    #[error("asset {} has no file name", .0.display())]
    AssetNameless(PathBuf),
    #[error("two outputs would be written as {0:?}")]
    DuplicateOutput(String),
    #[error("{} would be copied onto itself", .0.display())]
    SourceIsOutput(PathBuf),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_filename(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDescriptor {
    pub entry: PathBuf,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub copy: Vec<PathBuf>,
}

impl BuildDescriptor {
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            output: Output::default(),
            copy: Vec::new(),
        }
    }

    /// Read and parse a descriptor file, resolving its paths against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, PackError> {
        let text = fs::read_to_string(path).map_err(|source| PackError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let desc: Self = serde_json::from_str(&text).map_err(|source| PackError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(desc.resolve(base))
    }

    /// Join every relative path onto `base`.
    pub fn resolve(mut self, base: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        self.entry = join(self.entry.as_path());
        self.output.path = join(self.output.path.as_path());
        self.copy = self.copy.iter().map(|p| join(p.as_path())).collect();
        self
    }

    /// Final location of the bundled script.
    pub fn output_file(&self) -> PathBuf {
        self.output.path.join(&self.output.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let desc: BuildDescriptor = serde_json::from_str(r#"{ "entry": "static/main.js" }"#).unwrap();
        assert_eq!(desc, BuildDescriptor::new("static/main.js"));
        assert_eq!(desc.output_file(), PathBuf::from("dist/main.js"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<BuildDescriptor>(r#"{ "entry": "a.js", "plugins": [] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("plugins"));
    }

    #[test]
    fn load_resolves_against_descriptor_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DESCRIPTOR_FILE);
        fs::write(
            &path,
            r#"{ "entry": "static/main.js", "output": { "path": "out" }, "copy": ["static/index.html"] }"#,
        )
        .unwrap();

        let desc = BuildDescriptor::load(&path).unwrap();
        assert_eq!(desc.entry, dir.path().join("static/main.js"));
        assert_eq!(desc.output.path, dir.path().join("out"));
        assert_eq!(desc.output.filename, "main.js");
        assert_eq!(desc.copy, vec![dir.path().join("static/index.html")]);
    }

    #[test]
    fn web_crate_descriptor_parses() {
        let desc: BuildDescriptor =
            serde_json::from_str(include_str!("../../trigon_web/pack.json")).unwrap();
        assert_eq!(desc.entry, PathBuf::from("static/boot.js"));
        assert_eq!(desc.output, Output::default());
        assert_eq!(desc.copy, vec![PathBuf::from("static/index.html")]);
    }

    #[test]
    fn malformed_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DESCRIPTOR_FILE);
        fs::write(&path, "{ entry: ").unwrap();

        let err = BuildDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, PackError::Parse { .. }));
        assert!(err.to_string().contains(DESCRIPTOR_FILE));
    }
}
