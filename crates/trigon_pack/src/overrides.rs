//! Command-line overrides layered on top of a `pack.json`.

use std::path::{Path, PathBuf};

use crate::descriptor::{BuildDescriptor, PackError};

/// Replacement values for descriptor fields. `None` and an empty `copy`
/// keep what the descriptor says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub entry: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub filename: Option<String>,
    pub copy: Vec<PathBuf>,
}

impl Overrides {
    /// Read `config` and apply the overrides.
    ///
    /// A missing `config` is accepted when an entry is given; the defaults
    /// are then resolved against the directory `config` would live in, the
    /// same base a loaded descriptor uses.
    pub fn load(self, config: &Path) -> Result<BuildDescriptor, PackError> {
        let desc = if config.exists() || self.entry.is_none() {
            BuildDescriptor::load(config)?
        } else {
            let base = config.parent().unwrap_or_else(|| Path::new(""));
            BuildDescriptor::new(PathBuf::new()).resolve(base)
        };
        Ok(self.apply(desc))
    }

    pub fn apply(self, mut desc: BuildDescriptor) -> BuildDescriptor {
        if let Some(entry) = self.entry {
            desc.entry = entry;
        }
        if let Some(out) = self.out {
            desc.output.path = out;
        }
        if let Some(filename) = self.filename {
            desc.output.filename = filename;
        }
        if !self.copy.is_empty() {
            desc.copy = self.copy;
        }
        desc
    }
}
