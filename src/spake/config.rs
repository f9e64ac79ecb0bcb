use super::GroupNumber;
use crate::error::KrbError;

use serde::Deserialize;
use std::fs;
use std::io;
use std::io::Read;
use std::path::Path;
use tracing::{debug, error};

fn default_groups() -> Vec<GroupNumber> {
    vec![
        GroupNumber::Edwards25519,
        GroupNumber::P256,
        GroupNumber::P384,
        GroupNumber::P521,
    ]
}

/// Local SPAKE group policy.
///
/// ```toml
/// groups = ["P-256", "edwards25519"]
/// optimistic_group = "P-256"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpakeConfig {
    /// Acceptable groups, most preferred first.
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupNumber>,
    /// The group a KDC challenges with before seeing the client's support.
    #[serde(default)]
    pub optimistic_group: Option<GroupNumber>,
}

impl Default for SpakeConfig {
    fn default() -> Self {
        SpakeConfig {
            groups: default_groups(),
            optimistic_group: None,
        }
    }
}

impl SpakeConfig {
    pub fn parse<P: AsRef<Path>>(path: P) -> io::Result<SpakeConfig> {
        let mut contents = String::new();
        let mut f = fs::File::open(&path)?;
        f.read_to_string(&mut contents)?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> io::Result<SpakeConfig> {
        toml::from_str(contents).map_err(|err| {
            error!(?err);
            io::Error::other("toml parse failure")
        })
    }

    pub fn validate(&self) -> Result<(), KrbError> {
        if self.groups.is_empty() {
            error!("no spake groups are enabled");
            return Err(KrbError::UnsupportedSpakeGroup);
        }

        for (i, group) in self.groups.iter().enumerate() {
            if self.groups[..i].contains(group) {
                error!(?group, "spake group listed more than once");
                return Err(KrbError::UnsupportedSpakeGroup);
            }
        }

        if let Some(group) = self.optimistic_group {
            if !self.groups.contains(&group) {
                error!(?group, "optimistic spake group is not enabled");
                return Err(KrbError::UnsupportedSpakeGroup);
            }
        }

        Ok(())
    }

    /// The most preferred local group that the peer offered. Unknown group
    /// numbers from the peer are skipped.
    pub fn select_group(&self, offered: &[i32]) -> Result<GroupNumber, KrbError> {
        let offered: Vec<GroupNumber> = offered
            .iter()
            .filter_map(|g| GroupNumber::try_from(*g).ok())
            .collect();

        let selected = self
            .groups
            .iter()
            .find(|group| offered.contains(group))
            .copied()
            .ok_or_else(|| {
                error!(?offered, "no spake group in common with the peer");
                KrbError::UnsupportedSpakeGroup
            })?;

        debug!(group = ?selected, "spake group selected");
        Ok(selected)
    }

    /// Whether a challenge in group `group` can be answered, or must be
    /// rejected in favour of sending support.
    pub fn accepts_group(&self, group: i32) -> bool {
        GroupNumber::try_from(group)
            .map(|group| self.groups.contains(&group))
            .unwrap_or(false)
    }
}
