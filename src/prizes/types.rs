use log::warn;
use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::temple::loader::read_toml;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Prize {
    pub name: String,
    pub description: String,
    pub sponsor: String,
    #[serde(default = "default_value")]
    pub value: String,
    #[serde(default)]
    pub includes: Vec<String>,
}

fn default_value() -> String {
    "$0".to_string()
}

impl Prize {
    /// Dollar value with every non-digit stripped, so "$1,250" is 1250.
    /// A value too large for `u64` saturates.
    pub fn amount(&self) -> u64 {
        let amount = self
            .value
            .chars()
            .filter_map(|c| c.to_digit(10))
            .try_fold(0u64, |acc, d| acc.checked_mul(10)?.checked_add(u64::from(d)));

        amount.unwrap_or_else(|| {
            warn!("prize '{}' value '{}' overflows, capping", self.name, self.value);
            u64::MAX
        })
    }
}

/// Contents of `prizes.toml`, one list per milestone.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PrizeTable {
    #[serde(default)]
    pub participation: Vec<Prize>,
    #[serde(default)]
    pub moat_crossing: Vec<Prize>,
    #[serde(default)]
    pub steps_of_knowledge: Vec<Prize>,
    #[serde(default)]
    pub full_pendant: Vec<Prize>,
    #[serde(default)]
    pub reached_temple: Vec<Prize>,
    #[serde(default)]
    pub five_rooms: Vec<Prize>,
    #[serde(default)]
    pub grabbed_artifact: Vec<Prize>,
    #[serde(default)]
    pub grand_prizes: Vec<Prize>,
    #[serde(default)]
    pub speed_bonus: Vec<Prize>,
    #[serde(default)]
    pub no_guards_met: Vec<Prize>,
    #[serde(default)]
    pub all_rooms_visited: Vec<Prize>,
    #[serde(default)]
    pub sponsor_announcements: Vec<String>,
}

pub fn load_prizes(path: &Path) -> Result<PrizeTable, ConfigError> {
    read_toml(path)
}
