//! Sales tallies for the leaderboard.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of sale a rep can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleKind {
    Gen,
    Aw,
    Byod,
}

impl fmt::Display for SaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaleKind::Gen => "GEN",
            SaleKind::Aw => "AW",
            SaleKind::Byod => "BYOD",
        };
        f.write_str(label)
    }
}

/// Per-user sale counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesTally {
    #[serde(default)]
    pub gen: u32,
    #[serde(default)]
    pub aw: u32,
    #[serde(default)]
    pub byod: u32,
}

impl SalesTally {
    pub fn total(&self) -> u32 {
        self.gen + self.aw + self.byod
    }

    pub fn increment(&mut self, kind: SaleKind) {
        match kind {
            SaleKind::Gen => self.gen += 1,
            SaleKind::Aw => self.aw += 1,
            SaleKind::Byod => self.byod += 1,
        }
    }
}
