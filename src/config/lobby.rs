//! Table creation limits

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Limits checked locally before a create-table request is sent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLimits {
    pub min_players: u32,
    pub max_players: u32,
    /// Longest accepted table name, in characters
    pub max_name_length: usize,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 6,
            max_name_length: 64,
        }
    }
}

impl TableLimits {
    pub fn validate(&self) -> Result<()> {
        if self.min_players < 2 {
            return Err(anyhow!("Tables need at least 2 players"));
        }
        if self.max_players < self.min_players {
            return Err(anyhow!(
                "Max players ({}) cannot be lower than min players ({})",
                self.max_players,
                self.min_players
            ));
        }
        if self.max_name_length == 0 {
            return Err(anyhow!("Max table name length must be greater than 0"));
        }
        Ok(())
    }
}
