//! NPC feed loader
//!
//! NPCs and their quests come from a JSON array so writers can change the
//! story without recompiling. Validation happens here; the simulation assumes
//! every record it receives is well-formed.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::GameError;

/// Feed bundled with the binary
pub const BUNDLED_NPCS: &str = include_str!("../data/npcs.json");

/// One NPC as written in the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dialog: Vec<String>,
    #[serde(default)]
    pub quest: Option<QuestRecord>,
    #[serde(default)]
    pub post_quest_dialog: Vec<String>,
    /// Starts invisible until an unlock reveals it
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub wander: bool,
}

/// Quest as written in the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRecord {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Option<QuestParams>,
    /// Older records keep `item`/`amount` beside `type`
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub amount: Option<u32>,
    #[serde(default)]
    pub puzzle_id: Option<String>,
    #[serde(default)]
    pub reward_score: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestParams {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub amount: Option<u32>,
}

impl QuestRecord {
    /// Item id, preferring `params`
    pub fn item(&self) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.item.as_deref())
            .or(self.item.as_deref())
    }

    /// Amount, preferring `params`
    pub fn amount(&self) -> Option<u32> {
        self.params.as_ref().and_then(|p| p.amount).or(self.amount)
    }
}

/// Parse and validate a feed
pub fn parse_npcs(json: &str) -> Result<Vec<NpcRecord>, GameError> {
    let records: Vec<NpcRecord> = serde_json::from_str(json)?;
    validate(&records)?;
    Ok(records)
}

/// Load and validate a feed file
pub fn load_npcs_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<NpcRecord>, GameError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let records = parse_npcs(&contents)?;
    log::info!("Loaded {} NPCs from {}", records.len(), path.display());
    Ok(records)
}

fn validate(records: &[NpcRecord]) -> Result<(), GameError> {
    if records.is_empty() {
        return Err(GameError::EmptyFeed);
    }

    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(GameError::DuplicateNpc(record.id.clone()));
        }
        if record.id.trim().is_empty() || record.name.trim().is_empty() {
            return Err(GameError::InvalidRecord {
                id: record.id.clone(),
                reason: "missing id or name".into(),
            });
        }
        if record.dialog.is_empty() && record.quest.is_none() {
            return Err(GameError::InvalidRecord {
                id: record.id.clone(),
                reason: "no dialog and no quest".into(),
            });
        }
    }
    Ok(())
}
