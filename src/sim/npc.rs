//! NPCs, quests and the unlock table

use std::cell::Cell;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::state::Player;
use crate::consts::*;
use crate::npc_data::{NpcRecord, QuestRecord};

/// What a quest asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestKind {
    /// Hold at least `amount` of `item`
    Collect { item: String, amount: u32 },
    /// Have solved `puzzle_id`
    SolvePuzzle { puzzle_id: String },
    /// Type tag or parameters we cannot evaluate; never completes
    Unrecognized { tag: String },
}

impl QuestKind {
    fn from_record(record: &QuestRecord) -> Self {
        match record.kind.as_str() {
            "collect" => match (record.item(), record.amount()) {
                (Some(item), Some(amount)) => QuestKind::Collect {
                    item: item.to_string(),
                    amount,
                },
                _ => QuestKind::Unrecognized {
                    tag: "collect (missing item/amount)".into(),
                },
            },
            "solvePuzzle" => match &record.puzzle_id {
                Some(puzzle_id) => QuestKind::SolvePuzzle {
                    puzzle_id: puzzle_id.clone(),
                },
                None => QuestKind::Unrecognized {
                    tag: "solvePuzzle (missing puzzleId)".into(),
                },
            },
            other => QuestKind::Unrecognized { tag: other.to_string() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub description: String,
    pub kind: QuestKind,
    pub reward_score: u64,
    pub active: bool,
    pub completed: bool,
    /// Set once the unrecognized-kind warning has been logged
    #[serde(skip)]
    warned: Cell<bool>,
}

impl Quest {
    pub fn new(id: impl Into<String>, description: impl Into<String>, kind: QuestKind) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind,
            reward_score: 0,
            active: false,
            completed: false,
            warned: Cell::new(false),
        }
    }

    pub fn from_record(record: &QuestRecord) -> Self {
        let mut quest = Self::new(
            record.id.clone(),
            record.description.clone(),
            QuestKind::from_record(record),
        );
        quest.reward_score = record.reward_score;
        quest
    }

    /// Whether the player currently satisfies this quest
    pub fn check(&self, player: &Player) -> bool {
        match &self.kind {
            QuestKind::Collect { item, amount } => player.count(item) >= *amount,
            QuestKind::SolvePuzzle { puzzle_id } => player.solved_puzzles.contains(puzzle_id),
            QuestKind::Unrecognized { tag } => {
                if !self.warned.replace(true) {
                    log::warn!(
                        "Quest {} has unrecognized kind '{}', it can never complete",
                        self.id,
                        tag
                    );
                }
                false
            }
        }
    }

    /// Quest log suffix, e.g. " (2/3)"
    pub fn progress_text(&self, player: &Player) -> String {
        match &self.kind {
            QuestKind::Collect { item, amount } => {
                format!(" ({}/{})", player.count(item).min(*amount), amount)
            }
            _ => String::new(),
        }
    }
}

/// Slow drift for wandering NPCs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Wander {
    /// Radians
    pub heading: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub pos: Vec2,
    pub dialog: Vec<String>,
    pub post_quest_dialog: Vec<String>,
    pub quest: Option<Quest>,
    pub completed_quests: Vec<String>,
    /// Currently holding the dialog
    pub talking: bool,
    /// Engaged since the player last left range
    pub has_talked: bool,
    pub visible: bool,
    /// Session frame of the last engagement
    pub last_talk_tick: Option<u64>,
    pub wander: Option<Wander>,
}

impl Npc {
    pub fn from_record(record: &NpcRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            pos: Vec2::ZERO,
            dialog: record.dialog.clone(),
            post_quest_dialog: record.post_quest_dialog.clone(),
            quest: record.quest.as_ref().map(Quest::from_record),
            completed_quests: Vec::new(),
            talking: false,
            has_talked: false,
            visible: !record.hidden,
            last_talk_tick: None,
            wander: record.wander.then_some(Wander {
                heading: 0.0,
                speed: NPC_WANDER_SPEED,
            }),
        }
    }

    pub fn size() -> Vec2 {
        Vec2::new(NPC_WIDTH, NPC_HEIGHT)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, Self::size())
    }

    /// Centre-to-centre distance within talk range
    pub fn is_player_nearby(&self, player: &Player) -> bool {
        let d = player.rect().center() - self.rect().center();
        d.length_squared() <= NPC_TALK_RANGE * NPC_TALK_RANGE
    }

    /// Lethal zone, far smaller than the sprite
    pub fn danger_zone(&self) -> Rect {
        Rect::centered(self.rect().center(), NPC_DANGER_SIZE)
    }

    pub fn has_completed(&self, quest_id: &str) -> bool {
        self.completed_quests.iter().any(|q| q == quest_id)
    }

    /// Lines to present on engagement
    pub fn lines_for_engagement(&self) -> &[String] {
        let done = self
            .quest
            .as_ref()
            .is_some_and(|q| self.has_completed(&q.id));
        if done && !self.post_quest_dialog.is_empty() {
            &self.post_quest_dialog
        } else {
            &self.dialog
        }
    }

    /// Quest that can still be offered
    pub fn offerable_quest(&self) -> Option<&Quest> {
        self.quest
            .as_ref()
            .filter(|q| !q.active && !self.has_completed(&q.id))
    }

    /// Mark the quest completed if its predicate now holds. Returns the quest.
    pub fn check_quest_completion(&mut self, player: &Player) -> Option<&Quest> {
        let quest = self.quest.as_mut()?;
        if !quest.active || self.completed_quests.iter().any(|q| *q == quest.id) {
            return None;
        }
        if !quest.check(player) {
            return None;
        }

        quest.active = false;
        quest.completed = true;
        self.completed_quests.push(quest.id.clone());
        self.quest.as_ref()
    }
}

/// World features that quests can switch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    LighthouseBell,
}

/// Side effect of completing a specific quest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unlock {
    RevealNpc(&'static str),
    EnableFeature(Feature),
}

/// Quest id -> unlock
pub const UNLOCK_CHAINS: &[(&str, Unlock)] = &[
    ("thabo_clues", Unlock::RevealNpc("nandi")),
    ("nandi_fragments", Unlock::EnableFeature(Feature::LighthouseBell)),
];

pub fn unlocks_for(quest_id: &str) -> impl Iterator<Item = Unlock> + '_ {
    UNLOCK_CHAINS
        .iter()
        .filter(move |(id, _)| *id == quest_id)
        .map(|(_, unlock)| *unlock)
}
