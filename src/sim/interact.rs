//! NPC engagement, quest progression and unlocks
//!
//! Glue between the dialog lock, NPC quests and the session: starting a
//! conversation, applying choices, completing quests and running the
//! unlock table.

use serde::{Deserialize, Serialize};

use super::dialog::{Choice, ChoiceEffect, DialogEvent};
use super::npc::{Feature, Unlock, unlocks_for};
use super::state::{GameEvent, Session};

/// Puzzle solved by ringing the bell
pub const LIGHTHOUSE_BELL_PUZZLE: &str = "lighthouse_bell";

/// One quest log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLogEntry {
    pub npc_name: String,
    pub description: String,
    /// e.g. " (2/3)" for collect quests
    pub progress: String,
    pub completed: bool,
}

impl Session {
    /// Open a conversation with NPC `index`. Returns false if the lock is held
    /// or the NPC has nothing to say.
    pub fn engage(&mut self, index: usize) -> bool {
        let npc = &self.npcs[index];
        let choices = if npc.offerable_quest().is_some() {
            vec![Choice::accept_quest(), Choice::decline()]
        } else {
            Vec::new()
        };
        let name = npc.name.clone();
        let lines = npc.lines_for_engagement().to_vec();

        let Some(event) = self.dialog.start(index, &name, &lines, choices) else {
            return false;
        };

        let tick = self.time_ticks;
        let npc = &mut self.npcs[index];
        npc.talking = true;
        npc.has_talked = true;
        npc.last_talk_tick = Some(tick);
        log::debug!("Dialog opened with {}", npc.id);

        self.emit(GameEvent::Dialog(event));
        true
    }

    /// Show the next line, the choices, or close
    pub fn advance_dialog(&mut self) {
        let Some((event, released)) = self.dialog.advance() else {
            return;
        };
        if let Some(index) = released {
            self.npcs[index].talking = false;
        }
        self.emit(GameEvent::Dialog(event));
    }

    /// Apply choice `index` of the open choice list
    pub fn choose(&mut self, index: usize) {
        let Some((npc_index, effect)) = self.dialog.choose(index) else {
            return;
        };
        self.npcs[npc_index].talking = false;
        self.emit(GameEvent::Dialog(DialogEvent::Close));

        match effect {
            ChoiceEffect::AcceptQuest => {
                let npc = &mut self.npcs[npc_index];
                let Some(quest) = npc.quest.as_mut() else {
                    return;
                };
                quest.active = true;
                let accepted = GameEvent::QuestAccepted {
                    npc_id: npc.id.clone(),
                    quest_id: quest.id.clone(),
                };
                let text = format!("Quest accepted: {}", quest.description);
                log::info!("Quest {} accepted", quest.id);
                self.emit(accepted);
                self.message(text);
            }
            ChoiceEffect::Decline => self.message("Maybe next time!"),
        }
    }

    /// Forced close, e.g. when the player drives away
    pub(crate) fn close_dialog(&mut self) {
        if let Some(index) = self.dialog.close() {
            self.npcs[index].talking = false;
            self.emit(GameEvent::Dialog(DialogEvent::Close));
        }
    }

    /// Mark quests whose predicate now holds, award score and run unlocks
    pub(crate) fn complete_quests(&mut self) {
        for index in 0..self.npcs.len() {
            let npc = &mut self.npcs[index];
            let Some(quest) = npc.check_quest_completion(&self.player) else {
                continue;
            };
            let quest_id = quest.id.clone();
            let reward = quest.reward_score;
            let text = format!("🎉 Quest \"{}\" completed! +{} score", quest.description, reward);
            let npc_id = npc.id.clone();

            self.score += reward;
            log::info!("Quest {quest_id} completed for {npc_id}, +{reward}");
            self.emit(GameEvent::QuestCompleted {
                npc_id,
                quest_id: quest_id.clone(),
                reward,
            });
            self.message(text);

            for unlock in unlocks_for(&quest_id) {
                self.apply_unlock(unlock);
            }
        }
    }

    fn apply_unlock(&mut self, unlock: Unlock) {
        match unlock {
            Unlock::RevealNpc(id) => {
                let Some(index) = self.npc_index(id) else {
                    log::warn!("Unlock refers to unknown NPC {id}");
                    return;
                };
                if self.npcs[index].visible {
                    return;
                }
                self.npcs[index].visible = true;
                let name = self.npcs[index].name.clone();
                self.emit(GameEvent::NpcRevealed {
                    npc_id: id.to_string(),
                });
                self.message(format!("👀 {name} has appeared!"));
            }
            Unlock::EnableFeature(feature) => {
                if !self.features.enabled.insert(feature) {
                    return;
                }
                self.emit(GameEvent::FeatureEnabled(feature));
                match feature {
                    Feature::LighthouseBell => self.message("🔔 Go ring the lighthouse bell!"),
                }
            }
        }
    }

    /// Record a solved puzzle. Returns false if it was already solved.
    pub fn solve_puzzle(&mut self, puzzle_id: &str) -> bool {
        if !self.is_running() {
            return false;
        }
        let fresh = self.player.solved_puzzles.insert(puzzle_id.to_string());
        if fresh {
            log::info!("Puzzle {puzzle_id} solved");
        }
        fresh
    }

    /// Ring the lighthouse bell; only does anything once the feature is on
    pub fn ring_lighthouse_bell(&mut self) -> bool {
        if !self.features.is_enabled(Feature::LighthouseBell) {
            self.message("The bell is silent.");
            return false;
        }
        self.solve_puzzle(LIGHTHOUSE_BELL_PUZZLE)
    }

    /// Active quests first, then completed ones
    pub fn quest_log(&self) -> Vec<QuestLogEntry> {
        let mut active = Vec::new();
        let mut done = Vec::new();
        for npc in &self.npcs {
            let Some(quest) = &npc.quest else { continue };
            if npc.has_completed(&quest.id) {
                done.push(QuestLogEntry {
                    npc_name: npc.name.clone(),
                    description: quest.description.clone(),
                    progress: String::new(),
                    completed: true,
                });
            } else if quest.active {
                active.push(QuestLogEntry {
                    npc_name: npc.name.clone(),
                    description: quest.description.clone(),
                    progress: quest.progress_text(&self.player),
                    completed: false,
                });
            }
        }
        active.extend(done);
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::tests::test_session;

    fn open_choices(session: &mut Session, id: &str) -> usize {
        let index = session.npc_index(id).unwrap();
        assert!(session.engage(index));
        let lines = session.npcs[index].dialog.len();
        for _ in 0..lines {
            session.advance_dialog();
        }
        index
    }

    #[test]
    fn test_accept_quest() {
        let mut session = test_session(7);
        let index = open_choices(&mut session, "thabo");
        session.choose(0);

        let quest = session.npcs[index].quest.as_ref().unwrap();
        assert!(quest.active);
        assert!(!session.dialog.is_active());
        assert!(!session.npcs[index].talking);

        let events = session.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::QuestAccepted { quest_id, .. } if quest_id == "thabo_clues"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Message { text, .. } if text.starts_with("Quest accepted: ")
        )));

        let log = session.quest_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].progress, " (0/3)");
    }

    #[test]
    fn test_decline_quest() {
        let mut session = test_session(7);
        let index = open_choices(&mut session, "thabo");
        session.choose(1);

        assert!(!session.npcs[index].quest.as_ref().unwrap().active);
        assert!(session.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::Message { text, .. } if text == "Maybe next time!"
        )));
    }

    #[test]
    fn test_unlock_chain_reveals_and_enables() {
        let mut session = test_session(7);
        let thabo = session.npc_index("thabo").unwrap();
        let nandi = session.npc_index("nandi").unwrap();
        session.npcs[thabo].quest.as_mut().unwrap().active = true;
        session.npcs[nandi].quest.as_mut().unwrap().active = true;
        session.player.add_item("clue", 3);

        session.complete_quests();
        assert!(session.npcs[nandi].visible);
        assert_eq!(session.score, 50);
        assert!(!session.features.is_enabled(Feature::LighthouseBell));

        // Bell does nothing yet
        assert!(!session.ring_lighthouse_bell());

        session.player.add_item("fragment", 4);
        session.complete_quests();
        assert!(session.features.is_enabled(Feature::LighthouseBell));
        assert_eq!(session.score, 130);

        // Keeper's puzzle quest now completes
        let keeper = session.npc_index("keeper").unwrap();
        session.npcs[keeper].quest.as_mut().unwrap().active = true;
        assert!(session.ring_lighthouse_bell());
        session.complete_quests();
        assert!(session.npcs[keeper].has_completed("lighthouse_bell"));
        assert_eq!(session.score, 250);

        // Completed once, never again
        session.complete_quests();
        assert_eq!(session.score, 250);
    }

    #[test]
    fn test_post_quest_dialog_offers_no_choices() {
        let mut session = test_session(7);
        let thabo = session.npc_index("thabo").unwrap();
        session.npcs[thabo].quest.as_mut().unwrap().active = true;
        session.player.add_item("clue", 3);
        session.complete_quests();
        session.drain_events();

        assert!(session.engage(thabo));
        let post = session.npcs[thabo].post_quest_dialog.clone();
        for _ in 0..post.len() {
            session.advance_dialog();
        }
        assert!(!session.dialog.is_active());
        let log = session.quest_log();
        assert!(log.iter().any(|e| e.completed));
    }
}
