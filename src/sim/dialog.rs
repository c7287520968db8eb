//! Conversation state machine
//!
//! Idle -> Presenting (one line at a time) -> Choosing (if any choices) -> Idle.
//! Only one NPC can hold the dialog at a time. Transitions return events for
//! the presentation layer; nothing here draws.

use serde::{Deserialize, Serialize};

/// What picking a choice does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceEffect {
    AcceptQuest,
    Decline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub effect: ChoiceEffect,
}

impl Choice {
    pub fn accept_quest() -> Self {
        Self {
            label: "Accept Quest".into(),
            effect: ChoiceEffect::AcceptQuest,
        }
    }

    pub fn decline() -> Self {
        Self {
            label: "Decline".into(),
            effect: ChoiceEffect::Decline,
        }
    }
}

/// Declarative instructions for whoever renders the dialog box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogEvent {
    ShowLine { speaker: String, text: String },
    ShowChoices { labels: Vec<String> },
    Close,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DialogState {
    #[default]
    Idle,
    Presenting {
        npc: usize,
        speaker: String,
        lines: Vec<String>,
        /// Index of the line currently shown
        cursor: usize,
        choices: Vec<Choice>,
    },
    Choosing {
        npc: usize,
        choices: Vec<Choice>,
    },
}

/// The global dialog lock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dialog {
    state: DialogState,
}

impl Dialog {
    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, DialogState::Idle)
    }

    /// NPC index holding the lock
    pub fn active_npc(&self) -> Option<usize> {
        match self.state {
            DialogState::Idle => None,
            DialogState::Presenting { npc, .. } | DialogState::Choosing { npc, .. } => Some(npc),
        }
    }

    /// Try to open a conversation. Refused while another is active or when
    /// there is nothing to say.
    pub fn start(
        &mut self,
        npc: usize,
        speaker: &str,
        lines: &[String],
        choices: Vec<Choice>,
    ) -> Option<DialogEvent> {
        if self.is_active() || lines.is_empty() {
            return None;
        }

        let first = lines[0].clone();
        self.state = DialogState::Presenting {
            npc,
            speaker: speaker.to_string(),
            lines: lines.to_vec(),
            cursor: 0,
            choices,
        };
        Some(DialogEvent::ShowLine {
            speaker: speaker.to_string(),
            text: first,
        })
    }

    /// Move to the next line, then to choices, then close
    ///
    /// Returns the event and, on close, the NPC that was released.
    pub fn advance(&mut self) -> Option<(DialogEvent, Option<usize>)> {
        let DialogState::Presenting {
            npc,
            speaker,
            lines,
            cursor,
            choices,
        } = &mut self.state
        else {
            return None;
        };

        if *cursor + 1 < lines.len() {
            *cursor += 1;
            let event = DialogEvent::ShowLine {
                speaker: speaker.clone(),
                text: lines[*cursor].clone(),
            };
            return Some((event, None));
        }

        let npc = *npc;
        if choices.is_empty() {
            self.state = DialogState::Idle;
            return Some((DialogEvent::Close, Some(npc)));
        }

        let choices = std::mem::take(choices);
        let labels = choices.iter().map(|c| c.label.clone()).collect();
        self.state = DialogState::Choosing { npc, choices };
        Some((DialogEvent::ShowChoices { labels }, None))
    }

    /// Pick a choice while Choosing. Returns (npc, effect); the dialog closes.
    pub fn choose(&mut self, index: usize) -> Option<(usize, ChoiceEffect)> {
        let DialogState::Choosing { npc, choices } = &self.state else {
            return None;
        };
        let effect = choices.get(index)?.effect;
        let npc = *npc;
        self.state = DialogState::Idle;
        Some((npc, effect))
    }

    /// Drop whatever is open. Returns the NPC that held the lock.
    pub fn close(&mut self) -> Option<usize> {
        let npc = self.active_npc();
        self.state = DialogState::Idle;
        npc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lines_then_close() {
        let mut dialog = Dialog::default();
        let event = dialog.start(0, "Mpho", &lines(&["a", "b"]), vec![]).unwrap();
        assert_eq!(
            event,
            DialogEvent::ShowLine {
                speaker: "Mpho".into(),
                text: "a".into()
            }
        );
        assert_eq!(dialog.active_npc(), Some(0));

        let (event, released) = dialog.advance().unwrap();
        assert!(matches!(event, DialogEvent::ShowLine { ref text, .. } if text == "b"));
        assert_eq!(released, None);

        let (event, released) = dialog.advance().unwrap();
        assert_eq!(event, DialogEvent::Close);
        assert_eq!(released, Some(0));
        assert!(!dialog.is_active());
        assert!(dialog.advance().is_none());
    }

    #[test]
    fn test_lines_then_choices() {
        let mut dialog = Dialog::default();
        dialog
            .start(2, "Thabo", &lines(&["hi"]), vec![Choice::accept_quest(), Choice::decline()])
            .unwrap();

        // Can't choose while still presenting
        assert!(dialog.choose(0).is_none());

        let (event, _) = dialog.advance().unwrap();
        assert_eq!(
            event,
            DialogEvent::ShowChoices {
                labels: vec!["Accept Quest".into(), "Decline".into()]
            }
        );
        assert!(matches!(dialog.state(), DialogState::Choosing { npc: 2, .. }));

        // Out of range is ignored and keeps the lock
        assert!(dialog.choose(5).is_none());
        assert!(dialog.is_active());

        assert_eq!(dialog.choose(0), Some((2, ChoiceEffect::AcceptQuest)));
        assert!(!dialog.is_active());
    }

    #[test]
    fn test_lock_refuses_second_npc() {
        let mut dialog = Dialog::default();
        dialog.start(0, "A", &lines(&["one"]), vec![]).unwrap();
        assert!(dialog.start(1, "B", &lines(&["two"]), vec![]).is_none());
        assert_eq!(dialog.active_npc(), Some(0));
    }

    #[test]
    fn test_empty_lines_do_not_open() {
        let mut dialog = Dialog::default();
        assert!(dialog.start(0, "A", &[], vec![Choice::decline()]).is_none());
        assert!(!dialog.is_active());
    }

    #[test]
    fn test_forced_close() {
        let mut dialog = Dialog::default();
        dialog.start(3, "A", &lines(&["x"]), vec![Choice::decline()]).unwrap();
        dialog.advance();
        assert_eq!(dialog.close(), Some(3));
        assert_eq!(dialog.close(), None);
    }
}
