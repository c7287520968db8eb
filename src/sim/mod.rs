//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-factor timestep supplied by the caller
//! - Seeded RNG only
//! - Stable iteration order (feed order for NPCs, generation order for the world)
//! - No rendering or platform dependencies

pub mod collision;
pub mod dialog;
pub mod interact;
pub mod npc;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod world;

pub use collision::{Circle, Rect, circle_rect_overlap, is_on_road, rect_overlap};
pub use dialog::{Choice, ChoiceEffect, Dialog, DialogEvent, DialogState};
pub use interact::{LIGHTHOUSE_BELL_PUZZLE, QuestLogEntry};
pub use npc::{Feature, Npc, Quest, QuestKind, Unlock, unlocks_for};
pub use snapshot::FrameSnapshot;
pub use state::{
    Camera, CrashCause, EndCause, GameEvent, Particle, Player, Session, SessionPhase,
};
pub use tick::{Direction, MoveIntent, TickInput, tick};
pub use world::{Building, BuildingSprite, Coin, QuestItem, Tree, World};
