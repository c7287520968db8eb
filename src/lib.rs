//! Lighthouse Rider - A top-down motorcycle arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world generation, collisions, quests, frame tick)
//! - `npc_data`: NPC/quest feed loading and validation
//! - `upgrades`: Upgrade flags, wear and prices
//! - `persistence`: Key/value storage for upgrades and settings
//! - `platform`: Host collaborators (messages, payments)
//! - `game`: Host-side driver tying a session to its collaborators

pub mod error;
pub mod game;
pub mod npc_data;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod upgrades;

pub use error::GameError;
pub use game::{Game, PendingPurchase};
pub use settings::{Settings, StressPolicy, WorldConfig};
pub use upgrades::{Upgrade, Upgrades};

/// Game configuration constants
pub mod consts {
    /// One display frame at 60 Hz, in milliseconds
    pub const FRAME_MS: f32 = 16.666;
    /// Largest frame factor a single tick may advance (prevents tunnelling after stalls)
    pub const MAX_FRAME_FACTOR: f32 = 3.0;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 3000.0;
    pub const WORLD_HEIGHT: f32 = 3000.0;

    /// Roads
    pub const ROAD_THICKNESS: f32 = 100.0;
    pub const ROAD_BUFFER: f32 = 10.0;
    pub const H_ROADS: u32 = 4;
    pub const V_ROADS: u32 = 5;
    /// Random road offset is drawn from [ROAD_JITTER_MIN, ROAD_JITTER_MIN + ROAD_JITTER_SPAN)
    pub const ROAD_JITTER_MIN: f32 = -10.0;
    pub const ROAD_JITTER_SPAN: f32 = 100.0;

    /// Default entity counts
    pub const BUILDING_COUNT: usize = 50;
    pub const TREE_COUNT: usize = 70;
    pub const COIN_COUNT: usize = 15;

    /// Placement attempt budgets (multiplied by requested count)
    pub const BUILDING_ATTEMPTS_PER: usize = 30;
    pub const TREE_ATTEMPTS_PER: usize = 20;
    pub const COIN_ATTEMPTS_PER: usize = 500;
    pub const ITEM_ATTEMPTS_PER: usize = 500;

    /// Trees: sprite is 2*size square, circles are fractions of size
    pub const TREE_MIN_SIZE: f32 = 30.0;
    pub const TREE_SIZE_SPAN: f32 = 30.0;
    /// Crash circle (forgiving, much smaller than the sprite)
    pub const TREE_HAZARD_FACTOR: f32 = 0.3;
    /// Placement circle used when keeping pickups and actors away from trees
    pub const TREE_PLACEMENT_FACTOR: f32 = 0.8;

    /// Coins and quest items
    pub const COIN_SIZE: f32 = 5.0;
    pub const COIN_CLEARANCE: f32 = 2.0;
    pub const ITEM_SIZE: f32 = 20.0;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 60.0;
    pub const PLAYER_HEIGHT: f32 = 55.0;
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const SPEED_BOOST_BONUS: f32 = 3.0;
    pub const OFFROAD_SPEED_FACTOR: f32 = 0.5;
    pub const HITBOX_SHRINK_X: f32 = 10.0;
    pub const HITBOX_SHRINK_Y: f32 = 14.0;

    /// Timers (frames at 60 Hz)
    pub const INVULNERABLE_DURATION: f32 = 80.0;
    pub const START_INVULNERABILITY: f32 = 20.0;
    pub const FLASH_DURATION: f32 = 150.0;
    pub const OFFROAD_MAX: f32 = 1200.0;
    pub const STRESS_THRESHOLD: f32 = 60.0;

    /// Camera smoothing per frame
    pub const CAMERA_LERP: f32 = 0.1;

    /// NPCs
    pub const NPC_WIDTH: f32 = 40.0;
    pub const NPC_HEIGHT: f32 = 60.0;
    pub const NPC_TALK_RANGE: f32 = 80.0;
    pub const NPC_DANGER_SIZE: f32 = 14.0;
    pub const NPC_WANDER_SPEED: f32 = 0.6;
    pub const NPC_WANDER_TURN_CHANCE: f64 = 0.02;

    /// Safe spawn search
    pub const SPAWN_SIZE: f32 = 40.0;
    pub const SPAWN_PADDING: f32 = 15.0;
    pub const SPAWN_ATTEMPTS: usize = 5000;
    pub const SPAWN_FALLBACK_X: f32 = 50.0;
    pub const SPAWN_FALLBACK_Y: f32 = 300.0;

    /// Dust particles
    pub const MAX_DUST: usize = 80;

    /// Metal detector highlight radius
    pub const DETECTOR_RANGE: f32 = 250.0;

    /// Touch drag dead zone (pixels)
    pub const DRAG_DEADZONE: f32 = 15.0;

    /// Message durations (ms)
    pub const MESSAGE_MS: u32 = 5000;
}

/// Convert a frame duration in milliseconds to a clamped 60 Hz frame factor
#[inline]
pub fn frame_factor(elapsed_ms: f32) -> f32 {
    (elapsed_ms / consts::FRAME_MS).clamp(0.0, consts::MAX_FRAME_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_factor_clamped() {
        assert_eq!(frame_factor(consts::FRAME_MS), 1.0);
        assert_eq!(frame_factor(0.0), 0.0);
        assert_eq!(frame_factor(500.0), consts::MAX_FRAME_FACTOR);
    }
}
