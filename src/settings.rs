//! Game settings
//!
//! Persisted separately from upgrades in the key/value store. Anything not
//! listed here is a compile-time constant in `consts`.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::KeyValueStore;

/// World size and population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub h_roads: u32,
    pub v_roads: u32,
    pub buildings: usize,
    pub trees: usize,
    pub coins: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            h_roads: H_ROADS,
            v_roads: V_ROADS,
            buildings: BUILDING_COUNT,
            trees: TREE_COUNT,
            coins: COIN_COUNT,
        }
    }
}

/// What a crash does to a rider who has been leaning on the speed boost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum StressPolicy {
    /// Stress is tracked but never consulted
    #[default]
    Disabled,
    /// Above `threshold`, a crash ignores the helmet, burns the speed boost
    /// and ends the session
    Reckless { threshold: f32 },
}

impl StressPolicy {
    pub fn reckless() -> Self {
        StressPolicy::Reckless {
            threshold: STRESS_THRESHOLD,
        }
    }

    /// Whether a crash at this stress level is fatal regardless of the helmet
    pub fn is_reckless(&self, speed_boost: bool, stress: f32) -> bool {
        match *self {
            StressPolicy::Disabled => false,
            StressPolicy::Reckless { threshold } => speed_boost && stress > threshold,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub world: WorldConfig,
    pub stress_policy: StressPolicy,
    /// Fixed session seed (None = fresh seed per game)
    pub seed: Option<u64>,
}

impl Settings {
    /// Store key
    const STORAGE_KEY: &'static str = "motorcycleSettings";

    /// Load settings, falling back to defaults on missing or corrupt data
    pub fn load(store: &impl KeyValueStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from store");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {e}"),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), crate::GameError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
