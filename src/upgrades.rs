//! Upgrade flags
//!
//! A closed set of boolean upgrades plus the off-road wear counter. The
//! simulation mutates an in-memory copy; every change is reported as an
//! event so the host can persist it.

use serde::{Deserialize, Serialize};

use crate::GameError;
use crate::persistence::KeyValueStore;

/// Purchasable upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Upgrade {
    Helmet,
    SpeedBoost,
    OffRoadTreads,
    MetalDetector,
}

impl Upgrade {
    pub const ALL: [Upgrade; 4] = [
        Upgrade::Helmet,
        Upgrade::SpeedBoost,
        Upgrade::OffRoadTreads,
        Upgrade::MetalDetector,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Upgrade::Helmet => "Helmet",
            Upgrade::SpeedBoost => "Speed Boost",
            Upgrade::OffRoadTreads => "Off-Road Treads",
            Upgrade::MetalDetector => "Metal Detector",
        }
    }

    /// HUD line shown while owned
    pub fn hud_label(&self) -> &'static str {
        match self {
            Upgrade::Helmet => "🪖 Helmet",
            Upgrade::SpeedBoost => "⚡ Speed Boost",
            Upgrade::OffRoadTreads => "🛞 Off-Road Treads",
            Upgrade::MetalDetector => "🧲 Metal Detector",
        }
    }

    /// Price in sats
    pub fn price(&self) -> u64 {
        match self {
            Upgrade::Helmet | Upgrade::SpeedBoost => 50,
            Upgrade::OffRoadTreads | Upgrade::MetalDetector => 75,
        }
    }

    /// Lost when a session ends
    pub fn is_session_bound(&self) -> bool {
        matches!(self, Upgrade::SpeedBoost | Upgrade::MetalDetector)
    }
}

/// Owned upgrades and wear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Upgrades {
    pub helmet: bool,
    pub speed_boost: bool,
    pub off_road_treads: bool,
    pub metal_detector: bool,
    /// Frames spent off-road on the current set of treads
    pub offroad_wear: f32,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            helmet: true,
            speed_boost: false,
            off_road_treads: false,
            metal_detector: false,
            offroad_wear: 0.0,
        }
    }
}

impl Upgrades {
    /// Store key
    const STORAGE_KEY: &'static str = "motorcycleUpgrades";

    pub fn owns(&self, upgrade: Upgrade) -> bool {
        match upgrade {
            Upgrade::Helmet => self.helmet,
            Upgrade::SpeedBoost => self.speed_boost,
            Upgrade::OffRoadTreads => self.off_road_treads,
            Upgrade::MetalDetector => self.metal_detector,
        }
    }

    /// Set a flag, returning true if it changed
    pub fn set(&mut self, upgrade: Upgrade, owned: bool) -> bool {
        let slot = match upgrade {
            Upgrade::Helmet => &mut self.helmet,
            Upgrade::SpeedBoost => &mut self.speed_boost,
            Upgrade::OffRoadTreads => &mut self.off_road_treads,
            Upgrade::MetalDetector => &mut self.metal_detector,
        };
        let changed = *slot != owned;
        *slot = owned;
        changed
    }

    /// Owned upgrades in display order
    pub fn owned(&self) -> impl Iterator<Item = Upgrade> + '_ {
        Upgrade::ALL.into_iter().filter(|u| self.owns(*u))
    }

    /// Load from the store; stored keys override defaults
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Some(json) => match serde_json::from_str(&json) {
                Ok(upgrades) => upgrades,
                Err(e) => {
                    log::warn!("Ignoring corrupt upgrade data: {e}");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), GameError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults() {
        let upgrades = Upgrades::default();
        assert!(upgrades.owns(Upgrade::Helmet));
        assert!(!upgrades.owns(Upgrade::SpeedBoost));
        assert_eq!(upgrades.owned().collect::<Vec<_>>(), vec![Upgrade::Helmet]);
    }

    #[test]
    fn test_set_reports_change() {
        let mut upgrades = Upgrades::default();
        assert!(upgrades.set(Upgrade::OffRoadTreads, true));
        assert!(!upgrades.set(Upgrade::OffRoadTreads, true));
        assert!(upgrades.set(Upgrade::Helmet, false));
        assert!(!upgrades.owns(Upgrade::Helmet));
    }

    #[test]
    fn test_load_merges_onto_defaults() {
        let mut store = MemoryStore::default();
        assert_eq!(Upgrades::load(&store), Upgrades::default());

        store
            .set("motorcycleUpgrades", r#"{"speedBoost":true,"helmet":false}"#)
            .unwrap();
        let loaded = Upgrades::load(&store);
        assert!(loaded.speed_boost);
        assert!(!loaded.helmet);
        assert!(!loaded.metal_detector);

        store.set("motorcycleUpgrades", "not json").unwrap();
        assert_eq!(Upgrades::load(&store), Upgrades::default());
    }

    #[test]
    fn test_save_roundtrip() {
        let mut store = MemoryStore::default();
        let mut upgrades = Upgrades::default();
        upgrades.set(Upgrade::MetalDetector, true);
        upgrades.offroad_wear = 12.5;
        upgrades.save(&mut store).unwrap();
        assert_eq!(Upgrades::load(&store), upgrades);
    }

    #[test]
    fn test_prices() {
        assert_eq!(Upgrade::Helmet.price(), 50);
        assert_eq!(Upgrade::OffRoadTreads.price(), 75);
        assert!(Upgrade::SpeedBoost.is_session_bound());
        assert!(!Upgrade::Helmet.is_session_bound());
    }
}
