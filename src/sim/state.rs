//! Session state and core simulation types
//!
//! A `Session` owns everything one game needs: the world, the player, NPCs,
//! the dialog lock, an in-memory copy of upgrades, and its own RNG. A new
//! game builds a new `Session`; nothing is shared between sessions.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::dialog::{Dialog, DialogEvent};
use super::npc::{Feature, Npc};
use super::world::World;
use crate::GameError;
use crate::consts::*;
use crate::npc_data::NpcRecord;
use crate::settings::{Settings, StressPolicy};
use crate::upgrades::{Upgrade, Upgrades};

/// The rider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
    /// Facing in degrees, 0 = up, clockwise
    pub facing: f32,
    /// Frames of crash immunity left
    pub invulnerable: f32,
    /// Collected counts keyed by item id (coins included as "coin")
    pub inventory: BTreeMap<String, u32>,
    pub solved_puzzles: BTreeSet<String>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            speed: PLAYER_SPEED,
            facing: 0.0,
            invulnerable: 0.0,
            inventory: BTreeMap::new(),
            solved_puzzles: BTreeSet::new(),
        }
    }

    /// Sprite bounding box (camera, culling, road test)
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Forgiving hitbox for hazards and pickups
    pub fn hitbox(&self) -> Rect {
        self.rect().shrink(HITBOX_SHRINK_X, HITBOX_SHRINK_Y)
    }

    pub fn can_crash(&self) -> bool {
        self.invulnerable <= 0.0
    }

    pub fn count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn add_item(&mut self, item: &str, amount: u32) {
        *self.inventory.entry(item.to_string()).or_insert(0) += amount;
    }
}

/// Smoothed follow camera (top-left of the viewport in world space)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec2,
}

impl Camera {
    /// Snap so `target` is centred, then clamp
    pub fn center_on(&mut self, target: Vec2, viewport: Vec2, world: Vec2) {
        self.pos = target - viewport * 0.5;
        self.clamp(viewport, world);
    }

    /// Exponential approach toward centring `target`
    pub fn follow(&mut self, target: Vec2, viewport: Vec2, world: Vec2, dt: f32) {
        let goal = target - viewport * 0.5;
        let t = 1.0 - (1.0 - CAMERA_LERP).powf(dt);
        self.pos += (goal - self.pos) * t;
        self.clamp(viewport, world);
    }

    pub fn clamp(&mut self, viewport: Vec2, world: Vec2) {
        self.pos = self.pos.clamp(Vec2::ZERO, (world - viewport).max(Vec2::ZERO));
    }

    pub fn is_visible(&self, rect: &Rect, viewport: Vec2) -> bool {
        rect.max().x > self.pos.x
            && rect.pos.x < self.pos.x + viewport.x
            && rect.max().y > self.pos.y
            && rect.pos.y < self.pos.y + viewport.y
    }
}

/// Dust kicked up off-road (visual only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Frames left
    pub life: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Running,
    /// Gameplay frozen; flash and dust still decay
    Ended,
}

/// What the rider hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    Building,
    Tree,
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    Crashed,
    HitPedestrian,
}

impl EndCause {
    pub fn reason(&self) -> &'static str {
        match self {
            EndCause::Crashed => "You crashed!",
            EndCause::HitPedestrian => "You hit a pedestrian!",
        }
    }
}

/// Everything the host needs to react to, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Transient message; sticky ones stay until dismissed
    Message { text: String, sticky: bool },
    Dialog(DialogEvent),
    /// A flag flipped; persist it
    UpgradeChanged { upgrade: Upgrade, owned: bool },
    Crashed { cause: CrashCause, survived: bool },
    QuestAccepted { npc_id: String, quest_id: String },
    QuestCompleted { npc_id: String, quest_id: String, reward: u64 },
    NpcRevealed { npc_id: String },
    FeatureEnabled(Feature),
    CoinCollected,
    ItemCollected { item_id: String },
    GameOver { cause: EndCause, score: u64 },
}

/// World features switched on by the unlock table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Features {
    pub enabled: BTreeSet<Feature>,
}

impl Features {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }
}

/// One game, from spawn to game over
#[derive(Debug, Clone)]
pub struct Session {
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub world: World,
    pub player: Player,
    pub npcs: Vec<Npc>,
    pub dialog: Dialog,
    pub upgrades: Upgrades,
    pub camera: Camera,
    pub viewport: Vec2,
    pub score: u64,
    pub phase: SessionPhase,
    /// Screen flash frames left
    pub flash: f32,
    pub speed_stress: f32,
    pub stress_policy: StressPolicy,
    pub dust: Vec<Particle>,
    pub features: Features,
    pub time_ticks: u64,
    events: Vec<GameEvent>,
}

impl Session {
    /// Build a fresh world and populate it
    ///
    /// Fails if the NPC feed is empty: a session never starts without NPCs.
    pub fn new(
        seed: u64,
        settings: &Settings,
        records: &[NpcRecord],
        upgrades: Upgrades,
        viewport: Vec2,
    ) -> Result<Self, GameError> {
        if records.is_empty() {
            return Err(GameError::EmptyFeed);
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = World::generate(&mut rng, &settings.world);

        // Actors spawn clear of each other, the player's default spot included
        let mut avoid = vec![Rect::new(
            SPAWN_FALLBACK_X,
            SPAWN_FALLBACK_Y,
            PLAYER_WIDTH,
            PLAYER_HEIGHT,
        )];
        let mut npcs = Vec::with_capacity(records.len());
        for record in records {
            let mut npc = Npc::from_record(record);
            npc.pos = world.find_safe_spawn(&mut rng, Npc::size(), &avoid);
            if let Some(wander) = npc.wander.as_mut() {
                wander.heading = rand::Rng::random::<f32>(&mut rng) * std::f32::consts::TAU;
            }
            avoid.push(npc.rect());
            npcs.push(npc);
        }

        for npc in &npcs {
            if let Some(quest) = &npc.quest
                && let super::npc::QuestKind::Collect { item, amount } = &quest.kind
            {
                world.spawn_quest_items(&mut rng, item, &quest.id, *amount as usize);
            }
        }

        let npc_rects: Vec<Rect> = npcs.iter().map(Npc::rect).collect();
        let spawn = world.find_safe_spawn(
            &mut rng,
            Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            &npc_rects,
        );
        let mut player = Player::new(spawn);
        player.invulnerable = START_INVULNERABILITY;

        let mut camera = Camera::default();
        camera.center_on(player.rect().center(), viewport, world.size);

        log::info!(
            "Session {seed} started: {} NPCs, {} quest items, player at ({:.0}, {:.0})",
            npcs.len(),
            world.items.len(),
            spawn.x,
            spawn.y
        );

        Ok(Self {
            seed,
            rng,
            world,
            player,
            npcs,
            dialog: Dialog::default(),
            upgrades,
            camera,
            viewport,
            score: 0,
            phase: SessionPhase::Running,
            flash: 0.0,
            speed_stress: 0.0,
            stress_policy: settings.stress_policy,
            dust: Vec::new(),
            features: Features::default(),
            time_ticks: 0,
            events: Vec::new(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Whether the host should schedule another frame
    pub fn wants_frames(&self) -> bool {
        self.is_running() || self.flash > 0.0
    }

    pub fn npc_index(&self, id: &str) -> Option<usize> {
        self.npcs.iter().position(|n| n.id == id)
    }

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn message(&mut self, text: impl Into<String>) {
        self.emit(GameEvent::Message {
            text: text.into(),
            sticky: false,
        });
    }

    /// Flip a flag on the in-memory copy and signal it if it changed
    pub fn set_upgrade(&mut self, upgrade: Upgrade, owned: bool) {
        if self.upgrades.set(upgrade, owned) {
            self.emit(GameEvent::UpgradeChanged { upgrade, owned });
        }
    }

    /// Apply crash consequences. Returns true if the session survives.
    pub fn handle_crash(&mut self, cause: CrashCause) -> bool {
        if self.upgrades.helmet {
            self.set_upgrade(Upgrade::Helmet, false);
            self.player.invulnerable = INVULNERABLE_DURATION;
            self.flash = FLASH_DURATION;
            self.emit(GameEvent::Crashed { cause, survived: true });
            self.message("🪖 Helmet destroyed!");
            return true;
        }

        let reckless = self
            .stress_policy
            .is_reckless(self.upgrades.speed_boost, self.speed_stress);
        if reckless {
            log::info!("Crash into {cause:?} at stress {:.0}: reckless", self.speed_stress);
            self.speed_stress = 0.0;
            self.set_upgrade(Upgrade::SpeedBoost, false);
            self.player.invulnerable = INVULNERABLE_DURATION;
            self.flash = FLASH_DURATION;
        }

        self.emit(GameEvent::Crashed { cause, survived: false });
        self.end_session(EndCause::Crashed);
        false
    }

    /// Freeze gameplay, revoke session-bound upgrades and report the score
    pub fn end_session(&mut self, cause: EndCause) {
        if !self.is_running() {
            return;
        }

        for upgrade in Upgrade::ALL {
            if upgrade.is_session_bound() {
                self.set_upgrade(upgrade, false);
            }
        }
        self.close_dialog();

        self.phase = SessionPhase::Ended;
        self.flash = FLASH_DURATION;

        log::info!("Session {} ended: {:?}, score {}", self.seed, cause, self.score);
        self.emit(GameEvent::Message {
            text: format!("💥 Game Over\n{}\nScore: {}", cause.reason(), self.score),
            sticky: true,
        });
        self.emit(GameEvent::GameOver {
            cause,
            score: self.score,
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::npc_data::{BUNDLED_NPCS, parse_npcs};

    pub(crate) fn test_session(seed: u64) -> Session {
        let records = parse_npcs(BUNDLED_NPCS).unwrap();
        Session::new(
            seed,
            &Settings::default(),
            &records,
            Upgrades::default(),
            Vec2::new(800.0, 600.0),
        )
        .unwrap()
    }

    #[test]
    fn test_session_setup() {
        let session = test_session(1234);
        assert!(session.is_running());
        assert_eq!(session.player.invulnerable, START_INVULNERABILITY);
        assert_eq!(session.npcs.len(), 5);

        // Hidden NPCs start invisible
        let nandi = &session.npcs[session.npc_index("nandi").unwrap()];
        assert!(!nandi.visible);

        // Every collect quest spawned its items: 3 clues + 4 fragments + 2 markers
        assert_eq!(session.world.items.len(), 9);

        // Player and NPCs spawn clear of each other and of obstacles
        for npc in &session.npcs {
            assert!(!crate::sim::collision::rect_overlap(&npc.rect(), &session.player.rect()));
            assert!(!session.world.collides_with_obstacles(&npc.rect()));
        }
        assert!(!session.world.collides_with_obstacles(&session.player.rect()));
    }

    #[test]
    fn test_empty_feed_refuses_to_start() {
        let result = Session::new(
            1,
            &Settings::default(),
            &[],
            Upgrades::default(),
            Vec2::new(800.0, 600.0),
        );
        assert!(matches!(result, Err(GameError::EmptyFeed)));
    }

    #[test]
    fn test_helmet_absorbs_crash() {
        let mut session = test_session(1);
        session.player.invulnerable = 0.0;
        assert!(session.upgrades.helmet);

        assert!(session.handle_crash(CrashCause::Building));
        assert!(session.is_running());
        assert!(!session.upgrades.helmet);
        assert_eq!(session.player.invulnerable, INVULNERABLE_DURATION);
        assert_eq!(session.flash, FLASH_DURATION);
        assert!(session.drain_events().contains(&GameEvent::UpgradeChanged {
            upgrade: Upgrade::Helmet,
            owned: false
        }));
    }

    #[test]
    fn test_crash_without_helmet_ends_session() {
        let mut session = test_session(1);
        session.upgrades.helmet = false;
        session.upgrades.speed_boost = true;
        session.upgrades.metal_detector = true;
        session.score = 17;

        assert!(!session.handle_crash(CrashCause::Tree));
        assert_eq!(session.phase, SessionPhase::Ended);
        assert!(!session.upgrades.speed_boost);
        assert!(!session.upgrades.metal_detector);

        let events = session.drain_events();
        assert!(events.contains(&GameEvent::GameOver {
            cause: EndCause::Crashed,
            score: 17
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Message { text, sticky: true } if text.contains("Score: 17")
        )));
        // Still animating the flash
        assert!(session.wants_frames());
    }

    #[test]
    fn test_reckless_crash_still_spends_helmet_first() {
        let mut session = test_session(1);
        session.stress_policy = StressPolicy::reckless();
        session.upgrades.speed_boost = true;
        session.speed_stress = STRESS_THRESHOLD + 40.0;

        assert!(session.handle_crash(CrashCause::Building));
        assert_eq!(session.phase, SessionPhase::Running);
        assert!(!session.upgrades.helmet);
        assert!(session.upgrades.speed_boost);
        assert_eq!(session.speed_stress, STRESS_THRESHOLD + 40.0);
    }

    #[test]
    fn test_reckless_crash_without_helmet() {
        let mut session = test_session(1);
        session.stress_policy = StressPolicy::reckless();
        session.upgrades.helmet = false;
        session.upgrades.speed_boost = true;
        session.speed_stress = STRESS_THRESHOLD + 5.0;

        assert!(!session.handle_crash(CrashCause::Building));
        assert_eq!(session.phase, SessionPhase::Ended);
        assert!(!session.upgrades.speed_boost);
        assert_eq!(session.speed_stress, 0.0);
        assert_eq!(session.player.invulnerable, INVULNERABLE_DURATION);
    }

    #[test]
    fn test_camera_clamped() {
        let mut camera = Camera::default();
        let world = Vec2::new(3000.0, 3000.0);
        let viewport = Vec2::new(800.0, 600.0);
        camera.center_on(Vec2::new(10.0, 2990.0), viewport, world);
        assert_eq!(camera.pos, Vec2::new(0.0, 2400.0));

        // Viewport larger than the world pins to the origin
        camera.center_on(Vec2::new(100.0, 100.0), Vec2::new(4000.0, 4000.0), world);
        assert_eq!(camera.pos, Vec2::ZERO);
    }
}
