//! Per-frame simulation tick
//!
//! One call advances the session by a frame factor `dt` (1.0 = one 60 Hz
//! frame, clamped by the caller). While running, the pipeline order is fixed:
//!
//! 1. invulnerability countdown
//! 2. speed, off-road wear and stress
//! 3. movement intent to velocity and facing
//! 4. NPC engagement and pedestrian hits
//! 5. move and clamp (wandering NPCs step here too)
//! 6. building and tree crashes
//! 7. quest completion
//! 8. leaving NPC range
//! 9. pickups
//! 10. camera
//! 11. flash and dust decay (also runs after the session ends)

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, circle_rect_overlap, rect_overlap};
use super::npc::Npc;
use super::state::{CrashCause, EndCause, GameEvent, Particle, Session};
use crate::consts::*;
use crate::upgrades::Upgrade;

/// Directional input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// Drag steering: each axis engages past the dead zone
    pub fn from_drag(delta: Vec2) -> Self {
        Self {
            up: delta.y < -DRAG_DEADZONE,
            down: delta.y > DRAG_DEADZONE,
            left: delta.x < -DRAG_DEADZONE,
            right: delta.x > DRAG_DEADZONE,
        }
    }

    /// Diagonals win over single axes
    pub fn direction(&self) -> Option<Direction> {
        use Direction::*;
        let dir = match (self.up, self.down, self.left, self.right) {
            (true, _, true, _) => NorthWest,
            (true, _, _, true) => NorthEast,
            (_, true, true, _) => SouthWest,
            (_, true, _, true) => SouthEast,
            (_, _, _, true) => East,
            (_, _, true, _) => West,
            (_, true, _, _) => South,
            (true, _, _, _) => North,
            _ => return None,
        };
        Some(dir)
    }
}

/// The eight movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// Per-axis multipliers; diagonals move at full speed on both axes
    pub fn axes(&self) -> Vec2 {
        match self {
            Direction::North => Vec2::new(0.0, -1.0),
            Direction::NorthEast => Vec2::new(1.0, -1.0),
            Direction::East => Vec2::new(1.0, 0.0),
            Direction::SouthEast => Vec2::new(1.0, 1.0),
            Direction::South => Vec2::new(0.0, 1.0),
            Direction::SouthWest => Vec2::new(-1.0, 1.0),
            Direction::West => Vec2::new(-1.0, 0.0),
            Direction::NorthWest => Vec2::new(-1.0, -1.0),
        }
    }

    /// Sprite facing in degrees
    pub fn facing(&self) -> f32 {
        match self {
            Direction::North => 0.0,
            Direction::NorthEast => 45.0,
            Direction::East => 90.0,
            Direction::SouthEast => 135.0,
            Direction::South => 180.0,
            Direction::SouthWest => -135.0,
            Direction::West => -90.0,
            Direction::NorthWest => -45.0,
        }
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub intent: MoveIntent,
    /// Advance the open dialog
    pub advance_dialog: bool,
    /// Pick a dialog choice (takes precedence over advancing)
    pub choice: Option<usize>,
    /// Ring the lighthouse bell
    pub ring_bell: bool,
    /// New viewport size after a resize
    pub viewport: Option<Vec2>,
}

/// Advance the session by frame factor `dt`
pub fn tick(session: &mut Session, input: &TickInput, dt: f32) {
    if let Some(viewport) = input.viewport {
        session.viewport = viewport;
    }

    if session.is_running() {
        if let Some(choice) = input.choice {
            session.choose(choice);
        } else if input.advance_dialog {
            session.advance_dialog();
        }
        if input.ring_bell {
            session.ring_lighthouse_bell();
        }
        run_frame(session, input.intent, dt);
    }

    decay_effects(session, dt);
    session.time_ticks += 1;
}

/// Steps 1-10; returns early once the session ends
fn run_frame(session: &mut Session, intent: MoveIntent, dt: f32) {
    // 1. Invulnerability
    if session.player.invulnerable > 0.0 {
        session.player.invulnerable = (session.player.invulnerable - dt).max(0.0);
    }

    // 2. Speed
    let (speed, off_road) = resolve_speed(session, dt);

    // 3. Velocity and facing
    let mut velocity = Vec2::ZERO;
    if let Some(dir) = intent.direction() {
        velocity = dir.axes() * speed;
        session.player.facing = dir.facing();
    }
    if off_road {
        spawn_dust(session);
    }

    // 4. NPC engagement and pedestrian hits
    if check_npcs(session) {
        return;
    }

    // 5. Move and clamp
    let player = &mut session.player;
    player.pos = session.world.clamp_pos(player.pos + velocity * dt, player.size);
    move_wanderers(session, dt);

    // 6. Hazards
    if session.player.can_crash()
        && let Some(cause) = find_crash(session)
        && !session.handle_crash(cause)
    {
        return;
    }

    // 7. Quests
    session.complete_quests();

    // 8. Leaving range
    for index in 0..session.npcs.len() {
        if session.npcs[index].is_player_nearby(&session.player) {
            continue;
        }
        session.npcs[index].has_talked = false;
        if session.dialog.active_npc() == Some(index) {
            log::debug!("Player left {}, closing dialog", session.npcs[index].id);
            session.close_dialog();
        }
    }

    // 9. Pickups
    collect_pickups(session);

    // 10. Camera
    let target = session.player.rect().center();
    session
        .camera
        .follow(target, session.viewport, session.world.size, dt);
}

/// Effective speed this frame and whether the player is off-road
fn resolve_speed(session: &mut Session, dt: f32) -> (f32, bool) {
    let base = session.player.speed;
    let mut speed = base;
    if session.upgrades.speed_boost {
        speed += SPEED_BOOST_BONUS;
    }

    let off_road = !session.world.is_on_road(&session.player.rect());
    if off_road {
        if session.upgrades.off_road_treads {
            session.upgrades.offroad_wear += dt;
            if session.upgrades.offroad_wear > OFFROAD_MAX {
                session.upgrades.offroad_wear = 0.0;
                log::info!("Off-road treads worn out");
                session.set_upgrade(Upgrade::OffRoadTreads, false);
                session.message("🛞 Your off-road treads wore out!");
            }
        } else {
            speed *= OFFROAD_SPEED_FACTOR;
        }
    } else {
        session.upgrades.offroad_wear = (session.upgrades.offroad_wear - dt).max(0.0);
    }

    if session.upgrades.speed_boost && speed > base {
        session.speed_stress += dt;
    } else {
        session.speed_stress = (session.speed_stress - dt).max(0.0);
    }

    (speed, off_road)
}

/// Engage NPCs in range; returns true if a pedestrian was hit
fn check_npcs(session: &mut Session) -> bool {
    for index in 0..session.npcs.len() {
        let npc = &session.npcs[index];
        if !npc.visible {
            continue;
        }

        if npc.is_player_nearby(&session.player)
            && !session.dialog.is_active()
            && !npc.has_talked
        {
            session.engage(index);
        }

        let npc = &session.npcs[index];
        if session.dialog.active_npc() != Some(index)
            && rect_overlap(&session.player.hitbox(), &npc.danger_zone())
        {
            log::info!("Hit pedestrian {}", npc.id);
            session.end_session(EndCause::HitPedestrian);
            return true;
        }
    }
    false
}

/// First building hit, else first hit among trees on screen
fn find_crash(session: &Session) -> Option<CrashCause> {
    let hitbox = session.player.hitbox();
    if session
        .world
        .buildings
        .iter()
        .any(|b| rect_overlap(&hitbox, &b.rect))
    {
        return Some(CrashCause::Building);
    }

    let camera = &session.camera;
    session
        .world
        .trees
        .iter()
        .filter(|t| camera.is_visible(&t.bounds(), session.viewport))
        .any(|t| circle_rect_overlap(&t.hazard_circle(), &hitbox))
        .then_some(CrashCause::Tree)
}

/// Collect coins and quest items under the hitbox. Safe to call repeatedly.
pub(crate) fn collect_pickups(session: &mut Session) {
    let hitbox = session.player.hitbox();

    let before = session.world.coins.len();
    session.world.coins.retain(|c| !rect_overlap(&hitbox, &c.rect));
    let collected = (before - session.world.coins.len()) as u32;
    if collected > 0 {
        session.score += collected as u64;
        session.player.add_item("coin", collected);
        for _ in 0..collected {
            session.emit(GameEvent::CoinCollected);
        }
    }

    let mut picked = Vec::new();
    for item in session.world.items.iter_mut() {
        if !item.collected && rect_overlap(&hitbox, &item.rect) {
            item.collected = true;
            picked.push(item.item_id.clone());
        }
    }
    for item_id in picked {
        session.player.add_item(&item_id, 1);
        session.message(format!("🎉 Collected {item_id}!"));
        session.emit(GameEvent::ItemCollected { item_id });
    }
}

fn spawn_dust(session: &mut Session) {
    let center = session.player.rect().center();
    let rng = &mut session.rng;
    let count = rng.random_range(2..=3);
    for _ in 0..count {
        session.dust.push(Particle {
            pos: center + Vec2::new(rng.random_range(-3.0..3.0), rng.random_range(-3.0..3.0)),
            vel: Vec2::new(rng.random_range(-0.2..0.2), rng.random_range(-0.2..0.2)),
            size: rng.random_range(4.0..8.0),
            life: rng.random_range(35.0..60.0),
        });
    }
    if session.dust.len() > MAX_DUST {
        let excess = session.dust.len() - MAX_DUST;
        session.dust.drain(..excess);
    }
}

/// Drift wandering NPCs, turning at random or when blocked
fn move_wanderers(session: &mut Session, dt: f32) {
    for npc in session.npcs.iter_mut() {
        let Some(mut wander) = npc.wander else {
            continue;
        };
        if npc.talking || !npc.visible {
            continue;
        }

        if session.rng.random_bool(NPC_WANDER_TURN_CHANCE) {
            wander.heading = session.rng.random::<f32>() * std::f32::consts::TAU;
        }

        let step = Vec2::from_angle(wander.heading) * wander.speed * dt;
        let next = Rect::from_pos_size(npc.pos + step, Npc::size());
        let in_bounds = next.min().cmpge(Vec2::ZERO).all()
            && next.max().cmple(session.world.size).all();
        // Already inside a building: let it walk out
        let stuck = session.world.collides_with_obstacles(&npc.rect());

        if in_bounds && (stuck || !session.world.collides_with_obstacles(&next)) {
            npc.pos = next.pos;
        } else {
            wander.heading = session.rng.random::<f32>() * std::f32::consts::TAU;
        }
        npc.wander = Some(wander);
    }
}

/// Step 11: runs every tick, running or not
fn decay_effects(session: &mut Session, dt: f32) {
    if session.flash > 0.0 {
        session.flash = (session.flash - dt).max(0.0);
    }

    for p in session.dust.iter_mut() {
        p.pos += p.vel * dt;
        p.life -= dt;
    }
    session.dust.retain(|p| p.life > 0.0);
}
