//! Read-only view of a session for whoever draws it
//!
//! Everything is culled to the camera. Positions stay in world space; the
//! renderer subtracts `camera`.

use glam::Vec2;
use serde::Serialize;

use super::collision::Rect;
use super::dialog::DialogState;
use super::interact::QuestLogEntry;
use super::state::{Particle, Session, SessionPhase};
use super::world::BuildingSprite;
use crate::consts::DETECTOR_RANGE;
use crate::upgrades::Upgrade;

#[derive(Debug, Clone, Serialize)]
pub struct BuildingView {
    pub rect: Rect,
    pub sprite: BuildingSprite,
    pub rotated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeView {
    pub rect: Rect,
    pub sprite: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct NpcView {
    pub id: String,
    pub name: String,
    pub rect: Rect,
    pub talking: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub item_id: String,
    pub rect: Rect,
    /// Within metal detector range
    pub highlighted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub camera: Vec2,
    pub viewport: Vec2,
    pub roads: Vec<Rect>,
    pub buildings: Vec<BuildingView>,
    pub trees: Vec<TreeView>,
    pub coins: Vec<Rect>,
    pub items: Vec<ItemView>,
    pub npcs: Vec<NpcView>,
    pub player: Rect,
    pub facing: f32,
    /// Blink the rider while invulnerable
    pub invulnerable: bool,
    pub dust: Vec<Particle>,
    /// 0..=1 flash intensity
    pub flash: f32,
    pub score: u64,
    pub hud_upgrades: Vec<&'static str>,
    pub quest_log: Vec<QuestLogEntry>,
    pub dialog_open: bool,
    pub game_over: bool,
}

impl FrameSnapshot {
    pub fn capture(session: &Session) -> Self {
        let camera = session.camera;
        let viewport = session.viewport;
        let visible = |r: &Rect| camera.is_visible(r, viewport);

        let player_center = session.player.rect().center();
        let detector = session.upgrades.metal_detector;

        Self {
            camera: camera.pos,
            viewport,
            roads: session.world.roads.iter().filter(|r| visible(*r)).copied().collect(),
            buildings: session
                .world
                .buildings
                .iter()
                .filter(|b| visible(&b.rect))
                .map(|b| BuildingView {
                    rect: b.rect,
                    sprite: b.sprite,
                    rotated: b.rotated,
                })
                .collect(),
            trees: session
                .world
                .trees
                .iter()
                .map(|t| TreeView {
                    rect: t.bounds(),
                    sprite: t.sprite,
                })
                .filter(|t| visible(&t.rect))
                .collect(),
            coins: session
                .world
                .coins
                .iter()
                .map(|c| c.rect)
                .filter(|r| visible(r))
                .collect(),
            items: session
                .world
                .items
                .iter()
                .filter(|i| !i.collected && visible(&i.rect))
                .map(|i| ItemView {
                    item_id: i.item_id.clone(),
                    rect: i.rect,
                    highlighted: detector
                        && i.rect.center().distance(player_center) <= DETECTOR_RANGE,
                })
                .collect(),
            npcs: session
                .npcs
                .iter()
                .filter(|n| n.visible && visible(&n.rect()))
                .map(|n| NpcView {
                    id: n.id.clone(),
                    name: n.name.clone(),
                    rect: n.rect(),
                    talking: n.talking,
                })
                .collect(),
            player: session.player.rect(),
            facing: session.player.facing,
            invulnerable: !session.player.can_crash(),
            dust: session.dust.clone(),
            flash: (session.flash / crate::consts::FLASH_DURATION).clamp(0.0, 1.0),
            score: session.score,
            hud_upgrades: session.upgrades.owned().map(|u: Upgrade| u.hud_label()).collect(),
            quest_log: session.quest_log(),
            dialog_open: !matches!(session.dialog.state(), DialogState::Idle),
            game_over: session.phase == SessionPhase::Ended,
        }
    }
}
