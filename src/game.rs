//! Host-side driver
//!
//! Owns the durable upgrade copy, the store, the NPC feed and the current
//! session. Converts frame times to frame factors, routes session events to
//! the message sink and the store, and runs the purchase flow.

use glam::Vec2;

use crate::consts::MESSAGE_MS;
use crate::npc_data::NpcRecord;
use crate::persistence::KeyValueStore;
use crate::platform::{MessageDuration, MessageSink, PaymentGateway};
use crate::sim::{FrameSnapshot, GameEvent, Session, TickInput, tick};
use crate::upgrades::{Upgrade, Upgrades};
use crate::{GameError, Settings, frame_factor};

/// A purchase waiting on the payment gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPurchase {
    pub upgrade: Upgrade,
    /// Sats
    pub amount: u64,
    pub label: String,
}

pub struct Game<S: KeyValueStore> {
    store: S,
    upgrades: Upgrades,
    settings: Settings,
    npcs: Vec<NpcRecord>,
    session: Option<Session>,
    viewport: Vec2,
    next_seed: u64,
}

impl<S: KeyValueStore> Game<S> {
    /// Load upgrades and settings from `store`
    pub fn new(store: S, npcs: Vec<NpcRecord>, viewport: Vec2) -> Self {
        let upgrades = Upgrades::load(&store);
        let settings = Settings::load(&store);
        let next_seed = settings.seed.unwrap_or_else(rand::random);
        log::info!(
            "Game ready: {} NPCs, upgrades {:?}",
            npcs.len(),
            upgrades.owned().collect::<Vec<_>>()
        );
        Self {
            store,
            upgrades,
            settings,
            npcs,
            session: None,
            viewport,
            next_seed,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn upgrades(&self) -> &Upgrades {
        &self.upgrades
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_running)
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        if let Some(session) = self.session.as_mut() {
            session.viewport = viewport;
        }
    }

    /// Discard the old session and build a fresh one
    pub fn new_game(&mut self) -> Result<&mut Session, GameError> {
        if self.is_running() {
            return Err(GameError::SessionRunning);
        }

        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        let session = Session::new(
            seed,
            &self.settings,
            &self.npcs,
            self.upgrades.clone(),
            self.viewport,
        )?;
        Ok(self.session.insert(session))
    }

    /// Advance one display frame. Returns whether another frame is wanted.
    pub fn frame(
        &mut self,
        elapsed_ms: f32,
        input: &TickInput,
        sink: &mut impl MessageSink,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        tick(session, input, frame_factor(elapsed_ms));
        let events = session.drain_events();
        for event in events {
            self.route(event, sink);
        }

        self.session.as_ref().is_some_and(Session::wants_frames)
    }

    pub fn snapshot(&self) -> Option<FrameSnapshot> {
        self.session.as_ref().map(FrameSnapshot::capture)
    }

    fn route(&mut self, event: GameEvent, sink: &mut impl MessageSink) {
        match event {
            GameEvent::Message { text, sticky } => {
                let duration = if sticky {
                    MessageDuration::Sticky
                } else {
                    MessageDuration::Timed(MESSAGE_MS)
                };
                sink.show(&text, duration);
            }
            GameEvent::UpgradeChanged { upgrade, owned } => {
                log::debug!("Upgrade {upgrade:?} -> {owned}");
                match self.session.as_ref() {
                    Some(session) => self.upgrades = session.upgrades.clone(),
                    None => {
                        self.upgrades.set(upgrade, owned);
                    }
                }
                self.persist_upgrades();
            }
            GameEvent::GameOver { cause, score } => {
                log::info!("Game over ({cause:?}), final score {score}");
            }
            _ => {}
        }
    }

    fn persist_upgrades(&mut self) {
        if let Err(e) = self.upgrades.save(&mut self.store) {
            log::warn!("Failed to save upgrades: {e}");
        }
    }

    /// First half of a purchase. `None` if the upgrade is already owned.
    pub fn start_purchase(
        &self,
        upgrade: Upgrade,
        sink: &mut impl MessageSink,
    ) -> Option<PendingPurchase> {
        if self.upgrades.owns(upgrade) {
            sink.show(
                &format!("✔ You already own the {}!", upgrade.label()),
                MessageDuration::Timed(MESSAGE_MS),
            );
            return None;
        }
        Some(PendingPurchase {
            upgrade,
            amount: upgrade.price(),
            label: format!("{} Upgrade", upgrade.label()),
        })
    }

    /// Second half: apply the gateway's answer. Returns whether it unlocked.
    pub fn finish_purchase(
        &mut self,
        purchase: &PendingPurchase,
        paid: bool,
        sink: &mut impl MessageSink,
    ) -> bool {
        if !paid {
            log::info!("Payment for {} failed", purchase.label);
            sink.show("❌ Payment failed", MessageDuration::Timed(MESSAGE_MS));
            return false;
        }

        let upgrade = purchase.upgrade;
        self.upgrades.set(upgrade, true);
        if upgrade == Upgrade::OffRoadTreads {
            self.upgrades.offroad_wear = 0.0;
        }
        if let Some(session) = self.session.as_mut() {
            session.upgrades.set(upgrade, true);
            session.upgrades.offroad_wear = self.upgrades.offroad_wear;
        }
        self.persist_upgrades();

        log::info!("{} unlocked", upgrade.label());
        sink.show(
            &format!("✔ {} unlocked!", upgrade.label()),
            MessageDuration::Timed(MESSAGE_MS),
        );
        true
    }

    /// Run the whole purchase through `gateway`. No retry.
    pub fn buy_upgrade(
        &mut self,
        upgrade: Upgrade,
        gateway: &mut impl PaymentGateway,
        sink: &mut impl MessageSink,
    ) -> bool {
        let Some(purchase) = self.start_purchase(upgrade, sink) else {
            return false;
        };
        let paid = gateway.pay(purchase.amount, &purchase.label);
        self.finish_purchase(&purchase, paid, sink)
    }
}
