/// Gate controllers.
///
/// One per configured gate. The serializer reports presses and releases
/// of the gate's button; the controller animates the strip one tile per
/// tick through the same serializer channel as every other write.
///
/// Cycle:
///   closed ── press ──▶ open right-to-left ── release ──▶ close left-to-right
///
/// Signals arriving mid-animation are replayed in order once it ends, so
/// a release during opening starts the close right after.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info};

use crate::config::GateConfig;
use crate::domain::actor::Pos;
use crate::domain::tile::Tile;
use crate::sim::event::GameEvent;
use crate::sim::serializer::{ButtonSignal, ButtonWatch, MoveSender};

pub struct GateController {
    id: usize,
    gate: GateConfig,
    moves: MoveSender,
    signals: Receiver<ButtonSignal>,
    events: Sender<GameEvent>,
    tick: Duration,
    held: bool,
}

impl GateController {
    /// Build a controller and the button watch the serializer must
    /// register for it.
    pub fn new(
        id: usize,
        gate: GateConfig,
        moves: MoveSender,
        events: Sender<GameEvent>,
        tick: Duration,
    ) -> (Self, ButtonWatch) {
        let (signal, signals) = crossbeam_channel::unbounded();
        let watch = ButtonWatch { player: gate.player, at: gate.button, signal };
        let ctl = GateController { id, gate, moves, signals, events, tick, held: false };
        (ctl, watch)
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("gate-{}", self.id))
            .spawn(move || self.run())
    }

    pub fn run(mut self) {
        debug!(gate = self.id, config = ?self.gate, "gate controller started");
        while self.cycle() {}
        debug!(gate = self.id, "gate controller stopped");
    }

    /// One full open/close cycle. Returns false on shutdown.
    pub fn cycle(&mut self) -> bool {
        self.wait_until(true)
            && self.open()
            && self.wait_until(false)
            && self.close()
    }

    /// Cells from the button side inward: right-to-left.
    pub fn open_order(&self) -> impl Iterator<Item = Pos> + '_ {
        (self.gate.from..=self.gate.to).rev().map(|x| Pos::new(x, self.gate.row))
    }

    pub fn close_order(&self) -> impl Iterator<Item = Pos> + '_ {
        (self.gate.from..=self.gate.to).map(|x| Pos::new(x, self.gate.row))
    }

    fn open(&self) -> bool {
        for pos in self.open_order() {
            if !self.moves.set_tile(pos, Tile::Empty) {
                return false;
            }
            thread::sleep(self.tick);
        }
        info!(gate = self.id, "gate opened");
        let _ = self.events.send(GameEvent::GateOpened { gate: self.id });
        true
    }

    fn close(&self) -> bool {
        for pos in self.close_order() {
            if !self.moves.set_tile(pos, Tile::Gate) {
                return false;
            }
            thread::sleep(self.tick);
        }
        info!(gate = self.id, "gate closed");
        let _ = self.events.send(GameEvent::GateClosed { gate: self.id });
        true
    }

    /// Block until the button's held state equals `held`.
    fn wait_until(&mut self, held: bool) -> bool {
        while self.held != held {
            match self.signals.recv() {
                Ok(signal) => self.held = signal == ButtonSignal::Pressed,
                Err(_) => return false,
            }
        }
        true
    }
}
