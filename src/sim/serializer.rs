/// Move serializer: the single writer of the grid.
///
/// Every grid mutation in the running game is a `Command` on one bounded
/// channel, applied strictly in arrival order by one thread:
///   - actor moves (players with memento semantics, enemies without)
///   - hazard / collision resets
///   - gate animation ticks
///   - status line updates
///
/// Producers hold a cloneable `MoveSender`. The serializer owns the only
/// `WorldWriter`, so nothing else can write a cell.
///
/// Besides applying commands it watches button cells: when a player's
/// applied move (or reset) enters or leaves a watched button, the
/// registered gate controller is signalled.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, trace};

use crate::domain::actor::{Actor, Player, Pos};
use crate::domain::tile::Tile;
use super::event::{GameEvent, ResetCause};
use super::world::WorldWriter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Move { actor: Actor, from: Pos, dx: i32, dy: i32 },
    Reset { player: Player, cause: ResetCause },
    SetTile { pos: Pos, tile: Tile },
    Status(String),
}

/// Producer side of the serializer channel.
///
/// Sends block while the queue is full. They fail only once the
/// serializer is gone, which callers treat as shutdown.
#[derive(Clone)]
pub struct MoveSender {
    tx: Sender<Command>,
}

impl MoveSender {
    pub fn send(&self, cmd: Command) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn apply_move(&self, actor: Actor, from: Pos, dx: i32, dy: i32) -> bool {
        self.send(Command::Move { actor, from, dx, dy })
    }

    pub fn reset(&self, player: Player, cause: ResetCause) -> bool {
        self.send(Command::Reset { player, cause })
    }

    pub fn set_tile(&self, pos: Pos, tile: Tile) -> bool {
        self.send(Command::SetTile { pos, tile })
    }

    pub fn set_status(&self, msg: impl Into<String>) -> bool {
        self.send(Command::Status(msg.into()))
    }
}

/// Create the serializer channel. Capacity is clamped to at least one
/// pending request.
pub fn channel(capacity: usize) -> (MoveSender, Receiver<Command>) {
    let (tx, rx) = bounded(capacity.max(1));
    (MoveSender { tx }, rx)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ButtonSignal {
    Pressed,
    Released,
}

/// A button cell the serializer reports on.
pub struct ButtonWatch {
    pub player: Player,
    pub at: Pos,
    pub signal: Sender<ButtonSignal>,
}

pub struct MoveSerializer {
    world: WorldWriter,
    rx: Receiver<Command>,
    buttons: Vec<ButtonWatch>,
    events: Sender<GameEvent>,
}

impl MoveSerializer {
    pub fn new(world: WorldWriter, rx: Receiver<Command>, events: Sender<GameEvent>) -> Self {
        MoveSerializer { world, rx, buttons: vec![], events }
    }

    pub fn watch_button(&mut self, watch: ButtonWatch) {
        self.buttons.push(watch);
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("move-serializer".into())
            .spawn(move || self.run())
    }

    /// Apply commands until every sender is dropped.
    pub fn run(mut self) {
        debug!("move serializer started");
        while let Ok(cmd) = self.rx.recv() {
            self.apply(cmd);
        }
        debug!("move serializer stopped");
    }

    /// Apply every command queued right now.
    #[cfg(test)]
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while let Ok(cmd) = self.rx.try_recv() {
            self.apply(cmd);
            n += 1;
        }
        n
    }

    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Move { actor, from, dx, dy } => {
                let to = from.offset(dx, dy);
                if !self.world.apply_move(actor, from, to) {
                    debug!(?actor, ?from, ?to, "stale move skipped");
                    return;
                }
                trace!(?actor, ?from, ?to, "apply move");
                if let Some(player) = actor.player() {
                    self.watch_buttons(player, from, to);
                }
            }
            Command::Reset { player, cause } => {
                let (from, to) = self.world.reset_to_start(player, cause);
                info!(%player, ?cause, ?from, ?to, "player reset to start");
                let _ = self.events.send(GameEvent::PlayerReset { player, cause });
                self.watch_buttons(player, from, to);
            }
            Command::SetTile { pos, tile } => {
                self.world.set_tile(pos, tile);
            }
            Command::Status(msg) => {
                self.world.set_status(msg);
            }
        }
    }

    fn watch_buttons(&self, player: Player, from: Pos, to: Pos) {
        if from == to {
            return;
        }
        for watch in self.buttons.iter().filter(|w| w.player == player) {
            if to == watch.at {
                debug!(%player, at = ?watch.at, "button pressed");
                let _ = watch.signal.send(ButtonSignal::Pressed);
                let _ = self.events.send(GameEvent::ButtonPressed { player, at: watch.at });
            } else if from == watch.at {
                debug!(%player, at = ?watch.at, "button released");
                let _ = watch.signal.send(ButtonSignal::Released);
                let _ = self.events.send(GameEvent::ButtonReleased { player, at: watch.at });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    use crate::sim::world::{Grid, InitialState, World, WorldView};

    fn setup(rows: &[&str]) -> (WorldView, MoveSender, MoveSerializer, Receiver<GameEvent>) {
        let (view, writer, _) = World::split(InitialState {
            grid: Grid::from_rows(rows),
            players: [Pos::new(0, 0), Pos::new(0, 0)],
            enemies: [Pos::new(0, 0); 2],
        });
        let (tx, rx) = channel(16);
        let (ev_tx, ev_rx) = unbounded();
        (view, tx, MoveSerializer::new(writer, rx, ev_tx), ev_rx)
    }

    #[test]
    fn commands_apply_in_arrival_order() {
        let (view, tx, mut ser, _) = setup(&["    "]);
        tx.set_tile(Pos::new(1, 0), Tile::Gate);
        tx.set_tile(Pos::new(1, 0), Tile::Empty);
        tx.set_tile(Pos::new(1, 0), Tile::Vegetation);
        assert_eq!(ser.drain(), 3);
        assert_eq!(view.tile_at(Pos::new(1, 0)), Some(Tile::Vegetation));
    }

    #[test]
    fn move_then_back_is_a_round_trip() {
        let (view, tx, mut ser, _) = setup(&[" B%"]);
        let before = view.read().grid.clone();
        tx.apply_move(Actor::WaterPlayer, Pos::new(0, 0), 1, 0);
        tx.apply_move(Actor::WaterPlayer, Pos::new(1, 0), 1, 0);
        tx.apply_move(Actor::WaterPlayer, Pos::new(2, 0), -1, 0);
        tx.apply_move(Actor::WaterPlayer, Pos::new(1, 0), -1, 0);
        ser.drain();
        assert_eq!(view.read().grid, before);
    }

    #[test]
    fn status_command_sets_message() {
        let (view, tx, mut ser, _) = setup(&[" "]);
        tx.set_status("Interacting at (3, 4)");
        ser.drain();
        assert_eq!(view.status(), "Interacting at (3, 4)");
    }

    #[test]
    fn watched_button_signals_press_and_release() {
        let (_view, tx, mut ser, events) = setup(&[" B "]);
        let (sig_tx, sig_rx) = unbounded();
        ser.watch_button(ButtonWatch { player: Player::Fire, at: Pos::new(1, 0), signal: sig_tx });

        tx.apply_move(Actor::FirePlayer, Pos::new(0, 0), 1, 0);
        // Other player on the same button is ignored.
        tx.apply_move(Actor::WaterPlayer, Pos::new(0, 0), 1, 0);
        tx.apply_move(Actor::FirePlayer, Pos::new(1, 0), 1, 0);
        ser.drain();

        let signals: Vec<_> = sig_rx.try_iter().collect();
        assert_eq!(signals, vec![ButtonSignal::Pressed, ButtonSignal::Released]);
        let evs: Vec<_> = events.try_iter().collect();
        assert_eq!(evs.len(), 2);
    }

    #[test]
    fn reset_emits_event_and_releases_button() {
        let (view, writer, handles) = World::split(InitialState {
            grid: Grid::from_rows(&[" B "]),
            players: [Pos::new(0, 0), Pos::new(2, 0)],
            enemies: [Pos::new(2, 0); 2],
        });
        let (tx, rx) = channel(16);
        let (ev_tx, events) = unbounded();
        let mut ser = MoveSerializer::new(writer, rx, ev_tx);
        let (sig_tx, sig_rx) = unbounded();
        ser.watch_button(ButtonWatch { player: Player::Fire, at: Pos::new(1, 0), signal: sig_tx });

        tx.apply_move(Actor::FirePlayer, Pos::new(0, 0), 1, 0);
        handles[0].set_position(Pos::new(1, 0));
        tx.reset(Player::Fire, ResetCause::Caught);
        ser.drain();

        assert_eq!(view.position(Actor::FirePlayer), Pos::new(0, 0));
        assert_eq!(view.tile_at(Pos::new(1, 0)), Some(Tile::Button));
        assert_eq!(view.status(), "Fire extinguished");
        let signals: Vec<_> = sig_rx.try_iter().collect();
        assert_eq!(signals, vec![ButtonSignal::Pressed, ButtonSignal::Released]);
        let evs: Vec<_> = events.try_iter().collect();
        assert!(evs.contains(&GameEvent::PlayerReset { player: Player::Fire, cause: ResetCause::Caught }));
    }

    #[test]
    fn move_queued_before_a_catch_does_not_press_the_button() {
        let (view, tx, mut ser, _) = setup(&[" B ", "   "]);
        let (sig_tx, sig_rx) = unbounded();
        ser.watch_button(ButtonWatch { player: Player::Fire, at: Pos::new(1, 0), signal: sig_tx });

        tx.apply_move(Actor::FirePlayer, Pos::new(0, 0), 0, 1);
        tx.reset(Player::Fire, ResetCause::Caught);
        tx.apply_move(Actor::FirePlayer, Pos::new(0, 1), 1, -1);
        ser.drain();

        assert!(sig_rx.try_recv().is_err());
        assert_eq!(view.position(Actor::FirePlayer), Pos::new(0, 0));
        assert_eq!(view.read().grid, Grid::from_rows(&[" B ", "   "]));
    }

    #[test]
    fn gate_tick_under_a_player_stays_in_place() {
        let (view, tx, mut ser, _) = setup(&["   "]);
        tx.set_tile(Pos::new(0, 0), Tile::Gate);
        tx.apply_move(Actor::FirePlayer, Pos::new(0, 0), 1, 0);
        tx.apply_move(Actor::FirePlayer, Pos::new(1, 0), 1, 0);
        ser.drain();
        assert_eq!(
            view.read().grid.rows()[0],
            vec![Tile::Gate, Tile::Empty, Tile::Empty]
        );
    }

    #[test]
    fn run_stops_when_senders_are_dropped() {
        let (view, tx, ser, _) = setup(&["  "]);
        let handle = ser.spawn().unwrap();
        tx.set_tile(Pos::new(1, 0), Tile::Wall);
        drop(tx);
        handle.join().unwrap();
        assert_eq!(view.tile_at(Pos::new(1, 0)), Some(Tile::Wall));
    }
}
