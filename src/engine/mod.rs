/// Concurrent engine: spawns every actor thread around a shared world.
///
/// Thread map:
///   move-serializer   single writer, applies Commands in order
///   fireplayer        \ player actors, one input channel each
///   waterplayer       /
///   *-patrol, *-mover two per enemy
///   proximity         alerts enemies when their prey is near
///   collision         resets caught players
///   gate-N            one per configured gate
///
/// Threads run until their channels disconnect. The game exits by
/// tearing down the terminal and ending the process.

pub mod enemy;
pub mod gate;
pub mod monitor;
pub mod player;

use std::io;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use tracing::{info, trace};

use crate::config::GameConfig;
use crate::domain::actor::{Actor, MoveDir, Player};
use crate::sim::event::GameEvent;
use crate::sim::oracle::Oracle;
use crate::sim::serializer::{self, MoveSender, MoveSerializer};
use crate::sim::world::{InitialState, World, WorldView};

use enemy::{EnemyMover, EnemyPatrol};
use gate::GateController;
use monitor::{CollisionMonitor, ProximityMonitor};
use player::PlayerActor;

/// Inputs buffered per player before key presses are dropped.
const INPUT_QUEUE: usize = 4;

/// Front-end handle to a running engine.
pub struct Engine {
    view: WorldView,
    moves: MoveSender,
    inputs: [Sender<MoveDir>; 2],
    events: Receiver<GameEvent>,
}

impl Engine {
    pub fn start(init: InitialState, config: &GameConfig) -> io::Result<Engine> {
        let (view, writer, handles) = World::split(init);
        let (moves, commands) = serializer::channel(config.rules.move_queue);
        let (events_tx, events) = unbounded();
        let oracle = Oracle::new(view.clone(), moves.clone());
        let mut serializer = MoveSerializer::new(writer, commands, events_tx.clone());

        // Gates register their buttons before the serializer starts.
        let mut gates = Vec::with_capacity(config.gates.len());
        for (id, gate) in config.gates.iter().enumerate() {
            let (ctl, watch) = GateController::new(
                id,
                gate.clone(),
                moves.clone(),
                events_tx.clone(),
                config.speed.gate_tick(),
            );
            serializer.watch_button(watch);
            gates.push(ctl);
        }
        serializer.spawn()?;
        for ctl in gates {
            ctl.spawn()?;
        }

        let [fire, water, fire_enemy, water_enemy] = handles;

        let (fire_tx, fire_rx) = bounded(INPUT_QUEUE);
        let (water_tx, water_rx) = bounded(INPUT_QUEUE);
        PlayerActor::new(fire, oracle.clone(), moves.clone(), fire_rx).spawn()?;
        PlayerActor::new(water, oracle.clone(), moves.clone(), water_rx).spawn()?;

        let mut proximity = ProximityMonitor::new(
            view.clone(),
            config.rules.alert_distance,
            config.speed.proximity(),
        );
        // Water enemy hunts the fire player and is served first.
        for (player, handle) in [(Player::Fire, water_enemy), (Player::Water, fire_enemy)] {
            let (alert_tx, alert_rx) = bounded(0);
            let (step_tx, step_rx) = bounded(0);
            proximity.notify(player, alert_tx);
            EnemyPatrol::new(handle.actor(), oracle.clone(), config.speed.clone(), step_tx, alert_rx)
                .spawn()?;
            EnemyMover::new(handle, oracle.clone(), moves.clone(), step_rx).spawn()?;
        }
        proximity.spawn()?;

        CollisionMonitor::new(view.clone(), moves.clone(), config.speed.collision()).spawn()?;

        info!(gates = config.gates.len(), "engine started");
        Ok(Engine { view, moves, inputs: [fire_tx, water_tx], events })
    }

    pub fn view(&self) -> &WorldView {
        &self.view
    }

    /// Hand a direction to a player actor. Dropped if the actor is
    /// still busy with earlier presses.
    pub fn send_move(&self, player: Player, dir: MoveDir) {
        match self.inputs[player.index()].try_send(dir) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!(%player, ?dir, "input dropped"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Report the fire player's position on the status line.
    pub fn interact(&self) {
        let pos = self.view.position(Actor::FirePlayer);
        self.moves.set_status(format!("Interacting at ({}, {})", pos.x, pos.y));
    }

    pub fn events(&self) -> &Receiver<GameEvent> {
        &self.events
    }
}
