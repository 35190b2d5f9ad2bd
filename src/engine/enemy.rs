/// Enemy patrol.
///
/// Each enemy runs as two threads joined by a rendezvous channel:
///
///   patrol ──(dx)──▶ mover ──(Command::Move)──▶ serializer
///     ▲
///     └── alert (bool) from the proximity monitor
///
/// The patrol thread owns the direction and cadence. Every cycle it polls
/// for an alert without blocking, probes the cell one step ahead, hands the
/// step to the mover, sleeps, and reverses if the probed cell turned out to
/// be illegal. The mover applies the same oracle check and queues the move.
///
/// Enemies only walk horizontally and never trigger the hazard path.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

use crate::config::SpeedConfig;
use crate::domain::actor::{Actor, Pos};
use crate::sim::oracle::Oracle;
use crate::sim::serializer::MoveSender;
use crate::sim::world::ActorHandle;

// ── Patrol state ──

/// Direction and alert flag. Cadence follows the alert flag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Patrol {
    pub dx: i32,
    pub alert: bool,
}

impl Default for Patrol {
    fn default() -> Self {
        Patrol { dx: 1, alert: false }
    }
}

impl Patrol {
    pub fn interval(&self, speed: &SpeedConfig) -> Duration {
        if self.alert { speed.alert() } else { speed.patrol() }
    }

    /// Bounce off whatever made the probed cell illegal.
    pub fn settle(&mut self, probe_legal: bool) {
        if !probe_legal {
            self.dx = -self.dx;
        }
    }
}

// ── Patrol loop ──

pub struct EnemyPatrol {
    actor: Actor,
    oracle: Oracle,
    patrol: Patrol,
    speed: SpeedConfig,
    steps: Sender<i32>,
    alerts: Receiver<bool>,
}

impl EnemyPatrol {
    pub fn new(
        actor: Actor,
        oracle: Oracle,
        speed: SpeedConfig,
        steps: Sender<i32>,
        alerts: Receiver<bool>,
    ) -> Self {
        EnemyPatrol { actor, oracle, patrol: Patrol::default(), speed, steps, alerts }
    }

    #[cfg(test)]
    pub fn patrol(&self) -> Patrol {
        self.patrol
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        let name = format!("{:?}-patrol", self.actor).to_lowercase();
        thread::Builder::new().name(name).spawn(move || self.run())
    }

    pub fn run(mut self) {
        debug!(actor = ?self.actor, "patrol started");
        while let Some(probe) = self.emit() {
            thread::sleep(self.patrol.interval(&self.speed));
            self.settle(probe);
        }
        debug!(actor = ?self.actor, "patrol stopped");
    }

    /// Poll for an alert, then hand one step to the mover. Returns the
    /// probed cell, or `None` once the mover is gone.
    pub fn emit(&mut self) -> Option<Pos> {
        if let Ok(alert) = self.alerts.try_recv() {
            if alert != self.patrol.alert {
                trace!(actor = ?self.actor, alert, "alert changed");
            }
            self.patrol.alert = alert;
        }
        let probe = self.oracle.world().position(self.actor).offset(self.patrol.dx, 0);
        self.steps.send(self.patrol.dx).ok()?;
        Some(probe)
    }

    pub fn settle(&mut self, probe: Pos) {
        let legal = self.oracle.can_enter(probe.x, probe.y, Some(self.actor));
        self.patrol.settle(legal);
    }
}

// ── Mover ──

pub struct EnemyMover {
    me: ActorHandle,
    oracle: Oracle,
    moves: MoveSender,
    steps: Receiver<i32>,
}

impl EnemyMover {
    pub fn new(me: ActorHandle, oracle: Oracle, moves: MoveSender, steps: Receiver<i32>) -> Self {
        EnemyMover { me, oracle, moves, steps }
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        let name = format!("{:?}-mover", self.me.actor()).to_lowercase();
        thread::Builder::new().name(name).spawn(move || self.run())
    }

    pub fn run(self) {
        while let Ok(dx) = self.steps.recv() {
            self.step(dx);
        }
    }

    /// Returns true if the step was queued.
    pub fn step(&self, dx: i32) -> bool {
        let actor = self.me.actor();
        let here = self.me.position();
        let target = here.offset(dx, 0);
        if !self.oracle.can_enter(target.x, target.y, Some(actor)) {
            return false;
        }
        if !self.moves.apply_move(actor, here, dx, 0) {
            return false;
        }
        self.me.set_position(target);
        true
    }
}
