/// Player actor: turns direction inputs into serialized moves.
///
/// One instance per character, each draining its own input channel
/// one request at a time. The position cell is updated right after the
/// move is queued, before the serializer has applied it. A hazard sends
/// the cell straight back to start, so buffered inputs continue from there.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use tracing::debug;

use crate::domain::actor::MoveDir;
use crate::domain::rules::Entry;
use crate::sim::oracle::Oracle;
use crate::sim::serializer::MoveSender;
use crate::sim::world::ActorHandle;

pub struct PlayerActor {
    me: ActorHandle,
    oracle: Oracle,
    moves: MoveSender,
    inputs: Receiver<MoveDir>,
}

impl PlayerActor {
    pub fn new(me: ActorHandle, oracle: Oracle, moves: MoveSender, inputs: Receiver<MoveDir>) -> Self {
        PlayerActor { me, oracle, moves, inputs }
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        let name = format!("{:?}", self.me.actor()).to_lowercase();
        thread::Builder::new().name(name).spawn(move || self.run())
    }

    pub fn run(self) {
        debug!(actor = ?self.me.actor(), "player actor started");
        while let Ok(dir) = self.inputs.recv() {
            self.handle(dir);
        }
    }

    /// Returns true if a move was queued.
    pub fn handle(&self, dir: MoveDir) -> bool {
        let actor = self.me.actor();
        let (dx, dy) = dir.delta();
        let here = self.me.position();
        let target = here.offset(dx, dy);

        match self.oracle.enter(target.x, target.y, Some(actor)) {
            Entry::Open => {}
            Entry::Blocked => return false,
            Entry::Hazard(player) => {
                self.me.set_position(self.oracle.world().start(player));
                return false;
            }
        }
        if !self.moves.apply_move(actor, here, dx, dy) {
            return false;
        }
        self.me.set_position(target);
        true
    }
}
