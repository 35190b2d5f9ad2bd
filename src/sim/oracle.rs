/// Legality oracle: "may this actor step onto (x, y)?"
///
/// Read-only on the grid and safe to call from any thread. The one side
/// effect is the hazard branch, which queues a reset for the player on
/// the serializer channel rather than touching the grid itself. The caller
/// gets `Entry::Hazard` back and moves its own position cell to start.

use tracing::debug;

use crate::domain::actor::{Actor, Pos};
use crate::domain::rules::{classify_entry, Entry};
use super::event::ResetCause;
use super::serializer::MoveSender;
use super::world::WorldView;

#[derive(Clone)]
pub struct Oracle {
    world: WorldView,
    moves: MoveSender,
}

impl Oracle {
    pub fn new(world: WorldView, moves: MoveSender) -> Self {
        Oracle { world, moves }
    }

    pub fn world(&self) -> &WorldView {
        &self.world
    }

    pub fn can_enter(&self, x: i32, y: i32, actor: Option<Actor>) -> bool {
        self.enter(x, y, actor).is_open()
    }

    /// Like `can_enter`, but tells a refused player whether it was sent home.
    pub fn enter(&self, x: i32, y: i32, actor: Option<Actor>) -> Entry {
        let pos = Pos::new(x, y);
        let entry = classify_entry(self.world.tile_at(pos), actor);
        if let Entry::Hazard(player) = entry {
            debug!(%player, ?pos, "hazard contact");
            self.moves.reset(player, ResetCause::Hazard);
        }
        entry
    }
}
