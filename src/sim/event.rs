/// Events emitted by the engine as it mutates the world.
/// The presentation layer drains these for sound and the log.

use crate::domain::actor::{Player, Pos};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResetCause {
    Hazard,
    Caught,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerReset { player: Player, cause: ResetCause },
    ButtonPressed { player: Player, at: Pos },
    ButtonReleased { player: Player, at: Pos },
    GateOpened { gate: usize },
    GateClosed { gate: usize },
}
