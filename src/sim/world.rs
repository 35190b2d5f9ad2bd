/// Game state shared by every engine loop.
///
/// ## Ownership
///
/// One `Shared` aggregate lives behind an `Arc` for the process lifetime.
/// Access is split by type at construction (`World::split`):
///   - `WorldView`   read-only, cloneable; handed to every loop.
///   - `WorldWriter` the only way to mutate grid cells, the last-visited
///                   mementos and the status line. Exactly one exists and
///                   it is moved into the move serializer thread.
///   - `ActorHandle` write access to one actor's own position cell.
///
/// The grid sits under an `RwLock` that only the writer ever takes for
/// writing; positions are lock-free atomics (see `domain::actor`).

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::actor::{Actor, Player, Pos, Positions};
use crate::domain::tile::Tile;
use super::event::ResetCause;

/// Rows of tiles. Rows may differ in length; bounds are per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Tile>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Tile>>) -> Self {
        Grid { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Tile> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        self.rows
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
            .copied()
    }

    /// Out-of-bounds writes are ignored.
    #[inline]
    fn set(&mut self, pos: Pos, tile: Tile) {
        if pos.x < 0 || pos.y < 0 {
            return;
        }
        if let Some(cell) = self
            .rows
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
        {
            *cell = tile;
        }
    }

    /// Parse a diagram using the map legend. Actor glyphs stay in the grid.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        Grid::new(
            rows.iter()
                .map(|r| r.chars().map(Tile::from_glyph).collect())
                .collect(),
        )
    }
}

/// Everything a freshly loaded map provides.
#[derive(Clone, Debug)]
pub struct InitialState {
    pub grid: Grid,
    pub players: [Pos; 2],
    pub enemies: [Pos; 2],
}

/// Grid-side state: only `WorldWriter` mutates it.
///
/// `applied` is where each player stands as far as the grid is concerned.
/// It trails the position cells, which owners update before the serializer
/// gets to their move.
#[derive(Debug)]
pub struct GameState {
    pub grid: Grid,
    last_visited: [Tile; 2],
    applied: [Pos; 2],
    starts: [Pos; 2],
    pub status: String,
}

impl GameState {
    #[cfg(test)]
    pub fn last_visited(&self, player: Player) -> Tile {
        self.last_visited[player.index()]
    }

    #[cfg(test)]
    pub fn applied(&self, player: Player) -> Pos {
        self.applied[player.index()]
    }

    pub fn start(&self, player: Player) -> Pos {
        self.starts[player.index()]
    }
}

struct Shared {
    state: RwLock<GameState>,
    positions: Positions,
}

pub struct World;

impl World {
    /// Build the shared state and hand out its access handles.
    /// Handles are returned in `Actor::ALL` order.
    pub fn split(init: InitialState) -> (WorldView, WorldWriter, [ActorHandle; 4]) {
        let [fire, water] = init.players;
        let [fire_enemy, water_enemy] = init.enemies;
        let shared = Arc::new(Shared {
            state: RwLock::new(GameState {
                grid: init.grid,
                last_visited: [Tile::Empty; 2],
                applied: init.players,
                starts: init.players,
                status: String::new(),
            }),
            positions: Positions::new([fire, water, fire_enemy, water_enemy]),
        });
        let handles = Actor::ALL.map(|actor| ActorHandle {
            actor,
            shared: Arc::clone(&shared),
        });
        (
            WorldView { shared: Arc::clone(&shared) },
            WorldWriter { shared },
            handles,
        )
    }
}

// ── Read-only view ──

#[derive(Clone)]
pub struct WorldView {
    shared: Arc<Shared>,
}

impl WorldView {
    /// Lock the state for reading. A poisoned lock still holds a
    /// consistent grid (every write is a single cell store), so it
    /// is recovered rather than propagated.
    pub fn read(&self) -> RwLockReadGuard<'_, GameState> {
        self.shared.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tile_at(&self, pos: Pos) -> Option<Tile> {
        self.read().grid.get(pos)
    }

    pub fn position(&self, actor: Actor) -> Pos {
        self.shared.positions.get(actor)
    }

    pub fn start(&self, player: Player) -> Pos {
        self.read().start(player)
    }

    pub fn status(&self) -> String {
        self.read().status.clone()
    }
}

// ── Per-actor position handle ──

pub struct ActorHandle {
    actor: Actor,
    shared: Arc<Shared>,
}

impl ActorHandle {
    pub fn actor(&self) -> Actor {
        self.actor
    }

    pub fn position(&self) -> Pos {
        self.shared.positions.get(self.actor)
    }

    pub fn set_position(&self, pos: Pos) {
        self.shared.positions.set(self.actor, pos);
    }
}

// ── The single writer ──

pub struct WorldWriter {
    shared: Arc<Shared>,
}

impl WorldWriter {
    fn write(&self) -> RwLockWriteGuard<'_, GameState> {
        self.shared.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap an actor from `from` to `to`. Returns false if nothing moved.
    ///
    /// Players carry a memento: the vacated cell gets back whatever the
    /// player displaced on arrival, and the destination's current tile
    /// is remembered for the next departure. Enemies leave `Empty` behind.
    ///
    /// A player move whose origin is not where the grid has the player
    /// was queued before a reset took it elsewhere. It is skipped and the
    /// position cell is pulled back to the applied position.
    pub fn apply_move(&self, actor: Actor, from: Pos, to: Pos) -> bool {
        let mut state = self.write();
        let carried = state.grid.get(from).unwrap_or_default();
        match actor.player() {
            Some(player) => {
                let i = player.index();
                if state.applied[i] != from {
                    self.shared.positions.set(actor, state.applied[i]);
                    return false;
                }
                let restore = state.last_visited[i];
                state.grid.set(from, restore);
                state.last_visited[i] = state.grid.get(to).unwrap_or_default();
                state.applied[i] = to;
            }
            None => state.grid.set(from, Tile::Empty),
        }
        state.grid.set(to, carried);
        true
    }

    /// Send a player back to its start cell. Returns (old, new) position.
    ///
    /// The old position is the applied one, never the position cell. On a
    /// hazard the player actor has already moved its own cell to start and
    /// may have queued moves from there, so only a catch rewrites it.
    pub fn reset_to_start(&self, player: Player, cause: ResetCause) -> (Pos, Pos) {
        let i = player.index();
        let mut state = self.write();
        let here = state.applied[i];
        let start = state.starts[i];

        let carried = state.grid.get(here).unwrap_or_default();
        let restore = state.last_visited[i];
        state.grid.set(here, restore);

        state.applied[i] = start;
        if cause == ResetCause::Caught {
            self.shared.positions.set(player.actor(), start);
        }
        let landed_on = state.grid.get(start).unwrap_or_default();
        state.last_visited[i] = landed_on;
        state.grid.set(start, carried);
        state.status = player.reset_message().to_string();

        (here, start)
    }

    /// Write one cell. A cell a player stands on holds the player's carried
    /// tile, so the write lands in that player's memento instead and shows
    /// up once the player steps off.
    pub fn set_tile(&self, pos: Pos, tile: Tile) {
        let mut state = self.write();
        let mut occupied = false;
        for player in Player::BOTH {
            if state.applied[player.index()] == pos {
                state.last_visited[player.index()] = tile;
                occupied = true;
            }
        }
        if !occupied {
            state.grid.set(pos, tile);
        }
    }

    pub fn set_status(&self, msg: impl Into<String>) {
        self.write().status = msg.into();
    }
}
