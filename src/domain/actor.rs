/// Actors: the four movable entities and their shared position cells.
///
/// Positions are read by every loop (oracle callers, monitors, renderer)
/// and written by the owning actor right after it dispatches a move.
/// Each cell packs (x, y) into one `AtomicU64` so readers never observe
/// a half-updated pair.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Element {
    Fire,
    Water,
}

impl Element {
    pub fn opposite(self) -> Element {
        match self {
            Element::Fire => Element::Water,
            Element::Water => Element::Fire,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Actor {
    FirePlayer,
    WaterPlayer,
    FireEnemy,
    WaterEnemy,
}

impl Actor {
    pub const ALL: [Actor; 4] = [
        Actor::FirePlayer,
        Actor::WaterPlayer,
        Actor::FireEnemy,
        Actor::WaterEnemy,
    ];

    pub fn element(self) -> Element {
        match self {
            Actor::FirePlayer | Actor::FireEnemy => Element::Fire,
            Actor::WaterPlayer | Actor::WaterEnemy => Element::Water,
        }
    }

    pub fn player(self) -> Option<Player> {
        match self {
            Actor::FirePlayer => Some(Player::Fire),
            Actor::WaterPlayer => Some(Player::Water),
            _ => None,
        }
    }

    pub fn overlay(self) -> Tile {
        match self {
            Actor::FirePlayer => Tile::FirePlayer,
            Actor::WaterPlayer => Tile::WaterPlayer,
            Actor::FireEnemy => Tile::FireEnemy,
            Actor::WaterEnemy => Tile::WaterEnemy,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The two player characters. Narrower than `Actor` so that
/// player-only state (start position, last-visited memento) is
/// indexed without a fallible match.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Player {
    Fire,
    Water,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::Fire, Player::Water];

    pub fn actor(self) -> Actor {
        match self {
            Player::Fire => Actor::FirePlayer,
            Player::Water => Actor::WaterPlayer,
        }
    }

    /// The enemy that hunts this player.
    pub fn hunter(self) -> Actor {
        match self {
            Player::Fire => Actor::WaterEnemy,
            Player::Water => Actor::FireEnemy,
        }
    }

    pub fn element(self) -> Element {
        self.actor().element()
    }

    /// Status line shown when this player is sent back to start.
    pub fn reset_message(self) -> &'static str {
        match self {
            Player::Fire => "Fire extinguished",
            Player::Water => "Water evaporated",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(s: &str) -> Option<Player> {
        match s.to_lowercase().as_str() {
            "fire" => Some(Player::Fire),
            "water" => Some(Player::Water),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Fire => write!(f, "fire"),
            Player::Water => write!(f, "water"),
        }
    }
}

/// Movement direction for a single step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Pos {
        Pos { x: self.x + dx, y: self.y + dy }
    }

    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    fn pack(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    fn unpack(bits: u64) -> Pos {
        Pos {
            x: (bits >> 32) as u32 as i32,
            y: bits as u32 as i32,
        }
    }
}

/// Current position of every actor.
pub struct Positions {
    cells: [AtomicU64; 4],
}

impl Positions {
    pub fn new(initial: [Pos; 4]) -> Self {
        Positions {
            cells: initial.map(|p| AtomicU64::new(p.pack())),
        }
    }

    #[inline]
    pub fn get(&self, actor: Actor) -> Pos {
        Pos::unpack(self.cells[actor.index()].load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, actor: Actor, pos: Pos) {
        self.cells[actor.index()].store(pos.pack(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_position_keeps_negative_coordinates() {
        let p = Positions::new([Pos::default(); 4]);
        p.set(Actor::FireEnemy, Pos::new(-3, 7));
        assert_eq!(p.get(Actor::FireEnemy), Pos::new(-3, 7));
        assert_eq!(p.get(Actor::WaterEnemy), Pos::new(0, 0));
    }

    #[test]
    fn hunters_are_the_opposite_element() {
        for player in Player::BOTH {
            assert_eq!(player.hunter().element(), player.element().opposite());
            assert_eq!(player.hunter().player(), None);
        }
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(Pos::new(1, 1).manhattan(Pos::new(4, 5)), 7);
        assert_eq!(Pos::new(4, 5).manhattan(Pos::new(1, 1)), 7);
    }
}
