/// Tile palette and per-tile properties.
/// Appearance and passability are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use crossterm::style::Color;

use super::actor::Element;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Vegetation,
    Gate,
    Button,
    FireHazard,
    WaterHazard,
    // Overlays: drawn on top of the grid, never stored while occupied.
    FirePlayer,
    WaterPlayer,
    FireEnemy,
    WaterEnemy,
}

const WALL_FG: Color = Color::Black;
const WALL_BG: Color = Color::DarkGrey;

impl Tile {
    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Wall => '▤',
            Tile::Vegetation => '♣',
            Tile::Gate => '▒',
            Tile::Button => '◙',
            Tile::FireHazard => '▲',
            Tile::WaterHazard => '≈',
            Tile::FirePlayer => '○',
            Tile::WaterPlayer => '●',
            Tile::FireEnemy => '◇',
            Tile::WaterEnemy => '◆',
        }
    }

    pub fn fg(self) -> Color {
        match self {
            Tile::Wall => WALL_FG,
            Tile::Vegetation => Color::Green,
            Tile::FireHazard | Tile::FirePlayer | Tile::FireEnemy => Color::Red,
            Tile::WaterHazard | Tile::WaterPlayer | Tile::WaterEnemy => Color::Blue,
            _ => Color::Reset,
        }
    }

    pub fn bg(self) -> Color {
        match self {
            Tile::Wall => WALL_BG,
            _ => Color::Reset,
        }
    }

    /// Does this tile block entry for every actor?
    pub fn is_tangible(self) -> bool {
        matches!(
            self,
            Tile::Wall
                | Tile::Gate
                | Tile::FirePlayer
                | Tile::WaterPlayer
                | Tile::FireEnemy
                | Tile::WaterEnemy
        )
    }

    /// Element of a hazard tile, if this is one.
    pub fn hazard(self) -> Option<Element> {
        match self {
            Tile::FireHazard => Some(Element::Fire),
            Tile::WaterHazard => Some(Element::Water),
            _ => None,
        }
    }

    /// Map-file legend. Unicode glyphs and ASCII aliases both parse.
    /// Actor start glyphs map to their overlay tiles; the loader
    /// records them as positions and stores `Empty` instead.
    pub fn from_glyph(ch: char) -> Tile {
        match ch {
            '▤' | '#' => Tile::Wall,
            '▒' | '=' => Tile::Gate,
            '◙' | 'B' => Tile::Button,
            '♣' | '%' => Tile::Vegetation,
            '▲' | '^' => Tile::FireHazard,
            '≈' | '~' => Tile::WaterHazard,
            '○' | 'F' => Tile::FirePlayer,
            '●' | 'W' => Tile::WaterPlayer,
            '◇' | 'f' => Tile::FireEnemy,
            '◆' | 'w' => Tile::WaterEnemy,
            _ => Tile::Empty,
        }
    }
}
