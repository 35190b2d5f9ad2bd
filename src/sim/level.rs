/// Map loader.
///
/// ## Format
///   Plain text, one line per grid row. Columns are characters, so
///   Unicode glyphs and ASCII aliases can be mixed freely.
///
/// ## Tile legend:
///   '▤' / '#' = Wall            '▒' / '=' = Gate
///   '◙' / 'B' = Button          '♣' / '%' = Vegetation
///   '▲' / '^' = Fire hazard     '≈' / '~' = Water hazard
///   '○' / 'F' = Fire player     '●' / 'W' = Water player
///   '◇' / 'f' = Fire enemy      '◆' / 'w' = Water enemy
///   anything else = Empty
///
/// Actor glyphs record a start position and are stored as Empty.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::actor::{Actor, Pos};
use crate::domain::tile::Tile;
use super::world::{Grid, InitialState};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("cannot read map {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read and parse a map file.
pub fn load_map(path: &Path) -> Result<InitialState, MapError> {
    let text = std::fs::read_to_string(path).map_err(|source| MapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let init = parse_map(&text);
    info!(
        path = %path.display(),
        width = init.grid.width(),
        height = init.grid.height(),
        "map loaded"
    );
    Ok(init)
}

/// Parse map text. Never fails: unknown glyphs become Empty and a
/// missing actor glyph leaves that actor at (0, 0).
pub fn parse_map(text: &str) -> InitialState {
    let mut found: [Option<Pos>; 4] = [None; 4];
    let mut rows = Vec::new();

    for (y, line) in text.lines().enumerate() {
        let mut row = Vec::with_capacity(line.len());
        for (x, ch) in line.chars().enumerate() {
            let tile = Tile::from_glyph(ch);
            let actor = Actor::ALL.into_iter().find(|a| a.overlay() == tile);
            match actor {
                Some(actor) => {
                    found[actor as usize] = Some(Pos::new(x as i32, y as i32));
                    row.push(Tile::Empty);
                }
                None => row.push(tile),
            }
        }
        rows.push(row);
    }

    for actor in Actor::ALL {
        if found[actor as usize].is_none() {
            warn!(?actor, "map has no start glyph, placing at (0, 0)");
        }
    }

    let [fire, water, fire_enemy, water_enemy] = found.map(Option::unwrap_or_default);
    InitialState {
        grid: Grid::new(rows),
        players: [fire, water],
        enemies: [fire_enemy, water_enemy],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn actor_glyphs_become_positions_and_empty_cells() {
        let init = parse_map("▤○ ◇▤\n▤● ◆▤\n");
        assert_eq!(init.players, [Pos::new(1, 0), Pos::new(1, 1)]);
        assert_eq!(init.enemies, [Pos::new(3, 0), Pos::new(3, 1)]);
        assert_eq!(init.grid, Grid::from_rows(&["#   #", "#   #"]));
    }

    #[test]
    fn ascii_aliases_match_unicode_glyphs() {
        let a = parse_map("#=B%^~\nF W f w");
        let b = parse_map("▤▒◙♣▲≈\n○ ● ◇ ◆");
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.players, b.players);
        assert_eq!(a.enemies, b.enemies);
    }

    #[test]
    fn unknown_glyphs_are_empty_and_rows_keep_their_length() {
        let init = parse_map(".X.\n..");
        assert_eq!(init.grid.get(Pos::new(1, 0)), Some(Tile::Empty));
        assert_eq!(init.grid.rows()[0].len(), 3);
        assert_eq!(init.grid.rows()[1].len(), 2);
    }

    #[test]
    fn missing_actors_default_to_origin() {
        let init = parse_map("   ");
        assert_eq!(init.players, [Pos::new(0, 0); 2]);
        assert_eq!(init.enemies, [Pos::new(0, 0); 2]);
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "F ~ W").unwrap();
        let init = load_map(file.path()).unwrap();
        assert_eq!(init.grid.get(Pos::new(2, 0)), Some(Tile::WaterHazard));
        assert_eq!(init.players, [Pos::new(0, 0), Pos::new(4, 0)]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_map(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, MapError::Read { .. }));
        assert!(err.to_string().contains("nope.txt"));
    }
}
