/// Entry rules, truth-table driven.
///
/// Pure function of the target tile and the actor asking. Encodes
/// "may this actor step here" without performing anything.
///
/// ┌────────────────────────────────────────┬──────────────┐
/// │ Condition (priority order)              │ Result       │
/// ├────────────────────────────────────────┼──────────────┤
/// │ target outside the grid                 │ Blocked      │
/// │ target tile tangible                    │ Blocked      │
/// │ player + hazard of the opposite element │ Hazard       │
/// │ otherwise (incl. own-element hazard,    │ Open         │
/// │   any hazard for enemies / no actor)    │              │
/// └────────────────────────────────────────┴──────────────┘

use super::actor::{Actor, Player};
use super::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Entry {
    Open,
    Blocked,
    /// Entry refused and the player must be sent back to start.
    Hazard(Player),
}

impl Entry {
    pub fn is_open(self) -> bool {
        self == Entry::Open
    }
}

/// `target` is `None` when the coordinates fall outside the grid.
pub fn classify_entry(target: Option<Tile>, actor: Option<Actor>) -> Entry {
    let Some(tile) = target else { return Entry::Blocked };
    if tile.is_tangible() {
        return Entry::Blocked;
    }
    if let (Some(element), Some(player)) = (tile.hazard(), actor.and_then(Actor::player)) {
        if element == player.element().opposite() {
            return Entry::Hazard(player);
        }
    }
    Entry::Open
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN_TILES: [Tile; 3] = [Tile::Empty, Tile::Vegetation, Tile::Button];

    #[test]
    fn outside_the_grid_is_blocked_for_everyone() {
        assert_eq!(classify_entry(None, None), Entry::Blocked);
        for actor in Actor::ALL {
            assert_eq!(classify_entry(None, Some(actor)), Entry::Blocked);
        }
    }

    #[test]
    fn tangible_tiles_are_blocked() {
        for tile in [Tile::Wall, Tile::Gate, Tile::FireEnemy, Tile::WaterPlayer] {
            assert_eq!(classify_entry(Some(tile), None), Entry::Blocked);
            assert_eq!(classify_entry(Some(tile), Some(Actor::FirePlayer)), Entry::Blocked);
        }
    }

    #[test]
    fn open_tiles_are_open() {
        for tile in OPEN_TILES {
            for actor in Actor::ALL {
                assert!(classify_entry(Some(tile), Some(actor)).is_open());
            }
        }
    }

    #[test]
    fn opposite_hazard_resets_player() {
        assert_eq!(
            classify_entry(Some(Tile::WaterHazard), Some(Actor::FirePlayer)),
            Entry::Hazard(Player::Fire)
        );
        assert_eq!(
            classify_entry(Some(Tile::FireHazard), Some(Actor::WaterPlayer)),
            Entry::Hazard(Player::Water)
        );
    }

    #[test]
    fn own_hazard_is_walkable() {
        assert!(classify_entry(Some(Tile::FireHazard), Some(Actor::FirePlayer)).is_open());
        assert!(classify_entry(Some(Tile::WaterHazard), Some(Actor::WaterPlayer)).is_open());
    }

    #[test]
    fn enemies_ignore_hazards() {
        for tile in [Tile::FireHazard, Tile::WaterHazard] {
            assert!(classify_entry(Some(tile), Some(Actor::FireEnemy)).is_open());
            assert!(classify_entry(Some(tile), Some(Actor::WaterEnemy)).is_open());
            assert!(classify_entry(Some(tile), None).is_open());
        }
    }
}
