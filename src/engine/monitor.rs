/// Periodic monitors: proximity alerts and enemy collisions.
///
/// Both only read positions. Proximity talks to the enemy patrols over
/// rendezvous channels; collision resets go through the serializer.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::domain::actor::Player;
use crate::sim::event::ResetCause;
use crate::sim::serializer::MoveSender;
use crate::sim::world::WorldView;

// ── Proximity ──

/// Tells each enemy whether the player it hunts is within range.
pub struct ProximityMonitor {
    world: WorldView,
    distance: i32,
    interval: Duration,
    /// (hunted player, channel to its hunter), in send order.
    alerts: Vec<(Player, Sender<bool>)>,
}

impl ProximityMonitor {
    pub fn new(world: WorldView, distance: i32, interval: Duration) -> Self {
        ProximityMonitor { world, distance, interval, alerts: vec![] }
    }

    /// Register the alert channel of `player`'s hunter. Channels are
    /// served in registration order each cycle.
    pub fn notify(&mut self, player: Player, hunter: Sender<bool>) {
        self.alerts.push((player, hunter));
    }

    /// Is `player`'s hunter within alert distance?
    pub fn in_range(&self, player: Player) -> bool {
        let hunter = self.world.position(player.hunter());
        let prey = self.world.position(player.actor());
        hunter.manhattan(prey) <= self.distance
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("proximity".into())
            .spawn(move || self.run())
    }

    /// Each send blocks until the enemy polls for it.
    pub fn run(self) {
        debug!("proximity monitor started");
        loop {
            for (player, tx) in &self.alerts {
                if tx.send(self.in_range(*player)).is_err() {
                    debug!("proximity monitor stopped");
                    return;
                }
            }
            thread::sleep(self.interval);
        }
    }
}

// ── Collision ──

/// Resets any player standing on the same cell as its hunter.
pub struct CollisionMonitor {
    world: WorldView,
    moves: MoveSender,
    interval: Duration,
}

impl CollisionMonitor {
    pub fn new(world: WorldView, moves: MoveSender, interval: Duration) -> Self {
        CollisionMonitor { world, moves, interval }
    }

    pub fn caught(&self) -> Vec<Player> {
        Player::BOTH
            .into_iter()
            .filter(|p| self.world.position(p.hunter()) == self.world.position(p.actor()))
            .collect()
    }

    /// Queue resets for every caught player. Returns false once the
    /// serializer is gone.
    pub fn check(&self) -> bool {
        for player in self.caught() {
            info!(%player, "caught by enemy");
            if !self.moves.reset(player, ResetCause::Caught) {
                return false;
            }
        }
        true
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("collision".into())
            .spawn(move || self.run())
    }

    pub fn run(self) {
        debug!("collision monitor started");
        while self.check() {
            thread::sleep(self.interval);
        }
        debug!("collision monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};

    use crate::domain::actor::{Actor, Pos};
    use crate::sim::level::parse_map;
    use crate::sim::serializer::{channel, Command, MoveSerializer};
    use crate::sim::world::{ActorHandle, World};

    fn world(map: &str) -> (WorldView, crate::sim::world::WorldWriter, [ActorHandle; 4]) {
        World::split(parse_map(map))
    }

    #[test]
    fn alert_distance_is_inclusive() {
        // Fire player at 0, water enemy (its hunter) at 15.
        let (view, _w, handles) = world("F              w\nW               f");
        let mon = ProximityMonitor::new(view, 15, Duration::from_millis(1));
        assert!(mon.in_range(Player::Fire));
        handles[3].set_position(Pos::new(16, 0));
        assert!(!mon.in_range(Player::Fire));
    }

    #[test]
    fn distance_is_manhattan() {
        let (view, _w, handles) = world("F  \n   \nW f");
        let mon = ProximityMonitor::new(view, 3, Duration::from_millis(1));
        // Water player (0,2), fire enemy (2,2).
        assert!(mon.in_range(Player::Water));
        handles[2].set_position(Pos::new(2, 0));
        assert!(!mon.in_range(Player::Water));
        handles[2].set_position(Pos::new(1, 0));
        assert!(mon.in_range(Player::Water));
    }

    #[test]
    fn alerts_are_sent_in_registration_order() {
        let (view, _w, _) = world("Fw \nWf ");
        let mut mon = ProximityMonitor::new(view, 1, Duration::from_millis(1));
        let (water_tx, water_rx) = bounded(0);
        let (fire_tx, fire_rx) = bounded(0);
        mon.notify(Player::Fire, water_tx);
        mon.notify(Player::Water, fire_tx);
        let handle = mon.spawn().unwrap();

        // The second enemy cannot be served until the first one polls.
        assert!(fire_rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert_eq!(water_rx.recv().unwrap(), true);
        assert_eq!(fire_rx.recv().unwrap(), true);

        drop(water_rx);
        drop(fire_rx);
        handle.join().unwrap();
    }

    #[test]
    fn collision_resets_only_the_hunted_player() {
        let (view, writer, handles) = world("F w \nW f ");
        let (moves, rx) = channel(16);
        let (ev_tx, _ev) = unbounded();
        let mut ser = MoveSerializer::new(writer, rx, ev_tx);
        let mon = CollisionMonitor::new(view.clone(), moves, Duration::from_millis(1));

        // Fire enemy on the fire player's cell does nothing.
        handles[2].set_position(Pos::new(0, 0));
        assert!(mon.caught().is_empty());

        // Water enemy on the fire player's cell resets it.
        handles[0].set_position(Pos::new(1, 0));
        handles[3].set_position(Pos::new(1, 0));
        assert_eq!(mon.caught(), vec![Player::Fire]);
        assert!(mon.check());
        ser.drain();
        assert_eq!(view.position(Actor::FirePlayer), Pos::new(0, 0));
        assert_eq!(view.status(), "Fire extinguished");
    }

    #[test]
    fn both_players_can_be_caught_at_once() {
        let (view, _w, handles) = world("F w \nW f ");
        let (moves, rx) = channel(16);
        let mon = CollisionMonitor::new(view, moves, Duration::from_millis(1));
        handles[3].set_position(Pos::new(0, 0));
        handles[2].set_position(Pos::new(0, 1));
        assert!(mon.check());
        let cmds: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            cmds,
            vec![
                Command::Reset { player: Player::Fire, cause: ResetCause::Caught },
                Command::Reset { player: Player::Water, cause: ResetCause::Caught },
            ]
        );
    }
}
