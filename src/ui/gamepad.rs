/// Gamepad input using gilrs.
///
/// The first pad that sends anything drives the fire player, the second
/// the water player; further pads are ignored. Every D-pad press or
/// stick push past the deadzone is one step, like a key press.
///
/// Default mapping (interact / quit come from config.toml):
///   D-pad / Left Stick    →  Movement
///   A                     →  Interact
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::actor::{MoveDir, Player};
use super::input::InputEvent;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical face/shoulder button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }
}

/// A pad event, reduced to what the game cares about.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PadInput {
    Button(Btn),
    Dpad(MoveDir),
    StickX(f32),
    StickY(f32),
}

#[cfg(feature = "gamepad")]
impl PadInput {
    fn from_gilrs(event: &EventType) -> Option<PadInput> {
        let input = match *event {
            EventType::ButtonPressed(btn, _) => match btn {
                Button::DPadUp    => PadInput::Dpad(MoveDir::Up),
                Button::DPadDown  => PadInput::Dpad(MoveDir::Down),
                Button::DPadLeft  => PadInput::Dpad(MoveDir::Left),
                Button::DPadRight => PadInput::Dpad(MoveDir::Right),
                Button::South     => PadInput::Button(Btn::A),
                Button::East      => PadInput::Button(Btn::B),
                Button::West      => PadInput::Button(Btn::X),
                Button::North     => PadInput::Button(Btn::Y),
                Button::LeftTrigger   => PadInput::Button(Btn::L1),
                Button::RightTrigger  => PadInput::Button(Btn::R1),
                Button::LeftTrigger2  => PadInput::Button(Btn::L2),
                Button::RightTrigger2 => PadInput::Button(Btn::R2),
                Button::Start     => PadInput::Button(Btn::Start),
                Button::Select    => PadInput::Button(Btn::Select),
                _ => return None,
            },
            EventType::AxisChanged(Axis::LeftStickX, v, _) => PadInput::StickX(v),
            EventType::AxisChanged(Axis::LeftStickY, v, _) => PadInput::StickY(v),
            _ => return None,
        };
        Some(input)
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    interact: Vec<Btn>,
    quit: Vec<Btn>,
}

impl ActionMap {
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: Btn) -> Vec<Btn> {
            let list: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if list.is_empty() { vec![fallback] } else { list }
        }
        ActionMap {
            interact: parse_list(&cfg.interact, Btn::A),
            quit: parse_list(&cfg.quit, Btn::Select),
        }
    }
}

// ── Per-pad state ──

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
struct PadState {
    player: Player,
    stick_x: f32,
    stick_y: f32,
    stick_dir: Option<MoveDir>,
}

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
impl PadState {
    fn new(player: Player) -> Self {
        PadState { player, stick_x: 0.0, stick_y: 0.0, stick_dir: None }
    }

    fn apply(&mut self, input: PadInput, map: &ActionMap) -> Option<InputEvent> {
        match input {
            PadInput::Dpad(dir) => Some(InputEvent::Move(self.player, dir)),
            PadInput::Button(btn) if map.quit.contains(&btn) => Some(InputEvent::Quit),
            // Only the fire player's pad reports position.
            PadInput::Button(btn) if map.interact.contains(&btn) && self.player == Player::Fire => {
                Some(InputEvent::Interact)
            }
            PadInput::Button(_) => None,
            PadInput::StickX(v) => {
                self.stick_x = v;
                self.stick_edge()
            }
            PadInput::StickY(v) => {
                self.stick_y = v;
                self.stick_edge()
            }
        }
    }

    /// One step each time the stick enters a new direction.
    fn stick_edge(&mut self) -> Option<InputEvent> {
        let (x, y) = (self.stick_x, self.stick_y);
        let dir = if x.abs() >= y.abs() && x.abs() > STICK_DEADZONE {
            Some(if x < 0.0 { MoveDir::Left } else { MoveDir::Right })
        } else if y.abs() > STICK_DEADZONE {
            // gilrs reports up as positive.
            Some(if y > 0.0 { MoveDir::Up } else { MoveDir::Down })
        } else {
            None
        };
        let fresh = dir.filter(|d| self.stick_dir != Some(*d));
        self.stick_dir = dir;
        fresh.map(|d| InputEvent::Move(self.player, d))
    }
}

/// Pads in arrival order, each bound to the next free player.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
struct Seats<K> {
    pads: Vec<(K, PadState)>,
}

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
impl<K: PartialEq> Seats<K> {
    fn new() -> Self {
        Seats { pads: Vec::with_capacity(2) }
    }

    fn get_or_seat(&mut self, key: K) -> Option<&mut PadState> {
        let idx = match self.pads.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                let player = *Player::BOTH.get(self.pads.len())?;
                self.pads.push((key, PadState::new(player)));
                self.pads.len() - 1
            }
        };
        Some(&mut self.pads[idx].1)
    }
}

pub struct Gamepads {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    #[cfg(feature = "gamepad")]
    seats: Seats<GamepadId>,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    map: ActionMap,
}

impl Gamepads {
    pub fn new(cfg: &GamepadConfig) -> Self {
        Gamepads {
            #[cfg(feature = "gamepad")]
            gilrs: match Gilrs::new() {
                Ok(g) => Some(g),
                Err(e) => {
                    tracing::warn!("gamepad support unavailable: {e}");
                    None
                }
            },
            #[cfg(feature = "gamepad")]
            seats: Seats::new(),
            map: ActionMap::from_config(cfg),
        }
    }

    /// Translate every pending pad event.
    #[cfg(feature = "gamepad")]
    pub fn drain(&mut self, out: &mut Vec<InputEvent>) {
        let Some(gilrs) = &mut self.gilrs else { return };
        while let Some(event) = gilrs.next_event() {
            if let EventType::Disconnected = event.event {
                if let Some((_, pad)) = self.seats.pads.iter_mut().find(|(id, _)| *id == event.id) {
                    pad.stick_dir = None;
                }
                continue;
            }
            let Some(input) = PadInput::from_gilrs(&event.event) else { continue };
            if let Some(pad) = self.seats.get_or_seat(event.id) {
                if let Some(ev) = pad.apply(input, &self.map) {
                    tracing::trace!(player = %pad.player, ?ev, "gamepad input");
                    out.push(ev);
                }
            }
        }
    }

    #[cfg(not(feature = "gamepad"))]
    pub fn drain(&mut self, _out: &mut Vec<InputEvent>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ActionMap {
        ActionMap::from_config(&GamepadConfig {
            interact: vec!["A".into()],
            quit: vec!["Select".into(), "Start".into()],
        })
    }

    #[test]
    fn first_two_pads_take_fire_then_water() {
        let mut seats = Seats::new();
        assert_eq!(seats.get_or_seat(7).map(|p| p.player), Some(Player::Fire));
        assert_eq!(seats.get_or_seat(3).map(|p| p.player), Some(Player::Water));
        assert_eq!(seats.get_or_seat(7).map(|p| p.player), Some(Player::Fire));
        assert!(seats.get_or_seat(9).is_none());
    }

    #[test]
    fn dpad_moves_the_seated_player() {
        let mut pad = PadState::new(Player::Water);
        assert_eq!(
            pad.apply(PadInput::Dpad(MoveDir::Left), &map()),
            Some(InputEvent::Move(Player::Water, MoveDir::Left))
        );
    }

    #[test]
    fn configured_buttons_map_to_actions() {
        let m = map();
        let mut fire = PadState::new(Player::Fire);
        let mut water = PadState::new(Player::Water);
        assert_eq!(fire.apply(PadInput::Button(Btn::A), &m), Some(InputEvent::Interact));
        assert_eq!(water.apply(PadInput::Button(Btn::A), &m), None);
        assert_eq!(water.apply(PadInput::Button(Btn::Start), &m), Some(InputEvent::Quit));
        assert_eq!(fire.apply(PadInput::Button(Btn::B), &m), None);
    }

    #[test]
    fn stick_steps_once_per_push() {
        let m = map();
        let mut pad = PadState::new(Player::Fire);
        assert_eq!(pad.apply(PadInput::StickX(0.3), &m), None);
        assert_eq!(
            pad.apply(PadInput::StickX(0.9), &m),
            Some(InputEvent::Move(Player::Fire, MoveDir::Right))
        );
        // Still held: no repeat.
        assert_eq!(pad.apply(PadInput::StickX(1.0), &m), None);
        assert_eq!(pad.apply(PadInput::StickX(0.0), &m), None);
        assert_eq!(
            pad.apply(PadInput::StickY(0.8), &m),
            Some(InputEvent::Move(Player::Fire, MoveDir::Up))
        );
        assert_eq!(pad.apply(PadInput::StickY(0.0), &m), None);
        assert_eq!(
            pad.apply(PadInput::StickY(-0.8), &m),
            Some(InputEvent::Move(Player::Fire, MoveDir::Down))
        );
    }

    #[test]
    fn unknown_names_fall_back_to_defaults() {
        let m = ActionMap::from_config(&GamepadConfig { interact: vec!["nope".into()], quit: vec![] });
        assert_eq!(m.interact, vec![Btn::A]);
        assert_eq!(m.quit, vec![Btn::Select]);
        assert_eq!(Btn::from_name("rb"), Some(Btn::R1));
    }
}
