/// Keyboard input.
///
/// Each key press (or auto-repeat) becomes at most one `InputEvent`:
///   W A S D   move the fire player
///   I J K L   move the water player
///   E         interact
///   Esc       quit (Ctrl+C too, since raw mode swallows SIGINT)
///
/// Letters match case-insensitively so Caps Lock does not lock the game.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::actor::{MoveDir, Player};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    Move(Player, MoveDir),
    Interact,
    Quit,
}

/// Translate one key event. Releases and unbound keys yield `None`.
pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(InputEvent::Quit),
            _ => None,
        };
    }
    let ch = match key.code {
        KeyCode::Esc => return Some(InputEvent::Quit),
        KeyCode::Char(c) => c.to_ascii_lowercase(),
        _ => return None,
    };
    let ev = match ch {
        'w' => InputEvent::Move(Player::Fire, MoveDir::Up),
        'a' => InputEvent::Move(Player::Fire, MoveDir::Left),
        's' => InputEvent::Move(Player::Fire, MoveDir::Down),
        'd' => InputEvent::Move(Player::Fire, MoveDir::Right),
        'i' => InputEvent::Move(Player::Water, MoveDir::Up),
        'j' => InputEvent::Move(Player::Water, MoveDir::Left),
        'k' => InputEvent::Move(Player::Water, MoveDir::Down),
        'l' => InputEvent::Move(Player::Water, MoveDir::Right),
        'e' => InputEvent::Interact,
        _ => return None,
    };
    Some(ev)
}

/// Drain every pending terminal event without blocking.
pub fn drain_keys(out: &mut Vec<InputEvent>) {
    while poll(Duration::ZERO).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            out.extend(map_key(key));
        }
    }
}
