/// External configuration loader.
///
/// Reads the first `config.toml` found in the executable's directory, the
/// CWD, `~/.local/share/fire-and-water` or `/usr/share/fire-and-water`.
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::domain::actor::{Player, Pos};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub gates: Vec<GateConfig>,
    pub gamepad: GamepadConfig,
    pub log_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub patrol_ms: u64,     // enemy step interval, calm
    pub alert_ms: u64,      // enemy step interval, player nearby
    pub proximity_ms: u64,
    pub collision_ms: u64,
    pub gate_tick_ms: u64,  // one gate tile per tick
    pub frame_ms: u64,
}

impl SpeedConfig {
    pub fn patrol(&self) -> Duration { Duration::from_millis(self.patrol_ms) }
    pub fn alert(&self) -> Duration { Duration::from_millis(self.alert_ms) }
    pub fn proximity(&self) -> Duration { Duration::from_millis(self.proximity_ms) }
    pub fn collision(&self) -> Duration { Duration::from_millis(self.collision_ms) }
    pub fn gate_tick(&self) -> Duration { Duration::from_millis(self.gate_tick_ms) }
    pub fn frame(&self) -> Duration { Duration::from_millis(self.frame_ms) }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            patrol_ms: default_patrol(),
            alert_ms: default_alert(),
            proximity_ms: default_proximity(),
            collision_ms: default_collision(),
            gate_tick_ms: default_gate_tick(),
            frame_ms: default_frame(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    /// Manhattan distance at or under which an enemy goes on alert.
    pub alert_distance: i32,
    /// Pending move requests buffered ahead of the serializer (>= 1).
    pub move_queue: usize,
}

/// One gate: standing on `button` as `player` retracts the strip
/// `row`, columns `from..=to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateConfig {
    pub player: Player,
    pub button: Pos,
    pub row: i32,
    pub from: i32,
    pub to: i32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub interact: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default = "default_gates")]
    gates: Vec<TomlGate>,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_patrol")]
    patrol_ms: u64,
    #[serde(default = "default_alert")]
    alert_ms: u64,
    #[serde(default = "default_proximity")]
    proximity_ms: u64,
    #[serde(default = "default_collision")]
    collision_ms: u64,
    #[serde(default = "default_gate_tick")]
    gate_tick_ms: u64,
    #[serde(default = "default_frame")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_alert_distance")]
    alert_distance: i32,
    #[serde(default = "default_move_queue")]
    move_queue: usize,
}

#[derive(Deserialize, Debug, Clone)]
struct TomlGate {
    player: String,
    button: [i32; 2],
    row: i32,
    from: i32,
    to: i32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_interact")]
    interact: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    log_dir: Option<String>,
}

// ── Defaults ──

fn default_patrol() -> u64 { 500 }
fn default_alert() -> u64 { 35 }
fn default_proximity() -> u64 { 100 }
fn default_collision() -> u64 { 50 }
fn default_gate_tick() -> u64 { 100 }
fn default_frame() -> u64 { 16 }    // ~60 FPS
fn default_alert_distance() -> i32 { 15 }
fn default_move_queue() -> usize { 1 }

fn default_interact() -> Vec<String> { vec!["A".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

/// The stock map's two gates: the water player's button opens the west
/// gate, the fire player's button opens the east gate.
fn default_gates() -> Vec<TomlGate> {
    vec![
        TomlGate { player: "water".into(), button: [66, 24], row: 17, from: 1, to: 25 },
        TomlGate { player: "fire".into(), button: [13, 12], row: 17, from: 54, to: 78 },
    ]
}

impl Default for TomlConfig {
    fn default() -> Self {
        TomlConfig {
            speed: TomlSpeed::default(),
            rules: TomlRules::default(),
            gates: default_gates(),
            gamepad: TomlGamepad::default(),
            general: TomlGeneral::default(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            patrol_ms: default_patrol(),
            alert_ms: default_alert(),
            proximity_ms: default_proximity(),
            collision_ms: default_collision(),
            gate_tick_ms: default_gate_tick(),
            frame_ms: default_frame(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            alert_distance: default_alert_distance(),
            move_queue: default_move_queue(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            interact: default_interact(),
            quit: default_quit(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        GameConfig::load_from(&candidate_dirs())
    }

    /// First readable `config.toml` in `search_dirs` wins.
    fn load_from(search_dirs: &[PathBuf]) -> Self {
        for dir in search_dirs {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => return GameConfig::parse(&text),
                Err(e) => eprintln!("Warning: could not read {}: {e}", path.display()),
            }
        }
        GameConfig::default()
    }

    /// Parse a config document. Errors fall back to defaults.
    ///
    /// Runs before logging is up, so problems go to stderr.
    pub fn parse(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => GameConfig::from_toml(cfg),
            Err(e) => {
                eprintln!("Warning: config.toml parse error: {e}");
                eprintln!("Using default settings.");
                GameConfig::default()
            }
        }
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let gates = toml_cfg
            .gates
            .iter()
            .filter_map(|g| {
                let player = Player::from_name(&g.player);
                if player.is_none() {
                    warn!(player = %g.player, "ignoring gate with unknown player");
                }
                Some(GateConfig {
                    player: player?,
                    button: Pos::new(g.button[0], g.button[1]),
                    row: g.row,
                    from: g.from.min(g.to),
                    to: g.from.max(g.to),
                })
            })
            .collect();

        let log_dir = toml_cfg
            .general
            .log_dir
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);

        GameConfig {
            speed: SpeedConfig {
                patrol_ms: toml_cfg.speed.patrol_ms,
                alert_ms: toml_cfg.speed.alert_ms,
                proximity_ms: toml_cfg.speed.proximity_ms,
                collision_ms: toml_cfg.speed.collision_ms,
                gate_tick_ms: toml_cfg.speed.gate_tick_ms,
                frame_ms: toml_cfg.speed.frame_ms,
            },
            rules: RulesConfig {
                alert_distance: toml_cfg.rules.alert_distance,
                move_queue: toml_cfg.rules.move_queue.max(1),
            },
            gates,
            gamepad: GamepadConfig {
                interact: toml_cfg.gamepad.interact,
                quit: toml_cfg.gamepad.quit,
            },
            log_dir,
        }
    }
}

/// Platform cache directory for the log file.
fn default_log_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Caches/fire-and-water/logs");
        }
    }
    if let Some(cache) = std::env::var_os("XDG_CACHE_HOME") {
        return PathBuf::from(cache).join("fire-and-water/logs");
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".cache/fire-and-water/logs");
    }
    std::env::temp_dir().join("fire-and-water/logs")
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/fire-and-water)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/fire-and-water");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/fire-and-water");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::parse("");
        assert_eq!(cfg.speed.patrol_ms, 500);
        assert_eq!(cfg.speed.alert_ms, 35);
        assert_eq!(cfg.speed.proximity_ms, 100);
        assert_eq!(cfg.speed.collision_ms, 50);
        assert_eq!(cfg.speed.gate_tick_ms, 100);
        assert_eq!(cfg.rules.alert_distance, 15);
        assert_eq!(cfg.rules.move_queue, 1);
        assert_eq!(cfg.gates.len(), 2);
        assert_eq!(cfg.gates[0].player, Player::Water);
        assert_eq!(cfg.gates[0].button, Pos::new(66, 24));
        assert_eq!((cfg.gates[1].from, cfg.gates[1].to), (54, 78));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            r#"
            [speed]
            patrol_ms = 250

            [rules]
            move_queue = 0
            "#,
        );
        assert_eq!(cfg.speed.patrol_ms, 250);
        assert_eq!(cfg.speed.alert_ms, 35);
        assert_eq!(cfg.rules.move_queue, 1);
        assert_eq!(cfg.rules.alert_distance, 15);
    }

    #[test]
    fn custom_gates_replace_defaults() {
        let cfg = GameConfig::parse(
            r#"
            [[gates]]
            player = "Fire"
            button = [2, 3]
            row = 5
            from = 9
            to = 4

            [[gates]]
            player = "earth"
            button = [0, 0]
            row = 0
            from = 0
            to = 1
            "#,
        );
        assert_eq!(
            cfg.gates,
            vec![GateConfig { player: Player::Fire, button: Pos::new(2, 3), row: 5, from: 4, to: 9 }]
        );
    }

    #[test]
    fn broken_document_falls_back() {
        let cfg = GameConfig::parse("[speed\npatrol_ms = ");
        assert_eq!(cfg.speed.patrol_ms, 500);
        assert_eq!(cfg.gates.len(), 2);
    }

    #[test]
    fn first_directory_with_a_config_wins() {
        let empty = tempfile::tempdir().unwrap();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("config.toml"), "[speed]\npatrol_ms = 120\n").unwrap();
        std::fs::write(second.path().join("config.toml"), "[speed]\npatrol_ms = 900\n").unwrap();

        let dirs = [empty.path(), first.path(), second.path()].map(|p| p.to_path_buf());
        let cfg = GameConfig::load_from(&dirs);
        assert_eq!(cfg.speed.patrol_ms, 120);
        assert_eq!(cfg.speed.alert_ms, 35);
    }

    #[test]
    fn no_config_anywhere_gives_defaults() {
        let empty = tempfile::tempdir().unwrap();
        let cfg = GameConfig::load_from(&[empty.path().to_path_buf()]);
        assert_eq!(cfg.speed.patrol_ms, 500);
        assert_eq!(cfg.gates.len(), 2);
    }
}
