pub mod config;
pub mod play;
pub mod simulate_room;

use std::path::Path;

use eq_core::GameRules;

/// Load game rules from a JSON file, or the defaults when no file is given.
fn load_rules(path: Option<&Path>) -> Result<GameRules, String> {
    let Some(path) = path else {
        return Ok(GameRules::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    GameRules::from_json(&text).map_err(|e| format!("invalid rules in {}: {e}", path.display()))
}

/// Runtime for the async commands.
fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))
}
