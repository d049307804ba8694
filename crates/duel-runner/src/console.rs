//! Console prompts and announcements.

use std::io::{self, BufRead, Write};
use std::path::Path;

use duel_device::DisplayIndicator;
use duel_host::{DuelOutcome, SessionConfig};

use crate::error::RunnerError;

/// Prompt for a value, falling back to the default on a blank answer.
pub fn request_input(prompt: &str, default: &str) -> io::Result<String> {
    print!("{prompt} [{default}]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let input = input.trim();
    Ok(if input.is_empty() { default.to_string() } else { input.to_string() })
}

/// Ask a yes/no question until the answer is one of the two.
pub fn request_yes_no(prompt: &str) -> io::Result<bool> {
    loop {
        let answer = request_input(prompt, "Y")?;
        match answer.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            _ => {}
        }
    }
}

/// Build the session config from an optional YAML file, CLI flags, and
/// interactive prompts, in that order of precedence (later wins).
pub fn resolve_session_config(
    config_path: Option<&Path>,
    player_one: Option<String>,
    player_two: Option<String>,
    interactive: bool,
) -> Result<SessionConfig, RunnerError> {
    let mut config = match config_path {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };

    if let Some(name) = player_one {
        config.player_one_name = name;
    } else if interactive {
        config.player_one_name = request_input("Player 1 Name", &config.player_one_name)?;
    }

    if let Some(name) = player_two {
        config.player_two_name = name;
    } else if interactive {
        config.player_two_name = request_input("Player 2 Name", &config.player_two_name)?;
    }

    Ok(config)
}

/// Announce a resolved round.
pub fn announce_winner(outcome: &DuelOutcome) {
    println!(
        "{} wins with a reaction of {:.2} seconds!",
        outcome.winner_name, outcome.reaction_seconds
    );
}

/// Announce a premature press.
pub fn announce_early(player_name: &str) {
    println!("Too early {player_name}, keep going!");
}

/// Render a device display indicator to the terminal.
///
/// Text indicators print as text; LED patterns print as a 5x5 grid, the way
/// the reference device's matrix shows them.
pub fn render_display(indicator: DisplayIndicator) {
    if let Some(text) = indicator.text() {
        println!("[display] {text}");
        return;
    }
    if let Some(rows) = indicator.leds() {
        println!("[display]");
        for row in rows {
            let line: String = row.iter().map(|&lit| if lit { '#' } else { '.' }).collect();
            println!("  {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_without_prompting() {
        let config = resolve_session_config(None, None, None, false).unwrap();
        assert_eq!(config.player_one_name, "P1");
        assert_eq!(config.player_two_name, "P2");
    }

    #[test]
    fn test_cli_names_override_defaults() {
        let config =
            resolve_session_config(None, Some("Ada".to_string()), Some("Brin".to_string()), false)
                .unwrap();
        assert_eq!(config.player_one_name, "Ada");
        assert_eq!(config.player_two_name, "Brin");
    }

    #[test]
    fn test_yaml_config_loads() {
        let dir = std::env::temp_dir().join("rxnduel-console-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.yaml");
        std::fs::write(&path, "player_one_name: Ada\nmax_duel_secs: 5\n").unwrap();

        let config = resolve_session_config(Some(&path), None, None, false).unwrap();
        assert_eq!(config.player_one_name, "Ada");
        assert_eq!(config.player_two_name, "P2");
        assert_eq!(config.max_duel_secs, 5);
    }
}
