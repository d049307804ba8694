//! Simulated players for demo mode.
//!
//! A simulated player watches the device display the way a human would: when
//! the live pattern appears they press their button after a normally
//! distributed reaction time, and occasionally they jump the gun during the
//! armed phase.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use duel_device::{DisplayIndicator, PlayerButton};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::error::RunnerError;

/// Floor on simulated reaction times; nobody reacts in single-digit millis.
const MIN_REACTION_MS: f64 = 60.0;

/// Behaviour of one simulated player.
#[derive(Debug, Clone)]
pub struct SimPlayerConfig {
    /// Which button this player presses.
    pub button: PlayerButton,
    /// Mean reaction time after the live pattern appears, milliseconds.
    pub mean_reaction_ms: f64,
    /// Standard deviation of the reaction time, milliseconds.
    pub reaction_sd_ms: f64,
    /// Probability of pressing early while the device is still armed.
    pub early_press_chance: f64,
}

impl SimPlayerConfig {
    /// A reasonable human-ish profile for the given button.
    pub fn human(button: PlayerButton) -> Self {
        SimPlayerConfig {
            button,
            mean_reaction_ms: match button {
                PlayerButton::A => 260.0,
                PlayerButton::B => 290.0,
            },
            reaction_sd_ms: 45.0,
            early_press_chance: 0.08,
        }
    }
}

/// Spawn a simulated player watching display updates.
///
/// The thread exits when the display channel closes.
pub fn spawn_player(
    config: SimPlayerConfig,
    displays: Receiver<DisplayIndicator>,
    buttons: Sender<PlayerButton>,
) -> Result<JoinHandle<()>, RunnerError> {
    let reaction = Normal::new(config.mean_reaction_ms, config.reaction_sd_ms)
        .map_err(|e| RunnerError::SimPlayer(format!("reaction distribution: {e}")))?;
    if !(0.0..=1.0).contains(&config.early_press_chance) {
        return Err(RunnerError::SimPlayer(format!(
            "early_press_chance {} out of [0, 1]",
            config.early_press_chance
        )));
    }

    let handle = thread::Builder::new()
        .name(format!("sim-player-{:?}", config.button))
        .spawn(move || {
            let mut rng = StdRng::from_entropy();
            while let Ok(display) = displays.recv() {
                match display {
                    DisplayIndicator::Armed if rng.gen_bool(config.early_press_chance) => {
                        thread::sleep(Duration::from_millis(rng.gen_range(150..500)));
                        if buttons.send(config.button).is_err() {
                            break;
                        }
                        debug!("simulated {:?} pressed early", config.button);
                    }
                    DisplayIndicator::Live => {
                        let ms = reaction.sample(&mut rng).max(MIN_REACTION_MS);
                        thread::sleep(Duration::from_millis(ms as u64));
                        if buttons.send(config.button).is_err() {
                            break;
                        }
                        debug!("simulated {:?} reacted after {ms:.0} ms", config.button);
                    }
                    _ => {}
                }
            }
        })?;

    Ok(handle)
}
