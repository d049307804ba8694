//! Command-line surface of `rxnduel`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reaction Duel: a two-player reflex game over a serial-equivalent link.
#[derive(Debug, Parser)]
#[command(name = "rxnduel", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play against a reflex-trigger device reachable over TCP.
    Play {
        /// Device address (`host:port` of the serial bridge).
        #[arg(short = 'd', long = "device")]
        device: Option<String>,

        /// The name of player 1.
        #[arg(short = '1', long = "player-one")]
        player_one: Option<String>,

        /// The name of player 2.
        #[arg(short = '2', long = "player-two")]
        player_two: Option<String>,

        /// YAML session config file; CLI flags override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run the reflex trigger locally and expose its serial endpoint on TCP.
    ///
    /// Button presses come from stdin: `a` presses the first button, `b` the
    /// second, `q` quits.
    ServeDevice {
        /// TCP port to listen on (0 picks an ephemeral port).
        #[arg(short, long, default_value_t = 4950)]
        port: u16,
    },

    /// Self-contained demo: host, device, and two simulated players.
    Demo {
        /// Number of rounds to play.
        #[arg(short, long, default_value_t = 3)]
        rounds: u32,

        /// The name of player 1.
        #[arg(short = '1', long = "player-one")]
        player_one: Option<String>,

        /// The name of player 2.
        #[arg(short = '2', long = "player-two")]
        player_two: Option<String>,
    },
}
