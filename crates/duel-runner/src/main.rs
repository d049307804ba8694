//! `rxnduel` binary entry point.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread;

use clap::Parser;
use crossbeam_channel::unbounded;
use duel_device::{DeviceConfig, PlayerButton};
use duel_host::{DuelCoordinator, HostError, SessionConfig};
use duel_link::loopback;
use tracing_subscriber::EnvFilter;

use duel_runner::cli::{Cli, Command};
use duel_runner::{console, device_service, sim_players, tcp_bridge, RunnerError};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Play { device, player_one, player_two, config } => {
            run_play(device, player_one, player_two, config)
        }
        Command::ServeDevice { port } => run_serve_device(port),
        Command::Demo { rounds, player_one, player_two } => {
            run_demo(rounds, player_one, player_two)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Route `early-<id>` reports to the console under the configured names.
fn install_early_announcer<L: duel_link::LineLink>(
    coordinator: &mut DuelCoordinator<L>,
    config: &SessionConfig,
) {
    let player_one = config.player_one_name.clone();
    let player_two = config.player_two_name.clone();
    coordinator.on_early_press(move |id| {
        let name = match id {
            duel_protocol::PLAYER_ONE => player_one.as_str(),
            duel_protocol::PLAYER_TWO => player_two.as_str(),
            other => other,
        };
        console::announce_early(name);
    });
}

fn run_play(
    device: Option<String>,
    player_one: Option<String>,
    player_two: Option<String>,
    config: Option<PathBuf>,
) -> Result<(), RunnerError> {
    let session = console::resolve_session_config(config.as_deref(), player_one, player_two, true)?;
    let device_addr = match device {
        Some(addr) => addr,
        None => console::request_input("Device address", "127.0.0.1:4950")?,
    };

    println!("Connecting to device at {device_addr}...");
    let (link, _bridge) = tcp_bridge::connect(&device_addr)?;
    println!("Connection established.");

    let mut coordinator = DuelCoordinator::new(link, session.clone())?;
    install_early_announcer(&mut coordinator, &session);

    let cancel = coordinator.cancel_flag();
    ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))?;

    println!("Initiating handshake...");
    if let Err(e) = coordinator.connect() {
        coordinator.shutdown();
        return Err(e.into());
    }
    println!("Handshake successful.");

    while console::request_yes_no("Ready to play? (Y/N)")? {
        println!("Starting Game...");
        match coordinator.play_round() {
            Ok(outcome) => {
                console::announce_winner(&outcome);
                coordinator.reset_round();
            }
            Err(HostError::Interrupted) => {
                println!("Interrupted, aborting duel.");
                break;
            }
            Err(e) => {
                coordinator.shutdown();
                return Err(e.into());
            }
        }
    }

    coordinator.shutdown();
    Ok(())
}

fn run_serve_device(port: u16) -> Result<(), RunnerError> {
    let (service_end, bridge_end) = loopback();
    let (button_tx, button_rx) = unbounded();
    let (display_tx, display_rx) = unbounded();

    device_service::spawn_device(
        DeviceConfig::default(),
        service_end,
        button_rx,
        vec![display_tx],
    )?;
    let bridge = tcp_bridge::serve(port, bridge_end)?;

    println!("Device listening on port {}.", bridge.local_port());
    println!("Keys: 'a' = player 1 button, 'b' = player 2 button, 'q' = quit.");

    thread::spawn(move || {
        while let Ok(display) = display_rx.recv() {
            console::render_display(display);
        }
    });

    for line in io::stdin().lock().lines() {
        match line?.trim() {
            "a" | "A" => {
                let _ = button_tx.send(PlayerButton::A);
            }
            "b" | "B" => {
                let _ = button_tx.send(PlayerButton::B);
            }
            "q" | "Q" => break,
            "" => {}
            other => println!("Unknown key '{other}'."),
        }
    }
    Ok(())
}

fn run_demo(
    rounds: u32,
    player_one: Option<String>,
    player_two: Option<String>,
) -> Result<(), RunnerError> {
    let mut session = SessionConfig::default();
    if let Some(name) = player_one {
        session.player_one_name = name;
    }
    if let Some(name) = player_two {
        session.player_two_name = name;
    }
    // Keep demo rounds snappy.
    session.max_duel_secs = 4;

    let (host_end, device_end) = loopback();
    let (button_tx, button_rx) = unbounded();
    let (watch_one_tx, watch_one_rx) = unbounded();
    let (watch_two_tx, watch_two_rx) = unbounded();

    let device = device_service::spawn_device(
        DeviceConfig::default(),
        device_end,
        button_rx,
        vec![watch_one_tx, watch_two_tx],
    )?;
    let players = vec![
        sim_players::spawn_player(
            sim_players::SimPlayerConfig::human(PlayerButton::A),
            watch_one_rx,
            button_tx.clone(),
        )?,
        sim_players::spawn_player(
            sim_players::SimPlayerConfig::human(PlayerButton::B),
            watch_two_rx,
            button_tx,
        )?,
    ];

    let mut coordinator = DuelCoordinator::new(host_end.into_link(), session.clone())?;
    install_early_announcer(&mut coordinator, &session);

    let cancel = coordinator.cancel_flag();
    ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))?;

    coordinator.connect()?;
    println!("Handshake successful.");

    for round in 1..=rounds {
        println!("--- Round {round}/{rounds} ---");
        println!("Starting Game...");
        match coordinator.play_round() {
            Ok(outcome) => {
                console::announce_winner(&outcome);
                coordinator.reset_round();
            }
            Err(HostError::Interrupted) => {
                println!("Interrupted, aborting duel.");
                break;
            }
            Err(e) => {
                coordinator.shutdown();
                return Err(e.into());
            }
        }
    }

    coordinator.shutdown();
    drop(coordinator.into_link());

    device.join().ok();
    for player in players {
        player.join().ok();
    }
    Ok(())
}
