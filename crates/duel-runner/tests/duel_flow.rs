//! End-to-end duel flow: real coordinator against the threaded device
//! service over an in-process loopback link.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use duel_device::{DeviceConfig, DisplayIndicator, PlayerButton};
use duel_host::{DuelCoordinator, HostPhase, SessionConfig};
use duel_link::loopback;
use duel_runner::device_service::spawn_device;

fn quick_session() -> SessionConfig {
    SessionConfig {
        player_one_name: "Ada".to_string(),
        player_two_name: "Brin".to_string(),
        min_duel_secs: 1,
        max_duel_secs: 1,
        handshake_timeout_secs: Some(5),
    }
}

/// A scripted player: presses `button` a fixed delay after each live window.
fn spawn_presser(
    button: PlayerButton,
    delay: Duration,
    displays: Receiver<DisplayIndicator>,
    buttons: Sender<PlayerButton>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(display) = displays.recv() {
            if display == DisplayIndicator::Live {
                thread::sleep(delay);
                if buttons.send(button).is_err() {
                    break;
                }
            }
        }
    })
}

#[test]
fn clean_win_and_reset_across_rounds() {
    let (host_end, device_end) = loopback();
    let (button_tx, button_rx) = unbounded();
    let (display_tx, display_rx) = unbounded();

    let device =
        spawn_device(DeviceConfig::default(), device_end, button_rx, vec![display_tx]).unwrap();
    let presser =
        spawn_presser(PlayerButton::B, Duration::from_millis(80), display_rx, button_tx);

    let mut host = DuelCoordinator::new(host_end.into_link(), quick_session()).unwrap();
    host.connect().unwrap();
    assert_eq!(host.phase(), HostPhase::Ready);

    for _ in 0..2 {
        let outcome = host.play_round().unwrap();
        assert_eq!(outcome.winner_id, "P2");
        assert_eq!(outcome.winner_name, "Brin");
        assert!(outcome.reaction_seconds >= 0.0);
        assert!(outcome.reaction_seconds < 1.0);

        let session = host.session();
        assert!(session.is_duel_won);
        assert_eq!(session.winner_id.as_deref(), Some("P2"));

        host.reset_round();
        let session = host.session();
        assert!(!session.is_duel_running);
        assert!(!session.is_duel_won);
        assert!(session.winner_id.is_none());
    }

    host.shutdown();
    drop(host.into_link());
    device.join().unwrap();
    presser.join().unwrap();
}

#[test]
fn early_press_is_announced_but_does_not_resolve() {
    let (host_end, device_end) = loopback();
    let (button_tx, button_rx) = unbounded();
    let (display_tx, display_rx) = unbounded();

    let device =
        spawn_device(DeviceConfig::default(), device_end, button_rx, vec![display_tx]).unwrap();

    // Player 1 jumps the gun on arm, then player 2 wins the live window.
    let eager_tx = button_tx.clone();
    let presser = thread::spawn(move || {
        while let Ok(display) = display_rx.recv() {
            match display {
                DisplayIndicator::Armed => {
                    if eager_tx.send(PlayerButton::A).is_err() {
                        break;
                    }
                }
                DisplayIndicator::Live => {
                    thread::sleep(Duration::from_millis(60));
                    if button_tx.send(PlayerButton::B).is_err() {
                        break;
                    }
                }
                _ => {}
            }
        }
    });

    let mut host = DuelCoordinator::new(host_end.into_link(), quick_session()).unwrap();
    let early = Arc::new(Mutex::new(Vec::new()));
    let sink = early.clone();
    host.on_early_press(move |id| sink.lock().unwrap().push(id.to_string()));

    host.connect().unwrap();
    let outcome = host.play_round().unwrap();

    assert_eq!(outcome.winner_id, "P2");
    assert!(early.lock().unwrap().contains(&"P1".to_string()));

    host.shutdown();
    drop(host.into_link());
    device.join().unwrap();
    presser.join().unwrap();
}

#[test]
fn simultaneous_presses_resolve_to_first() {
    let (host_end, device_end) = loopback();
    let (button_tx, button_rx) = unbounded();
    let (display_tx, display_rx) = unbounded();

    let device =
        spawn_device(DeviceConfig::default(), device_end, button_rx, vec![display_tx]).unwrap();

    // Both buttons arrive back to back in the same live window; arrival
    // order decides the race.
    let presser = thread::spawn(move || {
        while let Ok(display) = display_rx.recv() {
            if display == DisplayIndicator::Live {
                thread::sleep(Duration::from_millis(50));
                if button_tx.send(PlayerButton::A).is_err() {
                    break;
                }
                if button_tx.send(PlayerButton::B).is_err() {
                    break;
                }
            }
        }
    });

    let mut host = DuelCoordinator::new(host_end.into_link(), quick_session()).unwrap();
    host.connect().unwrap();
    let outcome = host.play_round().unwrap();
    assert_eq!(outcome.winner_id, "P1");
    assert_eq!(outcome.winner_name, "Ada");

    host.shutdown();
    drop(host.into_link());
    device.join().unwrap();
    presser.join().unwrap();
}
