//! Threaded embedding of the reflex trigger.
//!
//! On hardware the trigger runs as a cooperative main loop with interrupt
//! handlers. Off hardware, this service reproduces that execution model on a
//! dedicated thread: one loop that multiplexes serial lines and button events
//! over channels, runs each handler to completion, ticks the display, and
//! pushes emitted lines back out. Channels deliver events one at a time, so
//! the atomicity the embedded scheduler guarantees holds here too.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{never, select, Receiver, Sender};
use duel_device::{DeviceConfig, DeviceEvent, DisplayIndicator, PlayerButton, ReflexTrigger};
use duel_link::PipeEnd;
use tracing::debug;

use crate::error::RunnerError;

/// Main-loop cadence. Only display refresh latency depends on it.
const TICK: Duration = Duration::from_millis(20);

/// Spawn the reflex trigger on its own thread.
///
/// The service stops when the serial peer goes away; dropping the button
/// sender is fine (the device just stops seeing presses). Display changes are
/// fanned out to every watcher; a dropped watcher is pruned.
pub fn spawn_device(
    config: DeviceConfig,
    serial: PipeEnd,
    buttons: Receiver<PlayerButton>,
    displays: Vec<Sender<DisplayIndicator>>,
) -> Result<JoinHandle<()>, RunnerError> {
    let mut trigger = ReflexTrigger::new(config)?;

    let handle = thread::Builder::new()
        .name("duel-device".to_string())
        .spawn(move || {
            let mut buttons = buttons;
            let mut displays = displays;
            let mut last_display: Option<DisplayIndicator> = None;

            loop {
                let mut link_closed = false;
                let mut buttons_gone = false;
                select! {
                    recv(serial.rx) -> line => match line {
                        Ok(line) => trigger.handle_event(DeviceEvent::SerialLine(line)),
                        Err(_) => link_closed = true,
                    },
                    recv(buttons) -> press => match press {
                        Ok(button) => trigger.handle_event(DeviceEvent::ButtonPressed(button)),
                        Err(_) => buttons_gone = true,
                    },
                    default(TICK) => {}
                }
                if link_closed {
                    break;
                }
                if buttons_gone {
                    // Button source gone; keep serving the serial side.
                    buttons = never();
                }

                trigger.tick();

                for line in trigger.drain_outbox() {
                    if serial.tx.send(line).is_err() {
                        link_closed = true;
                        break;
                    }
                }
                if link_closed {
                    break;
                }

                let display = trigger.display();
                if last_display != Some(display) {
                    last_display = Some(display);
                    displays.retain(|watcher| watcher.send(display).is_ok());
                }
            }
            debug!("device service stopped: serial link closed");
        })?;

    Ok(handle)
}
