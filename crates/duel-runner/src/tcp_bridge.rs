//! TCP stand-in for the physical serial link.
//!
//! The reference system runs the protocol over a USB serial port. Off
//! hardware, a TCP socket is the serial-equivalent byte stream: this module
//! exposes a locally running device on a TCP port (`serve`) and gives the
//! host a line-framed link to a remote device (`connect`).
//!
//! The async socket work runs on its own tokio runtime; a pair of pump
//! threads converts between the socket's byte chunks and the blocking line
//! channels the rest of the program uses. Framing happens in the pumps with
//! [`LineCodec`], so only whole lines ever cross into protocol code.

use std::thread;

use duel_link::{ChannelLink, PipeEnd};
use duel_protocol::LineCodec;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::RunnerError;

/// Capacity of the byte-chunk channels between socket tasks and pumps.
const CHUNK_CAPACITY: usize = 64;

/// Keeps the bridge's runtime and sockets alive. Drop it to tear them down.
pub struct BridgeHandle {
    _runtime: tokio::runtime::Runtime,
    local_port: u16,
}

impl BridgeHandle {
    /// The locally bound port (the listen port for `serve`).
    pub fn local_port(&self) -> u16 {
        self.local_port
    }
}

fn bridge_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
}

// ============================================================================
// Host side: connect
// ============================================================================

/// Connect to a device bridge and return the host's line-framed link.
///
/// A vanished peer closes the link; the coordinator sees that as a fatal
/// transport failure.
pub fn connect(addr: &str) -> Result<(ChannelLink, BridgeHandle), RunnerError> {
    let runtime = bridge_runtime()?;
    let stream = runtime.block_on(TcpStream::connect(addr))?;
    let local_port = stream.local_addr()?.port();
    info!("connected to device at {addr}");

    let (to_socket_tx, mut to_socket_rx) = mpsc::channel::<Vec<u8>>(CHUNK_CAPACITY);
    let (from_socket_tx, from_socket_rx) = mpsc::channel::<Vec<u8>>(CHUNK_CAPACITY);

    runtime.spawn(async move {
        let mut stream = stream;
        if let Err(e) = run_stream(&mut stream, &mut to_socket_rx, &from_socket_tx).await {
            warn!("device link failed: {e}");
        }
    });

    let link = spawn_line_pumps(to_socket_tx, from_socket_rx);
    Ok((link, BridgeHandle { _runtime: runtime, local_port }))
}

// ============================================================================
// Device side: serve
// ============================================================================

/// Expose a device's serial pipe on a TCP port.
///
/// One client at a time, like a serial port: the listener accepts, bridges
/// until the client disconnects, then accepts again.
pub fn serve(port: u16, serial: PipeEnd) -> Result<BridgeHandle, RunnerError> {
    let runtime = bridge_runtime()?;
    let listener = runtime.block_on(TcpListener::bind(("0.0.0.0", port)))?;
    let local_port = listener.local_addr()?.port();
    info!("device serial exposed on port {local_port}");

    let (to_socket_tx, mut to_socket_rx) = mpsc::channel::<Vec<u8>>(CHUNK_CAPACITY);
    let (from_socket_tx, mut from_socket_rx) = mpsc::channel::<Vec<u8>>(CHUNK_CAPACITY);

    runtime.spawn(async move {
        loop {
            let (mut stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("accept failed: {e}");
                    return;
                }
            };
            info!("host connected from {peer}");
            if let Err(e) = run_stream(&mut stream, &mut to_socket_rx, &from_socket_tx).await {
                debug!("host connection ended: {e}");
            } else {
                info!("host disconnected");
            }
            // Empty chunk marks the connection boundary to the rx pump so a
            // partial line left by this client cannot prefix the next
            // client's first line. `run_stream` itself never forwards empty
            // chunks.
            if from_socket_tx.send(Vec::new()).await.is_err() {
                return;
            }
        }
    });

    // Device → socket: encode pipe lines into newline-terminated chunks.
    thread::Builder::new()
        .name("bridge-dev-tx".to_string())
        .spawn(move || {
            while let Ok(line) = serial.rx.recv() {
                let mut buf = line.into_bytes();
                buf.push(b'\n');
                if to_socket_tx.blocking_send(buf).is_err() {
                    break;
                }
            }
        })?;

    // Socket → device: frame byte chunks into whole lines.
    thread::Builder::new()
        .name("bridge-dev-rx".to_string())
        .spawn(move || {
            let mut codec = LineCodec::new();
            while let Some(chunk) = from_socket_rx.blocking_recv() {
                if chunk.is_empty() {
                    if codec.buffered_len() > 0 {
                        warn!(
                            "discarding {} unterminated bytes from a disconnected host",
                            codec.buffered_len()
                        );
                        codec.clear();
                    }
                    continue;
                }
                if let Err(e) = codec.push(&chunk) {
                    warn!("{e}");
                }
                while let Some(line) = codec.decode_line() {
                    if serial.tx.send(line).is_err() {
                        return;
                    }
                }
            }
        })?;

    Ok(BridgeHandle { _runtime: runtime, local_port })
}

// ============================================================================
// Shared plumbing
// ============================================================================

/// Bridge one socket to the byte-chunk channels until either side closes.
async fn run_stream(
    stream: &mut TcpStream,
    outbound: &mut mpsc::Receiver<Vec<u8>>,
    inbound: &mpsc::Sender<Vec<u8>>,
) -> std::io::Result<()> {
    let (mut reader, mut writer) = stream.split();
    let mut read_buf = [0u8; 1024];

    loop {
        tokio::select! {
            result = reader.read(&mut read_buf) => {
                match result {
                    Ok(0) => return Ok(()),
                    Ok(n) => {
                        if inbound.send(read_buf[..n].to_vec()).await.is_err() {
                            return Ok(());
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
            chunk = outbound.recv() => {
                match chunk {
                    Some(data) => {
                        writer.write_all(&data).await?;
                        writer.flush().await?;
                    }
                    None => return Ok(()),
                }
            }
        }
    }
}

/// Turn the connect side's byte-chunk channels into a line-framed link.
fn spawn_line_pumps(
    to_socket: mpsc::Sender<Vec<u8>>,
    mut from_socket: mpsc::Receiver<Vec<u8>>,
) -> ChannelLink {
    let (line_in_tx, line_in_rx) = crossbeam_channel::bounded::<String>(CHUNK_CAPACITY);
    let (line_out_tx, line_out_rx) = crossbeam_channel::bounded::<String>(CHUNK_CAPACITY);

    thread::spawn(move || {
        let mut codec = LineCodec::new();
        while let Some(chunk) = from_socket.blocking_recv() {
            // Empty chunks are connection-boundary markers; any buffered
            // partial line belongs to the previous connection.
            if chunk.is_empty() {
                codec.clear();
                continue;
            }
            if let Err(e) = codec.push(&chunk) {
                warn!("{e}");
            }
            while let Some(line) = codec.decode_line() {
                if line_in_tx.send(line).is_err() {
                    return;
                }
            }
        }
        // Dropping line_in_tx here closes the host's receive side.
    });

    thread::spawn(move || {
        while let Ok(line) = line_out_rx.recv() {
            let mut buf = line.into_bytes();
            buf.push(b'\n');
            if to_socket.blocking_send(buf).is_err() {
                return;
            }
        }
    });

    ChannelLink::from_channels(line_out_tx, line_in_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_link::{loopback, LineLink};
    use std::time::Duration;

    #[test]
    fn test_handshake_over_tcp() {
        let (bridge_end, device_end) = loopback();
        let server = serve(0, bridge_end).unwrap();

        // Scripted device behind the pipe.
        let device_thread = thread::spawn(move || {
            let line = device_end.rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(line, "rxn-duel:handshake");
            device_end.tx.send("rxn-duel:ack".to_string()).unwrap();
            device_end
        });

        let addr = format!("127.0.0.1:{}", server.local_port());
        let (link, _client) = connect(&addr).unwrap();
        link.send_line("rxn-duel:handshake").unwrap();
        let reply = link.recv_line_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reply, "rxn-duel:ack");

        device_thread.join().unwrap();
    }

    #[test]
    fn test_reconnect_discards_partial_line() {
        use std::io::Write;

        let (bridge_end, device_end) = loopback();
        let server = serve(0, bridge_end).unwrap();
        let addr = format!("127.0.0.1:{}", server.local_port());

        // First host drops mid-line.
        {
            let mut stream = std::net::TcpStream::connect(&addr).unwrap();
            stream.write_all(b"rxn-duel:hands").unwrap();
        }

        // The next host's first line must reach the device intact, not
        // glued to the stale fragment.
        let (link, _client) = connect(&addr).unwrap();
        link.send_line("rxn-duel:handshake").unwrap();
        let line = device_end.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(line, "rxn-duel:handshake");
    }
}
