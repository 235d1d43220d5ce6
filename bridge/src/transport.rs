//! The socket side: one listener per player slot, one emulator connection at a time.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use gamebot_integrations::Log;
use gamebot_protocol::{write_command, Command, FrameReader, FrameSnapshot};

use crate::BridgeError;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Transport {
    listener: TcpListener,
    max_frame_bytes: usize,
    poll_interval: Duration,
}

impl Transport {
    /// Binds `host:port`. Port 0 picks a free port; see `local_addr`.
    pub fn bind(host: &str, port: u16, max_frame_bytes: usize, poll_interval: Duration) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind((host, port)).map_err(|source| BridgeError::Bind {
            host: host.to_string(),
            port,
            source,
        })?;

        // Accept is polled so a shutdown request is noticed while nobody has connected.
        listener.set_nonblocking(true)?;

        tracing::info!(target: Log::Transport, addr = ?listener.local_addr()?, "Waiting for the emulator");

        Ok(Self {
            listener,
            max_frame_bytes,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.listener.local_addr()?)
    }

    /// Waits for the emulator to connect. Returns `None` if `shutdown` is raised first.
    pub fn accept(&self, shutdown: &AtomicBool) -> Result<Option<Connection>, BridgeError> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::info!(target: Log::Transport, ?peer, "Emulator connected");
                    return Connection::new(stream, peer, self.max_frame_bytes, self.poll_interval).map(Some);
                },

                Err(error) if error.kind() == ErrorKind::WouldBlock => {
                    if shutdown.load(Ordering::Relaxed) {
                        return Ok(None);
                    }

                    thread::sleep(self.poll_interval);
                },

                Err(error) if error.kind() == ErrorKind::Interrupted => {},

                Err(error) => return Err(error.into()),
            }
        }
    }
}

/// A connected emulator. Reads and writes strictly alternate: one frame in, one
/// command out.
#[derive(Debug)]
pub struct Connection {
    reader: FrameReader<TcpStream>,
    writer: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    fn new(stream: TcpStream, peer: SocketAddr, max_frame_bytes: usize, poll_interval: Duration) -> Result<Self, BridgeError> {
        // Some platforms hand out accepted sockets with the listener's non-blocking flag.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(poll_interval))?;
        stream.set_nodelay(true)?;

        let writer = stream.try_clone()?;

        Ok(Self {
            reader: FrameReader::new(stream, max_frame_bytes),
            writer,
            peer,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Blocks until the next frame arrives. Returns `None` when the emulator closes
    /// the connection cleanly or `shutdown` is raised.
    ///
    /// The flag is checked before every read as well as on read timeouts; a peer
    /// streaming faster than the poll interval never times out.
    pub fn recv(&mut self, shutdown: &AtomicBool) -> Result<Option<FrameSnapshot>, BridgeError> {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!(target: Log::Transport, buffered = self.reader.buffered(), "Stopping read for shutdown");
                return Ok(None);
            }

            match self.reader.next_frame() {
                Ok(frame) => return Ok(frame),

                Err(error) if error.is_timeout() => {},

                Err(source) => {
                    return Err(BridgeError::Connection {
                        peer: self.peer,
                        source,
                    });
                },
            }
        }
    }

    pub fn send(&mut self, command: &Command) -> Result<(), BridgeError> {
        write_command(&mut self.writer, command).map_err(|source| BridgeError::Connection {
            peer: self.peer,
            source,
        })
    }
}
