//! TCP transport for the chat connection.
//!
//! Opens the socket, enables keepalive so dead peers are noticed, and wraps
//! the stream in a [`LineCodec`] frame.

use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::line::LineCodec;

/// A framed chat connection.
pub type Connection = Framed<TcpStream, LineCodec>;

/// Idle time before the first keepalive probe.
const KEEPALIVE_TIME: Duration = Duration::from_secs(120);

/// Interval between keepalive probes.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Connect to `addr` and frame the stream.
///
/// `max_line_len` bounds inbound lines; `None` leaves them unbounded.
pub async fn connect(addr: &str, max_line_len: Option<usize>) -> Result<Connection, ProtocolError> {
    debug!(addr, "opening socket");
    let stream = TcpStream::connect(addr).await?;
    Ok(frame(stream, max_line_len))
}

/// Frame an already-open stream.
pub fn frame(stream: TcpStream, max_line_len: Option<usize>) -> Connection {
    if let Err(e) = enable_keepalive(&stream) {
        warn!("failed to enable TCP keepalive: {}", e);
    }
    if let Err(e) = stream.set_nodelay(true) {
        warn!("failed to set TCP_NODELAY: {}", e);
    }
    let codec = match max_line_len {
        Some(max_len) => LineCodec::with_max_len(max_len),
        None => LineCodec::new(),
    };
    Framed::new(stream, codec)
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(KEEPALIVE_TIME)
        .with_interval(KEEPALIVE_INTERVAL);
    sock.set_tcp_keepalive(&keepalive)
}
