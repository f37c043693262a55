//! Locating the camera on the network.
//!
//! With an explicit host (`gopro.lan`, `10.5.5.9:8080`) the name is resolved
//! to an IPv4 address, unless it already is a literal IP. Without one, the
//! camera is found by multicast DNS: a PTR query for `_gopro-web._tcp.local.`
//! is sent a few times while a single listener thread waits for the first
//! answer carrying an A record.
//!
//! The listener owns the only sender of the result channel. Returning, for
//! any reason, drops it; that disconnect is the one completion signal the
//! sending side observes.

use crate::error::{HerosyncError, Result};
use crossbeam_channel::{bounded, RecvTimeoutError};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RData, RecordType};
use std::io::{self, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::{Host, Url};

pub const SERVICE_NAME: &str = "_gopro-web._tcp.local.";
pub const DEFAULT_API_PORT: u16 = 8080;

const MDNS_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);
const MDNS_PORT: u16 = 5353;
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Timing of one discovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryParams {
    /// How many times the query is sent.
    pub attempts: u32,
    /// Pause between sends.
    pub backoff: Duration,
    /// How long the listener waits for an answer, from its start.
    pub listen_window: Duration,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
            listen_window: Duration::from_secs(6),
        }
    }
}

/// Datagram transport used for discovery.
pub trait DiscoveryTransport: Send + Sync + 'static {
    fn send_query(&self, packet: &[u8]) -> io::Result<()>;

    /// Waits up to `timeout` for one datagram. `Ok(None)` means nothing arrived.
    fn recv(&self, timeout: Duration) -> io::Result<Option<Vec<u8>>>;
}

/// Plain UDP socket sending to the mDNS multicast group.
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    pub fn bind() -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        Ok(Self {
            socket,
            target: SocketAddrV4::new(MDNS_GROUP, MDNS_PORT).into(),
        })
    }
}

impl DiscoveryTransport for UdpTransport {
    fn send_query(&self, packet: &[u8]) -> io::Result<()> {
        self.socket.send_to(packet, self.target).map(|_| ())
    }

    fn recv(&self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        self.socket.set_read_timeout(Some(timeout))?;
        let mut buf = vec![0u8; 65536];
        match self.socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                debug!(%from, len, "mDNS datagram");
                buf.truncate(len);
                Ok(Some(buf))
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Resolves the camera's base URL.
///
/// An empty `host` triggers mDNS discovery with the default API port.
pub fn resolve_base_url(host: &str, scheme: &str, params: DiscoveryParams) -> Result<Url> {
    resolve_with(host, scheme, || {
        let transport = Arc::new(UdpTransport::bind()?);
        discover(transport, params)
    })
}

/// Like [`resolve_base_url`], with discovery supplied by the caller.
pub fn resolve_with<F>(host: &str, scheme: &str, discover: F) -> Result<Url>
where
    F: FnOnce() -> Result<Ipv4Addr>,
{
    let scheme = validate_scheme(scheme)?;

    let authority = if host.trim().is_empty() {
        let ip = discover()?;
        info!(%ip, "discovered GoPro via mDNS");
        format!("{}:{}", ip, DEFAULT_API_PORT)
    } else {
        resolve_host(host.trim(), scheme)?
    };

    let base = format!("{}://{}", scheme, authority);
    Url::parse(&base).map_err(|e| HerosyncError::Resolution {
        host: host.to_string(),
        reason: e.to_string(),
    })
}

fn validate_scheme(scheme: &str) -> Result<&'static str> {
    match scheme {
        "" | "http" => Ok("http"),
        "https" => Ok("https"),
        other => Err(HerosyncError::Config(format!(
            "invalid scheme: {:?}; choose http or https",
            other
        ))),
    }
}

/// Turns `host[:port]` into `ip[:port]`.
fn resolve_host(host: &str, scheme: &str) -> Result<String> {
    let resolution_err = |reason: String| HerosyncError::Resolution {
        host: host.to_string(),
        reason,
    };

    let parsed = Url::parse(&format!("{}://{}", scheme, host))
        .map_err(|e| resolution_err(format!("invalid host format: {}", e)))?;
    let port = parsed.port();

    let address = match parsed.host() {
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip),
        Some(Host::Domain(name)) => IpAddr::V4(lookup_ipv4(name).map_err(resolution_err)?),
        None => return Err(resolution_err("missing host name".to_string())),
    };

    let address = match address {
        IpAddr::V4(ip) => ip.to_string(),
        IpAddr::V6(ip) => format!("[{}]", ip),
    };

    Ok(match port {
        Some(port) => format!("{}:{}", address, port),
        None => address,
    })
}

fn lookup_ipv4(name: &str) -> std::result::Result<Ipv4Addr, String> {
    let addrs = (name, 0).to_socket_addrs().map_err(|e| e.to_string())?;
    let found = addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next();

    debug!(name, ?found, "DNS lookup");
    found.ok_or_else(|| "no IPv4 address found".to_string())
}

/// Finds the camera by mDNS.
///
/// Gives up with [`HerosyncError::DiscoveryTimeout`] once the listen window
/// has passed, or once every query has been sent and backed off, whichever
/// is later.
pub fn discover<T: DiscoveryTransport>(transport: Arc<T>, params: DiscoveryParams) -> Result<Ipv4Addr> {
    let query = build_query()?;
    let stop = Arc::new(AtomicBool::new(false));
    let (result_tx, result_rx) = bounded::<Ipv4Addr>(1);

    let listener = {
        let transport = Arc::clone(&transport);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let deadline = Instant::now() + params.listen_window;
            while !stop.load(Ordering::Relaxed) {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match transport.recv(remaining.min(POLL_SLICE)) {
                    Ok(Some(packet)) => {
                        if let Some(ip) = parse_answer(&packet) {
                            let _ = result_tx.send(ip);
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!(error = %e, "mDNS listener stopped");
                        break;
                    }
                }
            }
            // Dropping `result_tx` here disconnects the channel.
        })
    };

    let finish = |outcome: Result<Ipv4Addr>| {
        stop.store(true, Ordering::Relaxed);
        let _ = listener.join();
        outcome
    };

    for attempt in 1..=params.attempts {
        debug!(attempt, "sending mDNS query");
        if let Err(e) = transport.send_query(&query) {
            return finish(Err(e.into()));
        }

        match result_rx.recv_timeout(params.backoff) {
            Ok(ip) => return finish(Ok(ip)),
            Err(RecvTimeoutError::Disconnected) => return finish(Err(HerosyncError::DiscoveryTimeout)),
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    // Every query is out; wait for the listener to answer or give up.
    let outcome = result_rx.recv().map_err(|_| HerosyncError::DiscoveryTimeout);
    finish(outcome)
}

fn build_query() -> Result<Vec<u8>> {
    let name = Name::from_ascii(SERVICE_NAME).map_err(io::Error::other)?;

    let mut message = Message::new();
    message
        .set_id(0)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(false)
        .add_query(Query::query(name, RecordType::PTR));

    Ok(message.to_vec().map_err(io::Error::other)?)
}

/// First A record in the answer or additional sections of an mDNS response.
fn parse_answer(packet: &[u8]) -> Option<Ipv4Addr> {
    let message = Message::from_vec(packet).ok()?;
    message
        .answers()
        .iter()
        .chain(message.additionals())
        .find_map(|record| match record.data() {
            Some(RData::A(a)) => Some(a.0),
            _ => None,
        })
}
