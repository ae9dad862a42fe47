//! Resolution of the 48-bit node field of version 1 UUIDs.

use std::{process, sync::Arc, sync::OnceLock};

use sha1::{Digest, Sha1};
use tracing::{debug, warn};

/// Bit that marks a node as not derived from an IEEE 802 hardware address (RFC 4122, §4.5).
const MULTICAST_BIT: u64 = 1 << 40;

const MAX_NODE: u64 = (1 << 48) - 1;

const FALLBACK_HOST_NAME: &str = "localhost";

/// A source of candidate 48-bit hardware (MAC) addresses.
pub trait HardwareAddressSource {
    /// Returns zero or more candidate addresses in order of preference.
    fn addresses(&self) -> Vec<[u8; 6]>;
}

impl HardwareAddressSource for Vec<[u8; 6]> {
    fn addresses(&self) -> Vec<[u8; 6]> {
        self.clone()
    }
}

impl<T: HardwareAddressSource + ?Sized> HardwareAddressSource for Arc<T> {
    fn addresses(&self) -> Vec<[u8; 6]> {
        (**self).addresses()
    }
}

/// Enumerates the network interfaces of the host.
///
/// On Linux this reads `/sys/class/net/*/address`, skipping the loopback interface. On other
/// platforms it yields nothing, and node resolution falls back to a synthesized value.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct SystemInterfaces;

impl HardwareAddressSource for SystemInterfaces {
    #[cfg(target_os = "linux")]
    fn addresses(&self) -> Vec<[u8; 6]> {
        let Ok(entries) = std::fs::read_dir("/sys/class/net") else {
            return Vec::new();
        };

        let mut interfaces = entries
            .flatten()
            .filter(|e| e.file_name() != "lo")
            .filter_map(|e| {
                let text = std::fs::read_to_string(e.path().join("address")).ok()?;
                Some((e.file_name(), parse_node(text.trim())?))
            })
            .collect::<Vec<_>>();
        interfaces.sort();
        interfaces
            .into_iter()
            .map(|(_, node)| node_to_bytes(node))
            .collect()
    }

    #[cfg(not(target_os = "linux"))]
    fn addresses(&self) -> Vec<[u8; 6]> {
        Vec::new()
    }
}

/// How a [`Node`] value was obtained.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeOrigin {
    /// Configured explicitly.
    Explicit,
    /// Taken from a hardware address.
    Hardware,
    /// Hashed from the host name and a per-resolver discriminator. This is a best-effort value
    /// that is unlikely, but not guaranteed, to be unique among hosts.
    Synthesized,
}

/// A resolved 48-bit node and its origin.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Node {
    value: u64,
    origin: NodeOrigin,
}

impl Node {
    /// Returns the 48-bit node value.
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Returns how the value was obtained.
    pub const fn origin(&self) -> NodeOrigin {
        self.origin
    }
}

/// Resolves the node once and memoizes it for lock-free reads afterwards.
///
/// Resolution prefers an explicit value, then the first usable hardware address, and finally
/// synthesizes a node from a SHA-1 digest of the host name and a discriminator drawn when the
/// resolver is created. A synthesized node has the multicast bit set so that it can never equal a
/// real IEEE 802 address, but it is not globally unique; check [`Node::origin()`] when that
/// matters.
pub struct NodeResolver {
    explicit: Option<u64>,
    hardware: Arc<dyn HardwareAddressSource + Send + Sync>,
    discriminator: u64,
    resolved: OnceLock<Node>,
}

impl NodeResolver {
    /// Creates a resolver. `explicit` must fit in 48 bits; higher bits are discarded.
    pub fn new(
        explicit: Option<u64>,
        hardware: Arc<dyn HardwareAddressSource + Send + Sync>,
    ) -> Self {
        Self {
            explicit: explicit.map(|n| n & MAX_NODE),
            hardware,
            discriminator: rand::random(),
            resolved: OnceLock::new(),
        }
    }

    /// Returns the node, resolving it on first use.
    pub fn resolve(&self) -> Node {
        *self.resolved.get_or_init(|| self.resolve_uncached())
    }

    fn resolve_uncached(&self) -> Node {
        if let Some(value) = self.explicit {
            return Node {
                value,
                origin: NodeOrigin::Explicit,
            };
        }

        let hardware = self
            .hardware
            .addresses()
            .into_iter()
            .map(bytes_to_node)
            .find(|&n| n != 0 && n != MAX_NODE);
        if let Some(value) = hardware {
            debug!(node = format_args!("{value:012x}"), "using hardware address as node");
            return Node {
                value,
                origin: NodeOrigin::Hardware,
            };
        }

        let host = host_name().unwrap_or_else(|| FALLBACK_HOST_NAME.to_owned());
        let value = synthesize(&host, process::id(), self.discriminator);
        warn!(
            node = format_args!("{value:012x}"),
            host, "no hardware address available; synthesized a best-effort node"
        );
        Node {
            value,
            origin: NodeOrigin::Synthesized,
        }
    }
}

impl std::fmt::Debug for NodeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeResolver")
            .field("explicit", &self.explicit)
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}

/// Folds a SHA-1 digest of the host name and discriminators down to 48 bits.
fn synthesize(host: &str, pid: u32, discriminator: u64) -> u64 {
    let digest = Sha1::digest(format!("{host}#{pid}#{discriminator:016x}").as_bytes());
    let mut folded = [0u8; 6];
    for (i, b) in digest.iter().enumerate() {
        folded[i % 6] ^= b;
    }
    bytes_to_node(folded) | MULTICAST_BIT
}

fn host_name() -> Option<String> {
    let from_env = ["HOSTNAME", "COMPUTERNAME"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok());

    #[cfg(target_os = "linux")]
    let from_env = from_env.or_else(|| std::fs::read_to_string("/proc/sys/kernel/hostname").ok());

    from_env
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// Parses 12 hexadecimal digits, optionally separated by `:` or `-`, into a 48-bit node.
pub(crate) fn parse_node(src: &str) -> Option<u64> {
    let digits = src
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect::<String>();
    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(&digits, 16).ok()
}

fn bytes_to_node(bytes: [u8; 6]) -> u64 {
    let mut buf = [0u8; 8];
    buf[2..].copy_from_slice(&bytes);
    u64::from_be_bytes(buf)
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn node_to_bytes(node: u64) -> [u8; 6] {
    let mut bytes = [0u8; 6];
    bytes.copy_from_slice(&node.to_be_bytes()[2..]);
    bytes
}
