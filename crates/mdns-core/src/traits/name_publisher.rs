// # Name Publisher Trait
//
// Defines the interface to the local name publishing service (Avahi).
//
// ## Implementations
//
// - Avahi over D-Bus: `mdns-publisher-avahi` crate
//
// ## Publish / retract sequence
//
// ```rust,ignore
// let group = publisher.create_group().await?;
// publisher.add_address(&group, &AddressRecord::new("foo.local", addr)).await?;
// publisher.commit(&group).await?;
// // ... later
// publisher.free(&group).await?;
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;

/// Interface index meaning "all interfaces"
pub const IF_UNSPEC: i32 = -1;

/// Protocol meaning "both IPv4 and IPv6 transports"
pub const PROTO_UNSPEC: i32 = -1;

/// Publish flags sent with every address record
pub const ADDRESS_RECORD_FLAGS: u32 = 0x10;

/// Opaque publication group identifier
///
/// Only meaningful to the publisher that created it. It is stored verbatim
/// and handed back unchanged to [`NamePublisher::free`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupHandle(String);

impl GroupHandle {
    /// Wrap an identifier returned by the publishing service
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single address record to attach to a publication group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Interface index to publish on
    pub interface: i32,
    /// Transport protocol to publish on
    pub protocol: i32,
    /// Publish flags
    pub flags: u32,
    /// Fully qualified hostname (e.g. `foo.local`)
    pub hostname: String,
    /// Address the hostname resolves to
    pub address: Ipv4Addr,
}

impl AddressRecord {
    /// Create a record with the fixed interface, protocol and flag arguments
    pub fn new(hostname: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            interface: IF_UNSPEC,
            protocol: PROTO_UNSPEC,
            flags: ADDRESS_RECORD_FLAGS,
            hostname: hostname.into(),
            address,
        }
    }
}

/// Trait for name publishing service implementations
///
/// Each method maps to exactly one RPC against the service. Implementations
/// return errors built with [`crate::Error::publisher`] and never retry: the
/// reconciler treats every failure here as fatal.
///
/// # Thread Safety
///
/// Implementations must be usable across async tasks, although the
/// reconciler only ever drives one call at a time.
#[async_trait]
pub trait NamePublisher: Send + Sync {
    /// Create a new, empty publication group
    async fn create_group(&self) -> Result<GroupHandle, crate::Error>;

    /// Attach an address record to an uncommitted group
    async fn add_address(
        &self,
        group: &GroupHandle,
        record: &AddressRecord,
    ) -> Result<(), crate::Error>;

    /// Commit a group, making its records visible on the network
    async fn commit(&self, group: &GroupHandle) -> Result<(), crate::Error>;

    /// Free a group, withdrawing everything it published
    async fn free(&self, group: &GroupHandle) -> Result<(), crate::Error>;

    /// Get the publisher name (for logging/debugging)
    fn publisher_name(&self) -> &'static str;
}
