//! Fixed network interface lookup

use std::net::Ipv4Addr;

/// Reads the IPv4 address bound to a named local network interface
///
/// Used only in fixed-interface mode. Both failure cases (no such interface,
/// interface without an IPv4 address) are configuration errors and must be
/// reported as [`crate::Error::Config`] so the caller never retries them.
///
/// The lookup is a local, non-blocking system query and therefore synchronous.
pub trait InterfaceLookup: Send + Sync {
    /// Return the first IPv4 address of `interface`
    fn ipv4_address(&self, interface: &str) -> Result<Ipv4Addr, crate::Error>;
}
