// # Interface Address Lookup
//
// This crate reads the IPv4 address bound to a named local network
// interface, for use when the publisher is pinned to one interface instead
// of following the supervisor's primary route.
//
// ## Implementation
//
// The interface table is read with `getifaddrs(3)` on every lookup. The list
// is small and the call does not block, so the lookup stays synchronous.
//
// ## Failure Model
//
// Both failure cases are configuration errors and are never retried:
//
// - no interface with that name exists
// - the interface exists but carries no IPv4 address
//
// ## Platform Support
//
// Unix only. Other platforms return a configuration error on every lookup.

use mdns_core::traits::InterfaceLookup;
use mdns_core::{Error, Result};

use std::net::Ipv4Addr;

/// One row of the system interface table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    /// Interface name (e.g., "eth0")
    pub name: String,
    /// IPv4 address of this row, if it is an AF_INET row
    pub ipv4: Option<Ipv4Addr>,
}

/// Interface lookup backed by the operating system's interface table
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl SystemInterfaces {
    pub fn new() -> Self {
        Self
    }
}

impl InterfaceLookup for SystemInterfaces {
    fn ipv4_address(&self, interface: &str) -> Result<Ipv4Addr> {
        let entries = sys::interface_table()
            .map_err(|e| Error::config(format!("Failed to read network interfaces: {}", e)))?;

        let address = select_ipv4(&entries, interface)?;
        tracing::debug!("Interface {} has address {}", interface, address);
        Ok(address)
    }
}

/// Pick the first IPv4 address of `interface` from an interface table
///
/// `getifaddrs` yields one row per (interface, address family) pair, so an
/// interface appears several times. It counts as present as soon as any row
/// carries its name.
pub fn select_ipv4(entries: &[InterfaceEntry], interface: &str) -> Result<Ipv4Addr> {
    let mut seen = false;

    for entry in entries.iter().filter(|e| e.name == interface) {
        seen = true;
        if let Some(address) = entry.ipv4 {
            return Ok(address);
        }
    }

    if seen {
        Err(Error::config(format!(
            "Interface {} has no IPv4 address",
            interface
        )))
    } else {
        Err(Error::config(format!("Interface {} not found", interface)))
    }
}

#[cfg(unix)]
mod sys {
    use super::InterfaceEntry;
    use std::io;
    use std::net::Ipv4Addr;

    pub fn interface_table() -> io::Result<Vec<InterfaceEntry>> {
        let table = nix::ifaddrs::getifaddrs().map_err(io::Error::from)?;

        Ok(table
            .map(|ifa| InterfaceEntry {
                ipv4: ifa
                    .address
                    .as_ref()
                    .and_then(|addr| addr.as_sockaddr_in())
                    .map(|sin| Ipv4Addr::from(sin.ip())),
                name: ifa.interface_name,
            })
            .collect())
    }
}

#[cfg(not(unix))]
mod sys {
    use super::InterfaceEntry;
    use std::io;

    pub fn interface_table() -> io::Result<Vec<InterfaceEntry>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "interface lookup is only supported on Unix",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, ipv4: Option<[u8; 4]>) -> InterfaceEntry {
        InterfaceEntry {
            name: name.to_string(),
            ipv4: ipv4.map(Ipv4Addr::from),
        }
    }

    #[test]
    fn test_select_first_ipv4_row() {
        let table = vec![
            entry("eth0", None),
            entry("eth0", Some([192, 168, 1, 20])),
            entry("eth0", Some([192, 168, 1, 21])),
            entry("wlan0", Some([10, 0, 0, 5])),
        ];

        assert_eq!(
            select_ipv4(&table, "eth0").unwrap(),
            Ipv4Addr::new(192, 168, 1, 20)
        );
    }

    #[test]
    fn test_missing_interface_is_config_error() {
        let table = vec![entry("eth0", Some([192, 168, 1, 20]))];

        let err = select_ipv4(&table, "eth9").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_interface_without_ipv4_is_config_error() {
        let table = vec![entry("wlan0", None), entry("eth0", Some([10, 0, 0, 5]))];

        let err = select_ipv4(&table, "wlan0").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("no IPv4 address"));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_loopback_lookup() {
        let lookup = SystemInterfaces::new();
        assert_eq!(
            lookup.ipv4_address("lo").unwrap(),
            Ipv4Addr::LOCALHOST
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_system_lookup_unknown_interface() {
        let lookup = SystemInterfaces::new();
        let err = lookup.ipv4_address("no-such-if0").unwrap_err();
        assert!(err.is_configuration());
    }
}
