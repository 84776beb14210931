//! Desired binding resolver
//!
//! The Resolver answers "what should be published right now?" by combining:
//! - the device address, from a fixed interface or the identity provider
//! - the device name, always from the identity provider
//!
//! ## Retry policy
//!
//! Identity provider failures are transient by definition: the provider is
//! expected to come back, and nothing useful can happen without it. Every
//! provider call is therefore retried forever with a fixed delay. Name and
//! address are retried independently and combined only once both are known
//! for the current tick.
//!
//! A fixed interface that is missing or has no IPv4 address is a
//! configuration error and is returned immediately, before any provider call.

use std::fmt;
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::traits::{BindingResolver, DesiredBinding, IdentityProvider, InterfaceLookup};

/// How the device address is acquired, fixed at startup
pub enum AddressSource {
    /// Read the IPv4 address of a named local interface on every tick
    FixedInterface {
        /// Interface name (e.g., "eth0")
        interface: String,
        /// Lookup implementation
        lookup: Box<dyn InterfaceLookup>,
    },

    /// Ask the identity provider on every tick
    Provider,
}

impl fmt::Debug for AddressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSource::FixedInterface { interface, .. } => f
                .debug_struct("FixedInterface")
                .field("interface", interface)
                .finish_non_exhaustive(),
            AddressSource::Provider => f.write_str("Provider"),
        }
    }
}

/// Resolver producing one [`DesiredBinding`] per call
pub struct Resolver {
    /// Identity/address provider
    identity: Box<dyn IdentityProvider>,

    /// Address acquisition mode
    address: AddressSource,

    /// Fixed delay between provider retries
    retry_delay: Duration,

    /// Domain appended to the device name
    domain: String,
}

impl Resolver {
    /// Create a new resolver
    ///
    /// # Parameters
    ///
    /// - `identity`: Identity/address provider implementation
    /// - `address`: Address acquisition mode
    /// - `engine`: Engine settings (retry delay, domain)
    pub fn new(
        identity: Box<dyn IdentityProvider>,
        address: AddressSource,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            identity,
            address,
            retry_delay: Duration::from_secs(engine.retry_delay_secs),
            domain: engine.domain.clone(),
        }
    }

    /// The delay applied after each failed provider call
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    async fn fetch_address(&self) -> Result<Ipv4Addr> {
        let raw = self.identity.device_address().await?;
        primary_address(&raw)
    }

    async fn fetch_name(&self) -> Result<String> {
        let name = self.identity.device_name().await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::identity("Provider returned an empty device name"));
        }
        Ok(name.to_string())
    }

    /// Run `attempt` until it succeeds, sleeping `retry_delay` after each failure
    async fn retry_forever<T, F, Fut>(&self, what: &str, mut attempt: F) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures: u64 = 0;
        loop {
            match attempt().await {
                Ok(value) => {
                    if failures > 0 {
                        info!(
                            "Acquired {} from {} after {} failed attempt(s)",
                            what,
                            self.identity.provider_name(),
                            failures
                        );
                    }
                    return value;
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Could not acquire {} from {}, retrying in {:?}: {}",
                        what,
                        self.identity.provider_name(),
                        self.retry_delay,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl BindingResolver for Resolver {
    async fn resolve(&self) -> Result<DesiredBinding> {
        let address = match &self.address {
            AddressSource::FixedInterface { interface, lookup } => {
                match lookup.ipv4_address(interface) {
                    Ok(address) => address,
                    Err(e) => {
                        error!("Cannot read address of interface {}: {}", interface, e);
                        return Err(e);
                    }
                }
            }
            AddressSource::Provider => {
                self.retry_forever("IP address", move || self.fetch_address())
                    .await
            }
        };

        let name = self
            .retry_forever("device name", move || self.fetch_name())
            .await;

        let binding = DesiredBinding::new(full_hostname(&name, &self.domain), address);
        debug!("Resolved desired binding {}", binding);
        Ok(binding)
    }
}

/// Pick the primary-route address out of a provider answer
///
/// The provider lists one address per route, separated by spaces, primary
/// route first. Only the first is ever published so the device is not
/// advertised on several subnets at once.
pub fn primary_address(raw: &str) -> Result<Ipv4Addr> {
    let first = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::identity("Provider returned no IP address"))?;

    first
        .parse()
        .map_err(|_| Error::identity(format!("Invalid IPv4 address from provider: {}", first)))
}

/// Combine a device name with the local domain (`foo` + `local` -> `foo.local`)
pub fn full_hostname(device_name: &str, domain: &str) -> String {
    format!("{}.{}", device_name, domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_address_takes_first() {
        let address = primary_address("10.0.0.5 172.17.0.1 192.168.1.20").unwrap();
        assert_eq!(address, Ipv4Addr::new(10, 0, 0, 5));
    }

    #[test]
    fn test_primary_address_single() {
        assert_eq!(
            primary_address("192.168.1.20").unwrap(),
            Ipv4Addr::new(192, 168, 1, 20)
        );
    }

    #[test]
    fn test_primary_address_malformed_is_transient() {
        let err = primary_address("").unwrap_err();
        assert!(err.is_transient());

        let err = primary_address("fe80::1 10.0.0.5").unwrap_err();
        assert!(err.is_transient());

        assert!(primary_address("not-an-ip").is_err());
    }

    #[test]
    fn test_full_hostname() {
        assert_eq!(full_hostname("foo", "local"), "foo.local");
    }
}
