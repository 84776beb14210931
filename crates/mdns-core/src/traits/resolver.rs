//! Desired binding production

use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;

/// The hostname/address pair that should be published right now
///
/// Produced fresh on every reconciliation tick and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DesiredBinding {
    /// Fully qualified hostname (e.g. `foo.local`)
    pub hostname: String,
    /// Address the hostname should resolve to
    pub address: Ipv4Addr,
}

impl DesiredBinding {
    /// Create a new desired binding
    pub fn new(hostname: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            hostname: hostname.into(),
            address,
        }
    }
}

impl fmt::Display for DesiredBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.hostname, self.address)
    }
}

/// Source of the desired binding for each tick
///
/// `resolve()` never returns a partial result. It may suspend for an
/// unbounded time while transient failures are retried, and only returns an
/// error for conditions that retrying cannot fix.
#[async_trait]
pub trait BindingResolver: Send + Sync {
    /// Determine the binding that should currently be published
    async fn resolve(&self) -> Result<DesiredBinding, crate::Error>;
}
