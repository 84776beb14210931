// # Publication Ledger
//
// In-memory record of what is live on the name publishing service right now.
//
// ## Ownership
//
// The ledger is owned by the `Reconciler` and mutated only from its single
// task, so it carries no locks and performs no I/O.
//
// ## Restart Behavior
//
// - The ledger starts empty on every process start
// - A group left behind by a previous run is not known here and is not freed
// - First tick after a restart therefore always publishes

use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;

use crate::traits::{DesiredBinding, GroupHandle};

/// A binding that was successfully committed to the publishing service
///
/// Never mutated in place: a changed hostname or address is represented by
/// removing this entry and inserting a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedBinding {
    /// Publication group holding the record
    pub handle: GroupHandle,
    /// Published hostname
    pub hostname: String,
    /// Published address
    pub address: Ipv4Addr,
    /// When the group was committed
    pub published_at: DateTime<Utc>,
}

impl PublishedBinding {
    /// Create a published binding for a freshly committed group
    pub fn new(handle: GroupHandle, binding: &DesiredBinding) -> Self {
        Self {
            handle,
            hostname: binding.hostname.clone(),
            address: binding.address,
            published_at: Utc::now(),
        }
    }

    /// Whether this entry publishes exactly the given binding
    pub fn matches(&self, hostname: &str, address: Ipv4Addr) -> bool {
        self.hostname == hostname && self.address == address
    }

    /// How long the binding has been live
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.published_at)
    }
}

/// Set of currently published bindings
///
/// # Example
///
/// ```rust
/// use mdns_core::ledger::{PublicationLedger, PublishedBinding};
/// use mdns_core::traits::{DesiredBinding, GroupHandle};
/// use std::net::Ipv4Addr;
///
/// let mut ledger = PublicationLedger::new();
/// let desired = DesiredBinding::new("foo.local", Ipv4Addr::new(10, 0, 0, 5));
///
/// ledger.insert(PublishedBinding::new(GroupHandle::new("/group/1"), &desired));
/// assert!(ledger.find("foo.local", Ipv4Addr::new(10, 0, 0, 5)).is_some());
/// assert!(ledger.find("foo.local", Ipv4Addr::new(10, 0, 0, 9)).is_none());
///
/// ledger.remove("foo.local");
/// assert!(ledger.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PublicationLedger {
    entries: Vec<PublishedBinding>,
}

impl PublicationLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the entry publishing exactly `hostname` at `address`
    ///
    /// The same hostname at a different address does not match.
    pub fn find(&self, hostname: &str, address: Ipv4Addr) -> Option<&PublishedBinding> {
        self.entries
            .iter()
            .find(|entry| entry.matches(hostname, address))
    }

    /// Add a new entry
    ///
    /// The caller guarantees no conflicting entry exists; the single-binding
    /// policy is enforced by the reconciler.
    pub fn insert(&mut self, binding: PublishedBinding) {
        self.entries.push(binding);
    }

    /// Remove every entry for `hostname`, whatever its address
    ///
    /// Returns the number of entries removed (zero if absent).
    pub fn remove(&mut self, hostname: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.hostname != hostname);
        before - self.entries.len()
    }

    /// Remove the entry published under `handle`
    ///
    /// Other entries for the same hostname are left alone; each group is
    /// only dropped once its own free succeeded.
    pub fn remove_group(&mut self, handle: &GroupHandle) -> Option<PublishedBinding> {
        let index = self.entries.iter().position(|entry| &entry.handle == handle)?;
        Some(self.entries.remove(index))
    }

    /// Iterate over the published entries
    pub fn iter(&self) -> impl Iterator<Item = &PublishedBinding> {
        self.entries.iter()
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is published
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
