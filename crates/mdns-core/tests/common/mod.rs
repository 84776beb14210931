//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides in-memory stand-ins for the identity provider, the
//! interface lookup and the name publishing service, recording every call so
//! tests can assert on counts and ordering.

#![allow(dead_code)]

use mdns_core::config::EngineConfig;
use mdns_core::error::{Error, Result};
use mdns_core::traits::{
    AddressRecord, BindingResolver, DesiredBinding, GroupHandle, IdentityProvider,
    InterfaceLookup, NamePublisher,
};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One call observed by [`RecordingPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherCall {
    CreateGroup(GroupHandle),
    AddAddress {
        group: GroupHandle,
        record: AddressRecord,
    },
    Commit(GroupHandle),
    Free(GroupHandle),
}

/// A NamePublisher that records calls and can be told to fail one operation
pub struct RecordingPublisher {
    /// Every call in the order it was made
    calls: Arc<Mutex<Vec<PublisherCall>>>,
    /// Counter used to mint group handles
    next_group: Arc<AtomicUsize>,
    /// Operation that should fail ("create", "add-address", "commit", "free")
    fail_on: Arc<Mutex<Option<&'static str>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            next_group: Arc::new(AtomicUsize::new(1)),
            fail_on: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a new RecordingPublisher that shares its log with an existing one
    pub fn sharing_calls_with(other: &Self) -> Self {
        Self {
            calls: Arc::clone(&other.calls),
            next_group: Arc::clone(&other.next_group),
            fail_on: Arc::clone(&other.fail_on),
        }
    }

    /// Make every later call of `operation` fail
    pub fn fail_on(&self, operation: &'static str) {
        *self.fail_on.lock().unwrap() = Some(operation);
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<PublisherCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if *self.fail_on.lock().unwrap() == Some(operation) {
            return Err(Error::publisher(operation, "refused by test publisher"));
        }
        Ok(())
    }

    fn record(&self, call: PublisherCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl NamePublisher for RecordingPublisher {
    async fn create_group(&self) -> Result<GroupHandle> {
        self.check("create")?;
        let id = self.next_group.fetch_add(1, Ordering::SeqCst);
        let group = GroupHandle::new(format!("/org/freedesktop/Avahi/Server/EntryGroup{}", id));
        self.record(PublisherCall::CreateGroup(group.clone()));
        Ok(group)
    }

    async fn add_address(&self, group: &GroupHandle, record: &AddressRecord) -> Result<()> {
        self.check("add-address")?;
        self.record(PublisherCall::AddAddress {
            group: group.clone(),
            record: record.clone(),
        });
        Ok(())
    }

    async fn commit(&self, group: &GroupHandle) -> Result<()> {
        self.check("commit")?;
        self.record(PublisherCall::Commit(group.clone()));
        Ok(())
    }

    async fn free(&self, group: &GroupHandle) -> Result<()> {
        self.check("free")?;
        self.record(PublisherCall::Free(group.clone()));
        Ok(())
    }

    fn publisher_name(&self) -> &'static str {
        "recording"
    }
}

/// A BindingResolver that replays a script of bindings
///
/// Each call pops the next binding; the last one repeats forever.
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<DesiredBinding>>>,
    resolve_call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(script: Vec<DesiredBinding>) -> Self {
        assert!(!script.is_empty(), "script needs at least one binding");
        Self {
            script: Arc::new(Mutex::new(script.into())),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedResolver that shares its script with an existing one
    pub fn sharing_script_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            resolve_call_count: Arc::clone(&other.resolve_call_count),
        }
    }
}

#[async_trait::async_trait]
impl BindingResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<DesiredBinding> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            Ok(script.pop_front().unwrap())
        } else {
            Ok(script.front().cloned().unwrap())
        }
    }
}

/// An IdentityProvider that fails a set number of times before answering
pub struct FlakyIdentity {
    name: String,
    address: String,
    name_failures_left: Arc<AtomicUsize>,
    address_failures_left: Arc<AtomicUsize>,
    name_call_count: Arc<AtomicUsize>,
    address_call_count: Arc<AtomicUsize>,
}

impl FlakyIdentity {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            name_failures_left: Arc::new(AtomicUsize::new(0)),
            address_failures_left: Arc::new(AtomicUsize::new(0)),
            name_call_count: Arc::new(AtomicUsize::new(0)),
            address_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next `n` device_name() calls
    pub fn failing_name(self, n: usize) -> Self {
        self.name_failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Fail the next `n` device_address() calls
    pub fn failing_address(self, n: usize) -> Self {
        self.address_failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn name_call_count(&self) -> usize {
        self.name_call_count.load(Ordering::SeqCst)
    }

    pub fn address_call_count(&self) -> usize {
        self.address_call_count.load(Ordering::SeqCst)
    }

    /// Create a new FlakyIdentity that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            name: other.name.clone(),
            address: other.address.clone(),
            name_failures_left: Arc::clone(&other.name_failures_left),
            address_failures_left: Arc::clone(&other.address_failures_left),
            name_call_count: Arc::clone(&other.name_call_count),
            address_call_count: Arc::clone(&other.address_call_count),
        }
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FlakyIdentity {
    async fn device_name(&self) -> Result<String> {
        self.name_call_count.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.name_failures_left) {
            return Err(Error::identity("supervisor unreachable"));
        }
        Ok(self.name.clone())
    }

    async fn device_address(&self) -> Result<String> {
        self.address_call_count.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.address_failures_left) {
            return Err(Error::http("HTTP error: 503 Service Unavailable"));
        }
        Ok(self.address.clone())
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

/// An InterfaceLookup over a fixed table (None = present without IPv4)
pub struct FakeInterfaces {
    table: HashMap<String, Option<Ipv4Addr>>,
}

impl FakeInterfaces {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, address: Option<Ipv4Addr>) -> Self {
        self.table.insert(name.to_string(), address);
        self
    }
}

impl InterfaceLookup for FakeInterfaces {
    fn ipv4_address(&self, interface: &str) -> Result<Ipv4Addr> {
        match self.table.get(interface) {
            None => Err(Error::config(format!(
                "The configured interface {} is not present",
                interface
            ))),
            Some(None) => Err(Error::config(format!(
                "Interface {} has no IPv4 address",
                interface
            ))),
            Some(Some(address)) => Ok(*address),
        }
    }
}

/// Helper to build a desired binding
pub fn binding(hostname: &str, address: [u8; 4]) -> DesiredBinding {
    DesiredBinding::new(hostname, Ipv4Addr::from(address))
}

/// Helper to create engine settings for testing
pub fn test_engine_config() -> EngineConfig {
    EngineConfig {
        tick_interval_secs: 10,
        retry_delay_secs: 10,
        domain: "local".to_string(),
        event_channel_capacity: 100,
    }
}

/// Index of the first call matching `pred`
pub fn position_of(calls: &[PublisherCall], pred: impl Fn(&PublisherCall) -> bool) -> Option<usize> {
    calls.iter().position(pred)
}
