//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Asking the resolver for the desired binding on every tick
//! - Comparing it against the publication ledger
//! - Retracting stale groups and publishing the new one
//! - Recording the outcome in the ledger
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Resolver   │─── DesiredBinding ───┐
//! └─────────────┘                      │
//!                                      ▼
//!                             ┌──────────────┐
//!                             │  Reconciler  │
//!                             └──────────────┘
//!                                      │
//!         ┌────────────────────────────┼───────────────────────────┐
//!         │                            │                           │
//!         ▼                            ▼                           ▼
//! ┌──────────────────┐        ┌───────────────┐          ┌─────────────┐
//! │PublicationLedger │        │ NamePublisher │          │   Events    │
//! │ (find/insert)    │        │ (free/create) │          │  (notify)   │
//! └──────────────────┘        └───────────────┘          └─────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Resolve the desired binding
//! 2. Converged: the ledger already holds exactly that binding, no I/O
//! 3. Diverged: free every published group (in order, awaiting each), then
//!    create, fill and commit a new group
//! 4. Insert the new binding into the ledger
//!
//! Retract always completes before publish starts, so the service never
//! advertises two addresses for the device. Any publisher failure is fatal.

use crate::error::Result;
use crate::ledger::{PublicationLedger, PublishedBinding};
use crate::traits::{AddressRecord, BindingResolver, DesiredBinding, NamePublisher};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Reconciler started
    Started {
        publisher: &'static str,
    },

    /// Desired binding already published, nothing done
    Converged {
        hostname: String,
        address: Ipv4Addr,
    },

    /// A published group was freed
    Retracted {
        hostname: String,
        address: Ipv4Addr,
    },

    /// A new group was committed
    Published {
        hostname: String,
        address: Ipv4Addr,
    },

    /// A tick failed fatally
    Failed {
        error: String,
    },
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The ledger already matched; no publisher calls were made
    Converged,

    /// Stale bindings were retracted and the desired binding published
    Published {
        /// The binding now live
        binding: PublishedBinding,
        /// Number of groups freed before publishing
        retracted: usize,
    },
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Drive with [`Reconciler::run()`] (forever) or [`Reconciler::tick()`]
/// 3. `run()` returns only with a fatal error
///
/// ## Threading
///
/// One tick runs to completion before the next begins. The ledger is owned
/// by the reconciler and needs no locking. There is no cancellation point
/// inside a tick.
pub struct Reconciler {
    /// Desired binding source
    resolver: Box<dyn BindingResolver>,

    /// Name publishing service
    publisher: Box<dyn NamePublisher>,

    /// What is live right now
    ledger: PublicationLedger,

    /// Pause between ticks
    tick_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler with an empty ledger
    ///
    /// # Parameters
    ///
    /// - `resolver`: Desired binding source
    /// - `publisher`: Name publishing service implementation
    /// - `engine`: Engine settings
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields reconciler events
    pub fn new(
        resolver: Box<dyn BindingResolver>,
        publisher: Box<dyn NamePublisher>,
        engine: &crate::config::EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        engine.validate()?;

        let (tx, rx) = mpsc::channel(engine.event_channel_capacity);

        let reconciler = Self {
            resolver,
            publisher,
            ledger: PublicationLedger::new(),
            tick_interval: Duration::from_secs(engine.tick_interval_secs),
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// The current publication ledger
    pub fn ledger(&self) -> &PublicationLedger {
        &self.ledger
    }

    /// Run ticks forever, sleeping `tick_interval` between them
    ///
    /// # Returns
    ///
    /// Only ever returns the first fatal error.
    pub async fn run(&mut self) -> Result<()> {
        self.emit_event(ReconcileEvent::Started {
            publisher: self.publisher.publisher_name(),
        });
        info!(
            "Reconciler started (publisher={}, interval={:?})",
            self.publisher.publisher_name(),
            self.tick_interval
        );

        loop {
            if let Err(e) = self.tick().await {
                self.emit_event(ReconcileEvent::Failed {
                    error: e.to_string(),
                });
                return Err(e);
            }
            tokio::time::sleep(self.tick_interval).await;
        }
    }

    /// Run a single reconciliation tick
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let desired = self.resolver.resolve().await?;

        if self.ledger.find(&desired.hostname, desired.address).is_some() {
            debug!("{} already published, nothing to do", desired);
            self.emit_event(ReconcileEvent::Converged {
                hostname: desired.hostname,
                address: desired.address,
            });
            return Ok(TickOutcome::Converged);
        }

        let stale: Vec<PublishedBinding> = self.ledger.iter().cloned().collect();
        for binding in &stale {
            self.retract(binding).await?;
        }

        let binding = self.publish(&desired).await?;
        self.ledger.insert(binding.clone());

        Ok(TickOutcome::Published {
            binding,
            retracted: stale.len(),
        })
    }

    /// Free a published group and drop it from the ledger
    async fn retract(&mut self, binding: &PublishedBinding) -> Result<()> {
        info!(
            "Removing {} at address {} from local mDNS pool (live for {}s)",
            binding.hostname,
            binding.address,
            binding.age().num_seconds()
        );

        if let Err(e) = self.publisher.free(&binding.handle).await {
            error!(
                "Failed to retract {} at {} (group {}): {}",
                binding.hostname, binding.address, binding.handle, e
            );
            return Err(e);
        }

        self.ledger.remove_group(&binding.handle);
        self.emit_event(ReconcileEvent::Retracted {
            hostname: binding.hostname.clone(),
            address: binding.address,
        });
        Ok(())
    }

    /// Create, fill and commit a new group for `desired`
    async fn publish(&self, desired: &DesiredBinding) -> Result<PublishedBinding> {
        info!(
            "Adding {} at address {} to local mDNS pool",
            desired.hostname, desired.address
        );

        let group = match self.publisher.create_group().await {
            Ok(group) => group,
            Err(e) => {
                error!("Failed to create publication group for {}: {}", desired, e);
                return Err(e);
            }
        };

        let record = AddressRecord::new(desired.hostname.clone(), desired.address);
        if let Err(e) = self.publisher.add_address(&group, &record).await {
            error!("Failed to add {} to group {}: {}", desired, group, e);
            return Err(e);
        }

        if let Err(e) = self.publisher.commit(&group).await {
            error!("Failed to commit group {} for {}: {}", group, desired, e);
            return Err(e);
        }

        debug!("Committed group {} for {}", group, desired);
        self.emit_event(ReconcileEvent::Published {
            hostname: desired.hostname.clone(),
            address: desired.address,
        });

        Ok(PublishedBinding::new(group, desired))
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
