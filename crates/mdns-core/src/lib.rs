// # mdns-core
//
// Core library for keeping a local-network (mDNS) host record in sync with
// the device's current name and address.
//
// ## Architecture Overview
//
// - **IdentityProvider**: Trait for asking the supervisor for device name/address
// - **InterfaceLookup**: Trait for reading a fixed interface's IPv4 address
// - **NamePublisher**: Trait for publication groups on the name publishing service
// - **Resolver**: Produces the desired hostname/address binding for a tick
// - **PublicationLedger**: In-memory record of what is currently published
// - **Reconciler**: Control loop converging the ledger to the desired binding
//
// ## Design Principles
//
// 1. **Single source of truth**: The ledger, owned by the reconciler, is the only
//    record of what is live; it starts empty on every start
// 2. **Retract before publish**: Never two addresses advertised at once
// 3. **Transient vs fatal**: Provider failures are retried forever, publisher
//    failures end the process
// 4. **Library-First**: Real I/O lives in the integration crates

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use config::{AddressSourceConfig, EngineConfig, IdentityConfig, PublisherConfig};
pub use engine::{ReconcileEvent, Reconciler, TickOutcome};
pub use error::{Error, Result};
pub use ledger::{PublicationLedger, PublishedBinding};
pub use resolver::{AddressSource, Resolver};
pub use traits::{
    AddressRecord, BindingResolver, DesiredBinding, GroupHandle, IdentityProvider,
    InterfaceLookup, NamePublisher,
};
