//! Core traits for the mDNS publisher
//!
//! This module defines the abstract interfaces the reconciliation engine is
//! written against. Real implementations live in their own crates; tests
//! substitute in-memory doubles.
//!
//! - [`IdentityProvider`]: Device name and address from the supervisor
//! - [`InterfaceLookup`]: IPv4 address of a statically named interface
//! - [`NamePublisher`]: Publication groups on the local name publishing service
//! - [`BindingResolver`]: Produces the desired binding for a tick

pub mod identity;
pub mod interface;
pub mod name_publisher;
pub mod resolver;

pub use identity::IdentityProvider;
pub use interface::InterfaceLookup;
pub use name_publisher::{AddressRecord, GroupHandle, NamePublisher};
pub use resolver::{BindingResolver, DesiredBinding};
