// # Identity Provider Trait
//
// Defines the interface for asking the device supervisor who and where this
// device is.
//
// ## Implementations
//
// - HTTP/JSON supervisor API: `mdns-identity-http` crate
//
// ## Usage
//
// ```rust,ignore
// use mdns_core::IdentityProvider;
//
// let provider = /* IdentityProvider implementation */;
// let name = provider.device_name().await?;
// let raw = provider.device_address().await?; // "10.0.0.5 172.17.0.1"
// ```

use async_trait::async_trait;

/// Trait for identity/address provider implementations
///
/// The provider is an unreliable network service. Implementations make
/// exactly one request per call and report failures as transient errors
/// ([`crate::Error::is_transient`]); the [`crate::Resolver`] owns the retry
/// policy.
///
/// # Forbidden
///
/// - Retrying or sleeping inside a call
/// - Caching answers between calls (a rename must be visible on the next tick)
/// - Logging the API credential
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Get the device name as configured on the supervisor
    ///
    /// This is the bare name (e.g. `foo`), without any domain suffix.
    async fn device_name(&self) -> Result<String, crate::Error>;

    /// Get the device address exactly as reported
    ///
    /// Devices with several routes report several addresses separated by
    /// spaces, primary route first. Choosing one is left to the caller.
    async fn device_address(&self) -> Result<String, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
