//! DNS backend implementations

/// Shared utilities used by backend implementations.
pub mod common;

#[cfg(feature = "bind")]
mod bind;
#[cfg(feature = "cloudflare")]
mod cloudflare;

#[cfg(feature = "bind")]
pub use bind::BindProvider;
#[cfg(feature = "cloudflare")]
pub use cloudflare::CloudflareProvider;
