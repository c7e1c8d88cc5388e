//! Platform-specific helper abstractions used to keep trait bounds aligned with
//! the threading guarantees of each host.
//!
//! Engine callbacks arrive on threads owned by the native media library, so
//! every bridge implementation must be shareable across threads. The marker
//! traits below keep the bound in one place instead of repeating
//! `Send + Sync` on every trait definition.

/// Marker trait that applies `Send + Sync` to bridge implementations.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync {}

/// Marker trait equivalent to `Send`.
pub trait PlatformSend: Send {}

impl<T> PlatformSend for T where T: Send {}
