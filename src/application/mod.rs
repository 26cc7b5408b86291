//! Application layer - Discovery and binding use cases

pub mod bind;
pub mod discover;

pub use bind::TagBindingService;
pub use discover::TaglibDiscoveryWalker;
