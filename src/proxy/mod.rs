//! Reverse-proxy configuration: rendering and lifecycle management.

pub mod manager;
pub mod render;

pub use manager::{ConfigState, ProxyConfigManager};
pub use render::{ReverseProxyConfig, TlsPaths};
