//! Workspace umbrella crate.
//!
//! Exposes the feature flags that map onto the individual workspace crates so a
//! host application can depend on `product-uploader-workspace` alone and get a
//! fully wired [`core_service::CoreService`].

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
