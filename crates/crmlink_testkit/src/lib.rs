//! # crmlink Testkit
//!
//! Test utilities for crmlink.
//!
//! This crate provides:
//! - Entity metadata fixtures for a small sales schema
//! - [`MemoryBridge`], a stateful bridge that evaluates query markup
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use crmlink_codec::Map;
//! use crmlink_core::Projection;
//! use crmlink_testkit::prelude::*;
//!
//! let client = memory_client();
//! let id = client
//!     .create("account", &Map::new().with("name", "Contoso"))
//!     .unwrap();
//! let found = client.retrieve("account", id, &Projection::All).unwrap();
//! assert!(found.is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod memory;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::memory::*;
}

pub use fixtures::*;
pub use generators::*;
pub use memory::*;
