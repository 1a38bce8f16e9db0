//! # netcontext - Contextual Network Configuration Parser
//!
//! netcontext turns indentation-structured network device configuration
//! (Cisco IOS style) into a normalised tree, so that two snapshots of a
//! device's configuration can be compared by what they mean rather than by
//! how they were typed.
//!
//! ## Core Concepts
//!
//! - **Contexts**: named parsing modes entered by block-opening commands
//!   (`interface`, `vlan`, `ip access-list ...`) and left when indentation
//!   returns to the opening level
//! - **Commands**: anchored, case-insensitive patterns registered per
//!   context, each with an optional action and child context
//! - **Configuration tree**: sections of objects of attributes, created
//!   lazily as commands reference them
//! - **Canonicalisation**: rewriting order-insensitive or incidental syntax
//!   (standard ACL block order, service names, interface shorthand) into one
//!   form
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      IOS Grammar (ios)                               │
//! │     command table, actions, ACL canonicalisation, name normalisers   │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 Generic Contextual Parser (parser)                   │
//! │          indentation stack, per-context ordered command lists        │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Configuration Tree (tree)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use netcontext::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let text = std::fs::read_to_string("router1.cfg")?;
//!     let tree = IosParser::new()?.parse(&text)?;
//!
//!     for name in tree.sections() {
//!         println!("{name}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    // Error handling
    pub use crate::error::{Error, Result};

    // Generic parser
    pub use crate::parser::{
        Action, ContextParser, Groups, ParseStats, ParseTarget, Scope, ROOT_CONTEXT,
    };

    // Configuration tree
    pub use crate::tree::{ConfigTree, Map, Value};

    // IOS grammar
    pub use crate::ios::{Focus, IosConfig, IosParams, IosParser};

    // Settings
    pub use crate::config::Config;
}

pub mod config;
pub mod error;
pub mod ios;
pub mod logging;
pub mod parser;
pub mod tree;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns detailed version information including build metadata.
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        target: std::env::consts::ARCH,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Detailed version information for the netcontext build.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Semantic version string
    pub version: &'static str,
    /// Target architecture
    pub target: &'static str,
    /// Build profile (debug or release)
    pub profile: &'static str,
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "netcontext {} ({}, {})",
            self.version, self.target, self.profile
        )
    }
}
