//! # testflux
//!
//! Rule knowledge bases for test suites.
//!
//! Test classes declare which rule sources (directories or single files)
//! they need. Before each test method runs, testflux resolves those sources,
//! compiles them into one knowledge base and binds it into the test
//! instance.
//!
//! ## Modules
//!
//! - [`resolver`] - Declared rule sources to validated file paths
//! - [`builder`] - Rule compiler capability
//! - [`assembler`] - Knowledge base build pipeline and diagnostics
//! - [`injection`] - Binding knowledge bases into test instances
//! - [`declarations`] - Where class declarations come from
//! - [`lifecycle`] - Test runner listeners
//! - [`cli`] - Command line interface
//! - [`types`] - Shared types

pub mod assembler;
pub mod builder;
#[cfg(feature = "cli")]
pub mod cli;
pub mod declarations;
pub mod injection;
pub mod lifecycle;
pub mod resolver;
pub mod types;

pub use types::config::Config;
pub use types::errors::{TestfluxError, TestfluxResult};
