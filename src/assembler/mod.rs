//! Knowledge base assembly.
//!
//! For a test class the assembler:
//!
//! 1. resolves every declared rule source (see [`crate::resolver`])
//! 2. offers every resolved file to a fresh compiler
//! 3. fails with all accumulated diagnostics, or returns the knowledge base
//! 4. applies the per-method refinement hook
//!
//! ## Example
//!
//! ```rust,ignore
//! use testflux::assembler::KnowledgeBaseAssembler;
//! use testflux::builder::SourceCollectorFactory;
//! use testflux::types::config::Config;
//!
//! let assembler = KnowledgeBaseAssembler::from_config(&Config::default(), SourceCollectorFactory);
//! let knowledge = assembler.build(&declaration, &method, "/repo".as_ref())?;
//! println!("{} packages", knowledge.len());
//! ```

mod diagnostics;
mod engine;
mod session;

pub use diagnostics::{join_lines, render_diagnostics};
pub use engine::{KnowledgeBaseAssembler, MethodOverlay};
pub use session::{BuildPhase, BuildSession};
