//! Rule compilers.
//!
//! The assembler talks to the rule compiler only through
//! [`KnowledgeBuilder`]; a [`KnowledgeBuilderFactory`] supplies a fresh one
//! per build so no compiler state leaks between test methods.

mod base;
mod collector;

pub use base::{KnowledgeBuilder, KnowledgeBuilderFactory};
pub use collector::{SourceCollector, SourceCollectorFactory};
