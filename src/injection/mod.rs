//! Knowledge base injection.
//!
//! Test types implement [`Injectable`] to describe their slots; the
//! [`InjectionBinder`] picks the eligible ones and assigns the shared
//! knowledge base to each.
//!
//! A slot is eligible when:
//!
//! - it carries the inject marker (only under [`EligibilityPolicy::OptIn`])
//! - it does not carry the opt-out marker
//! - its kind accepts a knowledge base
//!
//! [`EligibilityPolicy::OptIn`]: crate::types::config::EligibilityPolicy::OptIn

mod binder;
mod slots;

pub use binder::InjectionBinder;
pub use slots::{Injectable, SlotDeclaration, SlotKind};
