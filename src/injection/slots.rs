//! Slot declarations and the injection contract.

use serde::{Deserialize, Serialize};

use crate::types::knowledge::SharedKnowledgeBase;

/// Declared type of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Holds a knowledge base.
    KnowledgeBase,
    /// Holds any value, knowledge bases included.
    Any,
    /// Holds something unrelated, named for diagnostics.
    Other(String),
}

impl SlotKind {
    /// Whether a knowledge base can be assigned to a slot of this kind.
    pub fn accepts_knowledge_base(&self) -> bool {
        matches!(self, SlotKind::KnowledgeBase | SlotKind::Any)
    }
}

/// One storage slot a test type declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDeclaration {
    /// Slot name, unique within its type.
    pub name: String,

    /// Declared kind.
    pub kind: SlotKind,

    /// Opt-in marker.
    #[serde(default)]
    pub inject: bool,

    /// Opt-out marker, wins over everything else.
    #[serde(default)]
    pub no_injection: bool,
}

impl SlotDeclaration {
    /// Declares an unmarked slot.
    pub fn new(name: impl Into<String>, kind: SlotKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inject: false,
            no_injection: false,
        }
    }

    /// Declares a knowledge base slot carrying the inject marker.
    pub fn knowledge_base(name: impl Into<String>) -> Self {
        Self::new(name, SlotKind::KnowledgeBase).injected()
    }

    /// Adds the inject marker.
    pub fn injected(mut self) -> Self {
        self.inject = true;
        self
    }

    /// Adds the opt-out marker.
    pub fn opted_out(mut self) -> Self {
        self.no_injection = true;
        self
    }
}

/// A test type that can receive knowledge bases.
///
/// Implementors list the slots they declare themselves and perform the
/// assignment, so private fields can be written without public setters.
///
/// ```rust,ignore
/// struct PricingTest {
///     knowledge: Option<SharedKnowledgeBase>,
/// }
///
/// impl Injectable for PricingTest {
///     fn type_name(&self) -> &str {
///         "PricingTest"
///     }
///
///     fn declared_slots(&self) -> Vec<SlotDeclaration> {
///         vec![SlotDeclaration::knowledge_base("knowledge")]
///     }
///
///     fn assign_slot(&mut self, slot: &str, knowledge: SharedKnowledgeBase) -> Result<(), String> {
///         match slot {
///             "knowledge" => {
///                 self.knowledge = Some(knowledge);
///                 Ok(())
///             }
///             other => Err(format!("no slot named '{other}'")),
///         }
///     }
///
///     fn clear_slot(&mut self, slot: &str) {
///         if slot == "knowledge" {
///             self.knowledge = None;
///         }
///     }
/// }
/// ```
pub trait Injectable: Send {
    /// Name of the concrete type. Slot tables are cached under it.
    fn type_name(&self) -> &str;

    /// Slots declared directly on this type.
    fn declared_slots(&self) -> Vec<SlotDeclaration>;

    /// Stores `knowledge` in `slot`. An `Err` carries the rejection reason.
    fn assign_slot(&mut self, slot: &str, knowledge: SharedKnowledgeBase) -> Result<(), String>;

    /// Empties `slot` again. Called on slots already filled when a later
    /// slot of the same bind rejects its assignment.
    fn clear_slot(&mut self, slot: &str);
}
