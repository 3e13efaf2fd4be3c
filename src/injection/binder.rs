//! Binding of knowledge bases into test instances.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::Span;

use crate::types::config::EligibilityPolicy;
use crate::types::knowledge::SharedKnowledgeBase;
use crate::{TestfluxError, TestfluxResult};

use super::slots::{Injectable, SlotDeclaration};

/// Binds a knowledge base into every eligible slot of a target.
///
/// Eligible slot tables are computed once per type name and kept for the
/// lifetime of the binder.
pub struct InjectionBinder {
    policy: EligibilityPolicy,
    slot_tables: RwLock<HashMap<String, Arc<[SlotDeclaration]>>>,
    span: Span,
}

impl InjectionBinder {
    /// Creates a binder with an empty slot-table cache.
    pub fn new(policy: EligibilityPolicy) -> Self {
        Self {
            policy,
            slot_tables: RwLock::new(HashMap::new()),
            span: tracing::debug_span!("binder"),
        }
    }

    /// Logs inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    /// Whether `slot` may receive a knowledge base under the binder's policy.
    pub fn is_eligible(&self, slot: &SlotDeclaration) -> bool {
        if slot.no_injection {
            return false;
        }
        if self.policy == EligibilityPolicy::OptIn && !slot.inject {
            return false;
        }
        slot.kind.accepts_knowledge_base()
    }

    /// Precomputes the slot table of a type, replacing any cached one.
    pub fn register(&self, type_name: &str, declared: &[SlotDeclaration]) -> Arc<[SlotDeclaration]> {
        let table = self.eligible(declared);
        tracing::debug!(
            parent: &self.span,
            type_name,
            eligible = table.len(),
            declared = declared.len(),
            "Registered slot table"
        );

        let mut tables = self
            .slot_tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tables.insert(type_name.to_string(), table.clone());
        table
    }

    /// Returns the eligible slots of `target`, computing them on first use.
    pub fn eligible_slots(&self, target: &dyn Injectable) -> Arc<[SlotDeclaration]> {
        {
            let tables = self
                .slot_tables
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(table) = tables.get(target.type_name()) {
                return table.clone();
            }
        }

        self.register(target.type_name(), &target.declared_slots())
    }

    /// Number of cached slot tables.
    pub fn cached_types(&self) -> usize {
        self.slot_tables
            .read()
            .map(|tables| tables.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    /// Binds `knowledge` into every eligible slot and returns how many were
    /// bound. All slots share the same allocation.
    ///
    /// If a slot rejects the assignment, the slots filled before it are
    /// cleared again, so the target ends up with all or none.
    pub fn bind(
        &self,
        knowledge: &SharedKnowledgeBase,
        target: &mut dyn Injectable,
    ) -> TestfluxResult<usize> {
        let slots = self.eligible_slots(target);

        for (index, slot) in slots.iter().enumerate() {
            if let Err(reason) = target.assign_slot(&slot.name, Arc::clone(knowledge)) {
                for filled in &slots[..index] {
                    target.clear_slot(&filled.name);
                }
                tracing::debug!(
                    parent: &self.span,
                    type_name = target.type_name(),
                    slot = %slot.name,
                    rolled_back = index,
                    "Slot rejected knowledge base"
                );
                return Err(TestfluxError::Injection {
                    class: target.type_name().to_string(),
                    slot: slot.name.clone(),
                    reason,
                });
            }

            tracing::trace!(
                parent: &self.span,
                type_name = target.type_name(),
                slot = %slot.name,
                knowledge_base = %knowledge.id,
                "Bound knowledge base"
            );
        }

        Ok(slots.len())
    }

    fn eligible(&self, declared: &[SlotDeclaration]) -> Arc<[SlotDeclaration]> {
        declared
            .iter()
            .filter(|slot| self.is_eligible(slot))
            .cloned()
            .collect()
    }
}

impl Default for InjectionBinder {
    fn default() -> Self {
        Self::new(EligibilityPolicy::default())
    }
}
