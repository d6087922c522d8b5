//! Auditing metadata shared by every persisted entity.
//!
//! Each entity embeds an [`AuditInfo`] and exposes it through [`AuditedEntity`],
//! which provides the soft-delete and modification-stamp behaviour.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// Creation/modification timestamps and the soft-delete flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    created_at: DateTime<Utc>,
    last_modified_at: Option<DateTime<Utc>>,
    is_deleted: bool,
}

impl AuditInfo {
    /// Audit metadata for a brand new entity: created now, never modified.
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            last_modified_at: None,
            is_deleted: false,
        }
    }

    /// Rehydrate persisted audit metadata.
    pub fn restore(
        created_at: DateTime<Utc>,
        last_modified_at: Option<DateTime<Utc>>,
        is_deleted: bool,
    ) -> Self {
        Self {
            created_at,
            last_modified_at,
            is_deleted,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        self.last_modified_at
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Stamp the modification time with the current UTC time.
    pub fn touch(&mut self) {
        self.last_modified_at = Some(Utc::now());
    }

    /// Flag as logically removed. Deleting twice is allowed and re-stamps.
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// An entity carrying [`AuditInfo`].
pub trait AuditedEntity: Entity {
    fn audit(&self) -> &AuditInfo;

    fn audit_mut(&mut self) -> &mut AuditInfo;

    fn created_at(&self) -> DateTime<Utc> {
        self.audit().created_at()
    }

    fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        self.audit().last_modified_at()
    }

    fn is_deleted(&self) -> bool {
        self.audit().is_deleted()
    }

    /// Soft delete: the row stays in storage with `is_deleted = true`.
    fn mark_as_deleted(&mut self) {
        self.audit_mut().mark_deleted();
    }

    fn update_last_modified(&mut self) {
        self.audit_mut().touch();
    }

    /// Fails with an invariant violation if the entity has been soft-deleted.
    fn ensure_not_deleted(&self) -> DomainResult<()> {
        if self.is_deleted() {
            return Err(DomainError::invariant(format!(
                "entity {:?} is deleted",
                self.id()
            )));
        }
        Ok(())
    }
}
