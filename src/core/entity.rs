//! Entity trait - common interface for all graph members

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::{EntityKind, EntityRef};

/// Bookkeeping shared by every entity kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Soft-delete flag; discarded entities are skipped by default scans
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub discarded: bool,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    /// Last editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,

    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Record an edit
    pub fn touch(&mut self, author: impl Into<String>) {
        self.modified_by = Some(author.into());
        self.modified_on = Some(Utc::now());
    }
}

/// Common trait for all entity kinds
pub trait Entity {
    /// The kind of this entity
    const KIND: EntityKind;

    /// Typed reference to this entity
    fn entity_ref(&self) -> EntityRef;

    /// Human readable name
    fn name(&self) -> &str;

    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    fn is_discarded(&self) -> bool {
        self.metadata().discarded
    }
}
