// Copyright 2025 Cowboy AI, LLC.

//! Entity identity and the persisted-document contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DomainError;

/// A typed entity ID using phantom types for type safety
///
/// The phantom type parameter ensures that IDs for different entity types
/// cannot be mixed up at compile time.
///
/// # Examples
///
/// ```rust
/// use siteworks_domain::{EntityId, MaterialId, ProjectId};
///
/// let material: MaterialId = EntityId::new();
/// let project: ProjectId = EntityId::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: MaterialId = project; // ERROR!
/// assert_ne!(material.as_uuid(), project.as_uuid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> FromStr for EntityId<T> {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self::from_uuid)
            .map_err(|e| DomainError::ValidationError(format!("malformed id {s:?}: {e}")))
    }
}

/// Bounds shared by all id marker types
pub trait IdMarker:
    fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + Send + Sync + 'static
{
}

macro_rules! id_markers {
    ($($(#[$doc:meta])* $marker:ident => $alias:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $marker;

            impl IdMarker for $marker {}

            #[doc = concat!("Id of a [`", stringify!($marker), "`] entity")]
            pub type $alias = EntityId<$marker>;
        )*
    };
}

id_markers! {
    /// Marker for materials
    MaterialMarker => MaterialId;
    /// Marker for equipment
    EquipmentMarker => EquipmentId;
    /// Marker for clients
    ClientMarker => ClientId;
    /// Marker for agreements (nested in clients)
    AgreementMarker => AgreementId;
    /// Marker for projects
    ProjectMarker => ProjectId;
    /// Marker for tasks
    TaskMarker => TaskId;
    /// Marker for progress reports
    ReportMarker => ReportId;
    /// Marker for users
    UserMarker => UserId;
}

/// A persisted document: an entity with identity, a version for optimistic
/// concurrency, and optional unique keys enforced by the store.
pub trait Document: Clone + Send + Sync + 'static {
    /// Id marker of this document type
    type Marker: IdMarker;

    /// Collection name, used for logging and unique-key errors
    const COLLECTION: &'static str;

    /// Human-readable entity name, used in not-found errors
    const ENTITY_TYPE: &'static str;

    /// The document's id
    fn id(&self) -> EntityId<Self::Marker>;

    /// Current persisted version (0 = never saved)
    fn version(&self) -> u64;

    /// Overwrite the version; only the store calls this
    fn set_version(&mut self, version: u64);

    /// Stamp the modification time
    fn touch(&mut self, now: DateTime<Utc>);

    /// Unique index entries as `(field, normalized value)`
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}
