//! Domain model for configuration export and import.
//!
//! The transfer domain models the six closed entity kinds, entity records and
//! their dependency edges, the self-describing export payload, import
//! requests with their conflict strategy and selection, and the terminal
//! import result. Storage and transport concerns remain outside this boundary.

mod entity;
mod error;
mod ids;
mod payload;
mod request;
mod result;
mod stored;

pub use entity::{EntityKey, EntityRecord, EntityType, MAX_ENTITY_NAME_LENGTH};
pub use error::{ParseConflictStrategyError, ParseEntityTypeError, TransferDomainError};
pub use ids::{EntityId, ImportId, KeyId};
pub use payload::{ExportPayload, PayloadHeader, PayloadMetadata, SchemaVersion};
pub use request::{ConflictStrategy, ImportRequest, Selection, UnmentionedTypePolicy};
pub use result::{ImportProgress, ImportResult, ImportStatus};
pub(crate) use result::ImportResultParts;
pub use stored::{PersistedEntityData, StoredEntity};
