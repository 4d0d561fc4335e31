//! acmreg Domain Layer
//!
//! Value types and collaborator traits shared by every other crate in the
//! workspace. Nothing here performs I/O; stores, model providers and the
//! extraction pipeline live in their own crates and depend on this one.
//!
//! ## Key Concepts
//!
//! - **HierarchicalContext**: the School → Building → Room → Area position
//!   a scanner or model is currently "inside" while walking a document
//! - **ExtractedRecord**: one asbestos-register item as returned by a model
//! - **AcmRecord**: the flat, persisted form of a register item
//! - **DataIssues**: order-preserving set of data-quality notes
//! - **Confidence**: `high > medium > low` ordinal used when merging
//!
//! ## Architecture
//!
//! - Only `serde` as an external dependency
//! - Trait definitions for every external interaction (documents, record
//!   persistence, model provisioning)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod context;
pub mod issues;
pub mod record;
pub mod register;
pub mod result;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use confidence::{ConfidenceDistribution, ExtractionConfidence};
pub use context::{AreaType, BuildingHeader, HierarchicalContext, RoomHeader, UNKNOWN_SCHOOL};
pub use issues::DataIssues;
pub use record::ExtractedRecord;
pub use register::{AcmRecord, RegisterSummary, UNKNOWN_BUILDING};
pub use result::ResultStatus;
pub use source::Source;
pub use traits::{
    Classify, FailureKind, ModelProvisioner, ModelSpec, RecordStore, SourceProvider,
    StructuredModel,
};
