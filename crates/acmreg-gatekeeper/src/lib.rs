//! acmreg Gatekeeper
//!
//! Quality control for model-extracted register records.
//!
//! The Gatekeeper provides:
//! - Required-field validation with building inference from context
//! - Result and confidence normalization
//! - Duplicate merging on a composite identity key
//!
//! # Examples
//!
//! ```
//! use acmreg_domain::{ExtractedRecord, HierarchicalContext};
//! use acmreg_gatekeeper::{Gatekeeper, ValidationConfig};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let record = ExtractedRecord {
//!     building_id: "B1".into(),
//!     product: "Floor Tiles".into(),
//!     material_description: "Vinyl tiles".into(),
//!     result: "NAD".into(),
//!     ..Default::default()
//! };
//!
//! let report = gatekeeper.validate_all(vec![record], &HierarchicalContext::default());
//! assert_eq!(report.accepted[0].result, "Not Detected");
//! ```

#![warn(missing_docs)]

mod config;
mod dedup;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use dedup::{dedup_key, merge_records, DedupOutcome, Deduplicator};
pub use error::GatekeeperError;
pub use validator::{
    issues, Gatekeeper, RejectionReason, ValidationReport, ValidationResult, ValidationStatus,
};
