//! Declarative VCL language metadata.
//!
//! The analyzer validates programs against a static description of the
//! language rather than hard-coded rules: which built-in subroutines
//! exist, which return actions each admits, which variables may be read,
//! written, or unset from which method, and which VCL versions each
//! variable spans. The description is a JSON document; a bundled payload
//! compiled into this crate serves as the default, and external files can
//! replace it at runtime through [`MetadataLoader`].
//!
//! # Usage
//!
//! ```
//! use vcl_metadata::{AccessKind, AccessOutcome, MetadataLoader};
//!
//! let loader = MetadataLoader::bundled().unwrap();
//! let metadata = loader.snapshot();
//! assert!(metadata.valid_return_action("recv", "hash"));
//! assert_eq!(
//!     metadata.variable_access("resp.http.x-served-by", "vcl_deliver", AccessKind::Write),
//!     AccessOutcome::Allowed,
//! );
//! ```

mod loader;
mod model;

pub use loader::{MetadataError, MetadataLoader};
pub use model::{
    AccessKind, AccessOutcome, LanguageMetadata, MethodContext, MethodInfo, VariableInfo,
};
