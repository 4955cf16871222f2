//! Domain layer for Convention Guardian
//!
//! CDD Principle: Domain Model - Pure business logic for convention enforcement
//! - Contains file entries, classification states, violation records and remediation actions
//! - Independent of directory listing, configuration parsing or terminal output
//! - Expresses the ubiquitous language of folder rules, naming templates and violations

pub mod entry;
pub mod remediation;
pub mod violations;

// Re-export main domain types for convenience
pub use entry::*;
pub use remediation::*;
pub use violations::*;
