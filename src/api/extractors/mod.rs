//! Custom request extractors and shared validation rules.

mod validated_json;
pub mod validation;

pub use validated_json::ValidatedJson;
