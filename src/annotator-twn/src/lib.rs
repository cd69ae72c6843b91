pub mod errors;
pub mod work;

pub use errors::Error;

pub use work::{AnnotationResult, Annotator, RunSummary, annotation_payload, extract_annotation};
