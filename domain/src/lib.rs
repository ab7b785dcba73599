pub mod analysis;
pub mod bmi;
pub mod completion;
pub mod error;
pub mod extractor;
pub mod form;
pub mod memory;
pub mod profiles;
pub mod template;
pub mod transcript;

pub use error::{
    AnalysisError, CompletionError, ExtractionError, FormError, SchemaError, TemplateError,
    TurnError,
};
