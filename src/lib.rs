pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod label;
pub mod locate;
pub mod names;
pub mod record;

pub use error::ExtractionError;
pub use flatten::{flatten, flatten_with, PlaceholderRule};
pub use label::{label_for, list_label};
pub use locate::RawTable;
pub use record::{extract, extract_with, ExtractOptions, SourceDocument, TableRecord};
