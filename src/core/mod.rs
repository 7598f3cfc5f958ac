pub mod batch;
pub mod cbl_parser;
pub mod editor;
pub mod importer;
pub mod json_batch;
pub mod placement;
pub mod reorder;
pub mod resolver;

pub use crate::domain::model::{BookDescriptor, ImportResult, Resolution};
pub use crate::domain::ports::{CatalogLookup, ListWriter, ReadingListStore, UserDirectory};
pub use crate::utils::error::Result;
