//! Connectors module
//!
//! - The `RecordSource` trait the pipeline pulls raw records through
//! - The Notion database-query implementation

pub mod notion;
pub mod trait_;

pub use notion::{NOTION_PROVIDER_SLUG, NotionClient, NotionSetupError};
pub use trait_::{FetchError, FetchedRecords, RecordSource};
