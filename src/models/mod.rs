//! # Data Models
//!
//! SeaORM entities for the star-schema warehouse tables, plus the service
//! info payload returned by the dashboard API root.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod dim_date;
pub mod dim_habit;
pub mod fact_habit;

pub use dim_date::Entity as DimDate;
pub use dim_habit::Entity as DimHabit;
pub use fact_habit::Entity as FactHabit;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "habits-dashboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
