pub mod error;
pub mod odds_api;
pub mod projections_api;

pub use error::ApiError;
