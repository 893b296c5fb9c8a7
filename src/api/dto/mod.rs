//! Data Transfer Objects for REST request/response serialization.
//!
//! Request bodies use camelCase field names and are validated into domain
//! inputs before reaching the service layer.

pub mod commentary_dto;
pub mod common_dto;
pub mod match_dto;

pub use commentary_dto::*;
pub use common_dto::*;
pub use match_dto::*;
