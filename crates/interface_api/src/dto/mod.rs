//! Request/response data transfer objects

pub mod cases;
pub mod enforcement;
