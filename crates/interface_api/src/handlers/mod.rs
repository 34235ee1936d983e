//! Request handlers

pub mod cases;
pub mod cycle;
pub mod enforcement;
pub mod health;
pub mod reports;
pub mod webhooks;
