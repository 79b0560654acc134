pub mod alert;
pub mod error;
pub mod logger;
pub mod validation;
