pub mod error;
pub mod logger;
pub mod network;
pub mod validation;
