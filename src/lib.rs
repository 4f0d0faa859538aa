//! Package reception desk: registration and recipient notifications, plus a
//! rule-based Spanish assistant that answers questions about the packages
//! on record.

pub mod aggregate;
pub mod assistant;
pub mod comms;
pub mod config;
pub mod desk;
pub mod error;
pub mod llm;
pub mod logger;
pub mod notify;
pub mod package;
pub mod runtime;
pub mod store;
