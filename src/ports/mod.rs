//! Port traits at the engine's seams.

pub mod config_port;
pub mod data_port;
pub mod report_port;
