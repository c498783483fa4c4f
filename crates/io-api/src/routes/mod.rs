//! API Routes

pub mod actuators;
pub mod sensors;
