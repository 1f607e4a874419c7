pub mod abort;
pub mod config;
pub mod predict;
pub mod steps;
pub mod transfer;
