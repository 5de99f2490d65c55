//! Command handlers

pub mod registry;
