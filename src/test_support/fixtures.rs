// Shared test fixtures, compiled only for unit tests.

pub mod app_state;
pub mod commands;
pub mod controls;
