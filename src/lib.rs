//! hrm - a local-first personnel records manager

pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod tui;
