pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod runtime;
pub mod site;
