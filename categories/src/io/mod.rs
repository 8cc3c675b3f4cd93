//! I/O helpers for the category store.

pub mod category_store;
pub mod config;
pub mod gateway;
pub mod init;
