//! Process bootstrap helpers for the device binary

pub mod config;

pub use self::config::load_config;
