//! Runtime module: process startup, config and logging.

pub mod boot;
