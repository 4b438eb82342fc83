//! doddle - a small chat bot that polls a messaging service, recognises
//! commands addressed to it and broadcasts them to plugins.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
