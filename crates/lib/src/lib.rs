//! presetci-lib: preset resolution and tool execution for CMake-based CI
//!
//! This crate provides the building blocks of the `presetci` tool:
//! - `tree`: the configuration value tree and its deep merge
//! - `substitute`: `${name}` expansion over configuration values
//! - `preset`: loading preset files, inheritance resolution and typed views
//! - `run`: spawning tools and classifying their output line by line
//! - `action`: the fixed registry of actions the CLI dispatches to

pub mod action;
pub mod consts;
pub mod platform;
pub mod preset;
pub mod run;
pub mod substitute;
pub mod tree;
pub mod util;
