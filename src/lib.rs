// Library crate: capture, persistence and analysis of browser debug sessions.
// main.rs drives the offline commands through these modules.

pub mod analyzer;
pub mod browser;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod runner;
pub mod screenshot;
pub mod session;
pub mod storage;
