pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod event_loop;
pub mod logging;
pub mod script;
pub mod terminal;
pub mod var;
