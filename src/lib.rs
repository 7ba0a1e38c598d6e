pub mod config;
pub mod consts;
pub mod engine;
pub mod events;
pub mod registry;
pub mod scenario;
pub mod server;
pub mod webhook;
