pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod matcher;
pub mod sampler;
pub mod sink;
pub mod system;
pub mod tracker;
