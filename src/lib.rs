pub mod config;
pub mod duration;
pub mod fetch;
pub mod providers;
