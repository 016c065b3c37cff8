pub mod batch;
pub mod cli;
pub mod config;
pub mod converter;
pub mod job;
pub mod locator;
pub mod util;
