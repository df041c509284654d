pub mod ai;
pub mod collection;
pub mod config;
pub mod errors;
pub mod logging;
pub mod record;
pub mod search;
