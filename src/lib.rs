pub mod cli;
pub mod config;
pub mod data;
pub mod fetch_data;
pub mod symbol;
pub mod venues;
