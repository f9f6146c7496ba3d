pub mod config;
pub mod radiation;
pub mod runner;
