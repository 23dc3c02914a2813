pub mod attempt;
pub mod cli;
pub mod config;
pub mod source;
