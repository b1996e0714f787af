pub mod board;
pub mod chat;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod refresh;
pub mod session;
pub mod tasks;
