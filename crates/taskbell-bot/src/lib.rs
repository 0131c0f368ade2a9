pub mod bot;
pub mod commands;
pub mod config;
pub mod notify;
pub mod scheduler;
pub mod telegram;
