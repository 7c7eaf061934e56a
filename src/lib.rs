//! Parade State Bot: consolidates per-company parade states into one report.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod health;
pub mod parade;
pub mod scheduler;
