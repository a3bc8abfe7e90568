//! # Comprobantes Telegram Bot
//!
//! A Telegram bot that turns a pipe-delimited message into a payment
//! receipt: the fields are formatted, composited onto a fixed background
//! template and sent back as a photo. User access is tracked in a small
//! SQLite store.

pub mod bot;
pub mod db;
pub mod fonts;
pub mod formatter;
pub mod layout;
pub mod parser;
pub mod renderer;
pub mod templates;
