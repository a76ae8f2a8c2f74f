//! Queries shared by the HTTP handlers and the bot.

pub mod questions;
pub mod share_cards;
pub mod users;
