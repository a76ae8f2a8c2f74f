// src/models/mod.rs

pub mod question;
pub mod share_card;
pub mod user;
