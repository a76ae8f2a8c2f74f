// src/telegram/mod.rs

pub mod bot;
pub mod init_data;
pub mod keyboard;
