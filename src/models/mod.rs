// src/models/mod.rs

pub mod course;
pub mod document;
pub mod enums;
pub mod learning_item;
pub mod question;
pub mod quiz_attempt;
pub mod quiz_bank;
pub mod response;
pub mod user;
pub mod week;
