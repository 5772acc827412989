// src/handlers/mod.rs

pub mod auth;
pub mod courses;
pub mod documents;
pub mod enrollments;
pub mod files;
pub mod learning_items;
pub mod questions;
pub mod quiz_banks;
pub mod quizzes;
pub mod weeks;
