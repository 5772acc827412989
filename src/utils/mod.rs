// src/utils/mod.rs

pub mod extract;
pub mod files;
pub mod hash;
pub mod html;
pub mod jwt;
