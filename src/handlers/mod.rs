// src/handlers/mod.rs

pub mod attempts;
pub mod exams;
pub mod results;
