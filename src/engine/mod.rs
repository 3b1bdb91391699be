// src/engine/mod.rs

pub mod clock;
pub mod registry;
pub mod scoring;
pub mod session;
