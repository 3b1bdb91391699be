// src/store/mod.rs

pub mod exams;
pub mod postgres;
pub mod results;
pub mod storage;
