// src/handlers/mod.rs

pub mod admin;
pub mod performance;
pub mod planner;
pub mod test_paper;
