// src/models/mod.rs

pub mod plan;
pub mod question;
pub mod response;
pub mod score;
pub mod test_paper;
