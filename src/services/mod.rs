// src/services/mod.rs

//! The assemble → score → classify → plan pipeline. Pure functions except
//! for `assembler::assemble`, which talks to the store traits.

pub mod allocation;
pub mod assembler;
pub mod planner;
pub mod scorer;
pub mod tier;
pub mod trend;
