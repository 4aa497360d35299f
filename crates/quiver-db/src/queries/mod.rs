//! Query functions, one module per table group.

pub mod assignments;
pub mod exercises;
pub mod routines;
pub mod students;
pub mod users;
