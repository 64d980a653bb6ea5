pub mod employee;
pub mod stats;
