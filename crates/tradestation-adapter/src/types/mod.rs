/*
[INPUT]:  API schemas for brokerage and market data
[OUTPUT]: Strongly-typed Rust structs and enums
[POS]:    Data layer - shared type definitions
[UPDATE]: When API schema changes or new types needed
*/

pub mod enums;
pub mod models;

pub use enums::*;
pub use models::*;
