//! OTSL (Optimized Table Structure Language) tokenizing, parsing, and building.

pub mod builder;
pub mod parser;
pub mod token;

pub use builder::build;
pub use parser::parse;
pub use token::OtslToken;
