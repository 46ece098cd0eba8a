//! CLI command implementations

pub mod derive;
pub mod generate;
pub mod inspect;
pub mod json_output;
pub mod stream;

mod entropy;
