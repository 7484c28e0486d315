pub mod generators;
pub mod utils;
