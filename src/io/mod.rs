// Loading raw records from files and writing analytics out again.

pub mod export;
pub mod import;

pub use export::*;
pub use import::*;
