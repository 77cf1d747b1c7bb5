mod runner;
mod script;

pub use runner::*;
pub use script::*;
