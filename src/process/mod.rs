pub mod memory;
mod process;
pub mod summary;

pub use process::{Origin, SmapsReport};
