pub mod parser;
pub mod region;

pub use parser::RegionParser;
pub use region::{Region, RegionName, SizeField};
