pub mod category;
pub mod config;
pub mod tree;

pub use category::*;
pub use config::*;
pub use tree::*;
