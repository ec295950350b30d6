pub mod enrich;
pub mod pipeline;
pub mod scanner;
pub mod subdivide;

mod error;

pub use error::{Error, Result};
