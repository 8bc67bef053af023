pub mod models;
pub mod parsers;
pub mod traits;

pub use models::*;
pub use parsers::*;
pub use traits::*;
