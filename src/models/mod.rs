pub mod concert;
pub mod filter;
pub mod route;

pub use concert::*;
pub use filter::*;
pub use route::*;
