pub mod types;

pub use types::{Entry, Reference, SearchKey};
