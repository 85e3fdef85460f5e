//! Doxygen search-index loading and lookup.
//!
//! - **[`parser`]**: reads `search/*.js` scripts into entries.
//! - **[`search_id`]**: Doxygen's `_xx` key escaping and `_<n>` suffixes.
//! - **[`table`]**: the immutable [`SearchIndexTable`] and its lazy [`Lookup`].
//! - **[`set`]**: a whole `search/` directory grouped by section.
//! - **[`shared`]**: a reloadable handle for long-running consumers.

pub mod entities;
pub mod error;
pub mod parser;
pub mod search_id;
pub mod set;
pub mod shared;
pub mod table;

pub use error::{LoadError, MalformedIndexError};
pub use set::{ALL_SECTION, SearchIndexSet};
pub use shared::SharedIndex;
pub use table::{Lookup, MatchMode, SearchIndexTable};
