//! muzikax-file - File-backed token store.
//!
//! [`FileTokenStore`] keeps the access/refresh pair in a small JSON file so
//! that credentials survive between process runs.

mod store;

pub use store::FileTokenStore;
