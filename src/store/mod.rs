pub mod memory;
pub mod rest;
pub mod traits;
pub mod types;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use traits::{ActivityStore, ListingStore};
pub use types::ListingFilters;
