// Dunkemon Schema - Shared catalog record definitions
// This crate contains the record types that the catalog files deserialize into,
// plus the fixed elemental type chart. Everything here is immutable game data;
// runtime state lives in the main `dunkemon` crate.

// Re-export the main types
pub use area_data::*;
pub use element_types::*;
pub use items::*;
pub use move_data::*;
pub use species_data::*;

pub mod area_data;
pub mod element_types;
pub mod items;
pub mod move_data;
pub mod species_data;
