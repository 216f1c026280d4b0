pub mod gameday;
pub mod lookup;
pub(crate) mod macros;
pub mod team;

// Re-export all models for easy importing
pub use gameday::*;
pub use lookup::*;
pub use team::*;
