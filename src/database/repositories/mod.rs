pub mod gameday;
pub mod team;

// Re-export all repositories for easy importing
pub use gameday::GamedayRepository;
pub use team::TeamRepository;
