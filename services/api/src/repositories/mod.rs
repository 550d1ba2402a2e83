//! Repositories for database operations
//!
//! Each repository issues single-statement queries against the shared
//! pool; uniqueness and ownership are enforced by the schema and the
//! statements themselves, never by read-then-write sequences.

pub mod preference;
pub mod preset;
pub mod user;

pub use preference::PreferenceRepository;
pub use preset::PresetRepository;
pub use user::UserRepository;
