//! Infrastructure layer for unitrack
//!
//! Everything that talks to the outside world: the database, password
//! hashing, session tokens and the clock.

pub mod clock;
pub mod credentials;
pub mod database;
pub mod log_messages;
pub mod store;
pub mod tokens;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::PasswordHasher;
pub use database::Database;
pub use store::{MemoryStore, PostgresStore, UniversityStore};
pub use tokens::{Claims, TokenIssuer};
