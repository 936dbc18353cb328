//! Persisted turn state — storage backends and the typed accessors over them.

pub mod accessor;
pub mod libsql;
pub mod memory;
pub mod profile;
pub mod traits;

pub use accessor::BotState;
pub use libsql::LibSqlStore;
pub use memory::MemoryStore;
pub use profile::UserProfile;
pub use traits::SessionStore;
