//! Redis adapters.

mod session_store;

pub use session_store::RedisSessionStore;
