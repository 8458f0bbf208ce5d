//! PostgreSQL adapters.

mod result_log;
mod user_store;

pub use result_log::PostgresResultLog;
pub use user_store::PostgresUserStore;
