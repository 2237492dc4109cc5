//! Storage adapters: an in-memory store for tests and database-less runs, and
//! the Postgres/pgvector adapter.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStaffingStore;
pub use postgres::PostgresStore;
