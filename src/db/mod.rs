// src/db/mod.rs
//
// Database module
//
// Provides:
// - Connection pooling
// - Schema migrations
// - Database utilities

pub mod connection;
pub mod migrations;

pub use connection::{
    create_connection_pool, get_connection, get_database_path, ConnectionPool, PooledConn,
};

pub use migrations::{
    get_database_stats, initialize_database, verify_database_integrity, DatabaseStats,
};

/// Open a pool on a fresh temporary database with the schema applied
///
/// In-memory databases are private to one connection, so pooled tests use a
/// file inside a temp directory that lives as long as the returned guard.
#[cfg(test)]
pub fn create_test_pool() -> (ConnectionPool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let pool = create_connection_pool(&dir.path().join("test.db")).expect("pool");
    {
        let conn = pool.get().expect("connection");
        initialize_database(&conn).expect("schema");
    }
    (pool, dir)
}
