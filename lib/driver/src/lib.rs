//! SQL dialect drivers for GraphRDB.
//!
//! A [SqlDriver] knows how SQL text looks for a particular database. The query compiler asks it
//! for every qualifier and join it emits. The storage layer only writes plain row statements
//! itself.

mod codec;
mod connection;
mod driver;
mod sqlite;

pub use codec::{decode_node, encode_node};
pub use connection::{RdbConnection, DEFAULT_STATEMENT_CACHE_CAPACITY};
pub use driver::{DriverKind, SqlDriver};
pub use sqlite::SqliteDriver;
