//! SQLite driver for SQLFAN
//!
//! A local stand-in for the warehouse: every session is its own rusqlite
//! connection to one database file, and the loader writes tables into that
//! same file. SQLite has no databases or schemas, so those qualifiers of a
//! `TableTarget` are ignored.

mod connection;
mod driver;
mod loader;
mod session;

pub use driver::SqliteDriver;
pub use loader::SqliteLoader;
pub use session::SqliteSession;
