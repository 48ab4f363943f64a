//! SQLFAN Core - Core abstractions shared by every other SQLFAN crate
//!
//! This crate defines the boundaries the rest of the workspace is written
//! against:
//!
//! - `Session` / `Cursor` - A live warehouse session and the handle a statement returns
//! - `SessionFactory` / `Driver` - Injected capability that opens sessions
//! - `TableLoader` - Column-oriented bulk writer for structured tables
//! - `VisionModel` - Vision-language model client
//! - Common types like `Value`, `Row`, `Table` and `ConnectionParams`

mod credentials;
mod error;
mod loader;
mod session;
mod types;
mod vision;

pub use credentials::*;
pub use error::*;
pub use loader::*;
pub use session::*;
pub use types::*;
pub use vision::*;
