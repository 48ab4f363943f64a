//! SQLFAN Services Layer
//!
//! This crate provides the operations a front end calls. Services orchestrate
//! the query crate and the injected boundaries (session factories, table
//! loaders, vision models); they never talk to a concrete driver.
//!
//! # Architecture
//!
//! ```text
//! Front end (sqlfan-cli)
//!     ↓
//! Service Layer (sqlfan-services) ← This crate
//!     ↓
//! Domain Layer (sqlfan-query)
//!     ↓
//! Boundaries (sqlfan-core) ← implemented by drivers such as sqlfan-driver-sqlite
//! ```
//!
//! # Services
//!
//! - [`QueryService`] - Split a script and run its statements concurrently
//! - [`MetadataService`] - Cached catalog listings and DDL generation
//! - [`UploadService`] - Load CSV/TXT files and workbooks into tables
//! - [`DocumentAiService`] - Ask questions about invoice images
//! - [`ReplicationService`] - Copy a schema between accounts
//! - [`TestDataService`] - Generate and save synthetic tables

mod document_ai;
mod error;
mod metadata_service;
mod query_service;
mod replication;
mod test_data;
mod upload_service;

pub use document_ai::{DocumentAiService, INVOICE_PROMPT, INVOICE_TABLE, InvoiceAnswer};
pub use error::{ServiceError, ServiceResult};
pub use metadata_service::{DEFAULT_LISTING_TTL, MetadataService};
pub use query_service::{ExecutionSummary, QueryService, ScriptExecution};
pub use replication::{
    DEFAULT_CHUNK_SIZE, ReplicationProgress, ReplicationReport, ReplicationService,
    TableReplication, ddl_collection_script, select_all_sql, setup_script, table_list_script,
};
pub use test_data::{ColumnKind, ColumnSpec, TestDataGenerator, TestDataService, validate_specs};
pub use upload_service::{
    FileFormat, UploadService, infer_value, parse_delimited, read_spreadsheet, read_table,
    spreadsheet_value,
};
