//! Retrying single-statement execution
//!
//! Used for sequential calls such as listing databases and schemas, where a
//! transient connectivity blip should not surface to the caller.
//!
//! # Example
//!
//! ```ignore
//! use sqlfan_query::retry::{RetryPolicy, execute_with_retry};
//!
//! // 3 attempts, 1 second apart, every error retried
//! let policy = RetryPolicy::default();
//! let rows = execute_with_retry(session.as_ref(), "SHOW DATABASES", &policy).await?;
//! ```

mod executor;
mod policy;


pub use executor::{connect_and_execute_with_retry, execute_with_retry};
pub use policy::RetryPolicy;
