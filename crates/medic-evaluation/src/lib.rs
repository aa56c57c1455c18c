//! # medic-evaluation
//!
//! Persistence of [`FixRecord`](medic_core::FixRecord)s.
//!
//! The orchestrator writes each finished record once through an
//! [`EvaluationSink`]; the CLI reads them back for inspection.
//!
//! ## Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`MemoryStore`] | Records live in process memory |
//! | [`FileStore`] | One `<id>.json` document per record in a directory |
//! | [`NullStore`] | Accepts and discards everything |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use medic_core::{EvaluationConfig, FixRecord};
//! use medic_evaluation::create_store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = create_store(&EvaluationConfig::default())?;
//! let record = FixRecord::new();
//! store.store(&record).await?;
//! let newest = store.list(10).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod store;

pub use error::EvaluationError;
pub use store::{EvaluationSink, FileStore, MemoryStore, NullStore, create_store};
