//! # FOB Comparative Ledger
//!
//! Keeps per-product price histories from the daily FOB comparative report.
//!
//! Each report is a grid of 28 product tables (7 sections of 4 products). The
//! crate splits that grid into per-product records, stores every report as a
//! daily batch workbook, and merges the batches into a summary workbook holding
//! one Excel table per product.
//!
//! ## Modules
//!
//! - [`segment`]: splits a report grid into records per [`product::Product`]
//! - [`reconcile`]: idempotent merge of batches into a product table
//! - [`spreadsheet`]: reads and rewrites xlsx workbooks and their tables
//! - [`batch`]: daily `FOB_YYYYMMDD.xlsx` batch workbooks
//! - [`extract`]: sources of report grids
//! - [`pipeline`]: the documents and summary passes of a run
//!
//! ## Merge rules
//!
//! - A report date already present in a table is never added again
//! - A batch whose columns do not match the table is rejected with a warning
//! - Rows without a month are dropped and rows are kept sorted by date
//! - The table range is resized to the rows written; stale rows are cleared
pub mod batch;
pub mod error;
pub mod extract;
mod helpers;
pub mod pipeline;
pub mod product;
pub mod reconcile;
pub mod record;
pub mod segment;
pub mod spreadsheet;

pub use error::LedgerError;
pub use product::Product;
pub use reconcile::reconcile;
pub use reconcile::ColumnPolicy;
pub use segment::segment;
