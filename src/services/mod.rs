//! Services module - library-wide operations over many application records.
//!
//! # Components
//!
//! - [`Scanner`]: Rediscovers mod targets for a whole application collection. Handles:
//!   - Splitting the collection into fixed-size batches
//!   - Bounding concurrent filesystem walks with a worker limit
//!   - Refreshing every mod's installed flag and version per application
//!   - Publishing [`ScanProgress`] through a watch channel
//!
//! - [`ScanReport`]: Counts of scanned and skipped applications and of failed batches.
//!
//! The scanner never holds the caller's collection across an await point in a worker: workers
//! receive owned copies and return them, and one drain loop merges the results.
//!
//! # Usage Example
//!
//! ```ignore
//! use vrmodkit::services::Scanner;
//!
//! let scanner = Scanner::new(Arc::new(settings));
//! let mut progress = scanner.subscribe();
//! let report = scanner.scan(&mut apps).await;
//! println!("{} scanned, {} skipped", report.scanned, report.skipped);
//! ```

pub mod scanner;

pub use scanner::{ScanProgress, ScanReport, Scanner, scan_app};
