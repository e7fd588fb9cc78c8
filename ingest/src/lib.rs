//! Loading of sysbench-style result files into unified, read-only tables.
//!
//! Every run directory holds `summary_*.csv` and `detail_*.csv` files. The
//! latest non-trivial file of each kind is resolved per run, tagged with a
//! source label and concatenated into a single [`UnifiedTable`].

pub mod extract;
pub mod record;
pub mod resolver;
pub mod table;


pub use extract::{extract, zero_filled, ExtractError, MissingPolicy};
pub use record::{DetailRow, Measurement, Metric, SummaryRow};
pub use resolver::{find_latest, find_latest_with, MIN_CONTENT_BYTES};
pub use table::{load_detail, load_summary, LoadError, RunSource, SourceLabeling, UnifiedTable};
