//! Data storage layer
//!
//! - `sqlite` - embedded store for identities, values and reports
//! - `types` - row types shared by the trait and its implementation
//! - `traits` - `MetricRepository`, the seam domain services depend on
//! - `error` - unified error type

pub mod error;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use sqlite::SqliteService;
pub use traits::MetricRepository;
