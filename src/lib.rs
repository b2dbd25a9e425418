pub mod config;
pub mod error;
pub mod mha_lookup;
pub mod models;
pub mod progress;
pub mod zip_locale;

pub use config::{JoinConfig, OutputTarget, ShortRowPolicy};
pub use error::{Error, Result};
pub use mha_lookup::{LookupStats, MhaLookup};
pub use models::{MhaKey, MhaRecord};
pub use progress::{LogProgress, NoProgress, ProgressObserver};
pub use zip_locale::{enrich, enrich_reader, JoinSummary};
