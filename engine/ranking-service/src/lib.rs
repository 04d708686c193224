//! Ranking Service
//!
//! Caches KeepTradeCut rankings per league configuration alongside the
//! Sleeper player directory and league data.
//!
//! Writes go through [`RefreshOrchestrator`] (fetch, normalize, merge,
//! store) and [`LeagueSync`]; reads go through [`QueryService`] and never
//! reach out to the sources.

pub mod error;
pub mod export;
pub mod league;
pub mod locks;
pub mod merge;
pub mod model;
pub mod normalizer;
pub mod query;
pub mod refresh;
pub mod source;
pub mod store;


pub use error::{NormalizeError, RankingError, Result};
pub use export::JsonExporter;
pub use league::LeagueSync;
pub use merge::{merge, DuplicateIdentity, MergeOutcome};
pub use model::{
    LeagueFormat, MergedPlayer, PlayerIdentity, PlayerProfile, Position, RankedPlayer,
    RankingConfiguration, RankingSnapshot, TepLevel,
};
pub use query::{CacheStats, QueryService};
pub use refresh::{ProfileRefreshReport, RefreshOrchestrator, RefreshReport, WriteMode};
pub use source::{LeagueSource, ProfileSource, RankingSource};
pub use store::{CacheStore, LeagueStore, MemoryStore, PgStore, ProfileStore, RankingStore};
