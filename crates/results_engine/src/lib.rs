//! Results engine: HTTP fetching, result caching, poll scheduling and the
//! subscription surface that drives the core state machine.
mod cache;
mod config;
mod engine;
mod export;
mod fetch;
mod filename;
mod persist;
mod scheduler;
mod types;

pub use cache::{FileCache, MemoryCache, ResultCache};
pub use config::EngineConfig;
pub use engine::{ResultsEngine, Subscription};
pub use export::{export_result, ExportError};
pub use fetch::{FetchSettings, ReqwestFetcher, ResultsFetcher};
pub use filename::cache_filename;
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use scheduler::{CancelToken, PollScheduler, TimerCallback, TimerSlot, TokioScheduler};
pub use types::{FailureKind, FetchError};
