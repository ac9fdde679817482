//! Results core: pure polling state machine, payload normalization and the
//! canonical result model.
mod config;
mod effect;
mod error;
mod key;
mod msg;
mod normalize;
mod result;
mod state;
mod update;
mod view_model;

pub use config::{PollConfig, MAX_RETRIES, POLL_INTERVAL};
pub use effect::Effect;
pub use error::{NormalizationError, PollError};
pub use key::{EmptyPersona, JobId, Persona, PollKey};
pub use msg::{FetchReply, Msg};
pub use normalize::{normalize, Payload};
pub use result::{
    Insight, Metrics, NormalizedResult, PrimaryMetrics, RequestSummary, SelectedMetrics,
    TimePoint, DEFAULT_ENVIRONMENT, UNKNOWN_DOMAIN,
};
pub use state::{DataSource, PollState, PollStatus};
pub use update::update;
pub use view_model::PollSnapshot;
