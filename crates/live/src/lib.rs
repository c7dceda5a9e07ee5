pub mod sampler;
pub mod state;
pub mod tps;

pub use sampler::{FETCH_LIMIT, LiveLedgerSampler, POLL_INTERVAL, SamplerHandle};
pub use state::{AggregateStats, LedgerState, LiveSnapshot, TypeCount};
pub use tps::{LedgerSample, TpsWindow};
