pub mod price_fetcher;
pub mod orchestrator;

pub use price_fetcher::{PriceFetcher, FetcherConfig, FetchOutcome, FetchCache};
pub use orchestrator::{FrameWatchOrchestrator, TickError, TickOutcome, LoopDelays, StopHandle};
