pub mod market_hours;
pub mod options_stream;

pub use market_hours::is_market_open;
pub use options_stream::{ChainPoller, ChainSource, ChainUpdate, PollerConfig};
