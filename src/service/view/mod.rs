//! Pure reshaping of fetched market data into dashboard view models.
//!
//! Nothing in here touches the network or the clock; callers pass the
//! current date/time in.

pub mod chart_range;
pub mod earnings_grouper;
pub mod market_overview;
pub mod options_window;

pub use chart_range::{resolve as resolve_chart_range, resolve_str as resolve_chart_range_str};
pub use earnings_grouper::group as group_earnings;
pub use options_window::{view as options_view, window as window_options};
