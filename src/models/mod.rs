pub mod chart;
pub mod earnings;
pub mod news;
pub mod nutrition;
pub mod options;
pub mod quotes;

pub use chart::{ChartInterval, ChartPoint, ChartRange, ChartWindow};
pub use earnings::{EarningsEvent, EarningsGroup, EarningsTiming};
pub use news::NewsItem;
pub use nutrition::NutrientFacts;
pub use options::{CombinedStrikeRow, OptionContract, OptionsChain, OptionsView, StrikeCount};
pub use quotes::{IndexQuote, StockDetails};
