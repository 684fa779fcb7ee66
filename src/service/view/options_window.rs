use crate::models::{CombinedStrikeRow, OptionContract, OptionsChain, OptionsView, StrikeCount};

/// Merge calls and puts per strike and cut a window centered on spot.
///
/// With `StrikeCount::All`, or when the chain carries no usable current
/// price, every strike is returned. Otherwise the window holds
/// `min(count, strikes)` rows around the strike nearest to spot. A window
/// that would run off either end is shifted back inside the chain rather
/// than shortened.
pub fn window(chain: &OptionsChain, count: StrikeCount) -> Vec<CombinedStrikeRow> {
    let strikes = distinct_strikes(&chain.calls, &chain.puts);

    let spot = chain
        .current_price
        .filter(|p| p.is_finite() && *p != 0.0);

    let (start, end) = match (count, spot) {
        (StrikeCount::Count(n), Some(spot)) => centered_bounds(&strikes, spot, n),
        _ => (0, strikes.len()),
    };

    strikes[start..end]
        .iter()
        .map(|&strike| CombinedStrikeRow {
            strike,
            call: find_side(&chain.calls, strike),
            put: find_side(&chain.puts, strike),
        })
        .collect()
}

/// Windowed rows plus the chain header the options card renders.
pub fn view(chain: &OptionsChain, count: StrikeCount) -> OptionsView {
    OptionsView {
        date: chain.date.clone(),
        current_price: chain.current_price,
        rows: window(chain, count),
    }
}

fn distinct_strikes(calls: &[OptionContract], puts: &[OptionContract]) -> Vec<f64> {
    let mut strikes: Vec<f64> = calls
        .iter()
        .chain(puts.iter())
        .map(|c| c.strike)
        .filter(|s| s.is_finite())
        .collect();
    strikes.sort_by(|a, b| a.total_cmp(b));
    strikes.dedup();
    strikes
}

fn centered_bounds(strikes: &[f64], spot: f64, count: usize) -> (usize, usize) {
    let total = strikes.len();
    if total <= count {
        return (0, total);
    }

    // Strict `<` keeps the lower index on ties.
    let mut closest = 0;
    for (idx, strike) in strikes.iter().enumerate() {
        if (strike - spot).abs() < (strikes[closest] - spot).abs() {
            closest = idx;
        }
    }

    // Even counts put the nearest strike in the lower of the two middle slots.
    let start = closest.saturating_sub((count.max(1) - 1) / 2).min(total - count);
    (start, start + count)
}

fn find_side(side: &[OptionContract], strike: f64) -> Option<OptionContract> {
    side.iter().find(|c| c.strike == strike).cloned()
}
