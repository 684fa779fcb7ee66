use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::info;

use crate::models::{OptionsView, StrikeCount};
use crate::service::api::routes::normalize_ticker;
use crate::service::api::{ApiError, ApiResult, AppState};
use crate::service::automation::{ChainPoller, ChainUpdate, PollerConfig};
use crate::service::view::options_view;

#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    pub expiration: Option<String>,
    pub strikes: Option<String>,
}

impl OptionsQuery {
    fn expiration(&self) -> Option<&str> {
        self.expiration.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    fn strike_count(&self) -> Result<StrikeCount, ApiError> {
        match self.strikes.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<StrikeCount>()
                .map_err(|e| ApiError::BadRequest(e.to_string())),
            None => Ok(StrikeCount::default()),
        }
    }
}

/// `GET /api/option/{ticker}/allExpirationDates`
pub async fn expirations(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let ticker = normalize_ticker(&ticker)?;
    let dates = state
        .finance
        .get_option_expirations(&ticker)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch expiration dates", e))?;
    Ok(Json(dates))
}

/// `GET /api/option/{ticker}?expiration=&strikes=`
pub async fn chain(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<OptionsQuery>,
) -> ApiResult<Json<OptionsView>> {
    let ticker = normalize_ticker(&ticker)?;
    let count = query.strike_count()?;
    let chain = state
        .finance
        .get_options_chain(&ticker, query.expiration())
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch options chain", e))?;
    Ok(Json(options_view(&chain, count)))
}

/// `GET /api/option/{ticker}/stream?expiration=&strikes=`
///
/// Emits a `chain` event per refresh. A failed refresh emits one `error`
/// event and ends the stream; so does the market closing. Disconnecting
/// drops the poller, which aborts its task.
pub async fn stream(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<OptionsQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let ticker = normalize_ticker(&ticker)?;
    let count = query.strike_count()?;
    info!("Opening options stream for {}", ticker);

    let poller = ChainPoller::spawn(
        state.finance.clone(),
        ticker,
        query.expiration().map(str::to_string),
        PollerConfig::with_interval(state.settings.options_refresh),
    );

    let events = chain_frames(poller, count).map(|frame| Ok(frame.into_event()));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// One message on the options stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StreamFrame {
    Chain(OptionsView),
    Failed,
    Waiting,
}

impl StreamFrame {
    fn into_event(self) -> Event {
        match self {
            StreamFrame::Chain(view) => match serde_json::to_string(&view) {
                Ok(json) => Event::default().event("chain").data(json),
                Err(err) => Event::default().event("error").data(err.to_string()),
            },
            StreamFrame::Failed => Event::default()
                .event("error")
                .data("Failed to refresh options chain"),
            StreamFrame::Waiting => Event::default().comment("waiting"),
        }
    }
}

/// Windowed frames for each poller update; ends with the poller's task or
/// right after a failure.
pub(crate) fn chain_frames(poller: ChainPoller, count: StrikeCount) -> impl Stream<Item = StreamFrame> {
    let rx = poller.subscribe();
    stream::unfold(Some((poller, rx)), move |open| async move {
        let (poller, mut rx) = open?;
        if rx.changed().await.is_err() {
            return None;
        }
        let update = rx.borrow_and_update().clone();
        match update {
            Some(ChainUpdate::Chain(chain)) => Some((
                StreamFrame::Chain(options_view(&chain, count)),
                Some((poller, rx)),
            )),
            Some(ChainUpdate::Failed(_)) => Some((StreamFrame::Failed, None)),
            None => Some((StreamFrame::Waiting, Some((poller, rx)))),
        }
    })
}
