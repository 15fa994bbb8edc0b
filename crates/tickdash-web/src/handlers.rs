//! HTTP handlers for the browser dashboard.
//!
//! The controller sits behind an async mutex. Handlers hold the lock only
//! to `begin` and `complete`, never across the network call, so a newer
//! request can start while an older one is still in flight; the older
//! result is then dropped as stale.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tickdash_core::{
    parse_date, ChartStyle, Completion, DashboardConfig, DashboardController, DashboardInputs,
    DashboardState, DashboardView, DataFetcher, FailureKind, FailureView, Pending, Period,
    PriceAlert, RangeSelection, StateKind, Symbol, SyntheticSource, ValidationError,
    PRESET_SYMBOLS,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::WebError;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    controller: Arc<Mutex<DashboardController>>,
    fetcher: DataFetcher,
    config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(config: DashboardConfig, controller: DashboardController) -> Self {
        Self {
            fetcher: controller.fetcher().clone(),
            controller: Arc::new(Mutex::new(controller)),
            config: Arc::new(config),
        }
    }

    pub fn from_config(config: DashboardConfig) -> Self {
        let controller = DashboardController::new(config.fetcher());
        Self::new(config, controller)
    }

    /// Run a pending fetch outside the lock and apply its result.
    async fn settle(&self, pending: Pending) -> Result<DashboardResponse, WebError> {
        let superseded = match pending {
            Pending::Rerendered => false,
            Pending::Fetch { ticket, request } => {
                let result = self.fetcher.fetch(&request).await;
                let completion = self.controller.lock().await.complete(ticket, result);
                completion == Completion::Stale
            }
        };

        let controller = self.controller.lock().await;
        Ok(DashboardResponse::from_state(controller.state(), superseded))
    }
}

/// Query string of `GET /api/dashboard`.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub symbol: Option<String>,
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub style: Option<String>,
    pub alert_above: Option<f64>,
    pub alert_below: Option<f64>,
    /// Whether the page is polling `/api/refresh`; echoed in the footer.
    pub auto_refresh: Option<bool>,
}

impl DashboardQuery {
    fn into_inputs(self, config: &DashboardConfig) -> Result<DashboardInputs, ValidationError> {
        let symbol = match non_empty(self.symbol.as_deref()) {
            Some(raw) => Symbol::parse(raw)?,
            None => config.default_symbol.clone(),
        };

        let range = match (non_empty(self.start.as_deref()), non_empty(self.end.as_deref())) {
            (Some(start), Some(end)) => RangeSelection::Custom {
                start: parse_date(start)?,
                end: parse_date(end)?,
            },
            _ => match non_empty(self.period.as_deref()) {
                Some(period) => period.parse::<Period>()?.into(),
                None => config.default_period.into(),
            },
        };

        let style = match non_empty(self.style.as_deref()) {
            Some(style) => style.parse()?,
            None => config.default_style,
        };

        Ok(DashboardInputs::new(symbol)
            .with_range(range)
            .with_style(style)
            .with_alert(PriceAlert::new(self.alert_above, self.alert_below)))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of every dashboard response.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub state: StateKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<DashboardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureView>,
    /// A newer request started before this one finished.
    pub superseded: bool,
}

impl DashboardResponse {
    fn from_state(state: &DashboardState, superseded: bool) -> Self {
        Self {
            state: state.kind(),
            view: state.view().cloned(),
            failure: state.failure().cloned(),
            superseded,
        }
    }

    fn status(&self) -> StatusCode {
        match self.failure.as_ref().map(|failure| failure.kind) {
            Some(FailureKind::NoData) => StatusCode::NOT_FOUND,
            Some(FailureKind::Fetch) => StatusCode::BAD_GATEWAY,
            None => StatusCode::OK,
        }
    }
}

impl IntoResponse for DashboardResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct Choice {
    value: &'static str,
    label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PresetsResponse {
    symbols: Vec<&'static str>,
    periods: Vec<Choice>,
    styles: Vec<Choice>,
    default_symbol: String,
    default_period: Period,
    default_style: ChartStyle,
    refresh_secs: u64,
    offline: bool,
    offline_symbols: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    source: &'static str,
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        source: state.fetcher.source_name(),
    })
}

/// GET /api/presets
pub async fn presets(State(state): State<AppState>) -> Json<PresetsResponse> {
    let config = &state.config;
    Json(PresetsResponse {
        symbols: PRESET_SYMBOLS.to_vec(),
        periods: Period::ALL
            .into_iter()
            .map(|period| Choice {
                value: period.as_str(),
                label: period.label(),
            })
            .collect(),
        styles: ChartStyle::ALL
            .into_iter()
            .map(|style| Choice {
                value: style.as_str(),
                label: style.label(),
            })
            .collect(),
        default_symbol: config.default_symbol.to_string(),
        default_period: config.default_period,
        default_style: config.default_style,
        refresh_secs: config.refresh_interval.as_secs(),
        offline: config.offline,
        offline_symbols: SyntheticSource::known_symbols().collect(),
    })
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<DashboardResponse, WebError> {
    let auto_refresh = query.auto_refresh.unwrap_or(false);
    let inputs = query.into_inputs(&state.config)?;
    debug!(symbol = %inputs.symbol, style = %inputs.style, auto_refresh, "dashboard requested");

    let pending = {
        let mut controller = state.controller.lock().await;
        controller.set_auto_refresh(auto_refresh);
        controller.begin(inputs)?
    };
    state.settle(pending).await
}

/// POST /api/refresh
pub async fn refresh(State(state): State<AppState>) -> Result<DashboardResponse, WebError> {
    let pending = state
        .controller
        .lock()
        .await
        .begin_refresh()
        .ok_or(WebError::NothingToRefresh)??;
    info!("refresh requested");
    state.settle(pending).await
}

/// GET /api/state
pub async fn current(State(state): State<AppState>) -> Json<DashboardResponse> {
    let controller = state.controller.lock().await;
    Json(DashboardResponse::from_state(controller.state(), false))
}
