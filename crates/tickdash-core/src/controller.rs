//! Dashboard state machine.
//!
//! ```text
//! AwaitingInput ──begin──▶ Loading ──complete(ok)──▶ Displaying
//!                            │  ▲                        │
//!                complete(err)  └──────begin/refresh─────┤
//!                            ▼                           │
//!                          Failed ◀──────────────────────┘
//! ```
//!
//! A fetch is split into [`begin`](DashboardController::begin) and
//! [`complete`](DashboardController::complete) so a caller can release its
//! lock on the controller while the network call runs. Every `begin` hands
//! out a fresh [`Ticket`]; `complete` ignores any ticket older than the
//! newest one, so the most recently *started* request always wins.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::alerts::PriceAlert;
use crate::chart::ChartRenderer;
use crate::data_source::SourceError;
use crate::fetcher::{DataFetcher, FetchOutcome};
use crate::view::{DashboardView, FailureView, ViewContext};
use crate::{ChartStyle, RangeSelection, Symbol, TickerRequest, ValidationError};

/// Most recent prices kept for the live tape.
pub const LIVE_TAPE_CAPACITY: usize = 100;

/// Wall clock used for "today" and view timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Everything the user controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardInputs {
    pub symbol: Symbol,
    #[serde(default)]
    pub range: RangeSelection,
    #[serde(default)]
    pub style: ChartStyle,
    #[serde(default)]
    pub alert: PriceAlert,
}

impl DashboardInputs {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            range: RangeSelection::default(),
            style: ChartStyle::default(),
            alert: PriceAlert::default(),
        }
    }

    pub fn with_range(mut self, range: impl Into<RangeSelection>) -> Self {
        self.range = range.into();
        self
    }

    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_alert(mut self, alert: PriceAlert) -> Self {
        self.alert = alert;
        self
    }

    /// Resolve the range against `today` and build the fetch request.
    pub fn request(&self, today: Date) -> Result<TickerRequest, ValidationError> {
        Ok(TickerRequest::new(self.symbol.clone(), self.range.resolve(today)?))
    }
}

/// Identifies one started fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    AwaitingInput,
    Loading { ticket: Ticket, symbol: Symbol },
    Displaying(Box<DashboardView>),
    Failed(FailureView),
}

/// Discriminant of [`DashboardState`], for logs and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    AwaitingInput,
    Loading,
    Displaying,
    Failed,
}

impl StateKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingInput => "awaiting_input",
            Self::Loading => "loading",
            Self::Displaying => "displaying",
            Self::Failed => "failed",
        }
    }
}

impl DashboardState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::AwaitingInput => StateKind::AwaitingInput,
            Self::Loading { .. } => StateKind::Loading,
            Self::Displaying(_) => StateKind::Displaying,
            Self::Failed(_) => StateKind::Failed,
        }
    }

    pub fn view(&self) -> Option<&DashboardView> {
        match self {
            Self::Displaying(view) => Some(view),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureView> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// What the caller must do after [`DashboardController::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    /// Run the fetch, then hand the result to `complete` with this ticket.
    Fetch { ticket: Ticket, request: TickerRequest },
    /// Re-rendered from held data; the state is already `Displaying`.
    Rerendered,
}

/// Result of [`DashboardController::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(StateKind),
    /// A newer request had started; the result was dropped.
    Stale,
}

/// Bounded history of observed prices for the current symbol.
#[derive(Debug, Clone, Default)]
pub struct LiveTape {
    symbol: Option<Symbol>,
    points: VecDeque<(OffsetDateTime, f64)>,
}

impl LiveTape {
    pub fn record(&mut self, symbol: &Symbol, at: OffsetDateTime, price: f64) {
        if self.symbol.as_ref() != Some(symbol) {
            self.reset(symbol);
        }
        if self.points.len() == LIVE_TAPE_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back((at, price));
    }

    pub fn reset(&mut self, symbol: &Symbol) {
        self.symbol = Some(symbol.clone());
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&mut self) -> &[(OffsetDateTime, f64)] {
        self.points.make_contiguous()
    }
}

pub struct DashboardController {
    fetcher: DataFetcher,
    renderer: ChartRenderer,
    clock: Arc<dyn Clock>,
    inputs: Option<DashboardInputs>,
    state: DashboardState,
    generation: u64,
    /// Data behind the current `Displaying` view; style changes re-render from it.
    held: Option<FetchOutcome>,
    tape: LiveTape,
    auto_refresh: bool,
}

impl DashboardController {
    pub fn new(fetcher: DataFetcher) -> Self {
        Self {
            fetcher,
            renderer: ChartRenderer::default(),
            clock: Arc::new(SystemClock),
            inputs: None,
            state: DashboardState::AwaitingInput,
            generation: 0,
            held: None,
            tape: LiveTape::default(),
            auto_refresh: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_renderer(mut self, renderer: ChartRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    /// Applies to views rendered from now on.
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn inputs(&self) -> Option<&DashboardInputs> {
        self.inputs.as_ref()
    }

    pub fn fetcher(&self) -> &DataFetcher {
        &self.fetcher
    }

    pub fn live_points(&self) -> usize {
        self.tape.len()
    }

    /// Accept new inputs.
    ///
    /// While displaying, inputs that resolve to the same request as the held
    /// data (only style or alert changed) re-render in place. Everything else
    /// starts a fetch.
    ///
    /// # Errors
    ///
    /// Returns the validation error when the range cannot be resolved; the
    /// state is left untouched.
    pub fn begin(&mut self, inputs: DashboardInputs) -> Result<Pending, ValidationError> {
        let request = inputs.request(self.clock.today())?;

        let reusable = matches!(self.state, DashboardState::Displaying(_))
            && self.held.as_ref().is_some_and(|held| held.request == request);
        self.inputs = Some(inputs);

        if reusable {
            self.rerender();
            info!(symbol = %request.symbol(), "re-rendered without fetching");
            return Ok(Pending::Rerendered);
        }

        Ok(self.start(request))
    }

    /// Re-fetch the current inputs, e.g. on an auto-refresh tick.
    ///
    /// Returns `None` before the first input. Trailing periods are resolved
    /// against today again, so a long-running session rolls forward.
    pub fn begin_refresh(&mut self) -> Option<Result<Pending, ValidationError>> {
        let request = self.inputs.as_ref()?.request(self.clock.today());
        Some(request.map(|request| self.start(request)))
    }

    /// Apply a fetch result.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<FetchOutcome, SourceError>,
    ) -> Completion {
        let symbol = match &self.state {
            DashboardState::Loading {
                ticket: current,
                symbol,
            } if *current == ticket => symbol.clone(),
            _ => {
                warn!(
                    ticket = ticket.0,
                    current = self.generation,
                    "discarding stale fetch result"
                );
                return Completion::Stale;
            }
        };

        // A range with no trading days is reported like an unknown symbol.
        let result = result.and_then(|outcome| {
            if outcome.series.is_empty() {
                Err(SourceError::no_data(format!(
                    "no rows for {symbol} in {}",
                    outcome.request.range()
                )))
            } else {
                Ok(outcome)
            }
        });

        match result {
            Ok(outcome) => {
                if let Some(close) = outcome.series.last().map(|bar| bar.close) {
                    self.tape
                        .record(outcome.request.symbol(), self.clock.now(), close);
                }
                info!(
                    symbol = %outcome.request.symbol(),
                    rows = outcome.series.len(),
                    "displaying dashboard"
                );
                self.held = Some(outcome);
                self.rerender();
            }
            Err(error) => {
                warn!(%symbol, code = error.code(), %error, "fetch failed");
                self.held = None;
                self.state = DashboardState::Failed(FailureView::from_error(&symbol, &error));
            }
        }

        Completion::Applied(self.state.kind())
    }

    /// `begin`, fetch, `complete` in one call.
    pub async fn submit(
        &mut self,
        inputs: DashboardInputs,
    ) -> Result<&DashboardState, ValidationError> {
        let pending = self.begin(inputs)?;
        self.drive(pending).await;
        Ok(&self.state)
    }

    /// Re-fetch the current inputs in one call.
    pub async fn refresh(&mut self) -> Option<Result<&DashboardState, ValidationError>> {
        match self.begin_refresh()? {
            Ok(pending) => {
                self.drive(pending).await;
                Some(Ok(&self.state))
            }
            Err(error) => Some(Err(error)),
        }
    }

    async fn drive(&mut self, pending: Pending) {
        if let Pending::Fetch { ticket, request } = pending {
            let result = self.fetcher.fetch(&request).await;
            self.complete(ticket, result);
        }
    }

    fn start(&mut self, request: TickerRequest) -> Pending {
        self.generation += 1;
        let ticket = Ticket(self.generation);

        debug!(
            ticket = ticket.0,
            symbol = %request.symbol(),
            range = %request.range(),
            "loading"
        );
        self.state = DashboardState::Loading {
            ticket,
            symbol: request.symbol().clone(),
        };
        Pending::Fetch { ticket, request }
    }

    fn rerender(&mut self) {
        let (Some(outcome), Some(inputs)) = (self.held.as_ref(), self.inputs.as_ref()) else {
            return;
        };
        let view = DashboardView::build(ViewContext {
            outcome,
            inputs,
            renderer: &self.renderer,
            tape: self.tape.points(),
            source: self.fetcher.source_name(),
            now: self.clock.now(),
            auto_refresh: self.auto_refresh,
        });
        self.state = DashboardState::Displaying(Box::new(view));
    }
}
