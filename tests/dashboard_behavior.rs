//! Behavior-driven tests for the dashboard controller.
//!
//! These exercise the AwaitingInput → Loading → Displaying/Failed cycle the
//! way a front end drives it: submit inputs, change style, change symbol,
//! hit errors, and keep going.

mod support;

use std::sync::Arc;
use std::time::Duration;

use support::{aapl_january_2023, apple_info, shared, symbol, Script, ScriptedSource};
use tickdash_core::{
    ChartStyle, Completion, DashboardController, DashboardInputs, DataFetcher, FailureKind,
    FixedClock, Pending, Period, PriceAlert, RangeSelection, SourceError, StateKind,
    SyntheticSource, Trace,
};
use time::macros::{date, datetime};
use time::Weekday;

fn controller(source: Arc<ScriptedSource>) -> DashboardController {
    DashboardController::new(DataFetcher::new(source))
        .with_clock(Arc::new(FixedClock(datetime!(2024-06-28 15:30 UTC))))
}

fn january_2023(sym: &str) -> DashboardInputs {
    DashboardInputs::new(symbol(sym)).with_range(RangeSelection::Custom {
        start: date!(2023 - 01 - 01),
        end: date!(2023 - 01 - 10),
    })
}

fn aapl_source() -> Arc<ScriptedSource> {
    shared(
        ScriptedSource::new()
            .with("AAPL", Script::Bars(aapl_january_2023()))
            .with("MSFT", Script::Bars(aapl_january_2023()))
            .with_info(apple_info()),
    )
}

// =============================================================================
// Dashboard: Happy path
// =============================================================================

#[tokio::test]
async fn dashboard_starts_awaiting_input_and_refresh_is_a_no_op() {
    // Given: A fresh controller
    let mut dashboard = controller(aapl_source());

    // Then: It waits for input and has nothing to refresh
    assert_eq!(dashboard.state().kind(), StateKind::AwaitingInput);
    assert!(dashboard.refresh().await.is_none());
}

#[tokio::test]
async fn aapl_first_ten_days_of_2023_render_candles_for_every_row() {
    // Given: AAPL with the range 2023-01-01..2023-01-10
    let source = aapl_source();
    let mut dashboard = controller(source.clone());

    // When: The user submits
    let state = dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");

    // Then: The dashboard displays weekday rows only
    let view = state.view().expect("should be displaying");
    assert!(!view.recent_rows.is_empty());
    for row in &view.recent_rows {
        let date = tickdash_core::parse_date(&row.date).expect("iso date");
        assert!(!matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday));
    }

    // And: latest_close is the close of the last weekday row
    assert_eq!(view.metrics.latest_close, Some(130.73));
    assert_eq!(view.metrics.latest_volume, Some(63_896_200));
    assert_eq!(view.metrics.period_high, Some(133.41));
    assert_eq!(view.metrics.period_low, Some(124.17));

    // And: The candlestick has one glyph per row
    assert_eq!(view.style, ChartStyle::Candlestick);
    assert_eq!(view.price_chart.glyph_count(), view.recent_rows.len());
    assert_eq!(view.volume_chart.glyph_count(), 6);

    // And: The four-up tiles and company panel are filled in
    let labels = view.tiles.iter().map(|t| t.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["Current Price", "Volume", "52W High", "52W Low"]);
    assert_eq!(view.tiles[0].value, "$130.73");
    assert_eq!(view.tiles[1].value, "63,896,200");
    assert_eq!(view.company.name, "Apple Inc.");
    assert_eq!(view.company.pe_ratio, "N/A");
    assert_eq!(view.footer.source, "scripted");
    assert!(view.footer.market_open, "11:30 New York on a Friday");
    assert!(!view.footer.auto_refresh);
    assert_eq!(source.history_calls(), 1);
}

#[tokio::test]
async fn weekend_only_range_fails_with_no_data() {
    // Given: The offline source and a Saturday..Sunday range
    let mut dashboard = DashboardController::new(DataFetcher::new(Arc::new(SyntheticSource::new())))
        .with_clock(Arc::new(FixedClock(datetime!(2024-06-28 15:30 UTC))));
    let inputs = DashboardInputs::new(symbol("MSFT")).with_range(RangeSelection::Custom {
        start: date!(2024 - 06 - 22),
        end: date!(2024 - 06 - 23),
    });

    // When: The user submits
    let state = dashboard.submit(inputs).await.expect("valid inputs");

    // Then: It fails the same way an unknown symbol does
    assert_eq!(state.kind(), StateKind::Failed);
    let failure = state.failure().expect("failure details");
    assert_eq!(failure.kind, FailureKind::NoData);
    assert_eq!(failure.code, "source.no_data");
    assert_eq!(failure.message, "No data found for symbol: MSFT");

    // And: A range with trading days recovers
    let state = dashboard
        .submit(DashboardInputs::new(symbol("MSFT")).with_range(RangeSelection::Custom {
            start: date!(2024 - 06 - 24),
            end: date!(2024 - 06 - 28),
        }))
        .await
        .expect("valid inputs");
    assert_eq!(state.kind(), StateKind::Displaying);
}

// =============================================================================
// Dashboard: What triggers a fetch
// =============================================================================

#[tokio::test]
async fn changing_style_while_displaying_does_not_fetch_again() {
    // Given: A dashboard displaying AAPL as candlesticks
    let source = aapl_source();
    let mut dashboard = controller(source.clone());
    dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");
    assert_eq!(source.history_calls(), 1);

    // When: Only the style changes, twice
    for style in [ChartStyle::Line, ChartStyle::Area] {
        let state = dashboard
            .submit(january_2023("AAPL").with_style(style))
            .await
            .expect("valid inputs");

        // Then: The chart follows the style
        let view = state.view().expect("still displaying");
        assert_eq!(view.style, style);
        assert_eq!(view.price_chart.traces.len(), 1);
        assert!(matches!(view.price_chart.traces[0], Trace::Line { .. }));
        assert_eq!(view.price_chart.glyph_count(), 6);
    }

    // And: No new network call was made
    assert_eq!(source.history_calls(), 1);
}

#[tokio::test]
async fn changing_symbol_or_range_fetches_again() {
    // Given: A dashboard displaying AAPL
    let source = aapl_source();
    let mut dashboard = controller(source.clone());
    dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");

    // When: The symbol changes
    dashboard
        .submit(january_2023("MSFT"))
        .await
        .expect("valid inputs");

    // Then: A second fetch happened
    assert_eq!(source.history_calls(), 2);

    // When: The range changes
    let narrower = DashboardInputs::new(symbol("MSFT")).with_range(RangeSelection::Custom {
        start: date!(2023 - 01 - 05),
        end: date!(2023 - 01 - 10),
    });
    let state = dashboard.submit(narrower).await.expect("valid inputs");

    // Then: A third fetch happened and the view shrank
    assert_eq!(source.history_calls(), 3);
    assert_eq!(state.view().expect("displaying").recent_rows.len(), 4);
}

#[tokio::test]
async fn refresh_fetches_again_and_grows_the_live_tape() {
    // Given: A dashboard displaying AAPL
    let source = aapl_source();
    let mut dashboard = controller(source.clone());
    let first = dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");
    assert!(first.view().expect("displaying").live_chart.is_none());

    // When: An auto-refresh tick fires
    let state = dashboard
        .refresh()
        .await
        .expect("inputs present")
        .expect("range still valid");

    // Then: It fetched again and the live chart now has two points
    assert_eq!(source.history_calls(), 2);
    let live = state
        .view()
        .expect("displaying")
        .live_chart
        .as_ref()
        .expect("two points draw a line");
    assert_eq!(live.glyph_count(), 2);
    assert_eq!(dashboard.live_points(), 2);
}

// =============================================================================
// Dashboard: Failures
// =============================================================================

#[tokio::test]
async fn unknown_symbol_fails_with_no_data_and_session_continues() {
    // Given: A provider that only knows AAPL
    let source = aapl_source();
    let mut dashboard = controller(source.clone());

    // When: The user asks for ZZZZINVALID
    let state = dashboard
        .submit(DashboardInputs::new(symbol("ZZZZINVALID")).with_range(Period::OneMonth))
        .await
        .expect("syntactically valid inputs");

    // Then: The state is Failed with a NoData message naming the symbol
    let failure = state.failure().expect("should be failed");
    assert_eq!(failure.kind, FailureKind::NoData);
    assert_eq!(failure.symbol.as_str(), "ZZZZINVALID");
    assert!(failure.message.contains("ZZZZINVALID"));

    // And: The next input is accepted normally
    let state = dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");
    assert_eq!(state.kind(), StateKind::Displaying);
}

#[tokio::test(start_paused = true)]
async fn network_timeout_fails_with_fetch_error_and_session_continues() {
    // Given: A provider that hangs for TSLA and a 10 second fetch budget
    let source = shared(
        ScriptedSource::new()
            .with("TSLA", Script::Hang)
            .with("AAPL", Script::Bars(aapl_january_2023())),
    );
    let mut dashboard = DashboardController::new(
        DataFetcher::new(source.clone()).with_timeout(Duration::from_secs(10)),
    )
    .with_clock(Arc::new(FixedClock(datetime!(2024-06-28 15:30 UTC))));

    // When: The user asks for TSLA
    let state = dashboard
        .submit(january_2023("TSLA"))
        .await
        .expect("valid inputs");

    // Then: The state is Failed with a fetch error
    let failure = state.failure().expect("should be failed");
    assert_eq!(failure.kind, FailureKind::Fetch);
    assert_eq!(failure.code, "source.timeout");

    // And: The session still accepts new input
    let state = dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");
    assert_eq!(state.kind(), StateKind::Displaying);
}

#[tokio::test]
async fn style_change_after_failure_fetches_instead_of_rerendering() {
    // Given: A dashboard whose last fetch failed
    let source = shared(ScriptedSource::new().with(
        "AAPL",
        Script::Fail(SourceError::unavailable("upstream returned 502")),
    ));
    let mut dashboard = controller(source.clone());
    dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");
    assert_eq!(dashboard.state().kind(), StateKind::Failed);

    // When: Only the style changes
    dashboard
        .submit(january_2023("AAPL").with_style(ChartStyle::Line))
        .await
        .expect("valid inputs");

    // Then: There is nothing to re-render, so it tries the network again
    assert_eq!(source.history_calls(), 2);
}

#[tokio::test]
async fn invalid_range_is_rejected_without_leaving_the_current_state() {
    // Given: A dashboard displaying AAPL
    let mut dashboard = controller(aapl_source());
    dashboard
        .submit(january_2023("AAPL"))
        .await
        .expect("valid inputs");

    // When: The user picks a start date after the end date
    let inverted = DashboardInputs::new(symbol("AAPL")).with_range(RangeSelection::Custom {
        start: date!(2023 - 02 - 01),
        end: date!(2023 - 01 - 01),
    });
    let result = dashboard.submit(inverted).await;

    // Then: The input is rejected and the previous view stays up
    assert!(result.is_err());
    assert_eq!(dashboard.state().kind(), StateKind::Displaying);
}

// =============================================================================
// Dashboard: Last request wins
// =============================================================================

#[tokio::test]
async fn stale_result_arriving_last_is_discarded() {
    // Given: Two fetches started back to back, AAPL then MSFT
    let source = aapl_source();
    let mut dashboard = controller(source.clone());
    let fetcher = dashboard.fetcher().clone();

    let Pending::Fetch { ticket: first, request: first_req } =
        dashboard.begin(january_2023("AAPL")).expect("valid inputs")
    else {
        panic!("first submit must fetch");
    };
    let Pending::Fetch { ticket: second, request: second_req } =
        dashboard.begin(january_2023("MSFT")).expect("valid inputs")
    else {
        panic!("symbol change must fetch");
    };

    // When: MSFT completes first and AAPL arrives afterwards
    let msft = fetcher.fetch(&second_req).await;
    let aapl = fetcher.fetch(&first_req).await;
    assert_eq!(dashboard.complete(second, msft), Completion::Applied(StateKind::Displaying));
    let late = dashboard.complete(first, aapl);

    // Then: The late AAPL result is dropped and MSFT stays on screen
    assert_eq!(late, Completion::Stale);
    let view = dashboard.state().view().expect("displaying");
    assert_eq!(view.symbol.as_str(), "MSFT");
}

#[tokio::test]
async fn stale_result_arriving_first_does_not_end_loading() {
    // Given: Two fetches started back to back
    let source = aapl_source();
    let mut dashboard = controller(source.clone());
    let fetcher = dashboard.fetcher().clone();

    let Pending::Fetch { ticket: first, request: first_req } =
        dashboard.begin(january_2023("AAPL")).expect("valid inputs")
    else {
        panic!("first submit must fetch");
    };
    let Pending::Fetch { ticket: second, request: second_req } =
        dashboard.begin(january_2023("MSFT")).expect("valid inputs")
    else {
        panic!("symbol change must fetch");
    };

    // When: The older AAPL result arrives first
    let early = dashboard.complete(first, fetcher.fetch(&first_req).await);

    // Then: It is ignored and the dashboard keeps loading MSFT
    assert_eq!(early, Completion::Stale);
    assert_eq!(dashboard.state().kind(), StateKind::Loading);

    // When: MSFT arrives
    dashboard.complete(second, fetcher.fetch(&second_req).await);

    // Then: MSFT is displayed
    assert_eq!(
        dashboard.state().view().expect("displaying").symbol.as_str(),
        "MSFT"
    );
}

// =============================================================================
// Dashboard: Alerts
// =============================================================================

#[tokio::test]
async fn price_above_threshold_raises_an_alert_in_the_view() {
    // Given: An alert above $130
    let mut dashboard = controller(aapl_source());
    let inputs = january_2023("AAPL").with_alert(PriceAlert::new(Some(130.0), None));

    // When: The dashboard displays a latest close of $130.73
    let state = dashboard.submit(inputs).await.expect("valid inputs");

    // Then: The view carries the alert
    let alert = state
        .view()
        .expect("displaying")
        .alert
        .as_ref()
        .expect("alert should fire");
    assert_eq!(alert.message, "AAPL price is above $130.00");
}
