use chart_overlays::core::{OhlcPoint, SeriesPoint};
use chart_overlays::host::{NullHost, PaneContext, PanePrimitive};
use chart_overlays::shapes::{
    ExternalSeries, FillBetweenConfig, FillBetweenRenderer, FillColorMode, FillPaint, FillSource,
    PriceComponent,
};

use approx::assert_relative_eq;

fn coordinate_host(bar_times: Vec<i64>) -> NullHost {
    let mut host = NullHost::new();
    host.set_coordinate_space(bar_times, 0.0, 200.0, 1000.0, 500.0);
    host
}

fn bar(time: i64, close: f64) -> OhlcPoint {
    OhlcPoint::new(time, close, close + 1.0, close - 1.0, close).expect("valid bar")
}

fn render(renderer: &mut FillBetweenRenderer, host: &NullHost, candles: &[OhlcPoint]) {
    let ctx = PaneContext {
        coords: host,
        candles,
        pixel_ratio: 1.0,
    };
    renderer.update_all_views(&ctx);
}

#[test]
fn hline_fill_is_one_full_width_rectangle() {
    let host = coordinate_host(vec![100, 200, 300, 400, 500]);
    let mut renderer = FillBetweenRenderer::new(FillBetweenConfig::hline(
        100.0,
        90.0,
        FillColorMode::Static("#80808040".to_owned()),
    ));

    render(&mut renderer, &host, &[]);

    let frame = renderer.pane_views();
    assert_eq!(frame.fills.len(), 1);
    assert_eq!(frame.fills[0].polygons.len(), 1);
    let quad = &frame.fills[0].polygons[0];
    // Price 100 maps to y = 250, price 90 to y = 275; the x span covers the
    // whole visible width.
    assert_relative_eq!(quad[0].x, 0.0);
    assert_relative_eq!(quad[0].y, 250.0);
    assert_relative_eq!(quad[2].x, 1001.0);
    assert_relative_eq!(quad[2].y, 276.0);
}

#[test]
fn hline_rectangle_is_independent_of_level_order() {
    let host = coordinate_host(vec![100, 200, 300, 400, 500]);
    let color = FillColorMode::Static("#80808040".to_owned());
    let mut forward = FillBetweenRenderer::new(FillBetweenConfig::hline(
        100.0,
        90.0,
        FillColorMode::Static("#80808040".to_owned()),
    ));
    let mut reversed = FillBetweenRenderer::new(FillBetweenConfig::hline(90.0, 100.0, color));

    render(&mut forward, &host, &[]);
    render(&mut reversed, &host, &[]);

    assert_eq!(forward.pane_views(), reversed.pane_views());
}

#[test]
fn hline_gradient_paint_survives_into_the_frame() {
    let host = coordinate_host(vec![100, 200, 300]);
    let mut renderer = FillBetweenRenderer::new(FillBetweenConfig::hline(
        30.0,
        70.0,
        FillColorMode::Gradient {
            top: "#ff000040".to_owned(),
            bottom: "#0000ff40".to_owned(),
        },
    ));

    render(&mut renderer, &host, &[]);

    let frame = renderer.pane_views();
    assert_eq!(frame.fills.len(), 1);
    assert!(matches!(
        frame.fills[0].paint,
        FillPaint::VerticalGradient { .. }
    ));
}

#[test]
fn series_fill_emits_one_quad_per_visible_step() {
    let host = coordinate_host(vec![100, 200, 300, 400, 500]);
    let candles = vec![
        bar(100, 60.0),
        bar(200, 62.0),
        bar(300, 58.0),
        bar(400, 61.0),
        bar(500, 63.0),
    ];
    let mut renderer = FillBetweenRenderer::new(FillBetweenConfig::series(
        FillSource::Component(PriceComponent::Close),
        FillSource::Level(50.0),
        FillColorMode::Static("#00ff0020".to_owned()),
    ));

    render(&mut renderer, &host, &candles);

    let frame = renderer.pane_views();
    assert_eq!(frame.fills.len(), 1);
    assert_eq!(frame.fills[0].polygons.len(), 4);
    frame.validate().expect("drawable frame");
}

#[test]
fn dynamic_color_splits_steps_into_above_and_below_batches() {
    let host = coordinate_host(vec![100, 200, 300, 400, 500]);
    let candles = vec![
        bar(100, 60.0),
        bar(200, 60.0),
        bar(300, 40.0),
        bar(400, 40.0),
        bar(500, 60.0),
    ];
    let mut renderer = FillBetweenRenderer::new(FillBetweenConfig::series(
        FillSource::Component(PriceComponent::Close),
        FillSource::Level(50.0),
        FillColorMode::Dynamic {
            above: "#00ff0020".to_owned(),
            below: "#ff000020".to_owned(),
            equal: "#80808020".to_owned(),
        },
    ));

    render(&mut renderer, &host, &candles);

    let frame = renderer.pane_views();
    assert_eq!(frame.fills.len(), 2);
    let count_for = |color: &str| {
        frame
            .fills
            .iter()
            .find(|batch| batch.paint == FillPaint::Solid(color.to_owned()))
            .map_or(0, |batch| batch.polygons.len())
    };
    assert_eq!(count_for("#00ff0020"), 2);
    assert_eq!(count_for("#ff000020"), 2);
}

#[test]
fn missing_external_values_skip_steps_unless_gaps_are_filled() {
    let host = coordinate_host(vec![100, 200, 300]);
    let candles = vec![bar(100, 60.0), bar(200, 61.0), bar(300, 59.0)];
    // The external series has no value at t=200, so both steps touch a gap.
    let external = ExternalSeries::from_points(&[
        SeriesPoint::new(100, 55.0),
        SeriesPoint::new(300, 45.0),
    ]);

    let mut strict = FillBetweenRenderer::new(FillBetweenConfig::series(
        FillSource::Component(PriceComponent::Close),
        FillSource::External(external.clone()),
        FillColorMode::Static("#00ff0020".to_owned()),
    ));
    render(&mut strict, &host, &candles);
    assert!(strict.pane_views().fills.is_empty());

    let mut gap_filling = FillBetweenRenderer::new(
        FillBetweenConfig::series(
            FillSource::Component(PriceComponent::Close),
            FillSource::External(external),
            FillColorMode::Static("#00ff0020".to_owned()),
        )
        .with_fill_gaps(true),
    );
    render(&mut gap_filling, &host, &candles);
    assert_eq!(gap_filling.pane_views().fills[0].polygons.len(), 2);
}

#[test]
fn conditional_color_callback_decides_per_step() {
    let host = coordinate_host(vec![100, 200, 300]);
    let candles = vec![bar(100, 60.0), bar(200, 40.0), bar(300, 60.0)];
    let mut renderer = FillBetweenRenderer::new(FillBetweenConfig::series(
        FillSource::Component(PriceComponent::Close),
        FillSource::Level(50.0),
        FillColorMode::Conditional(Box::new(|s1, s2| {
            if s1 > s2 {
                "#up".to_owned()
            } else {
                "#down".to_owned()
            }
        })),
    ));

    render(&mut renderer, &host, &candles);

    let frame = renderer.pane_views();
    assert_eq!(frame.fills.len(), 2);
    assert_eq!(frame.fills[0].paint, FillPaint::Solid("#up".to_owned()));
    assert_eq!(frame.fills[1].paint, FillPaint::Solid("#down".to_owned()));
}

#[test]
fn only_constant_levels_contribute_to_autoscale() {
    let hline = FillBetweenRenderer::new(FillBetweenConfig::hline(
        100.0,
        90.0,
        FillColorMode::Static("#888".to_owned()),
    ));
    let span = hline.autoscale_info().expect("levels span");
    assert_relative_eq!(span.min, 90.0);
    assert_relative_eq!(span.max, 100.0);

    let series = FillBetweenRenderer::new(FillBetweenConfig::series(
        FillSource::Component(PriceComponent::Close),
        FillSource::Component(PriceComponent::Open),
        FillColorMode::Static("#888".to_owned()),
    ));
    assert!(series.autoscale_info().is_none());
}

#[test]
fn reconfiguring_clears_the_stale_frame() {
    let host = coordinate_host(vec![100, 200, 300]);
    let mut renderer = FillBetweenRenderer::new(FillBetweenConfig::hline(
        30.0,
        70.0,
        FillColorMode::Static("#888".to_owned()),
    ));
    render(&mut renderer, &host, &[]);
    assert!(!renderer.pane_views().fills.is_empty());

    renderer.set_config(FillBetweenConfig::hline(
        10.0,
        20.0,
        FillColorMode::Static("#999".to_owned()),
    ));
    assert!(renderer.pane_views().fills.is_empty(), "cleared until repaint");
}
