/// Put all the stages together: load games, build features, tune the forest, score 2023 and chart it.
use std::error::Error;

mod encode;
mod features;
mod io;
mod model;
mod preprocess;
mod report;

use clap::Parser;
use encode::{CategoryEncoders, UNKNOWN};
use io::load_csv;
use model::{accuracy, grid_search, ParamGrid};
use plotters::prelude::*;
use plotters::style::FontTransform;
use preprocess::{accumulate_team_form, label_games, regular_season, split_by_season, targets, Game, TEST_SEASON};
use report::{team_records, TeamRecord};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "nfl_predictor")]
#[command(about = "Predicts NFL home wins with a tuned tree ensemble and charts the 2023 season")]
struct Args {
    /// Game history csv
    #[arg(default_value = "spreadspoke_scores.csv")]
    data: String,

    /// Where to write the season chart (saved as a PNG, no window is opened)
    #[arg(long, default_value = "team_records_2023.png")]
    chart: String,

    /// Cross-validation folds
    #[arg(long, default_value_t = 5)]
    folds: usize,

    /// Seed for the ensemble
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Draws predicted wins and losses per team as stacked bars and saves them to `path`
/// input: team records sorted as they should appear
/// output: none (writes the PNG)
/// logic: one segment per team along X, named at its centre; wins from 0, losses stacked on top
fn plot_team_records(records: &[TeamRecord], path: &str) -> Result<(), Box<dyn Error>> {
    let count = records.len();
    let max_games = records.iter().map(TeamRecord::games).max().unwrap_or(0) + 1;

    let root = BitMapBackend::new(path, (1400, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Predicted {} Wins and Losses by Team", TEST_SEASON), ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(220)
        .y_label_area_size(50)
        .build_cartesian_2d((0..count).into_segmented(), 0..max_games)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => records.get(*i).map(|r| r.team.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
        .x_desc("Team")
        .y_desc("Games")
        .draw()?;

    chart
        .draw_series(records.iter().enumerate().map(|(i, r)| {
            Rectangle::new([(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), r.wins)], GREEN.mix(0.8).filled())
        }))?
        .label("Wins")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], GREEN.mix(0.8).filled()));

    chart
        .draw_series(records.iter().enumerate().map(|(i, r)| {
            Rectangle::new(
                [(SegmentValue::Exact(i), r.wins), (SegmentValue::Exact(i + 1), r.games())],
                RED.mix(0.8).filled())
        }))?
        .label("Losses")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RED.mix(0.8).filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Season outcome of one run
struct SeasonForecast {
    accuracy: f64,
    table: Vec<TeamRecord>,
}

/// split, assemble, tune on the training seasons and forecast the test season
fn forecast_season(
    games: &[Game],
    encoders: &CategoryEncoders,
    folds: usize,
    seed: u64,
) -> Result<SeasonForecast, Box<dyn Error>> {
    let (train, test) = split_by_season(games);
    let x_train = features::assemble(&train)?;
    let x_test = features::assemble(&test)?;
    let (y_train, y_test) = (targets(&train), targets(&test));
    info!(train = train.len(), test = test.len(), "split by season");

    let search = grid_search(&x_train, &y_train, &ParamGrid::default(), folds, seed)?;
    info!(
        params = ?search.best.params(),
        cv_accuracy = search.best_score,
        candidates = search.scores.len(),
        "selected model"
    );
    let predictions = search.best.predict(&x_test)?;

    Ok(SeasonForecast {
        accuracy: accuracy(&predictions, &y_test),
        table: team_records(&test, &predictions, encoders),
    })
}

/// load data, engineer features, tune, evaluate and chart
/// input: command line (every option has a default)
/// output: the accuracy line on stdout and the chart on disk
fn main() -> Result<(), Box<dyn Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();

    // 1) Load, label and encode
    info!(path = %args.data, "loading games");
    let records = regular_season(load_csv(&args.data)?);
    let encoders = CategoryEncoders::fit(&records);
    let mut games = label_games(records, &encoders)?;
    accumulate_team_form(&mut games);
    let known_teams = encoders.team_home.classes().iter().filter(|t| t.as_str() != UNKNOWN).count();
    info!(games = games.len(), teams = known_teams, "regular season games labelled");

    // 2) Split, tune and score
    let forecast = forecast_season(&games, &encoders, args.folds, args.seed)?;
    println!("{} Predictions Accuracy: {}", TEST_SEASON, forecast.accuracy);

    // 3) Season chart
    plot_team_records(&forecast.table, &args.chart)?;
    info!(path = %args.chart, teams = forecast.table.len(), "wrote season chart");

    Ok(())
}
