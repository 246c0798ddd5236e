// Module for loading and validating the game data. It reads the csv file, validates headers, and coerces numeric text.
use std::error::Error;
use std::fs::File;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;

/// Columns the pipeline reads. The file may carry more (dates, weather temperature, ...).
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "schedule_season",
    "schedule_playoff",
    "team_home",
    "team_away",
    "score_home",
    "score_away",
    "spread_favorite",
    "over_under_line",
    "team_favorite_id",
    "stadium",
    "stadium_neutral",
    "weather_humidity",
    "weather_detail",
];

/// One scheduled game. Numeric columns stay as raw text so a bad value
/// becomes a gap rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "schedule_season")]  pub season: i32,
    #[serde(rename = "schedule_playoff")] pub playoff: String,
    pub team_home: Option<String>,
    pub team_away: Option<String>,
    pub score_home: Option<String>,
    pub score_away: Option<String>,
    pub spread_favorite: Option<String>,
    pub over_under_line: Option<String>,
    pub team_favorite_id: Option<String>,
    pub stadium: Option<String>,
    pub stadium_neutral: Option<String>,
    pub weather_humidity: Option<String>,
    pub weather_detail: Option<String>,
}

/// Parse a numeric cell; blanks and garbage are missing.
pub fn coerce_numeric(raw: Option<&str>) -> Option<f64> {
    let s = raw?.trim();
    if let Some(b) = parse_flag(s) {
        return Some(if b { 1.0 } else { 0.0 });
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// `schedule_playoff` is written as TRUE/FALSE in the dataset, sometimes 1/0.
pub fn is_playoff(raw: &str) -> bool {
    let s = raw.trim();
    parse_flag(s).unwrap_or(s == "1")
}

fn check_headers(headers: &StringRecord) -> Result<(), Box<dyn Error>> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(format!("missing required column: {}", column).into());
        }
    }
    Ok(())
}

/// input: path to the games csv
/// output: every row in file order, or the first error hit
/// logic: validate the header row, skip blank lines, deserialize the rest.
/// A malformed row aborts the load.
pub fn load_csv(path: &str) -> Result<Vec<GameRecord>, Box<dyn Error>> {
    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    check_headers(&headers)?;

    let mut out = Vec::new();
    for result in rdr.records() {
        let raw: StringRecord = result?;
        if raw.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let rec = raw.deserialize::<GameRecord>(Some(&headers)).map_err(|e| {
            format!(
                "malformed record at line {}: {}",
                raw.position().map(|p| p.line()).unwrap_or(0),
                e
            )
        })?;
        out.push(rec);
    }

    Ok(out)
}
