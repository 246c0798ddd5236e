// Feature matrix assembly with per-column median imputation.
use crate::io::coerce_numeric;
use crate::preprocess::Game;
use ndarray::Array2;
use std::error::Error;

/// Fixed prior added to every game in favour of the home side.
pub const HOME_ADVANTAGE: f64 = 0.08;

/// Model input columns, in matrix order.
pub const FEATURE_COLUMNS: [&str; 14] = [
    "score_home",
    "score_away",
    "spread_favorite",
    "over_under_line",
    "stadium_neutral",
    "weather_humidity",
    "home_wins",
    "away_wins",
    "home_advantage",
    "team_home",
    "team_away",
    "team_favorite_id",
    "stadium",
    "weather_detail",
];

fn raw_features(g: &Game) -> [Option<f64>; 14] {
    let r = &g.record;
    let c = &g.codes;
    [
        coerce_numeric(r.score_home.as_deref()),
        coerce_numeric(r.score_away.as_deref()),
        coerce_numeric(r.spread_favorite.as_deref()),
        coerce_numeric(r.over_under_line.as_deref()),
        coerce_numeric(r.stadium_neutral.as_deref()),
        coerce_numeric(r.weather_humidity.as_deref()),
        Some(f64::from(g.home_wins)),
        Some(f64::from(g.away_wins)),
        Some(HOME_ADVANTAGE),
        Some(c.team_home as f64),
        Some(c.team_away as f64),
        Some(c.team_favorite_id as f64),
        Some(c.stadium as f64),
        Some(c.weather_detail as f64),
    ]
}

/// Median of the present values; even counts average the middle pair.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// input: the games of one split
/// output: n x 14 matrix with no gaps
/// logic: coerce each column, then fill its gaps with the median of the
/// values present in these games. A column with nothing to take a median of
/// is an error.
pub fn assemble(games: &[&Game]) -> Result<Array2<f64>, Box<dyn Error>> {
    let rows: Vec<[Option<f64>; 14]> = games.iter().map(|g| raw_features(g)).collect();
    let mut x = Array2::<f64>::zeros((rows.len(), FEATURE_COLUMNS.len()));

    for (j, name) in FEATURE_COLUMNS.iter().enumerate() {
        let present: Vec<f64> = rows.iter().filter_map(|r| r[j]).collect();
        let fill = if present.len() == rows.len() {
            0.0
        } else {
            median(&present)
                .ok_or_else(|| format!("column {} has no numeric values to impute from", name))?
        };
        for (i, r) in rows.iter().enumerate() {
            x[(i, j)] = r[j].unwrap_or(fill);
        }
    }

    Ok(x)
}
