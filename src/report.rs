// Predicted season records per team.
use crate::encode::{CategoryEncoders, UNKNOWN};
use crate::preprocess::{Game, GameResult};
use ndarray::Array1;
use std::collections::BTreeMap;

/// Relocated or renamed franchises left out of the season table.
pub const EXCLUDED_TEAMS: [&str; 12] = [
    "Baltimore Colts",
    "Boston Patriots",
    "Houston Oilers",
    "Los Angeles Raiders",
    "Oakland Raiders",
    "Phoenix Cardinals",
    "San Diego Chargers",
    "St. Louis Cardinals",
    "St. Louis Rams",
    "Tennessee Oilers",
    "Washington Football Team",
    "Washington Redskins",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
}

impl TeamRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Tally predicted wins and losses for every known team.
///
/// `predictions[i]` is `true` when game `i` is predicted a home win. Teams are
/// the fitted home and away vocabularies, minus [`UNKNOWN`] and [`EXCLUDED_TEAMS`];
/// a team with no games in `games` still gets a 0-0 row. Sorted by wins,
/// most first, then by name.
pub fn team_records(
    games: &[&Game],
    predictions: &Array1<bool>,
    encoders: &CategoryEncoders,
) -> Vec<TeamRecord> {
    let mut table: BTreeMap<&str, (u32, u32)> = encoders
        .team_home
        .classes()
        .iter()
        .chain(encoders.team_away.classes())
        .map(String::as_str)
        .filter(|t| *t != UNKNOWN && !EXCLUDED_TEAMS.contains(t))
        .map(|t| (t, (0, 0)))
        .collect();

    for (g, &home_win) in games.iter().zip(predictions.iter()) {
        let predicted = if home_win { GameResult::HomeWin } else { GameResult::AwayWin };
        let sides = [
            (encoders.team_home.decode(g.codes.team_home), GameResult::HomeWin),
            (encoders.team_away.decode(g.codes.team_away), GameResult::AwayWin),
        ];
        for (team, win_as) in sides {
            if let Some((wins, losses)) = team.and_then(|t| table.get_mut(t)) {
                if predicted == win_as {
                    *wins += 1;
                } else {
                    *losses += 1;
                }
            }
        }
    }

    let mut records: Vec<TeamRecord> = table
        .into_iter()
        .map(|(team, (wins, losses))| TeamRecord { team: team.to_string(), wins, losses })
        .collect();
    records.sort_by(|a, b| b.wins.cmp(&a.wins));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::GameRecord;
    use crate::preprocess::label_games;

    fn record(home: &str, away: &str) -> GameRecord {
        GameRecord {
            season: 2023,
            playoff: "FALSE".into(),
            team_home: Some(home.into()),
            team_away: Some(away.into()),
            score_home: Some("0".into()),
            score_away: Some("0".into()),
            spread_favorite: None,
            over_under_line: None,
            team_favorite_id: None,
            stadium: None,
            stadium_neutral: None,
            weather_humidity: None,
            weather_detail: None,
        }
    }

    #[test]
    fn counts_predicted_sides_and_skips_excluded_teams() {
        let records = vec![
            record("Buffalo Bills", "Miami Dolphins"),
            record("Miami Dolphins", "Buffalo Bills"),
            record("Oakland Raiders", "Buffalo Bills"),
            record("New York Jets", "Miami Dolphins"),
        ];
        let encoders = CategoryEncoders::fit(&records);
        let games = label_games(records, &encoders).unwrap();
        let refs: Vec<&Game> = games.iter().collect();
        let predictions = Array1::from(vec![true, false, false, true]);

        let table = team_records(&refs, &predictions, &encoders);
        let names: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(names, vec!["Buffalo Bills", "New York Jets", "Miami Dolphins"]);
        assert_eq!(table[0], TeamRecord { team: "Buffalo Bills".into(), wins: 3, losses: 0 });
        assert_eq!(table[1], TeamRecord { team: "New York Jets".into(), wins: 1, losses: 0 });
        assert_eq!(table[2], TeamRecord { team: "Miami Dolphins".into(), wins: 0, losses: 3 });
        for r in &table {
            let played = refs
                .iter()
                .filter(|g| {
                    g.record.team_home.as_deref() == Some(r.team.as_str())
                        || g.record.team_away.as_deref() == Some(r.team.as_str())
                })
                .count();
            assert_eq!(r.games() as usize, played);
        }
    }

    #[test]
    fn teams_without_games_get_empty_rows() {
        let records = vec![record("Buffalo Bills", "Miami Dolphins"), record("Chicago Bears", "Detroit Lions")];
        let encoders = CategoryEncoders::fit(&records);
        let games = label_games(records, &encoders).unwrap();
        let refs: Vec<&Game> = games.iter().take(1).collect();
        let table = team_records(&refs, &Array1::from(vec![false]), &encoders);
        for idle in ["Chicago Bears", "Detroit Lions"] {
            let r = table.iter().find(|r| r.team == idle).unwrap();
            assert_eq!(r.games(), 0);
        }
        assert!(table.iter().all(|r| r.team != UNKNOWN));
    }
}
