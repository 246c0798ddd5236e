// Labelling, encoding and team form. Turns raw records into model-ready games.
use crate::encode::{CategoryCodes, CategoryEncoders};
use crate::io::{coerce_numeric, is_playoff, GameRecord};
use ndarray::Array1;
use std::collections::BTreeSet;
use std::error::Error;
use std::ops::RangeInclusive;
use tracing::debug;

pub const TRAIN_SEASONS: RangeInclusive<i32> = 2017..=2022;
pub const TEST_SEASON: i32 = 2023;

/// Outcome of a game from the home side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult { HomeWin, AwayWin, Tie }

impl GameResult {
    /// A missing score is neither greater nor less, so it reads as a tie.
    pub fn from_scores(home: Option<f64>, away: Option<f64>) -> Self {
        match (home, away) {
            (Some(h), Some(a)) if h > a => GameResult::HomeWin,
            (Some(h), Some(a)) if h < a => GameResult::AwayWin,
            _ => GameResult::Tie,
        }
    }
}

/// A labelled, encoded game plus its form counters
#[derive(Debug, Clone)]
pub struct Game {
    pub record: GameRecord,
    pub result: GameResult,
    pub codes: CategoryCodes,
    pub home_wins: u32,
    pub away_wins: u32,
}

impl Game {
    pub fn season(&self) -> i32 {
        self.record.season
    }

    pub fn home_win(&self) -> bool {
        self.result == GameResult::HomeWin
    }
}

/// Drop playoff games, keeping file order.
pub fn regular_season(records: Vec<GameRecord>) -> Vec<GameRecord> {
    records.into_iter().filter(|r| !is_playoff(&r.playoff)).collect()
}

/// Label and encode every record. The encoders must have been fitted on
/// these same records.
pub fn label_games(
    records: Vec<GameRecord>,
    encoders: &CategoryEncoders,
) -> Result<Vec<Game>, Box<dyn Error>> {
    records
        .into_iter()
        .map(|record| -> Result<Game, Box<dyn Error>> {
            let result = GameResult::from_scores(
                coerce_numeric(record.score_home.as_deref()),
                coerce_numeric(record.score_away.as_deref()),
            );
            let codes = encoders
                .encode(&record)
                .ok_or_else(|| format!("record outside fitted encoders: {:?}", record))?;
            Ok(Game { record, result, codes, home_wins: 0, away_wins: 0 })
        })
        .collect()
}

/// Write each team's prior wins into its games, per role, in row order.
/// Counters are not reset between seasons.
pub fn accumulate_team_form(games: &mut [Game]) {
    let teams: BTreeSet<usize> = games
        .iter()
        .flat_map(|g| [g.codes.team_home, g.codes.team_away])
        .collect();

    for team in teams {
        let mut wins = 0;
        for g in games.iter_mut().filter(|g| g.codes.team_home == team) {
            g.home_wins = wins;
            if g.result == GameResult::HomeWin {
                wins += 1;
            }
        }

        let mut wins = 0;
        for g in games.iter_mut().filter(|g| g.codes.team_away == team) {
            g.away_wins = wins;
            if g.result == GameResult::AwayWin {
                wins += 1;
            }
        }
    }
    debug!(games = games.len(), "team form accumulated");
}

/// Split into (train, test) by season. Games outside both ranges are dropped.
pub fn split_by_season(games: &[Game]) -> (Vec<&Game>, Vec<&Game>) {
    let train = games.iter().filter(|g| TRAIN_SEASONS.contains(&g.season())).collect();
    let test = games.iter().filter(|g| g.season() == TEST_SEASON).collect();
    (train, test)
}

/// `true` where the home side won.
pub fn targets(games: &[&Game]) -> Array1<bool> {
    games.iter().map(|g| g.home_win()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(season: i32, home: &str, away: &str, sh: &str, sa: &str) -> GameRecord {
        GameRecord {
            season,
            playoff: "FALSE".into(),
            team_home: Some(home.into()),
            team_away: Some(away.into()),
            score_home: Some(sh.into()),
            score_away: Some(sa.into()),
            spread_favorite: None,
            over_under_line: None,
            team_favorite_id: None,
            stadium: None,
            stadium_neutral: None,
            weather_humidity: None,
            weather_detail: None,
        }
    }

    fn games(records: Vec<GameRecord>) -> Vec<Game> {
        let encoders = CategoryEncoders::fit(&records);
        let mut games = label_games(records, &encoders).unwrap();
        accumulate_team_form(&mut games);
        games
    }

    #[test]
    fn labels_match_score_comparison() {
        assert_eq!(GameResult::from_scores(Some(24.0), Some(17.0)), GameResult::HomeWin);
        assert_eq!(GameResult::from_scores(Some(3.0), Some(17.0)), GameResult::AwayWin);
        assert_eq!(GameResult::from_scores(Some(20.0), Some(20.0)), GameResult::Tie);
        assert_eq!(GameResult::from_scores(None, Some(20.0)), GameResult::Tie);
    }

    #[test]
    fn drops_playoff_games() {
        let mut playoff = record(2023, "A", "B", "1", "0");
        playoff.playoff = "TRUE".into();
        let kept = regular_season(vec![record(2023, "A", "B", "1", "0"), playoff]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn form_counts_prior_wins_per_role() {
        let games = games(vec![
            record(2020, "A", "B", "21", "7"),  // A home win
            record(2020, "B", "A", "10", "14"), // A away win
            record(2021, "A", "B", "3", "9"),   // B away win
            record(2021, "A", "B", "28", "0"),  // A home win
            record(2022, "B", "A", "17", "17"), // tie
            record(2022, "A", "B", "7", "6"),   // A home win
        ]);
        let home: Vec<u32> = games.iter().map(|g| g.home_wins).collect();
        let away: Vec<u32> = games.iter().map(|g| g.away_wins).collect();
        // A at home: games 0,2,3,5 with wins at 0,3,5; B at home: games 1,4 with none
        assert_eq!(home, vec![0, 0, 1, 1, 0, 2]);
        // B away: games 0,2,3,5 with a win at 2; A away: games 1,4 with a win at 1
        assert_eq!(away, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn form_counters_never_skip() {
        let games = games(vec![
            record(2017, "A", "B", "1", "0"),
            record(2017, "A", "B", "1", "0"),
            record(2018, "A", "B", "0", "1"),
            record(2023, "A", "B", "1", "0"),
        ]);
        let mut expected = 0;
        for g in &games {
            assert_eq!(g.home_wins, expected);
            if g.home_win() {
                expected += 1;
            }
        }
    }

    #[test]
    fn splits_by_season() {
        let games = games(vec![
            record(2016, "A", "B", "1", "0"),
            record(2017, "A", "B", "1", "0"),
            record(2022, "B", "A", "0", "1"),
            record(2023, "A", "B", "0", "1"),
            record(2024, "A", "B", "0", "1"),
        ]);
        let (train, test) = split_by_season(&games);
        assert!(train.iter().all(|g| TRAIN_SEASONS.contains(&g.season())));
        assert!(test.iter().all(|g| g.season() == TEST_SEASON));
        assert_eq!((train.len(), test.len()), (2, 1));
        assert!(!train.iter().any(|a| test.iter().any(|b| std::ptr::eq(*a, *b))));
        assert_eq!(targets(&test), Array1::from(vec![false]));
    }
}
