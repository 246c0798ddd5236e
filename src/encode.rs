// Reversible label encoding for the text columns.
use crate::io::GameRecord;

/// Label given to missing text values before encoding.
pub const UNKNOWN: &str = "unknown";

/// Sorted vocabulary; a value's code is its position.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit over a column. Missing values map to [`UNKNOWN`], which is always
    /// part of the vocabulary.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut classes: Vec<String> = values
            .into_iter()
            .map(|v| v.unwrap_or(UNKNOWN).to_string())
            .collect();
        classes.push(UNKNOWN.to_string());
        classes.sort();
        classes.dedup();
        LabelEncoder { classes }
    }

    pub fn encode(&self, value: Option<&str>) -> Option<usize> {
        let value = value.unwrap_or(UNKNOWN);
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Codes for one game's categorical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryCodes {
    pub team_home: usize,
    pub team_away: usize,
    pub team_favorite_id: usize,
    pub stadium: usize,
    pub weather_detail: usize,
}

/// One encoder per categorical column, fitted over train and test together
/// and kept around to decode predictions.
#[derive(Debug, Clone)]
pub struct CategoryEncoders {
    pub team_home: LabelEncoder,
    pub team_away: LabelEncoder,
    pub team_favorite_id: LabelEncoder,
    pub stadium: LabelEncoder,
    pub weather_detail: LabelEncoder,
}

impl CategoryEncoders {
    pub fn fit(records: &[GameRecord]) -> Self {
        CategoryEncoders {
            team_home: LabelEncoder::fit(records.iter().map(|r| r.team_home.as_deref())),
            team_away: LabelEncoder::fit(records.iter().map(|r| r.team_away.as_deref())),
            team_favorite_id: LabelEncoder::fit(
                records.iter().map(|r| r.team_favorite_id.as_deref()),
            ),
            stadium: LabelEncoder::fit(records.iter().map(|r| r.stadium.as_deref())),
            weather_detail: LabelEncoder::fit(records.iter().map(|r| r.weather_detail.as_deref())),
        }
    }

    /// Encode a record this set was fitted on. `None` means the record
    /// carries a value outside the fitted vocabulary.
    pub fn encode(&self, r: &GameRecord) -> Option<CategoryCodes> {
        Some(CategoryCodes {
            team_home: self.team_home.encode(r.team_home.as_deref())?,
            team_away: self.team_away.encode(r.team_away.as_deref())?,
            team_favorite_id: self.team_favorite_id.encode(r.team_favorite_id.as_deref())?,
            stadium: self.stadium.encode(r.stadium.as_deref())?,
            weather_detail: self.weather_detail.encode(r.weather_detail.as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_fitted_value() {
        let values = [Some("DOME"), None, Some("Rain"), Some("DOME"), Some("Fog")];
        let enc = LabelEncoder::fit(values.iter().copied());
        assert_eq!(enc.classes(), &["DOME", "Fog", "Rain", "unknown"]);
        for v in values {
            let code = enc.encode(v).unwrap();
            assert_eq!(enc.decode(code), Some(v.unwrap_or(UNKNOWN)));
        }
    }

    #[test]
    fn missing_and_literal_unknown_share_a_code() {
        let enc = LabelEncoder::fit([Some("unknown"), None, Some("BUF")]);
        assert_eq!(enc.classes().len(), 2);
        assert_eq!(enc.encode(None), enc.encode(Some("unknown")));
    }

    #[test]
    fn unseen_values_do_not_encode() {
        let enc = LabelEncoder::fit([Some("KC")]);
        assert_eq!(enc.encode(Some("LV")), None);
        assert_eq!(enc.decode(enc.classes().len()), None);
    }
}
