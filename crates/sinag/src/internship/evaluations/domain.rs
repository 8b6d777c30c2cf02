use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortalError;
use crate::ids::{AccountId, EvaluationId, InternId};
use crate::internship::logbook::domain::round2;
use crate::storage::UnknownVariant;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
const MAX_COMMENTS_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPeriod {
    Midterm,
    Final,
}

impl EvaluationPeriod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Midterm => "midterm",
            Self::Final => "final",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Midterm => "Midterm Evaluation",
            Self::Final => "Final Evaluation",
        }
    }
}

impl fmt::Display for EvaluationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationPeriod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "midterm" => Ok(Self::Midterm),
            "final" => Ok(Self::Final),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Performance criteria on the HTE evaluation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    QualityOfWork,
    QuantityOfWork,
    Dependability,
    AttendanceAndPunctuality,
    Initiative,
    Cooperation,
    Communication,
    ProfessionalConduct,
}

impl Criterion {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::QualityOfWork,
            Self::QuantityOfWork,
            Self::Dependability,
            Self::AttendanceAndPunctuality,
            Self::Initiative,
            Self::Cooperation,
            Self::Communication,
            Self::ProfessionalConduct,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QualityOfWork => "quality_of_work",
            Self::QuantityOfWork => "quantity_of_work",
            Self::Dependability => "dependability",
            Self::AttendanceAndPunctuality => "attendance_and_punctuality",
            Self::Initiative => "initiative",
            Self::Cooperation => "cooperation",
            Self::Communication => "communication",
            Self::ProfessionalConduct => "professional_conduct",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::QualityOfWork => "Quality of Work",
            Self::QuantityOfWork => "Quantity of Work",
            Self::Dependability => "Dependability",
            Self::AttendanceAndPunctuality => "Attendance and Punctuality",
            Self::Initiative => "Initiative",
            Self::Cooperation => "Cooperation",
            Self::Communication => "Communication",
            Self::ProfessionalConduct => "Professional Conduct",
        }
    }
}

impl FromStr for Criterion {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|criterion| criterion.as_str() == value)
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingLabel {
    Outstanding,
    VerySatisfactory,
    Satisfactory,
    Fair,
    Poor,
}

impl RatingLabel {
    pub fn for_average(average: f64) -> Self {
        if average >= 4.5 {
            Self::Outstanding
        } else if average >= 3.5 {
            Self::VerySatisfactory
        } else if average >= 2.5 {
            Self::Satisfactory
        } else if average >= 1.5 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Outstanding => "Outstanding",
            Self::VerySatisfactory => "Very Satisfactory",
            Self::Satisfactory => "Satisfactory",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

pub type Ratings = BTreeMap<Criterion, u8>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub average: f64,
    pub percentage: f64,
    pub rating: RatingLabel,
    pub rating_label: &'static str,
}

impl Score {
    pub fn from_ratings(ratings: &Ratings) -> Self {
        let total: u32 = ratings.values().map(|value| u32::from(*value)).sum();
        let count = ratings.len().max(1) as f64;
        let average = round2(f64::from(total) / count);
        let rating = RatingLabel::for_average(average);
        Self {
            average,
            percentage: round2(average / f64::from(MAX_RATING) * 100.0),
            rating,
            rating_label: rating.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub intern_id: InternId,
    pub period: EvaluationPeriod,
    pub evaluator_id: AccountId,
    pub ratings: Ratings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub score: Score,
}

/// Submitted form; criteria arrive keyed by their snake_case names.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationDraft {
    pub period: EvaluationPeriod,
    pub ratings: BTreeMap<String, u8>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEvaluation {
    pub period: EvaluationPeriod,
    pub ratings: Ratings,
    pub comments: Option<String>,
}

impl EvaluationDraft {
    /// Every criterion rated once within range; unknown criteria are refused.
    pub fn validate(self) -> Result<ValidEvaluation, PortalError> {
        let mut ratings = Ratings::new();
        for (name, value) in self.ratings {
            let criterion: Criterion = name
                .trim()
                .parse()
                .map_err(|_| PortalError::validation(format!("unknown criterion '{name}'")))?;
            if !(MIN_RATING..=MAX_RATING).contains(&value) {
                return Err(PortalError::validation(format!(
                    "{} must be rated from {MIN_RATING} to {MAX_RATING}",
                    criterion.label()
                )));
            }
            ratings.insert(criterion, value);
        }
        let missing: Vec<&str> = Criterion::ordered()
            .into_iter()
            .filter(|criterion| !ratings.contains_key(criterion))
            .map(Criterion::label)
            .collect();
        if !missing.is_empty() {
            return Err(PortalError::validation(format!(
                "missing ratings for: {}",
                missing.join(", ")
            )));
        }

        let comments = self
            .comments
            .map(|comments| comments.trim().to_string())
            .filter(|comments| !comments.is_empty());
        if comments
            .as_ref()
            .is_some_and(|comments| comments.chars().count() > MAX_COMMENTS_LEN)
        {
            return Err(PortalError::validation(format!(
                "comments must be at most {MAX_COMMENTS_LEN} characters"
            )));
        }

        Ok(ValidEvaluation {
            period: self.period,
            ratings,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(value: u8) -> EvaluationDraft {
        EvaluationDraft {
            period: EvaluationPeriod::Midterm,
            ratings: Criterion::ordered()
                .into_iter()
                .map(|criterion| (criterion.as_str().to_string(), value))
                .collect(),
            comments: None,
        }
    }

    #[test]
    fn labels_follow_the_average_bands() {
        assert_eq!(RatingLabel::for_average(4.5), RatingLabel::Outstanding);
        assert_eq!(RatingLabel::for_average(4.49), RatingLabel::VerySatisfactory);
        assert_eq!(RatingLabel::for_average(3.5), RatingLabel::VerySatisfactory);
        assert_eq!(RatingLabel::for_average(2.5), RatingLabel::Satisfactory);
        assert_eq!(RatingLabel::for_average(1.5), RatingLabel::Fair);
        assert_eq!(RatingLabel::for_average(1.49), RatingLabel::Poor);
    }

    #[test]
    fn score_rounds_average_and_percentage() {
        let mut valid = draft(4).validate().expect("valid");
        valid.ratings.insert(Criterion::Initiative, 5);
        valid.ratings.insert(Criterion::Cooperation, 5);
        valid.ratings.insert(Criterion::Communication, 3);
        let score = Score::from_ratings(&valid.ratings);
        assert_eq!(score.average, 4.13);
        assert_eq!(score.percentage, 82.6);
        assert_eq!(score.rating, RatingLabel::VerySatisfactory);
    }

    #[test]
    fn all_criteria_are_required_and_in_range() {
        let mut partial = draft(4);
        partial.ratings.remove("initiative");
        assert!(matches!(partial.validate(), Err(PortalError::Validation(_))));

        assert!(draft(6).validate().is_err());
        assert!(draft(0).validate().is_err());

        let mut extra = draft(3);
        extra.ratings.insert("charisma".to_string(), 5);
        assert!(extra.validate().is_err());
    }
}
