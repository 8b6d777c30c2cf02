use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::domain::{Criterion, Evaluation, EvaluationPeriod, Ratings, Score, ValidEvaluation};
use crate::ids::{AccountId, EvaluationId, InternId};
use crate::storage::{parse_column, RepositoryError, SqliteStore};

/// Storage abstraction for supervisor evaluations.
pub trait EvaluationRepository: Send + Sync {
    fn insert_evaluation(
        &self,
        intern_id: InternId,
        evaluator: AccountId,
        evaluation: &ValidEvaluation,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, RepositoryError>;
    fn fetch_evaluation(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError>;
    fn fetch_evaluation_for(
        &self,
        intern_id: InternId,
        period: EvaluationPeriod,
    ) -> Result<Option<Evaluation>, RepositoryError>;
    fn list_evaluations(&self, intern_id: InternId) -> Result<Vec<Evaluation>, RepositoryError>;
}

const EVALUATION_COLUMNS: &str =
    "id, intern_id, period, evaluator_id, ratings, comments, submitted_at";

fn encode_ratings(ratings: &Ratings) -> Result<String, RepositoryError> {
    let named: BTreeMap<&str, u8> = ratings
        .iter()
        .map(|(criterion, value)| (criterion.as_str(), *value))
        .collect();
    serde_json::to_string(&named)
        .map_err(|err| RepositoryError::Unavailable(format!("cannot encode ratings: {err}")))
}

fn evaluation_from_row(row: &Row<'_>) -> rusqlite::Result<Evaluation> {
    let raw: String = row.get(4)?;
    let named: BTreeMap<String, u8> = serde_json::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err)))?;
    let ratings = named
        .into_iter()
        .map(|(name, value)| {
            name.parse::<Criterion>()
                .map(|criterion| (criterion, value))
                .map_err(|err| {
                    rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err))
                })
        })
        .collect::<rusqlite::Result<Ratings>>()?;

    Ok(Evaluation {
        id: row.get(0)?,
        intern_id: row.get(1)?,
        period: parse_column(row, 2)?,
        evaluator_id: row.get(3)?,
        score: Score::from_ratings(&ratings),
        ratings,
        comments: row.get(5)?,
        submitted_at: row.get(6)?,
    })
}

impl EvaluationRepository for SqliteStore {
    fn insert_evaluation(
        &self,
        intern_id: InternId,
        evaluator: AccountId,
        evaluation: &ValidEvaluation,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, RepositoryError> {
        let ratings = encode_ratings(&evaluation.ratings)?;
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO evaluations (intern_id, period, evaluator_id, ratings, comments, \
                 submitted_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    intern_id,
                    evaluation.period.as_str(),
                    evaluator,
                    ratings,
                    evaluation.comments,
                    now,
                ],
            )?;
            Ok(EvaluationId(conn.last_insert_rowid()))
        })?;
        self.fetch_evaluation(id)?.ok_or(RepositoryError::NotFound)
    }

    fn fetch_evaluation(&self, id: EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE id = ?1"),
                [id],
                evaluation_from_row,
            )
            .optional()
        })
    }

    fn fetch_evaluation_for(
        &self,
        intern_id: InternId,
        period: EvaluationPeriod,
    ) -> Result<Option<Evaluation>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {EVALUATION_COLUMNS} FROM evaluations \
                     WHERE intern_id = ?1 AND period = ?2"
                ),
                params![intern_id, period.as_str()],
                evaluation_from_row,
            )
            .optional()
        })
    }

    fn list_evaluations(&self, intern_id: InternId) -> Result<Vec<Evaluation>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE intern_id = ?1
                 ORDER BY CASE period WHEN 'midterm' THEN 0 ELSE 1 END"
            ))?;
            let rows = stmt.query_map([intern_id], evaluation_from_row)?;
            rows.collect()
        })
    }
}
