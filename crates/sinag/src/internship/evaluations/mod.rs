//! Supervisor evaluations at midterm and at the end of the internship.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{
    Criterion, Evaluation, EvaluationDraft, EvaluationPeriod, RatingLabel, Ratings, Score,
};
pub use repository::EvaluationRepository;
pub use router::evaluation_routes;
pub use service::EvaluationService;
