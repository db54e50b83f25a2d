//! Hiring interview service: managers publish positions with weighted
//! questions, candidates complete interviews, and managers score and finalize
//! the resulting applications.
//!
//! The crate is organized around the `workflows::hiring` module, which owns
//! the domain model, the evaluation and finalization engine, and the analytics
//! aggregations. Persistence and outbound notifications are behind traits so
//! the service can be exercised against in-memory doubles.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
