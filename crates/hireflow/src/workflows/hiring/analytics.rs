//! Funnel aggregations over a manager's applications.
//!
//! Every function here is pure over a snapshot of positions/applications; the
//! service gathers the manager-scoped snapshot and supplies `now` where a
//! window is involved, so results are deterministic and idempotent.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, OverallResult, Position, PositionId,
};
use super::evaluation::round2;

/// Default lookback window for trend buckets.
pub const DEFAULT_TREND_DAYS: i64 = 30;
/// Default age after which an in-progress application counts as abandoned.
pub const DEFAULT_ABANDON_HOURS: i64 = 72;

/// Counts of applications by interview status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub in_progress: usize,
    pub completed: usize,
    pub total: usize,
}

pub fn status_summary(applications: &[Application]) -> StatusSummary {
    let completed = applications
        .iter()
        .filter(|application| application.status == ApplicationStatus::Completed)
        .count();

    StatusSummary {
        in_progress: applications.len() - completed,
        completed,
        total: applications.len(),
    }
}

/// Mean time from start to completion over completed applications. Zeroed
/// when nothing has completed yet; that is a valid answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTimeSummary {
    pub completed_applications: usize,
    pub average_minutes: f64,
    pub average_hours: f64,
}

pub fn average_completion_time(applications: &[Application]) -> CompletionTimeSummary {
    let durations: Vec<Duration> = applications
        .iter()
        .filter_map(|application| {
            application
                .completed_at
                .map(|completed_at| completed_at - application.started_at)
        })
        .collect();

    if durations.is_empty() {
        return CompletionTimeSummary {
            completed_applications: 0,
            average_minutes: 0.0,
            average_hours: 0.0,
        };
    }

    let total_seconds: i64 = durations.iter().map(Duration::num_seconds).sum();
    let mean_minutes = total_seconds as f64 / 60.0 / durations.len() as f64;

    CompletionTimeSummary {
        completed_applications: durations.len(),
        average_minutes: round2(mean_minutes),
        average_hours: round2(mean_minutes / 60.0),
    }
}

/// Per-position application volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionApplications {
    pub position_id: PositionId,
    pub title: String,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

/// By-position counts plus the sums across all owned positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionBreakdown {
    pub positions: Vec<PositionApplications>,
    pub total_applications: usize,
    pub total_completed: usize,
}

pub fn applications_by_position(
    positions: &[Position],
    applications: &[Application],
) -> PositionBreakdown {
    let entries: Vec<PositionApplications> = positions
        .iter()
        .map(|position| {
            let for_position: Vec<&Application> = applications
                .iter()
                .filter(|application| application.position_id == position.id)
                .collect();
            let completed = for_position
                .iter()
                .filter(|application| application.status == ApplicationStatus::Completed)
                .count();

            PositionApplications {
                position_id: position.id.clone(),
                title: position.title.clone(),
                total: for_position.len(),
                completed,
                in_progress: for_position.len() - completed,
            }
        })
        .collect();

    let total_applications = entries.iter().map(|entry| entry.total).sum();
    let total_completed = entries.iter().map(|entry| entry.completed).sum();

    PositionBreakdown {
        positions: entries,
        total_applications,
        total_completed,
    }
}

/// Count and independently rounded integer percentage for one overall result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSlice {
    pub count: usize,
    pub percentage: u32,
}

/// Distribution over PENDING/PASSED/FAILED. The three percentages are each
/// rounded against the total on their own, so they need not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDistribution {
    pub pending: ResultSlice,
    pub passed: ResultSlice,
    pub failed: ResultSlice,
    pub total: usize,
}

fn result_slice(count: usize, total: usize) -> ResultSlice {
    let percentage = if total > 0 {
        (count as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };
    ResultSlice { count, percentage }
}

pub fn result_distribution(applications: &[Application]) -> ResultDistribution {
    let total = applications.len();
    let count_of = |result: OverallResult| {
        applications
            .iter()
            .filter(|application| application.overall_result == result)
            .count()
    };

    ResultDistribution {
        pending: result_slice(count_of(OverallResult::Pending), total),
        passed: result_slice(count_of(OverallResult::Passed), total),
        failed: result_slice(count_of(OverallResult::Failed), total),
        total,
    }
}

/// Per-position completed/total ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCompletionRatio {
    pub position_id: PositionId,
    pub title: String,
    pub total: usize,
    pub completed: usize,
    pub ratio: f64,
    pub percentage: f64,
}

/// Overall ratio computed from summed counts, not an average of the
/// per-position ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallCompletionRatio {
    pub total: usize,
    pub completed: usize,
    pub ratio: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRatioSummary {
    pub positions: Vec<PositionCompletionRatio>,
    pub overall: OverallCompletionRatio,
}

fn ratio_pair(completed: usize, total: usize) -> (f64, f64) {
    if total == 0 {
        return (0.0, 0.0);
    }
    let raw = completed as f64 / total as f64;
    (round2(raw), round2(raw * 100.0))
}

pub fn completion_ratio(
    positions: &[Position],
    applications: &[Application],
) -> CompletionRatioSummary {
    let breakdown = applications_by_position(positions, applications);

    let entries = breakdown
        .positions
        .into_iter()
        .map(|entry| {
            let (ratio, percentage) = ratio_pair(entry.completed, entry.total);
            PositionCompletionRatio {
                position_id: entry.position_id,
                title: entry.title,
                total: entry.total,
                completed: entry.completed,
                ratio,
                percentage,
            }
        })
        .collect();

    let (ratio, percentage) = ratio_pair(breakdown.total_completed, breakdown.total_applications);

    CompletionRatioSummary {
        positions: entries,
        overall: OverallCompletionRatio {
            total: breakdown.total_applications,
            completed: breakdown.total_completed,
            ratio,
            percentage,
        },
    }
}

/// Bucketing granularity for trend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    Daily,
    Weekly,
}

/// One time bucket keyed by ISO calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub period: TrendPeriod,
    pub lookback_days: i64,
    pub buckets: Vec<TrendBucket>,
}

/// Weeks start on Sunday: subtract the weekday's offset from Sunday.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Count applications by `started_at` in daily or weekly buckets over the
/// lookback window, ascending by bucket date.
pub fn trends(
    applications: &[Application],
    period: TrendPeriod,
    lookback_days: i64,
    now: DateTime<Utc>,
) -> TrendReport {
    let window_start = now - Duration::days(lookback_days);
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for application in applications {
        if application.started_at < window_start {
            continue;
        }
        let day = application.started_at.date_naive();
        let key = match period {
            TrendPeriod::Daily => day,
            TrendPeriod::Weekly => week_start(day),
        };
        *counts.entry(key).or_insert(0) += 1;
    }

    TrendReport {
        period,
        lookback_days,
        buckets: counts
            .into_iter()
            .map(|(date, count)| TrendBucket {
                date: date.to_string(),
                count,
            })
            .collect(),
    }
}

/// An in-progress application older than the caller-chosen threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedApplication {
    pub application_id: ApplicationId,
    pub position_id: PositionId,
    pub candidate_name: String,
    pub candidate_email: String,
    pub started_at: DateTime<Utc>,
    pub hours_elapsed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedReport {
    pub threshold_hours: i64,
    pub applications: Vec<AbandonedApplication>,
}

/// In-progress applications with no completion whose start is older than
/// `threshold_hours`, annotated with whole hours elapsed, newest first.
pub fn abandoned(
    applications: &[Application],
    threshold_hours: i64,
    now: DateTime<Utc>,
) -> AbandonedReport {
    let cutoff = now - Duration::hours(threshold_hours);
    let mut stale: Vec<AbandonedApplication> = applications
        .iter()
        .filter(|application| {
            application.status == ApplicationStatus::InProgress
                && application.completed_at.is_none()
                && application.started_at < cutoff
        })
        .map(|application| AbandonedApplication {
            application_id: application.id.clone(),
            position_id: application.position_id.clone(),
            candidate_name: application.candidate_name.clone(),
            candidate_email: application.candidate_email.clone(),
            started_at: application.started_at,
            hours_elapsed: (now - application.started_at).num_hours(),
        })
        .collect();

    stale.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    AbandonedReport {
        threshold_hours,
        applications: stale,
    }
}
