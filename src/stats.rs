//! Derived figures computed from deposits: totals, milestone counts,
//! per-day groupings and cumulative series.
//!
//! Everything here is a pure function of its inputs. Nothing is cached, so
//! callers recompute after every mutation.
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};

use crate::types::{Deposit, Project, ProjectId};

/// Distinct days shown in the daily history.
pub const DAILY_HISTORY_DAYS: usize = 7;
/// Days covered by the deposit calendar.
pub const CALENDAR_DAYS: usize = 14;
/// Points kept in a single project's cumulative chart.
pub const CHART_POINTS: usize = 14;
/// Points kept in the portfolio chart.
pub const PORTFOLIO_POINTS: usize = 30;

pub fn total_saved<'a>(deposits: impl IntoIterator<Item = &'a Deposit>) -> f64 {
    deposits.into_iter().map(|deposit| deposit.amount).sum()
}

/// Number of milestones needed to reach the target, rounded up.
pub fn total_milestones(project: &Project) -> u64 {
    if project.palier_value <= 0.0 {
        return 0;
    }
    (project.target_amount / project.palier_value).ceil().max(0.0) as u64
}

/// Number of whole milestones covered by `saved`.
pub fn current_milestones(project: &Project, saved: f64) -> u64 {
    if project.palier_value <= 0.0 {
        return 0;
    }
    (saved / project.palier_value).floor().max(0.0) as u64
}

/// Capped at 100 once the target has been passed.
pub fn progress_percent(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (current as f64 * 100.0 / total as f64).min(100.0)
}

pub fn remaining_balance(project: &Project, saved: f64) -> f64 {
    (project.target_amount - saved).max(0.0)
}

pub fn deposit_days<'a>(deposits: impl IntoIterator<Item = &'a Deposit>) -> BTreeSet<NaiveDate> {
    deposits.into_iter().map(|deposit| deposit.date).collect()
}

/// Days left until `deadline`, never negative.
pub fn days_remaining(deadline: NaiveDate, today: NaiveDate) -> i64 {
    deadline.signed_duration_since(today).num_days().max(0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjectSummary {
    pub saved: f64,
    pub total_milestones: u64,
    pub current_milestones: u64,
    pub progress_percent: f64,
    pub remaining: f64,
}

impl ProjectSummary {
    pub fn compute<'a>(
        project: &Project,
        deposits: impl IntoIterator<Item = &'a Deposit>,
    ) -> Self {
        let saved = total_saved(deposits);
        let total = total_milestones(project);
        let current = current_milestones(project, saved);
        Self {
            saved,
            total_milestones: total,
            current_milestones: current,
            progress_percent: progress_percent(current, total),
            remaining: remaining_balance(project, saved),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub has_deposit: bool,
    pub is_today: bool,
}

/// The `span` days ending at `today`, oldest first.
pub fn calendar(days: &BTreeSet<NaiveDate>, today: NaiveDate, span: usize) -> Vec<CalendarDay> {
    (0..span as u64)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| CalendarDay {
            date,
            has_deposit: days.contains(&date),
            is_today: date == today,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub total: f64,
}

impl CumulativePoint {
    /// Share of `target` reached at this point, as a rounded percentage.
    pub fn percent_of(&self, target: f64) -> i64 {
        if target <= 0.0 {
            return 0;
        }
        (self.total / target * 100.0).round() as i64
    }
}

/// Running total per day, in the order days were first reached.
///
/// Deposits are replayed by timestamp and the last running total seen on a
/// date becomes that date's value. Only the last `window` points are kept.
pub fn cumulative_by_day<'a>(
    deposits: impl IntoIterator<Item = &'a Deposit>,
    window: usize,
) -> Vec<CumulativePoint> {
    let mut sorted: Vec<&Deposit> = deposits.into_iter().collect();
    sorted.sort_by_key(|deposit| deposit.timestamp);

    let mut points: Vec<CumulativePoint> = Vec::new();
    let mut running = 0.0;
    for deposit in sorted {
        running += deposit.amount;
        match points.iter_mut().find(|point| point.date == deposit.date) {
            Some(point) => point.total = running,
            None => points.push(CumulativePoint {
                date: deposit.date,
                total: running,
            }),
        }
    }
    keep_last(points, window)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub amount: f64,
    pub milestones: i64,
}

/// Per-day sums converted to milestones, most recent day first.
pub fn daily_history<'a>(
    deposits: impl IntoIterator<Item = &'a Deposit>,
    palier_value: f64,
    limit: usize,
) -> Vec<DailyEntry> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for deposit in deposits {
        *by_day.entry(deposit.date).or_default() += deposit.amount;
    }
    by_day
        .into_iter()
        .rev()
        .take(limit)
        .map(|(date, amount)| DailyEntry {
            date,
            amount,
            milestones: if palier_value > 0.0 {
                (amount / palier_value).round() as i64
            } else {
                0
            },
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    /// Cumulative amount per project, in project order.
    pub per_project: Vec<(ProjectId, f64)>,
    pub total: f64,
}

/// Cumulative amounts of every project over time plus their sum.
///
/// A project without a deposit on some date carries its previous cumulative
/// value forward. Deposits of projects missing from `projects` are ignored.
pub fn portfolio_series<'a>(
    projects: &[Project],
    deposits: impl IntoIterator<Item = &'a Deposit>,
    window: usize,
) -> Vec<PortfolioPoint> {
    let mut sorted: Vec<(usize, &Deposit)> = deposits
        .into_iter()
        .filter_map(|deposit| {
            projects
                .iter()
                .position(|project| project.id == deposit.project_id)
                .map(|index| (index, deposit))
        })
        .collect();
    sorted.sort_by_key(|(_, deposit)| deposit.date);

    let mut running = vec![0.0; projects.len()];
    let mut points: Vec<PortfolioPoint> = Vec::new();
    for (index, deposit) in sorted {
        running[index] += deposit.amount;
        let point = PortfolioPoint {
            date: deposit.date,
            per_project: projects
                .iter()
                .zip(&running)
                .map(|(project, value)| (project.id.clone(), *value))
                .collect(),
            total: running.iter().sum(),
        };
        match points.last_mut() {
            Some(last) if last.date == deposit.date => *last = point,
            _ => points.push(point),
        }
    }
    keep_last(points, window)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_target: f64,
    pub overall_progress: f64,
    pub total_milestones: u64,
}

pub fn portfolio_summary(projects: &[Project], deposits: &[Deposit]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    for project in projects {
        let saved = total_saved(
            deposits
                .iter()
                .filter(|deposit| deposit.project_id == project.id),
        );
        summary.total_value += saved;
        summary.total_target += project.target_amount;
        summary.total_milestones += current_milestones(project, saved);
    }
    if summary.total_target > 0.0 {
        summary.overall_progress =
            (summary.total_value / summary.total_target * 100.0).min(100.0);
    }
    summary
}

fn keep_last<T>(mut items: Vec<T>, window: usize) -> Vec<T> {
    if items.len() > window {
        items.drain(..items.len() - window);
    }
    items
}
