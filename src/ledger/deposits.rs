/// In-memory deposit collection.
use chrono::{DateTime, Local, NaiveDate, SubsecRound, Utc};
use uuid::Uuid;

use crate::error::{Result, positive};
use crate::types::Deposit;

#[derive(Clone, Debug, Default)]
pub struct DepositStore {
    deposits: Vec<Deposit>,
}

impl DepositStore {
    pub fn new(deposits: Vec<Deposit>) -> Self {
        Self { deposits }
    }

    pub fn all(&self) -> &[Deposit] {
        &self.deposits
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty()
    }

    /// Records a deposit made at `at`, dated with its local calendar day.
    pub fn add(&mut self, project_id: &str, amount: f64, at: DateTime<Local>) -> Result<Deposit> {
        let deposit = Deposit {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            amount: positive("deposit amount", amount)?,
            date: at.date_naive(),
            // persisted with millisecond precision
            timestamp: at.with_timezone(&Utc).trunc_subsecs(3),
            is_seed: false,
        };
        self.deposits.push(deposit.clone());
        Ok(deposit)
    }

    pub fn remove(&mut self, id: &str) -> Option<Deposit> {
        let index = self.deposits.iter().position(|deposit| deposit.id == id)?;
        Some(self.deposits.remove(index))
    }

    /// Drops every deposit of a project and returns how many were removed.
    pub fn remove_by_project(&mut self, project_id: &str) -> usize {
        let before = self.deposits.len();
        self.deposits
            .retain(|deposit| deposit.project_id != project_id);
        before - self.deposits.len()
    }

    pub fn list_by_project(&self, project_id: &str) -> Vec<&Deposit> {
        self.deposits
            .iter()
            .filter(|deposit| deposit.project_id == project_id)
            .collect()
    }

    /// The `count` newest deposits of a project, newest first.
    /// Deposits sharing a timestamp are ordered by insertion, latest first.
    pub fn recent(&self, project_id: &str, count: usize) -> Vec<&Deposit> {
        let mut matching: Vec<(usize, &Deposit)> = self
            .deposits
            .iter()
            .enumerate()
            .filter(|(_, deposit)| deposit.project_id == project_id)
            .collect();
        matching.sort_by(|(a_index, a), (b_index, b)| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b_index.cmp(a_index))
        });
        matching
            .into_iter()
            .take(count)
            .map(|(_, deposit)| deposit)
            .collect()
    }

    pub fn latest(&self, project_id: &str) -> Option<&Deposit> {
        self.recent(project_id, 1).into_iter().next()
    }

    pub fn has_deposit_on(&self, project_id: &str, day: NaiveDate) -> bool {
        self.deposits
            .iter()
            .any(|deposit| deposit.project_id == project_id && deposit.date == day)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::error::LedgerError;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn add_stamps_date_and_timestamp() {
        let mut store = DepositStore::default();
        let moment = at(10);
        let deposit = store.add("p", 30.0, moment).unwrap();
        assert_eq!(deposit.date, moment.date_naive());
        assert_eq!(deposit.timestamp, moment.with_timezone(&Utc));
        assert!(!deposit.is_seed);
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn add_rejects_non_positive_amounts() {
        let mut store = DepositStore::default();
        for amount in [0.0, -5.0, f64::INFINITY] {
            assert!(matches!(
                store.add("p", amount, at(10)),
                Err(LedgerError::InvalidAmount(_))
            ));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn recent_orders_newest_first_and_limits() {
        let mut store = DepositStore::default();
        store.add("p", 1.0, at(9)).unwrap();
        store.add("p", 3.0, at(11)).unwrap();
        store.add("q", 7.0, at(12)).unwrap();
        store.add("p", 2.0, at(10)).unwrap();

        let amounts: Vec<f64> = store.recent("p", 2).iter().map(|d| d.amount).collect();
        assert_eq!(amounts, vec![3.0, 2.0]);

        let all: Vec<f64> = store.recent("p", 50).iter().map(|d| d.amount).collect();
        assert_eq!(all, vec![3.0, 2.0, 1.0]);
        assert!(store.recent("p", 0).is_empty());
    }

    #[test]
    fn same_timestamp_prefers_later_insertion() {
        let mut store = DepositStore::default();
        let first = store.add("p", 1.0, at(9)).unwrap();
        let second = store.add("p", 2.0, at(9)).unwrap();
        assert_eq!(store.latest("p").map(|d| d.id.clone()), Some(second.id));
        assert_ne!(first.id, store.latest("p").unwrap().id);
    }

    #[test]
    fn remove_by_project_keeps_others() {
        let mut store = DepositStore::default();
        store.add("p", 1.0, at(9)).unwrap();
        store.add("q", 2.0, at(9)).unwrap();
        store.add("p", 3.0, at(9) + Duration::minutes(5)).unwrap();
        assert_eq!(store.remove_by_project("p"), 2);
        assert_eq!(store.list_by_project("q").len(), 1);
        assert!(store.list_by_project("p").is_empty());
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut store = DepositStore::default();
        store.add("p", 1.0, at(9)).unwrap();
        assert_eq!(store.remove("nope"), None);
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn has_deposit_on_checks_project_and_day() {
        let mut store = DepositStore::default();
        store.add("p", 1.0, at(9)).unwrap();
        let day = at(9).date_naive();
        assert!(store.has_deposit_on("p", day));
        assert!(!store.has_deposit_on("q", day));
        assert!(!store.has_deposit_on("p", day.succ_opt().unwrap()));
    }
}
