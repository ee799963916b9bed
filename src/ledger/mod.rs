//! The ledger: projects, their deposits and the active project selection.
//!
//! Every operation is a synchronous read-modify-write cycle. A change is
//! made on a copy of the in-memory collections and only swapped in once the
//! write to the key-value store succeeded. Changes that touch more than one
//! key are written in a single transaction, so a cascading delete can never
//! leave orphaned deposits behind.
mod deposits;
mod projects;

use chrono::{DateTime, Local, NaiveDate, SubsecRound, Utc};
use rusqlite::Connection;

use deposits::DepositStore;
use projects::ProjectStore;

use crate::color::ProjectColor;
use crate::db::{self, Batch};
use crate::error::{LedgerError, Result};
use crate::stats::ProjectSummary;
use crate::types::{Deposit, LegacyDeposit, NewProject, Project, ProjectId, ProjectPatch};

/// Names of the entries the ledger persists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub projects: String,
    pub deposits: String,
    pub active_project: String,
    /// Deposit list of the single-project layout, imported once.
    pub legacy_deposits: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            projects: "mydream_projects".to_string(),
            deposits: "mydream_all_deposits".to_string(),
            active_project: "mydream_active_project".to_string(),
            legacy_deposits: "mydream_deposits".to_string(),
        }
    }
}

type ThemeHook = Box<dyn Fn(ProjectColor)>;

pub struct Ledger {
    conn: Connection,
    keys: StorageKeys,
    projects: ProjectStore,
    deposits: DepositStore,
    active_id: ProjectId,
    theme_hook: Option<ThemeHook>,
}

impl Ledger {
    /// Loads the ledger from `conn`, creating the starter project on first run.
    pub fn open(conn: Connection, keys: StorageKeys) -> Result<Self> {
        let stored_projects: Vec<Project> = db::load(&keys.projects, Vec::new(), &conn);
        let mut ledger = Self {
            conn,
            keys,
            projects: ProjectStore::default(),
            deposits: DepositStore::default(),
            active_id: ProjectId::new(),
            theme_hook: None,
        };

        if stored_projects.is_empty() {
            let starter = Project::starter();
            ledger.active_id = starter.id.clone();
            ledger.projects = ProjectStore::new(vec![starter]);
            Batch::new()
                .put(&ledger.keys.projects, ledger.projects.all())?
                .put(&ledger.keys.active_project, &ledger.active_id)?
                .commit(&ledger.conn)?;
            tracing::info!("created starter project");
        } else {
            let stored_deposits: Vec<Deposit> =
                db::load(&ledger.keys.deposits, Vec::new(), &ledger.conn);
            let stored_active: String =
                db::load(&ledger.keys.active_project, String::new(), &ledger.conn);
            ledger.projects = ProjectStore::new(stored_projects);
            ledger.deposits = DepositStore::new(stored_deposits);
            ledger.active_id = if ledger.projects.contains(&stored_active) {
                stored_active
            } else {
                ledger
                    .projects
                    .first()
                    .map(|project| project.id.clone())
                    .unwrap_or_default()
            };
        }

        ledger.import_legacy_deposits()?;
        tracing::debug!(
            "loaded {} projects and {} deposits, active '{}'",
            ledger.projects.len(),
            ledger.deposits.all().len(),
            ledger.active_id
        );
        Ok(ledger)
    }

    /// Moves deposits of the single-project layout onto the first project.
    fn import_legacy_deposits(&mut self) -> Result<()> {
        let legacy: Vec<LegacyDeposit> =
            db::load(&self.keys.legacy_deposits, Vec::new(), &self.conn);
        if legacy.is_empty() || !self.deposits.is_empty() {
            return Ok(());
        }
        let Some(owner) = self.projects.first().map(|project| project.id.clone()) else {
            return Ok(());
        };
        let count = legacy.len();
        self.deposits = DepositStore::new(
            legacy
                .into_iter()
                .map(|deposit| deposit.into_deposit(&owner))
                .collect(),
        );
        Batch::new()
            .put(&self.keys.deposits, self.deposits.all())?
            .delete(&self.keys.legacy_deposits)
            .commit(&self.conn)?;
        tracing::info!("imported {count} legacy deposits into project '{owner}'");
        Ok(())
    }

    /// Registers the callback that applies a project's theme color.
    ///
    /// It runs immediately for the current active project, then whenever the
    /// active project or its color changes.
    pub fn on_theme_change(&mut self, hook: impl Fn(ProjectColor) + 'static) {
        self.theme_hook = Some(Box::new(hook));
        self.notify_theme();
    }

    fn notify_theme(&self) {
        if let (Some(hook), Some(project)) = (&self.theme_hook, self.active_project()) {
            hook(project.color);
        }
    }

    pub fn projects(&self) -> &[Project] {
        self.projects.all()
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn active_project_id(&self) -> &str {
        &self.active_id
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.projects
            .get(&self.active_id)
            .or_else(|| self.projects.first())
    }

    fn require_project(&self, id: &str) -> Result<&Project> {
        self.projects
            .get(id)
            .ok_or_else(|| LedgerError::ProjectNotFound(id.to_string()))
    }

    pub fn create_project(&mut self, new: NewProject) -> Result<Project> {
        let mut projects = self.projects.clone();
        let project = projects.create(new, Utc::now().trunc_subsecs(3))?;
        db::save(&self.keys.projects, projects.all(), &self.conn)?;
        self.projects = projects;
        tracing::info!("created project '{}' ({})", project.name, project.id);
        Ok(project)
    }

    /// Applies `patch` to a project. `Ok(None)` when the id is unknown.
    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> Result<Option<Project>> {
        let recolored = patch.color.is_some();
        let mut projects = self.projects.clone();
        let Some(updated) = projects.update(id, patch)? else {
            tracing::debug!("update ignored, no project '{id}'");
            return Ok(None);
        };
        db::save(&self.keys.projects, projects.all(), &self.conn)?;
        self.projects = projects;
        tracing::info!("updated project '{}'", updated.id);
        if recolored && updated.id == self.active_id {
            self.notify_theme();
        }
        Ok(Some(updated))
    }

    /// Deletes a project together with its deposits.
    ///
    /// Returns `Ok(false)` without touching anything when the id is unknown
    /// or the project is the last one left. If the active project is deleted,
    /// the first remaining project becomes active.
    pub fn delete_project(&mut self, id: &str) -> Result<bool> {
        let mut projects = self.projects.clone();
        let Some(removed) = projects.remove(id) else {
            tracing::debug!("delete ignored for '{id}'");
            return Ok(false);
        };
        let mut deposits = self.deposits.clone();
        let dropped = deposits.remove_by_project(&removed.id);
        let mut batch = Batch::new()
            .put(&self.keys.projects, projects.all())?
            .put(&self.keys.deposits, deposits.all())?;

        let was_active = self.active_id == removed.id;
        let mut active_id = self.active_id.clone();
        if was_active {
            if let Some(first) = projects.first() {
                active_id = first.id.clone();
            }
            batch = batch.put(&self.keys.active_project, &active_id)?;
        }
        batch.commit(&self.conn)?;
        self.projects = projects;
        self.deposits = deposits;
        self.active_id = active_id;

        tracing::info!(
            "deleted project '{}' and {dropped} of its deposits",
            removed.id
        );
        if was_active {
            self.notify_theme();
        }
        Ok(true)
    }

    pub fn switch_active(&mut self, id: &str) -> Result<()> {
        self.require_project(id)?;
        db::save(&self.keys.active_project, id, &self.conn)?;
        self.active_id = id.to_string();
        tracing::info!("switched active project to '{id}'");
        self.notify_theme();
        Ok(())
    }

    /// Removes every deposit of a project, keeping the project itself.
    pub fn reset_project(&mut self, id: &str) -> Result<usize> {
        self.require_project(id)?;
        let mut deposits = self.deposits.clone();
        let dropped = deposits.remove_by_project(id);
        if dropped > 0 {
            db::save(&self.keys.deposits, deposits.all(), &self.conn)?;
            self.deposits = deposits;
        }
        tracing::info!("reset project '{id}', {dropped} deposits removed");
        Ok(dropped)
    }

    pub fn add_deposit(&mut self, project_id: &str, amount: f64) -> Result<Deposit> {
        self.record_deposit(project_id, amount, Local::now())
    }

    /// Adds `count` milestones worth of the project's palier value.
    pub fn add_milestones(&mut self, project_id: &str, count: u32) -> Result<Deposit> {
        if count == 0 {
            return Err(LedgerError::InvalidMilestoneCount);
        }
        let palier = self.require_project(project_id)?.palier_value;
        self.add_deposit(project_id, palier * f64::from(count))
    }

    fn record_deposit(
        &mut self,
        project_id: &str,
        amount: f64,
        at: DateTime<Local>,
    ) -> Result<Deposit> {
        self.require_project(project_id)?;
        let mut deposits = self.deposits.clone();
        let deposit = deposits.add(project_id, amount, at)?;
        db::save(&self.keys.deposits, deposits.all(), &self.conn)?;
        self.deposits = deposits;
        tracing::info!(
            "added deposit {} of {} to '{project_id}'",
            deposit.id,
            deposit.amount
        );
        Ok(deposit)
    }

    /// Removes any deposit by id, seed deposits included.
    pub fn remove_deposit(&mut self, deposit_id: &str) -> Result<Option<Deposit>> {
        let mut deposits = self.deposits.clone();
        let Some(removed) = deposits.remove(deposit_id) else {
            return Ok(None);
        };
        db::save(&self.keys.deposits, deposits.all(), &self.conn)?;
        self.deposits = deposits;
        tracing::info!("removed deposit {deposit_id} from '{}'", removed.project_id);
        Ok(Some(removed))
    }

    /// Takes back the most recent deposit of a project.
    /// A seed deposit is never undone this way.
    pub fn undo_last_deposit(&mut self, project_id: &str) -> Result<Option<Deposit>> {
        let Some(latest) = self.deposits.latest(project_id) else {
            return Ok(None);
        };
        if latest.is_seed {
            tracing::debug!("latest deposit of '{project_id}' is a seed, nothing to undo");
            return Ok(None);
        }
        let id = latest.id.clone();
        self.remove_deposit(&id)
    }

    pub fn all_deposits(&self) -> &[Deposit] {
        self.deposits.all()
    }

    pub fn deposits_for(&self, project_id: &str) -> Vec<&Deposit> {
        self.deposits.list_by_project(project_id)
    }

    pub fn recent_deposits(&self, project_id: &str, count: usize) -> Vec<&Deposit> {
        self.deposits.recent(project_id, count)
    }

    pub fn has_deposited_on(&self, project_id: &str, day: NaiveDate) -> bool {
        self.deposits.has_deposit_on(project_id, day)
    }

    pub fn summary(&self, project_id: &str) -> Option<ProjectSummary> {
        let project = self.projects.get(project_id)?;
        Some(ProjectSummary::compute(
            project,
            self.deposits.list_by_project(project_id),
        ))
    }

    #[cfg(test)]
    fn into_connection(self) -> Connection {
        self.conn
    }
}
