/// In-memory project collection with validation.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{LedgerError, Result, positive};
use crate::types::{NewProject, Project, ProjectPatch};

#[derive(Clone, Debug, Default)]
pub struct ProjectStore {
    projects: Vec<Project>,
}

impl ProjectStore {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    pub fn all(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn first(&self) -> Option<&Project> {
        self.projects.first()
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Validates and appends a new project.
    pub fn create(&mut self, new: NewProject, now: DateTime<Utc>) -> Result<Project> {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: validated_name(&new.name)?,
            target_amount: positive("target amount", new.target_amount)?,
            palier_value: positive("palier value", new.palier_value)?,
            color: new.color,
            image_url: None,
            images: Vec::new(),
            deadline: new.deadline,
            created_at: now,
        };
        self.projects.push(project.clone());
        Ok(project)
    }

    /// Merges `patch` into the matching project. `Ok(None)` when no project has this id.
    ///
    /// Every field is validated before anything is written, so a rejected
    /// patch leaves the project untouched.
    pub fn update(&mut self, id: &str, patch: ProjectPatch) -> Result<Option<Project>> {
        let name = patch.name.as_deref().map(validated_name).transpose()?;
        let target_amount = patch
            .target_amount
            .map(|value| positive("target amount", value))
            .transpose()?;
        let palier_value = patch
            .palier_value
            .map(|value| positive("palier value", value))
            .transpose()?;

        let Some(project) = self.projects.iter_mut().find(|project| project.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            project.name = name;
        }
        if let Some(target_amount) = target_amount {
            project.target_amount = target_amount;
        }
        if let Some(palier_value) = palier_value {
            project.palier_value = palier_value;
        }
        if let Some(color) = patch.color {
            project.color = color;
        }
        if let Some(image_url) = patch.image_url {
            project.image_url = image_url;
        }
        if let Some(images) = patch.images {
            project.images = images;
        }
        if let Some(deadline) = patch.deadline {
            project.deadline = deadline;
        }
        Ok(Some(project.clone()))
    }

    /// Removes a project unless it is the last one left.
    pub fn remove(&mut self, id: &str) -> Option<Project> {
        if self.projects.len() <= 1 {
            return None;
        }
        let index = self.projects.iter().position(|project| project.id == id)?;
        Some(self.projects.remove(index))
    }
}

fn validated_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ProjectColor;

    fn store_with_starter() -> ProjectStore {
        ProjectStore::new(vec![Project::starter()])
    }

    #[test]
    fn create_appends_with_fresh_id() {
        let mut store = store_with_starter();
        let now = Utc::now();
        let car = store
            .create(NewProject::new("  Car ", 5000.0, ProjectColor::Red), now)
            .unwrap();
        assert_eq!(car.name, "Car");
        assert_eq!(car.palier_value, 15.0);
        assert_eq!(car.created_at, now);
        assert_ne!(car.id, "default");
        assert_eq!(store.len(), 2);
        assert_eq!(store.all()[1], car);
    }

    #[test]
    fn create_rejects_bad_input() {
        let mut store = store_with_starter();
        let now = Utc::now();
        assert!(matches!(
            store.create(NewProject::new("   ", 10.0, ProjectColor::Blue), now),
            Err(LedgerError::EmptyName)
        ));
        assert!(matches!(
            store.create(NewProject::new("Trip", 0.0, ProjectColor::Blue), now),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            store.create(
                NewProject::new("Trip", 100.0, ProjectColor::Blue).palier(f64::NAN),
                now
            ),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut store = store_with_starter();
        let updated = store
            .update(
                "default",
                ProjectPatch {
                    target_amount: Some(12_000.0),
                    color: Some(ProjectColor::Green),
                    ..ProjectPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Rolex");
        assert_eq!(updated.target_amount, 12_000.0);
        assert_eq!(updated.color, ProjectColor::Green);
    }

    #[test]
    fn update_can_clear_deadline_and_image() {
        let mut store = store_with_starter();
        let set = ProjectPatch {
            image_url: Some(Some("watch.png".into())),
            deadline: Some(Some("2030-01-01".parse().unwrap())),
            ..ProjectPatch::default()
        };
        store.update("default", set).unwrap();
        assert_eq!(store.all()[0].image_url.as_deref(), Some("watch.png"));

        let clear = ProjectPatch {
            image_url: Some(None),
            deadline: Some(None),
            ..ProjectPatch::default()
        };
        let cleared = store.update("default", clear).unwrap().unwrap();
        assert_eq!(cleared.image_url, None);
        assert_eq!(cleared.deadline, None);
    }

    #[test]
    fn rejected_update_changes_nothing() {
        let mut store = store_with_starter();
        let patch = ProjectPatch {
            name: Some("Renamed".into()),
            palier_value: Some(-1.0),
            ..ProjectPatch::default()
        };
        assert!(store.update("default", patch).is_err());
        assert_eq!(store.all()[0].name, "Rolex");
    }

    #[test]
    fn update_of_unknown_id_is_noop() {
        let mut store = store_with_starter();
        let patch = ProjectPatch {
            name: Some("Renamed".into()),
            ..ProjectPatch::default()
        };
        assert_eq!(store.update("missing", patch).unwrap(), None);
    }

    #[test]
    fn last_project_cannot_be_removed() {
        let mut store = store_with_starter();
        assert_eq!(store.remove("default"), None);
        assert_eq!(store.len(), 1);
    }
}
