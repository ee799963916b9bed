use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::color::ProjectColor;

pub type ProjectId = String;
pub type DepositId = String;

/// Milestone size used when a project does not specify one.
pub const DEFAULT_PALIER: f64 = 15.0;

/// A savings goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub target_amount: f64,
    #[serde(default = "default_palier")]
    pub palier_value: f64,
    #[serde(default)]
    pub color: ProjectColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ProjectImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// The starter project created on first run.
    pub fn starter() -> Self {
        Self {
            id: "default".to_string(),
            name: "Rolex".to_string(),
            target_amount: 10_000.0,
            palier_value: DEFAULT_PALIER,
            color: ProjectColor::White,
            image_url: None,
            images: Vec::new(),
            deadline: None,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Favorite gallery image, then the lowest-ordered one, then the legacy single image.
    pub fn cover_image(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|image| image.is_favorite)
            .or_else(|| self.images.iter().min_by_key(|image| image.order))
            .map(|image| image.url.as_str())
            .or(self.image_url.as_deref())
    }
}

fn default_palier() -> f64 {
    DEFAULT_PALIER
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectImage {
    #[serde(default)]
    pub id: String,
    pub url: String,
    /// Position in the gallery, lowest first.
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Input for creating a project.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub target_amount: f64,
    pub color: ProjectColor,
    pub palier_value: f64,
    pub deadline: Option<NaiveDate>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, target_amount: f64, color: ProjectColor) -> Self {
        Self {
            name: name.into(),
            target_amount,
            color,
            palier_value: DEFAULT_PALIER,
            deadline: None,
        }
    }

    pub fn palier(mut self, palier_value: f64) -> Self {
        self.palier_value = palier_value;
        self
    }

    pub fn deadline(mut self, deadline: Option<NaiveDate>) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Partial update for a project. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub palier_value: Option<f64>,
    pub color: Option<ProjectColor>,
    /// `Some(None)` clears the image.
    pub image_url: Option<Option<String>>,
    pub images: Option<Vec<ProjectImage>>,
    /// `Some(None)` clears the deadline.
    pub deadline: Option<Option<NaiveDate>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single deposit recorded toward a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: DepositId,
    pub project_id: ProjectId,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_seed: bool,
}

/// Deposit shape of the single-project layout, which had no project reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDeposit {
    pub id: DepositId,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Sentinel id the legacy layout used for its synthetic starting deposit.
pub const LEGACY_SEED_ID: &str = "initial";

impl LegacyDeposit {
    pub fn into_deposit(self, project_id: &str) -> Deposit {
        Deposit {
            is_seed: self.id == LEGACY_SEED_ID,
            id: self.id,
            project_id: project_id.to_string(),
            amount: self.amount,
            date: self.date,
            timestamp: self.timestamp,
        }
    }
}
