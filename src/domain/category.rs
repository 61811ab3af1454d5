// Expense category schemas and naming rules

use crate::db::schema::Category;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_NAME_FIELD: usize = 100;
const MAX_NAME_LENGTH: usize = 50;
const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Categories seeded for every new account
pub const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("Groceries", "Food and household items"),
    ("Transport", "Public transport, fuel, parking"),
    ("Utilities", "Electricity, water, internet"),
    ("Entertainment", "Movies, dining out, hobbies"),
    ("Healthcare", "Medical expenses and insurance"),
];

/// Validated category fields ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

pub fn default_categories() -> Vec<NewCategory> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, description)| NewCategory {
            name: name.to_string(),
            description: Some(description.to_string()),
        })
        .collect()
}

/// Body of both create and update; the name is always required
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub type CategoryCreate = CategoryInput;
pub type CategoryUpdate = CategoryInput;

impl CategoryInput {
    /// Field constraints (422), then naming rules (400)
    pub fn validate(&self) -> Result<NewCategory> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_NAME_FIELD {
            return Err(AppError::InvalidInput(format!(
                "name must be between 1 and {} characters",
                MAX_NAME_FIELD
            )));
        }

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(AppError::InvalidInput(format!(
                    "description must be at most {} characters",
                    MAX_DESCRIPTION_LENGTH
                )));
            }
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(
                "Category name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Category name cannot be longer than {} characters",
                MAX_NAME_LENGTH
            )));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(NewCategory {
            name: name.to_string(),
            description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryRead {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            user_id: category.user_id,
            name: category.name,
            description: category.description,
        }
    }
}
