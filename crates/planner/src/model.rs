use std::collections::BTreeMap;

use homeplan_shared::{Result, Weekday};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A task or a grocery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub text: String,
    pub done: bool,
    /// Creation time in unix milliseconds, only known for cloud items.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Item {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: homeplan_shared::new_id(),
            text: text.into(),
            done: false,
            created_at: None,
        }
    }
}

/// The two checklists of a household.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListKind {
    Tasks,
    Groceries,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerState {
    #[serde(default)]
    pub tasks: Vec<Item>,
    #[serde(default)]
    pub groceries: Vec<Item>,
    #[serde(default)]
    pub meals: BTreeMap<Weekday, String>,
}

impl PlannerState {
    pub fn list(&self, kind: ListKind) -> &[Item] {
        match kind {
            ListKind::Tasks => &self.tasks,
            ListKind::Groceries => &self.groceries,
        }
    }

    pub fn list_mut(&mut self, kind: ListKind) -> &mut Vec<Item> {
        match kind {
            ListKind::Tasks => &mut self.tasks,
            ListKind::Groceries => &mut self.groceries,
        }
    }

    /// Meal for `day`, empty when nothing is planned.
    pub fn meal(&self, day: Weekday) -> &str {
        self.meals.get(&day).map(String::as_str).unwrap_or_default()
    }
}

/// Trims `text` and rejects it when nothing is left.
pub fn clean_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        homeplan_shared::user!("Please enter some text first.");
    }

    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_list_kind_labels() {
        assert_eq!(ListKind::Tasks.to_string(), "tasks");
        assert_eq!(ListKind::from_str("groceries").unwrap(), ListKind::Groceries);
        assert!(ListKind::from_str("chores").is_err());
    }

    #[test]
    fn test_meal_defaults_to_empty() {
        let mut state = PlannerState::default();
        state.meals.insert(Weekday::Monday, "Pasta".to_owned());

        assert_eq!(state.meal(Weekday::Monday), "Pasta");
        assert_eq!(state.meal(Weekday::Tuesday), "");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Milk ").unwrap(), "Milk");
        assert!(clean_text("   ").unwrap_err().is_validation());
    }

    #[test]
    fn test_local_item_has_no_created_at_field() {
        let json = serde_json::to_value(Item::new("Milk")).unwrap();
        assert!(json.get("createdAt").is_none());
        assert_eq!(json["done"], false);
    }
}
