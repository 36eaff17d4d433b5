use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SkillError;

/// Which catalog list a browsing session walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuerySubject {
    Categories,
    Manufacturers,
    Products,
    Features,
}

impl QuerySubject {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Manufacturers => "manufacturers",
            Self::Products => "products",
            Self::Features => "features",
        }
    }
}

impl fmt::Display for QuerySubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationCommand {
    Next,
    Prev,
    MoveFirst,
    Stop,
}

impl FromStr for NavigationCommand {
    type Err = SkillError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "next" => Ok(Self::Next),
            "prev" | "previous" => Ok(Self::Prev),
            "movefirst" | "move_first" | "startover" | "start_over" => Ok(Self::MoveFirst),
            "stop" => Ok(Self::Stop),
            _ => Err(SkillError::InvalidCommand(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Category,
    Manufacturer,
    Product,
    FeatureValue,
}

/// Record field spoken when a list page is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayField {
    #[default]
    Name,
    SimpleName,
}

/// Filters narrowing a catalog query. Persisted in the session as `queryParams`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_value: Option<String>,
}

impl QueryParams {
    pub fn for_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn for_manufacturer(manufacturer: impl Into<String>) -> Self {
        Self {
            manufacturer: Some(manufacturer.into()),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A named catalog entity as returned by the query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub entity_type: EntityType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, Vec<String>>,
}

impl CatalogRecord {
    pub fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
        Self {
            entity_type,
            name: name.into(),
            simple_name: None,
            description: None,
            phone: None,
            address: None,
            category: None,
            manufacturer: None,
            features: BTreeMap::new(),
        }
    }

    /// Trimmed display value, or `None` when the field is missing or blank.
    pub fn display(&self, field: DisplayField) -> Option<&str> {
        let value = match field {
            DisplayField::Name => Some(self.name.as_str()),
            DisplayField::SimpleName => self.simple_name.as_deref(),
        }?;
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn is(&self, entity_type: EntityType) -> bool {
        self.entity_type == entity_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_aliases() {
        assert_eq!("next".parse::<NavigationCommand>().unwrap(), NavigationCommand::Next);
        assert_eq!("Previous".parse::<NavigationCommand>().unwrap(), NavigationCommand::Prev);
        assert_eq!(
            "startOver".parse::<NavigationCommand>().unwrap(),
            NavigationCommand::MoveFirst
        );
        assert_eq!(
            "moveFirst".parse::<NavigationCommand>().unwrap(),
            NavigationCommand::MoveFirst
        );
    }

    #[test]
    fn unknown_navigation_command_is_invalid() {
        let err = "sideways".parse::<NavigationCommand>().expect_err("should fail");
        assert!(matches!(err, SkillError::InvalidCommand(ref raw) if raw == "sideways"));
    }

    #[test]
    fn display_skips_blank_values() {
        let mut record = CatalogRecord::new(EntityType::Product, "  Speed Lane Slide  ");
        assert_eq!(record.display(DisplayField::Name), Some("Speed Lane Slide"));
        assert_eq!(record.display(DisplayField::SimpleName), None);

        record.simple_name = Some("   ".into());
        assert_eq!(record.display(DisplayField::SimpleName), None);
    }

    #[test]
    fn subject_serializes_in_camel_case() {
        let json = serde_json::to_string(&QuerySubject::Manufacturers).expect("json");
        assert_eq!(json, "\"manufacturers\"");
    }
}
