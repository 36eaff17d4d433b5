use std::collections::BTreeMap;

use shared::domain::NavigationCommand;

/// A recognised request with its slots already pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    GetVersion,
    Help,
    GetCategories,
    GetManufacturers,
    GetManufacturersForCategory {
        category: String,
    },
    GetCategoriesForManufacturer {
        manufacturer: String,
    },
    GetProducts {
        entity: String,
    },
    GetProductsCount {
        entity: String,
    },
    QueryProducts {
        category: String,
        manufacturer: Option<String>,
        feature: Option<String>,
        feature_value: Option<String>,
    },
    GetDetails {
        entity: Option<String>,
    },
    GetManufacturerPhone {
        manufacturer: String,
    },
    GetManufacturerAddress {
        manufacturer: String,
    },
    GetProductFeatureValues {
        feature: String,
        product: Option<String>,
    },
    GetAllProductFeatures {
        product: Option<String>,
    },
    GetFeatureValuesForCategory {
        feature: String,
        category: String,
    },
    Navigate(NavigationCommand),
    Repeat,
    /// A known intent arrived without a slot it cannot work without.
    Incomplete {
        intent: String,
        slot: &'static str,
    },
    Unknown(String),
}

struct Slots<'a>(&'a BTreeMap<String, String>);

impl Slots<'_> {
    fn get(&self, key: &str) -> Option<String> {
        let snake = key
            .chars()
            .flat_map(|c| {
                let lower = c.to_ascii_lowercase();
                c.is_ascii_uppercase()
                    .then_some('_')
                    .into_iter()
                    .chain(std::iter::once(lower))
            })
            .collect::<String>();
        self.0
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key) || name.as_str() == snake)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

impl Intent {
    pub fn parse(name: &str, slots: &BTreeMap<String, String>) -> Self {
        let slots = Slots(slots);
        let name = name.trim();
        let incomplete = |slot: &'static str| Self::Incomplete {
            intent: name.to_string(),
            slot,
        };

        macro_rules! require {
            ($slot:literal) => {
                match slots.get($slot) {
                    Some(value) => value,
                    None => return incomplete($slot),
                }
            };
        }

        let product_feature = |feature: &str| Self::GetProductFeatureValues {
            feature: feature.to_string(),
            product: slots.get("product"),
        };

        match name {
            "GetVersionIntent" => Self::GetVersion,
            "HelpIntent" | "AMAZON.HelpIntent" => Self::Help,
            "GetCategoriesIntent" => Self::GetCategories,
            "GetManufacturersIntent" => Self::GetManufacturers,
            "GetManufacturersForCategoryIntent" => Self::GetManufacturersForCategory {
                category: require!("category"),
            },
            "GetCategoriesForManufacturerIntent" => Self::GetCategoriesForManufacturer {
                manufacturer: require!("manufacturer"),
            },
            "GetProductsIntent" => Self::GetProducts {
                entity: require!("entity"),
            },
            "GetProductsCountIntent" => Self::GetProductsCount {
                entity: require!("entity"),
            },
            "QueryProductsIntent" | "QueryProductByFeatureIntent" | "QueryProductByMfgFeatureIntent" => {
                Self::QueryProducts {
                    category: require!("category"),
                    manufacturer: slots.get("manufacturer"),
                    feature: slots.get("feature").map(|f| canonical_feature(&f)),
                    feature_value: slots.get("featureValue"),
                }
            }
            "GetDetailsIntent" => Self::GetDetails {
                entity: slots.get("entity"),
            },
            "GetManufacturerPhoneIntent" => Self::GetManufacturerPhone {
                manufacturer: require!("manufacturer"),
            },
            "GetManufacturerAddressIntent" => Self::GetManufacturerAddress {
                manufacturer: require!("manufacturer"),
            },
            "GetProductFeatureValuesIntent" => {
                let feature = require!("feature");
                product_feature(&canonical_feature(&feature))
            }
            "GetProductFinishesIntent" => product_feature("finish"),
            "GetProductHeightsIntent" => product_feature("height"),
            "GetProductWidthsIntent" => product_feature("width"),
            "GetAllProductFeaturesIntent" => Self::GetAllProductFeatures {
                product: slots.get("product"),
            },
            "GetFeatureValuesForCategoryIntent" => Self::GetFeatureValuesForCategory {
                feature: canonical_feature(&require!("feature")),
                category: require!("category"),
            },
            "GetFinishesForCategoryIntent" => Self::GetFeatureValuesForCategory {
                feature: "finish".into(),
                category: require!("category"),
            },
            "GetHeightsForCategoryIntent" => Self::GetFeatureValuesForCategory {
                feature: "height".into(),
                category: require!("category"),
            },
            "GetWidthsForCategoryIntent" => Self::GetFeatureValuesForCategory {
                feature: "width".into(),
                category: require!("category"),
            },
            "MoveNextIntent" | "AMAZON.NextIntent" => Self::Navigate(NavigationCommand::Next),
            "MovePrevIntent" | "AMAZON.PreviousIntent" => Self::Navigate(NavigationCommand::Prev),
            "MoveFirstIntent" | "AMAZON.StartOverIntent" => {
                Self::Navigate(NavigationCommand::MoveFirst)
            }
            "StopNavIntent" | "AMAZON.StopIntent" | "AMAZON.CancelIntent" => {
                Self::Navigate(NavigationCommand::Stop)
            }
            "RepeatIntent" | "AMAZON.RepeatIntent" => Self::Repeat,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Maps spoken feature names onto the singular names the catalog stores.
pub fn canonical_feature(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mapped = match lower.as_str() {
        "finishes" => "finish",
        "colors" | "colours" | "colour" => "color",
        "heights" => "height",
        "widths" => "width",
        "lengths" => "length",
        "depths" => "depth",
        "sizes" => "size",
        _ => return lower,
    };
    mapped.to_string()
}

/// Words that point back at whatever the user is currently looking at.
pub fn is_pronoun(name: &str) -> bool {
    matches!(
        name.trim().to_lowercase().as_str(),
        "it" | "that" | "that one" | "this" | "this one"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_navigation_aliases() {
        let none = BTreeMap::new();
        assert_eq!(
            Intent::parse("AMAZON.NextIntent", &none),
            Intent::Navigate(NavigationCommand::Next)
        );
        assert_eq!(
            Intent::parse("MoveFirstIntent", &none),
            Intent::Navigate(NavigationCommand::MoveFirst)
        );
        assert_eq!(
            Intent::parse("AMAZON.CancelIntent", &none),
            Intent::Navigate(NavigationCommand::Stop)
        );
    }

    #[test]
    fn reads_slots_in_either_case_style() {
        let intent = Intent::parse(
            "QueryProductByMfgFeatureIntent",
            &slots(&[
                ("category", "Dishwashers"),
                ("manufacturer", " Kenmore "),
                ("feature", "Finishes"),
                ("feature_value", "Stainless Steel"),
            ]),
        );
        assert_eq!(
            intent,
            Intent::QueryProducts {
                category: "Dishwashers".into(),
                manufacturer: Some("Kenmore".into()),
                feature: Some("finish".into()),
                feature_value: Some("Stainless Steel".into()),
            }
        );
    }

    #[test]
    fn missing_required_slot_is_incomplete() {
        let intent = Intent::parse("GetProductsIntent", &slots(&[("entity", "  ")]));
        assert_eq!(
            intent,
            Intent::Incomplete {
                intent: "GetProductsIntent".into(),
                slot: "entity",
            }
        );
    }

    #[test]
    fn fixed_feature_intents_fill_the_feature() {
        let intent = Intent::parse("GetProductHeightsIntent", &slots(&[("product", "it")]));
        assert_eq!(
            intent,
            Intent::GetProductFeatureValues {
                feature: "height".into(),
                product: Some("it".into()),
            }
        );
    }

    #[test]
    fn unknown_names_are_kept() {
        assert_eq!(
            Intent::parse("FreeText", &BTreeMap::new()),
            Intent::Unknown("FreeText".into())
        );
    }

    #[test]
    fn pronouns_and_feature_synonyms() {
        assert!(is_pronoun("That One"));
        assert!(!is_pronoun("Tournex"));
        assert_eq!(canonical_feature(" Colours "), "color");
        assert_eq!(canonical_feature("Paint Type"), "paint type");
    }
}
