use std::{collections::BTreeMap, fmt, fs, num::NonZeroUsize, path::Path, str::FromStr};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{DisplayField, QueryParams, QuerySubject},
    error::SkillError,
};

use crate::template::{render, Tokens};

pub const DEFAULT_GROUP_SIZE: usize = 5;
pub const DEFAULT_PRODUCT_GROUP_SIZE: usize = 1;

/// Speech text, card title and optional reprompt for one kind of answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTemplate {
    pub text: String,
    #[serde(default)]
    pub card: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub text: String,
    pub title: String,
    pub reprompt: Option<String>,
}

impl ResponseTemplate {
    fn new(text: &str, card: &str, reprompt: Option<&str>) -> Self {
        Self {
            text: text.to_string(),
            card: card.to_string(),
            reprompt: reprompt.map(str::to_string),
        }
    }

    pub fn render(&self, tokens: &Tokens) -> RenderedTemplate {
        RenderedTemplate {
            text: render(&self.text, tokens),
            title: render(&self.card, tokens),
            reprompt: self
                .reprompt
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .map(|r| render(r, tokens)),
        }
    }
}

/// Page template for a list. `{items}` receives the joined display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTemplate {
    pub text: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<String>,
    #[serde(default)]
    pub display_field: DisplayField,
}

impl ListTemplate {
    fn new(text: &str, title: &str, reprompt: Option<&str>) -> Self {
        Self {
            text: text.to_string(),
            title: title.to_string(),
            reprompt: reprompt.map(str::to_string),
            display_field: DisplayField::Name,
        }
    }

    fn speaking(mut self, field: DisplayField) -> Self {
        self.display_field = field;
        self
    }

    pub fn as_response(&self) -> ResponseTemplate {
        ResponseTemplate {
            text: self.text.clone(),
            card: self.title.clone(),
            reprompt: self.reprompt.clone(),
        }
    }
}

/// `initial` answers a fresh query, `single` a fresh query with one result,
/// `navigation` every page reached with next, previous or start over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTemplateSet {
    pub initial: ListTemplate,
    pub single: ListTemplate,
    pub navigation: ListTemplate,
}

macro_rules! keyed {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $key:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SkillError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|key| key.as_str() == raw.trim())
                    .ok_or_else(|| {
                        SkillError::Config(format!("unknown {} '{raw}'", stringify!($name)))
                    })
            }
        }
    };
}

keyed!(
    /// Every single-shot answer the skill can give.
    TemplateKey {
        LaunchPrompt => "launch_prompt",
        UnknownIntent => "unknown_intent",
        Help => "help",
        GetVersion => "get_version",
        NoResults => "no_results",
        GeneralError => "general_error",
        NotInList => "not_in_list",
        Goodbye => "goodbye",
        Repeat => "repeat",
        NothingToRepeat => "nothing_to_repeat",
        Details => "details",
        NoDetailsForCategory => "no_details_for_category",
        NoDetailsForManufacturer => "no_details_for_manufacturer",
        NoDetailsForProduct => "no_details_for_product",
        EntityNotFound => "entity_not_found",
        CategoryNotFound => "category_not_found",
        ManufacturerNotFound => "manufacturer_not_found",
        ProductNotFound => "product_not_found",
        ManufacturerPhoneFound => "manufacturer_phone_found",
        ManufacturerPhoneNotFound => "manufacturer_phone_not_found",
        ManufacturerAddressFound => "manufacturer_address_found",
        ManufacturerAddressNotFound => "manufacturer_address_not_found",
        NoProductsForEntity => "no_products_for_entity",
        NumProductsForCategory => "num_products_for_category",
        NumProductsForManufacturer => "num_products_for_manufacturer",
        ProductQueryNoResults => "product_query_no_results",
        FeatureSupported => "feature_supported",
        FeatureNotSupported => "feature_not_supported",
        NoFeatures => "no_features",
        ProductAllFeatures => "product_all_features",
        FeatureNotSupportedByCategory => "feature_not_supported_by_category",
    }
);

keyed!(
    /// Paginated lists, one template set each.
    ListKey {
        Categories => "categories",
        Manufacturers => "manufacturers",
        CategoriesForManufacturer => "categories_for_manufacturer",
        ManufacturersForCategory => "manufacturers_for_category",
        Products => "products",
        FeatureValues => "feature_values",
    }
);

impl ListKey {
    pub fn for_query(subject: QuerySubject, params: Option<&QueryParams>) -> Self {
        let by_manufacturer = params.is_some_and(|p| p.manufacturer.is_some());
        let by_category = params.is_some_and(|p| p.category.is_some());
        match subject {
            QuerySubject::Categories if by_manufacturer => Self::CategoriesForManufacturer,
            QuerySubject::Categories => Self::Categories,
            QuerySubject::Manufacturers if by_category => Self::ManufacturersForCategory,
            QuerySubject::Manufacturers => Self::Manufacturers,
            QuerySubject::Products => Self::Products,
            QuerySubject::Features => Self::FeatureValues,
        }
    }

    /// The value bound to `{name}` when a page of this list is rendered.
    pub fn name_token(self, params: Option<&QueryParams>) -> Option<&str> {
        let params = params?;
        match self {
            Self::CategoriesForManufacturer => params.manufacturer.as_deref(),
            Self::ManufacturersForCategory => params.category.as_deref(),
            Self::Products => params
                .category
                .as_deref()
                .or(params.manufacturer.as_deref()),
            Self::FeatureValues => params.feature.as_deref(),
            Self::Categories | Self::Manufacturers => params.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiTemplates {
    responses: BTreeMap<TemplateKey, ResponseTemplate>,
    lists: BTreeMap<ListKey, ListTemplateSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateFile {
    #[serde(default = "inherit_by_default")]
    inherit_defaults: bool,
    #[serde(default)]
    responses: BTreeMap<String, ResponseTemplate>,
    #[serde(default)]
    lists: BTreeMap<String, ListOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListOverride {
    initial: Option<ListTemplate>,
    single: Option<ListTemplate>,
    navigation: Option<ListTemplate>,
}

fn inherit_by_default() -> bool {
    true
}

impl UiTemplates {
    pub fn empty() -> Self {
        Self {
            responses: BTreeMap::new(),
            lists: BTreeMap::new(),
        }
    }

    /// Parses a template file. Keys it names replace the built-in texts;
    /// with `inherit_defaults = false` only the file's own templates exist.
    pub fn from_toml_str(raw: &str) -> Result<Self, SkillError> {
        let file: TemplateFile =
            toml::from_str(raw).map_err(|e| SkillError::Config(format!("template file: {e}")))?;

        let mut templates = if file.inherit_defaults {
            Self::default()
        } else {
            Self::empty()
        };

        for (key, template) in file.responses {
            templates.responses.insert(key.parse()?, template);
        }

        for (key, overrides) in file.lists {
            let key: ListKey = key.parse()?;
            let current = templates.lists.get(&key).cloned();
            let pick = |new: Option<ListTemplate>, old: Option<&ListTemplate>, part: &str| {
                new.or_else(|| old.cloned())
                    .ok_or_else(|| SkillError::MissingTemplate(format!("{key}.{part}")))
            };
            let set = ListTemplateSet {
                initial: pick(overrides.initial, current.as_ref().map(|s| &s.initial), "initial")?,
                single: pick(overrides.single, current.as_ref().map(|s| &s.single), "single")?,
                navigation: pick(
                    overrides.navigation,
                    current.as_ref().map(|s| &s.navigation),
                    "navigation",
                )?,
            };
            templates.lists.insert(key, set);
        }

        Ok(templates)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read templates from '{}'", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid templates in '{}'", path.display()))
    }

    pub fn response(&self, key: TemplateKey) -> Result<&ResponseTemplate, SkillError> {
        self.responses
            .get(&key)
            .ok_or_else(|| SkillError::MissingTemplate(key.to_string()))
    }

    pub fn list(&self, key: ListKey) -> Result<&ListTemplateSet, SkillError> {
        self.lists
            .get(&key)
            .ok_or_else(|| SkillError::MissingTemplate(key.to_string()))
    }

    pub fn remove_response(&mut self, key: TemplateKey) -> Option<ResponseTemplate> {
        self.responses.remove(&key)
    }

    /// Fails on the first template the skill may need but does not have.
    pub fn validate(&self) -> Result<(), SkillError> {
        for key in TemplateKey::ALL {
            self.response(*key)?;
        }
        for key in ListKey::ALL {
            let set = self.list(*key)?;
            for (part, template) in [
                ("initial", &set.initial),
                ("single", &set.single),
                ("navigation", &set.navigation),
            ] {
                if !template.text.contains("{items}") {
                    return Err(SkillError::Config(format!(
                        "list template {key}.{part} never speaks {{items}}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for UiTemplates {
    fn default() -> Self {
        use TemplateKey as K;

        let try_again = Some("Do you want to try again?");
        let responses = [
            (
                K::LaunchPrompt,
                ResponseTemplate::new(
                    "Welcome to the catalog skill version {version}. Try asking for a list of categories or manufacturers.",
                    "Try asking for a list of categories or manufacturers",
                    Some("Try asking for a list of categories."),
                ),
            ),
            (
                K::UnknownIntent,
                ResponseTemplate::new(
                    "Sorry, your request was not recognized.",
                    "Unknown Intent",
                    Some("Sorry, your request was not recognized. Want to try again?"),
                ),
            ),
            (
                K::Help,
                ResponseTemplate::new(
                    "You can ask for a list of categories, or a list of manufacturers. Navigation commands will help you to navigate through lists of results. Here are some examples: \
                     List all categories. \
                     List all manufacturers. \
                     What products are in Optical Turnstiles? \
                     How many products does Kenmore have? \
                     What finishes does 24 inch Built-In Dishwasher by Kenmore come in? \
                     What features does Speed lane Slide by Boon Edam USA support? \
                     What manufacturers have products for Optical Turnstiles? \
                     What categories does Kenmore have products for?",
                    "Help",
                    Some("Try this command: list all categories."),
                ),
            ),
            (
                K::GetVersion,
                ResponseTemplate::new("Catalog skill version {version}.", "Get Version", None),
            ),
            (
                K::NoResults,
                ResponseTemplate::new(
                    "Sorry, no results found for your query. Do you want to try that again?",
                    "No Results Found",
                    Some("Sorry, no results found for your query. Do you want to try that again?"),
                ),
            ),
            (
                K::GeneralError,
                ResponseTemplate::new(
                    "Sorry, an error has occurred.",
                    "General Error",
                    Some("Sorry, an error has occurred. Want to try again?"),
                ),
            ),
            (
                K::NotInList,
                ResponseTemplate::new(
                    "Sorry, that's not a valid command, because we're not currently navigating a list result. Do you want to try that again?",
                    "Invalid Request",
                    try_again,
                ),
            ),
            (K::Goodbye, ResponseTemplate::new("Stopping. Goodbye.", "Stop", None)),
            (K::Repeat, ResponseTemplate::new("{text}", "Repeat", None)),
            (
                K::NothingToRepeat,
                ResponseTemplate::new(
                    "Sorry, there is nothing to repeat yet.",
                    "Nothing to Repeat",
                    Some("Try asking for a list of categories."),
                ),
            ),
            (K::Details, ResponseTemplate::new("{content}", "Entity Details: {name}", None)),
            (
                K::NoDetailsForCategory,
                ResponseTemplate::new(
                    "Sorry, no details are available for this category.",
                    "No Details for Category",
                    None,
                ),
            ),
            (
                K::NoDetailsForManufacturer,
                ResponseTemplate::new(
                    "Sorry, no details are available for this manufacturer.",
                    "No Details for Manufacturer",
                    None,
                ),
            ),
            (
                K::NoDetailsForProduct,
                ResponseTemplate::new(
                    "Sorry, no details are available for this product.",
                    "No Details for Product",
                    None,
                ),
            ),
            (
                K::EntityNotFound,
                ResponseTemplate::new("Sorry, {name} could not be found.", "{name} Not Found", None),
            ),
            (
                K::CategoryNotFound,
                ResponseTemplate::new(
                    "Sorry, no category by the name {name} was found.",
                    "Category Not Found",
                    None,
                ),
            ),
            (
                K::ManufacturerNotFound,
                ResponseTemplate::new(
                    "Sorry, no manufacturer by the name {name} was found.",
                    "Manufacturer Not Found",
                    None,
                ),
            ),
            (
                K::ProductNotFound,
                ResponseTemplate::new(
                    "Sorry, no product by the name {name} was found.",
                    "Product Not Found",
                    None,
                ),
            ),
            (
                K::ManufacturerPhoneFound,
                ResponseTemplate::new(
                    "The phone number for {name} is {value}.",
                    "Phone Number for {name}",
                    None,
                ),
            ),
            (
                K::ManufacturerPhoneNotFound,
                ResponseTemplate::new(
                    "Sorry, no phone number is available for {name}.",
                    "Phone Number Not Found",
                    None,
                ),
            ),
            (
                K::ManufacturerAddressFound,
                ResponseTemplate::new(
                    "The street address for {name} is {value}.",
                    "Address for {name}",
                    None,
                ),
            ),
            (
                K::ManufacturerAddressNotFound,
                ResponseTemplate::new(
                    "Sorry, no street address is available for {name}.",
                    "Address Not Found",
                    None,
                ),
            ),
            (
                K::NoProductsForEntity,
                ResponseTemplate::new(
                    "Sorry, no products were found for {name}.",
                    "No Products Found",
                    None,
                ),
            ),
            (
                K::NumProductsForCategory,
                ResponseTemplate::new(
                    "{count} products found for {name}.",
                    "{count} products found for {name}",
                    None,
                ),
            ),
            (
                K::NumProductsForManufacturer,
                ResponseTemplate::new(
                    "{count} products found for {name}.",
                    "{count} products found for {name}",
                    None,
                ),
            ),
            (
                K::ProductQueryNoResults,
                ResponseTemplate::new(
                    "No products were found for your query.",
                    "No Results for Product Query",
                    try_again,
                ),
            ),
            (
                K::FeatureSupported,
                ResponseTemplate::new(
                    "Product {name} supports the following {feature}: {value}.",
                    "Feature Supported",
                    None,
                ),
            ),
            (
                K::FeatureNotSupported,
                ResponseTemplate::new(
                    "Sorry, the feature {feature} is not supported for product {name}.",
                    "Feature Not Supported",
                    None,
                ),
            ),
            (
                K::NoFeatures,
                ResponseTemplate::new("No features are listed for {name}.", "No Features Listed", None),
            ),
            (
                K::ProductAllFeatures,
                ResponseTemplate::new(
                    "Product {name} supports the following features: {content}",
                    "Features for {name}",
                    None,
                ),
            ),
            (
                K::FeatureNotSupportedByCategory,
                ResponseTemplate::new(
                    "Sorry, the feature {feature} is not supported by {category}.",
                    "Feature Not Supported",
                    None,
                ),
            ),
        ];

        let browse = Some("Say next, previous, start over, or stop.");
        let more = Some("Say next, or ask a different question.");
        let set = |initial: ListTemplate, single: ListTemplate, navigation: ListTemplate| {
            ListTemplateSet {
                initial,
                single,
                navigation,
            }
        };
        let lists = [
            (
                ListKey::Categories,
                set(
                    ListTemplate::new(
                        "Found {count} categories. Results {start} to {end} of {count}. {items}. Say next, or ask a different question.",
                        "Results {start} to {end} of {count}",
                        more,
                    ),
                    ListTemplate::new("Found 1 category. {items}.", "Categories", None),
                    ListTemplate::new(
                        "Categories {start} to {end} of {count}. {items}. Say next, previous, start over, or stop.",
                        "Categories {start} to {end} of {count}",
                        browse,
                    ),
                ),
            ),
            (
                ListKey::Manufacturers,
                set(
                    ListTemplate::new(
                        "Found {count} manufacturers. Results {start} to {end} of {count}. {items}. Say next to move to the next results, or ask a different question.",
                        "Results {start} to {end} of {count}",
                        more,
                    ),
                    ListTemplate::new("Found 1 manufacturer. {items}.", "Manufacturers", None),
                    ListTemplate::new(
                        "Results {start} to {end} of {count}. {items}. Say next, previous, start over, or stop.",
                        "Results {start} to {end} of {count}",
                        browse,
                    ),
                ),
            ),
            (
                ListKey::CategoriesForManufacturer,
                set(
                    ListTemplate::new(
                        "Found {count} categories for {name}. Results {start} to {end} of {count}. {items}. Say next, or ask a different question.",
                        "Categories for {name}",
                        more,
                    ),
                    ListTemplate::new("Categories for {name}: {items}.", "Categories for {name}", None),
                    ListTemplate::new(
                        "Categories for {name}, {start} to {end} of {count}. {items}. Say next, previous, start over, or stop.",
                        "Categories for {name}",
                        browse,
                    ),
                ),
            ),
            (
                ListKey::ManufacturersForCategory,
                set(
                    ListTemplate::new(
                        "Found {count} manufacturers for {name}. Results {start} to {end} of {count}. {items}. Say next, or ask a different question.",
                        "Manufacturers for {name}",
                        more,
                    ),
                    ListTemplate::new(
                        "Manufacturers for {name}: {items}.",
                        "Manufacturers for {name}",
                        None,
                    ),
                    ListTemplate::new(
                        "Manufacturers for {name}, {start} to {end} of {count}. {items}. Say next, previous, start over, or stop.",
                        "Manufacturers for {name}",
                        browse,
                    ),
                ),
            ),
            (
                ListKey::Products,
                set(
                    ListTemplate::new(
                        "Found {count} products. Result {range} of {count}. {items}. Say next to move to the next result, or ask a different question.",
                        "Result {range} of {count}",
                        Some("Say next to move to the next result, or ask a different question."),
                    ),
                    ListTemplate::new("Found 1 product. {items}.", "Products", None),
                    ListTemplate::new(
                        "Result {range} of {count}. {items}. Say next, previous, start over, or stop.",
                        "Result {range} of {count}",
                        browse,
                    )
                    .speaking(DisplayField::SimpleName),
                ),
            ),
            (
                ListKey::FeatureValues,
                set(
                    ListTemplate::new(
                        "The following values exist for {name}. Results {start} to {end} of {count}. {items}. Say next, or ask a different question.",
                        "Feature Values for {name}",
                        more,
                    ),
                    ListTemplate::new(
                        "The following values exist for {name}. {items}.",
                        "Feature Values for {name}",
                        None,
                    ),
                    ListTemplate::new(
                        "Values for {name}, {start} to {end} of {count}. {items}. Say next, previous, start over, or stop.",
                        "Feature Values for {name}",
                        browse,
                    ),
                ),
            ),
        ];

        Self {
            responses: responses.into_iter().collect(),
            lists: lists.into_iter().collect(),
        }
    }
}

/// Everything the skill reads at request time. Built once at startup.
#[derive(Debug, Clone)]
pub struct SkillConfig {
    pub version: String,
    pub group_size: NonZeroUsize,
    pub product_group_size: NonZeroUsize,
    pub templates: UiTemplates,
}

impl SkillConfig {
    pub fn new(
        version: impl Into<String>,
        group_size: usize,
        product_group_size: usize,
        templates: UiTemplates,
    ) -> Result<Self, SkillError> {
        let group_size = NonZeroUsize::new(group_size)
            .ok_or_else(|| SkillError::Config("list group size must be at least 1".into()))?;
        let product_group_size = NonZeroUsize::new(product_group_size)
            .ok_or_else(|| SkillError::Config("product group size must be at least 1".into()))?;
        templates.validate()?;
        Ok(Self {
            version: version.into(),
            group_size,
            product_group_size,
            templates,
        })
    }

    pub fn group_size_for(&self, subject: QuerySubject) -> NonZeroUsize {
        match subject {
            QuerySubject::Products => self.product_group_size,
            _ => self.group_size,
        }
    }
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            group_size: NonZeroUsize::new(DEFAULT_GROUP_SIZE).unwrap_or(NonZeroUsize::MIN),
            product_group_size: NonZeroUsize::MIN,
            templates: UiTemplates::default(),
        }
    }
}
