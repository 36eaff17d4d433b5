use shared::{
    domain::{CatalogRecord, EntityType, QueryParams, QuerySubject},
    error::SkillError,
    protocol::{Card, SkillRequest, SkillResponse},
    session::{SessionAttributes, SessionState},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::TemplateKey,
    fetch_records,
    intent::{is_pronoun, Intent},
    navigate_list, render_list_response, run_list_query,
    template::{join_english, Tokens},
    SkillContext,
};

type Reply = Result<SkillResponse, SkillError>;

/// Unwraps a catalog lookup or answers the turn with the general error template.
macro_rules! or_general_error {
    ($ctx:expr, $session:expr, $result:expr) => {
        match $result {
            Ok(value) => value,
            Err(error) => return general_error($ctx, $session, error),
        }
    };
}

pub async fn handle_request(
    ctx: &SkillContext,
    request: SkillRequest,
    session: Option<SessionAttributes>,
) -> Reply {
    match request {
        SkillRequest::Launch => {
            info!("session launched");
            let tokens = Tokens::new().with("version", &ctx.config.version);
            ctx.respond(TemplateKey::LaunchPrompt, &tokens, session.unwrap_or_default())
        }
        SkillRequest::SessionEnded { reason } => {
            info!(reason = reason.as_deref().unwrap_or("unspecified"), "session ended");
            Ok(SkillResponse {
                text: String::new(),
                card: Card {
                    title: String::new(),
                    content: String::new(),
                },
                reprompt: None,
                session_attributes: SessionAttributes::default(),
                should_end_session: true,
            })
        }
        SkillRequest::Intent { name, slots } => {
            let intent = Intent::parse(&name, &slots);
            debug!(?intent, "dispatching intent");
            handle_intent(ctx, intent, session).await
        }
    }
}

pub async fn handle_intent(
    ctx: &SkillContext,
    intent: Intent,
    session: Option<SessionAttributes>,
) -> Reply {
    let session = session.unwrap_or_default();
    match intent {
        Intent::Navigate(command) => navigate_list(ctx, command, Some(session)).await,
        Intent::GetVersion => {
            let tokens = Tokens::new().with("version", &ctx.config.version);
            ctx.respond_and_end(TemplateKey::GetVersion, &tokens, session)
        }
        Intent::Help => ctx.respond(TemplateKey::Help, &Tokens::new(), session),
        Intent::GetCategories => {
            run_list_query(ctx, QuerySubject::Categories, None, session).await
        }
        Intent::GetManufacturers => {
            run_list_query(ctx, QuerySubject::Manufacturers, None, session).await
        }
        Intent::GetManufacturersForCategory { category } => {
            manufacturers_for_category(ctx, &category, session).await
        }
        Intent::GetCategoriesForManufacturer { manufacturer } => {
            categories_for_manufacturer(ctx, &manufacturer, session).await
        }
        Intent::GetProducts { entity } => products_for_entity(ctx, &entity, false, session).await,
        Intent::GetProductsCount { entity } => {
            products_for_entity(ctx, &entity, true, session).await
        }
        Intent::QueryProducts {
            category,
            manufacturer,
            feature,
            feature_value,
        } => {
            let params = QueryParams {
                category: Some(category),
                manufacturer,
                name: None,
                feature,
                feature_value,
            };
            query_products(ctx, params, session).await
        }
        Intent::GetDetails { entity } => details(ctx, entity.as_deref(), session).await,
        Intent::GetManufacturerPhone { manufacturer } => {
            manufacturer_property(ctx, &manufacturer, ContactField::Phone, session).await
        }
        Intent::GetManufacturerAddress { manufacturer } => {
            manufacturer_property(ctx, &manufacturer, ContactField::Address, session).await
        }
        Intent::GetProductFeatureValues { feature, product } => {
            product_feature_values(ctx, &feature, product.as_deref(), session).await
        }
        Intent::GetAllProductFeatures { product } => {
            all_product_features(ctx, product.as_deref(), session).await
        }
        Intent::GetFeatureValuesForCategory { feature, category } => {
            feature_values_for_category(ctx, &feature, &category, session).await
        }
        Intent::Repeat => repeat(ctx, session),
        Intent::Incomplete { intent, slot } => {
            warn!(%intent, slot, "intent is missing a required slot");
            ctx.respond(TemplateKey::UnknownIntent, &Tokens::new(), session)
        }
        Intent::Unknown(name) => {
            warn!(intent = %name, "unrecognised intent");
            ctx.respond(TemplateKey::UnknownIntent, &Tokens::new(), session)
        }
    }
}

fn general_error(ctx: &SkillContext, session: SessionAttributes, source: anyhow::Error) -> Reply {
    let failure = SkillError::Catalog(format!("{source:#}"));
    error!(error = %failure, "catalog lookup failed");
    ctx.respond(TemplateKey::GeneralError, &Tokens::new(), session)
}

fn named(name: &str) -> Tokens {
    Tokens::new().with("name", name)
}

async fn manufacturers_for_category(
    ctx: &SkillContext,
    category: &str,
    session: SessionAttributes,
) -> Reply {
    let found = or_general_error!(
        ctx,
        session,
        ctx.catalog.find_one(QuerySubject::Categories, category).await
    );
    let Some(found) = found else {
        return ctx.respond(TemplateKey::CategoryNotFound, &named(category), session);
    };
    let params = QueryParams::for_category(found.name);
    run_list_query(ctx, QuerySubject::Manufacturers, Some(params), session).await
}

async fn categories_for_manufacturer(
    ctx: &SkillContext,
    manufacturer: &str,
    session: SessionAttributes,
) -> Reply {
    let found = or_general_error!(
        ctx,
        session,
        ctx.catalog
            .find_one(QuerySubject::Manufacturers, manufacturer)
            .await
    );
    let Some(found) = found else {
        return ctx.respond(TemplateKey::ManufacturerNotFound, &named(manufacturer), session);
    };
    let params = QueryParams::for_manufacturer(found.name);
    run_list_query(ctx, QuerySubject::Categories, Some(params), session).await
}

/// Products of a category or manufacturer, as a list or as a count.
async fn products_for_entity(
    ctx: &SkillContext,
    entity: &str,
    count_only: bool,
    mut session: SessionAttributes,
) -> Reply {
    let found = or_general_error!(ctx, session, ctx.catalog.find_entity(entity).await);
    let (params, count_key) = match found {
        Some(record) if record.is(EntityType::Category) => (
            QueryParams::for_category(record.name),
            TemplateKey::NumProductsForCategory,
        ),
        Some(record) if record.is(EntityType::Manufacturer) => (
            QueryParams::for_manufacturer(record.name),
            TemplateKey::NumProductsForManufacturer,
        ),
        _ => return ctx.respond(TemplateKey::EntityNotFound, &named(entity), session),
    };

    let products = fetch_records(ctx, QuerySubject::Products, Some(&params)).await;
    if products.is_empty() {
        session.record_attempt(QuerySubject::Products, Some(params));
        return ctx.respond(TemplateKey::NoProductsForEntity, &named(entity), session);
    }

    if count_only {
        let name = params
            .category
            .as_deref()
            .or(params.manufacturer.as_deref())
            .unwrap_or(entity);
        let tokens = named(name).with("count", products.len());
        return ctx.respond(count_key, &tokens, session);
    }

    render_list_response(ctx, &products, QuerySubject::Products, Some(params), session)
}

async fn query_products(
    ctx: &SkillContext,
    params: QueryParams,
    mut session: SessionAttributes,
) -> Reply {
    let category = params.category.clone().unwrap_or_default();
    let found = or_general_error!(
        ctx,
        session,
        ctx.catalog.find_one(QuerySubject::Categories, &category).await
    );
    if found.is_none() {
        return ctx.respond(TemplateKey::CategoryNotFound, &named(&category), session);
    }

    if let Some(manufacturer) = params.manufacturer.as_deref() {
        let found = or_general_error!(
            ctx,
            session,
            ctx.catalog
                .find_one(QuerySubject::Manufacturers, manufacturer)
                .await
        );
        if found.is_none() {
            return ctx.respond(TemplateKey::ManufacturerNotFound, &named(manufacturer), session);
        }
    }

    let products = fetch_records(ctx, QuerySubject::Products, Some(&params)).await;
    if products.is_empty() {
        session.record_attempt(QuerySubject::Products, Some(params));
        return ctx.respond(TemplateKey::ProductQueryNoResults, &Tokens::new(), session);
    }
    render_list_response(ctx, &products, QuerySubject::Products, Some(params), session)
}

/// The record shown first on the page the session is currently browsing.
async fn current_record(
    ctx: &SkillContext,
    session: &SessionAttributes,
) -> Option<CatalogRecord> {
    let SessionState::Browsing(browse) = session.state() else {
        return None;
    };
    let mut records = fetch_records(ctx, browse.subject, browse.params.as_ref()).await;
    if browse.start_index < records.len() {
        Some(records.swap_remove(browse.start_index))
    } else {
        records.into_iter().next()
    }
}

async fn details(ctx: &SkillContext, entity: Option<&str>, session: SessionAttributes) -> Reply {
    let record = match entity.filter(|name| !is_pronoun(name)) {
        Some(name) => or_general_error!(ctx, session, ctx.catalog.find_entity(name).await),
        None => current_record(ctx, &session).await,
    };
    let Some(record) = record else {
        let name = entity.unwrap_or("that");
        return ctx.respond(TemplateKey::EntityNotFound, &named(name), session);
    };

    let templates = &ctx.config.templates;
    let fallback = |key: TemplateKey| templates.response(key).map(|t| t.text.clone());
    let content = match record.entity_type {
        EntityType::Category => match record.description.clone() {
            Some(description) => description,
            None => fallback(TemplateKey::NoDetailsForCategory)?,
        },
        EntityType::Manufacturer => manufacturer_summary(&record),
        EntityType::Product | EntityType::FeatureValue => match record.description.clone() {
            Some(description) => description,
            None => fallback(TemplateKey::NoDetailsForProduct)?,
        },
    };

    let tokens = named(&record.name).with("content", content);
    ctx.respond(TemplateKey::Details, &tokens, session)
}

fn manufacturer_summary(record: &CatalogRecord) -> String {
    let mut parts = vec![format!("{}.", record.name.trim())];
    if let Some(phone) = &record.phone {
        parts.push(format!("phone number: {phone}."));
    }
    if let Some(address) = &record.address {
        parts.push(format!("address: {address}."));
    }
    if let Some(description) = &record.description {
        parts.push(description.clone());
    }
    parts.join(" ")
}

#[derive(Debug, Clone, Copy)]
enum ContactField {
    Phone,
    Address,
}

async fn manufacturer_property(
    ctx: &SkillContext,
    manufacturer: &str,
    field: ContactField,
    session: SessionAttributes,
) -> Reply {
    let found = or_general_error!(
        ctx,
        session,
        ctx.catalog
            .find_one(QuerySubject::Manufacturers, manufacturer)
            .await
    );
    let Some(record) = found else {
        return ctx.respond(TemplateKey::ManufacturerNotFound, &named(manufacturer), session);
    };

    let (value, found_key, missing_key) = match field {
        ContactField::Phone => (
            record.phone.as_deref(),
            TemplateKey::ManufacturerPhoneFound,
            TemplateKey::ManufacturerPhoneNotFound,
        ),
        ContactField::Address => (
            record.address.as_deref(),
            TemplateKey::ManufacturerAddressFound,
            TemplateKey::ManufacturerAddressNotFound,
        ),
    };

    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => ctx.respond(found_key, &named(&record.name).with("value", value), session),
        None => ctx.respond(missing_key, &named(&record.name), session),
    }
}

enum ProductLookup {
    Found(CatalogRecord),
    Missing(String),
}

/// Resolves a spoken product name. Pronouns and an empty slot point at the
/// product currently shown in a products list.
async fn resolve_product(
    ctx: &SkillContext,
    product: Option<&str>,
    session: &SessionAttributes,
) -> anyhow::Result<ProductLookup> {
    match product.filter(|name| !is_pronoun(name)) {
        Some(name) => Ok(match ctx.catalog.find_one(QuerySubject::Products, name).await? {
            Some(record) => ProductLookup::Found(record),
            None => ProductLookup::Missing(name.to_string()),
        }),
        None => {
            let current = match session.query_subject {
                Some(QuerySubject::Products) => current_record(ctx, session).await,
                _ => None,
            };
            Ok(match current {
                Some(record) => ProductLookup::Found(record),
                None => ProductLookup::Missing(product.unwrap_or("that").to_string()),
            })
        }
    }
}

fn feature_values<'a>(record: &'a CatalogRecord, feature: &str) -> Option<&'a [String]> {
    record
        .features
        .iter()
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(feature.trim()))
        .map(|(_, values)| values.as_slice())
        .filter(|values| !values.is_empty())
}

async fn product_feature_values(
    ctx: &SkillContext,
    feature: &str,
    product: Option<&str>,
    session: SessionAttributes,
) -> Reply {
    let lookup = resolve_product(ctx, product, &session).await;
    let lookup = or_general_error!(ctx, session, lookup);
    let record = match lookup {
        ProductLookup::Found(record) => record,
        ProductLookup::Missing(name) => {
            return ctx.respond(TemplateKey::ProductNotFound, &named(&name), session)
        }
    };

    let tokens = named(&record.name).with("feature", feature);
    match feature_values(&record, feature) {
        Some(values) => {
            let tokens = tokens.with("value", join_english(values));
            ctx.respond(TemplateKey::FeatureSupported, &tokens, session)
        }
        None => ctx.respond(TemplateKey::FeatureNotSupported, &tokens, session),
    }
}

async fn all_product_features(
    ctx: &SkillContext,
    product: Option<&str>,
    session: SessionAttributes,
) -> Reply {
    let lookup = resolve_product(ctx, product, &session).await;
    let lookup = or_general_error!(ctx, session, lookup);
    let record = match lookup {
        ProductLookup::Found(record) => record,
        ProductLookup::Missing(name) => {
            return ctx.respond(TemplateKey::ProductNotFound, &named(&name), session)
        }
    };

    let described: Vec<String> = record
        .features
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(feature, values)| format!("{feature}: {}.", join_english(values)))
        .collect();
    if described.is_empty() {
        return ctx.respond(TemplateKey::NoFeatures, &named(&record.name), session);
    }

    let tokens = named(&record.name).with("content", described.join(" "));
    ctx.respond(TemplateKey::ProductAllFeatures, &tokens, session)
}

async fn feature_values_for_category(
    ctx: &SkillContext,
    feature: &str,
    category: &str,
    mut session: SessionAttributes,
) -> Reply {
    let found = or_general_error!(
        ctx,
        session,
        ctx.catalog.find_one(QuerySubject::Categories, category).await
    );
    let Some(found) = found else {
        return ctx.respond(TemplateKey::CategoryNotFound, &named(category), session);
    };

    let params = QueryParams {
        category: Some(found.name.clone()),
        feature: Some(feature.to_string()),
        ..QueryParams::default()
    };
    let values = fetch_records(ctx, QuerySubject::Features, Some(&params)).await;
    if values.is_empty() {
        session.record_attempt(QuerySubject::Features, Some(params));
        let tokens = Tokens::new()
            .with("feature", feature)
            .with("category", &found.name);
        return ctx.respond(TemplateKey::FeatureNotSupportedByCategory, &tokens, session);
    }
    render_list_response(ctx, &values, QuerySubject::Features, Some(params), session)
}

fn repeat(ctx: &SkillContext, session: SessionAttributes) -> Reply {
    match session.text.clone().filter(|text| !text.trim().is_empty()) {
        Some(text) => ctx.respond(TemplateKey::Repeat, &Tokens::new().with("text", text), session),
        None => ctx.respond(TemplateKey::NothingToRepeat, &Tokens::new(), session),
    }
}

#[cfg(test)]
#[path = "tests/handlers_tests.rs"]
mod tests;
