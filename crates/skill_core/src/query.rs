use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{CatalogRecord, EntityType, QueryParams, QuerySubject};
use storage::Storage;

/// Ordered catalog records for a subject and optional filter.
#[async_trait]
pub trait QuerySource: Send + Sync {
    async fn run_query(
        &self,
        subject: QuerySubject,
        params: Option<&QueryParams>,
    ) -> Result<Vec<CatalogRecord>>;

    /// Category, manufacturer or product with this name, searched in that order.
    async fn find_entity(&self, name: &str) -> Result<Option<CatalogRecord>>;

    async fn find_one(&self, subject: QuerySubject, name: &str) -> Result<Option<CatalogRecord>> {
        let params = QueryParams::named(name);
        Ok(self
            .run_query(subject, Some(&params))
            .await?
            .into_iter()
            .next())
    }
}

#[async_trait]
impl QuerySource for Storage {
    async fn run_query(
        &self,
        subject: QuerySubject,
        params: Option<&QueryParams>,
    ) -> Result<Vec<CatalogRecord>> {
        let empty = QueryParams::default();
        let params = params.unwrap_or(&empty);

        match subject {
            QuerySubject::Categories => {
                if let Some(manufacturer) = params.manufacturer.as_deref() {
                    self.categories_for_manufacturer(manufacturer).await
                } else if let Some(name) = params.name.as_deref() {
                    Ok(self.find_category(name).await?.into_iter().collect())
                } else {
                    self.list_categories().await
                }
            }
            QuerySubject::Manufacturers => {
                if let Some(category) = params.category.as_deref() {
                    self.manufacturers_for_category(category).await
                } else if let Some(name) = params.name.as_deref() {
                    Ok(self.find_manufacturer(name).await?.into_iter().collect())
                } else {
                    self.list_manufacturers().await
                }
            }
            QuerySubject::Products => {
                if let Some(name) = params.name.as_deref() {
                    return Ok(self.find_product(name).await?.into_iter().collect());
                }
                let products = self
                    .list_products(params.category.as_deref(), params.manufacturer.as_deref())
                    .await?;
                Ok(filter_by_feature(products, params))
            }
            QuerySubject::Features => {
                let (Some(category), Some(feature)) =
                    (params.category.as_deref(), params.feature.as_deref())
                else {
                    return Ok(Vec::new());
                };
                Ok(self
                    .feature_values_for_category(category, feature)
                    .await?
                    .into_iter()
                    .map(|value| CatalogRecord::new(EntityType::FeatureValue, value))
                    .collect())
            }
        }
    }

    async fn find_entity(&self, name: &str) -> Result<Option<CatalogRecord>> {
        self.find_entity_by_name(name).await
    }
}

/// Keeps products that list `feature`, and when a value is given, list that
/// value for it. Both comparisons ignore case and surrounding whitespace.
pub fn filter_by_feature(products: Vec<CatalogRecord>, params: &QueryParams) -> Vec<CatalogRecord> {
    let Some(feature) = params.feature.as_deref().map(str::trim) else {
        return products;
    };
    let wanted = params.feature_value.as_deref().map(str::trim);

    products
        .into_iter()
        .filter(|product| {
            product
                .features
                .iter()
                .filter(|(name, _)| name.trim().eq_ignore_ascii_case(feature))
                .any(|(_, values)| match wanted {
                    Some(wanted) => values
                        .iter()
                        .any(|value| value.trim().eq_ignore_ascii_case(wanted)),
                    None => !values.is_empty(),
                })
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
