use anyhow::{bail, Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{CatalogRecord, EntityType};

mod seed;

pub use seed::SeedSummary;

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NewManufacturer<'a> {
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub simple_name: Option<&'a str>,
    pub category: Option<&'a str>,
    pub manufacturer: Option<&'a str>,
    pub description: Option<&'a str>,
}

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.simple_name, p.description, c.name, m.name
     FROM products p
     LEFT JOIN categories c ON c.id = p.category_id
     LEFT JOIN manufacturers m ON m.id = p.manufacturer_id";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run catalog migrations")?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_category(&self, name: &str, description: Option<&str>) -> Result<i64> {
        let rec = sqlx::query(
            "INSERT INTO categories (name, description) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET description=excluded.description
             RETURNING id",
        )
        .bind(name.trim())
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert category '{name}'"))?;
        Ok(rec.get::<i64, _>(0))
    }

    pub async fn insert_manufacturer(&self, manufacturer: &NewManufacturer<'_>) -> Result<i64> {
        let rec = sqlx::query(
            "INSERT INTO manufacturers (name, phone, address, description) VALUES (?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET phone=excluded.phone, address=excluded.address, description=excluded.description
             RETURNING id",
        )
        .bind(manufacturer.name.trim())
        .bind(manufacturer.phone)
        .bind(manufacturer.address)
        .bind(manufacturer.description)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert manufacturer '{}'", manufacturer.name))?;
        Ok(rec.get::<i64, _>(0))
    }

    pub async fn link_category_manufacturer(&self, category: &str, manufacturer: &str) -> Result<()> {
        let category_id = self.require_id("categories", category).await?;
        let manufacturer_id = self.require_id("manufacturers", manufacturer).await?;
        sqlx::query(
            "INSERT OR IGNORE INTO category_manufacturers (category_id, manufacturer_id) VALUES (?, ?)",
        )
        .bind(category_id)
        .bind(manufacturer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_product(&self, product: &NewProduct<'_>) -> Result<i64> {
        let category_id = match product.category {
            Some(category) => Some(self.require_id("categories", category).await?),
            None => None,
        };
        let manufacturer_id = match product.manufacturer {
            Some(manufacturer) => Some(self.require_id("manufacturers", manufacturer).await?),
            None => None,
        };

        let rec = sqlx::query(
            "INSERT INTO products (name, simple_name, category_id, manufacturer_id, description)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET simple_name=excluded.simple_name,
                 category_id=excluded.category_id,
                 manufacturer_id=excluded.manufacturer_id,
                 description=excluded.description
             RETURNING id",
        )
        .bind(product.name.trim())
        .bind(product.simple_name)
        .bind(category_id)
        .bind(manufacturer_id)
        .bind(product.description)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert product '{}'", product.name))?;

        if let (Some(category), Some(manufacturer)) = (product.category, product.manufacturer) {
            self.link_category_manufacturer(category, manufacturer)
                .await?;
        }

        Ok(rec.get::<i64, _>(0))
    }

    pub async fn add_product_feature(
        &self,
        product_id: i64,
        feature: &str,
        values: &[&str],
    ) -> Result<()> {
        for (position, value) in values.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO product_features (product_id, feature, value, position)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(product_id)
            .bind(feature.trim())
            .bind(value.trim())
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<CatalogRecord>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    pub async fn find_category(&self, name: &str) -> Result<Option<CatalogRecord>> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(category_from_row))
    }

    pub async fn list_manufacturers(&self) -> Result<Vec<CatalogRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, phone, address, description FROM manufacturers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(manufacturer_from_row).collect())
    }

    pub async fn find_manufacturer(&self, name: &str) -> Result<Option<CatalogRecord>> {
        let row = sqlx::query(
            "SELECT id, name, phone, address, description FROM manufacturers WHERE name = ?",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(manufacturer_from_row))
    }

    pub async fn categories_for_manufacturer(&self, manufacturer: &str) -> Result<Vec<CatalogRecord>> {
        let rows = sqlx::query(
            "SELECT c.id, c.name, c.description
             FROM categories c
             INNER JOIN category_manufacturers cm ON cm.category_id = c.id
             INNER JOIN manufacturers m ON m.id = cm.manufacturer_id
             WHERE m.name = ?
             ORDER BY c.id",
        )
        .bind(manufacturer.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    pub async fn manufacturers_for_category(&self, category: &str) -> Result<Vec<CatalogRecord>> {
        let rows = sqlx::query(
            "SELECT m.id, m.name, m.phone, m.address, m.description
             FROM manufacturers m
             INNER JOIN category_manufacturers cm ON cm.manufacturer_id = m.id
             INNER JOIN categories c ON c.id = cm.category_id
             WHERE c.name = ?
             ORDER BY m.id",
        )
        .bind(category.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(manufacturer_from_row).collect())
    }

    pub async fn list_products(
        &self,
        category: Option<&str>,
        manufacturer: Option<&str>,
    ) -> Result<Vec<CatalogRecord>> {
        let sql = format!(
            "{PRODUCT_SELECT}
             WHERE (?1 IS NULL OR c.name = ?1)
               AND (?2 IS NULL OR m.name = ?2)
             ORDER BY p.id"
        );
        let rows = sqlx::query(&sql)
            .bind(category.map(str::trim))
            .bind(manufacturer.map(str::trim))
            .fetch_all(&self.pool)
            .await?;
        self.products_with_features(rows).await
    }

    pub async fn find_product(&self, name: &str) -> Result<Option<CatalogRecord>> {
        let sql = format!(
            "{PRODUCT_SELECT}
             WHERE p.name = ?1 OR p.simple_name = ?1
             ORDER BY p.id
             LIMIT 1"
        );
        let rows = sqlx::query(&sql)
            .bind(name.trim())
            .fetch_all(&self.pool)
            .await?;
        Ok(self.products_with_features(rows).await?.into_iter().next())
    }

    /// Distinct values of `feature` across the products of `category`, in
    /// catalog order. Values are compared case-insensitively.
    pub async fn feature_values_for_category(
        &self,
        category: &str,
        feature: &str,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT pf.value
             FROM product_features pf
             INNER JOIN products p ON p.id = pf.product_id
             INNER JOIN categories c ON c.id = p.category_id
             WHERE c.name = ? AND pf.feature = ?
             ORDER BY p.id, pf.position",
        )
        .bind(category.trim())
        .bind(feature.trim())
        .fetch_all(&self.pool)
        .await?;

        let mut seen = HashSet::new();
        Ok(rows
            .into_iter()
            .map(|r| r.get::<String, _>(0))
            .filter(|value| seen.insert(value.to_lowercase()))
            .collect())
    }

    /// Looks a name up across categories, manufacturers and products, in that order.
    pub async fn find_entity_by_name(&self, name: &str) -> Result<Option<CatalogRecord>> {
        if let Some(category) = self.find_category(name).await? {
            return Ok(Some(category));
        }
        if let Some(manufacturer) = self.find_manufacturer(name).await? {
            return Ok(Some(manufacturer));
        }
        self.find_product(name).await
    }

    async fn products_with_features(&self, rows: Vec<SqliteRow>) -> Result<Vec<CatalogRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let feature_rows = sqlx::query(
            "SELECT product_id, feature, value FROM product_features ORDER BY product_id, position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut features: HashMap<i64, BTreeMap<String, Vec<String>>> = HashMap::new();
        for row in feature_rows {
            features
                .entry(row.get::<i64, _>(0))
                .or_default()
                .entry(row.get::<String, _>(1))
                .or_default()
                .push(row.get::<String, _>(2));
        }

        Ok(rows
            .iter()
            .map(|row| {
                let mut record = product_from_row(row);
                record.features = features.remove(&row.get::<i64, _>(0)).unwrap_or_default();
                record
            })
            .collect())
    }

    async fn require_id(&self, table: &str, name: &str) -> Result<i64> {
        let sql = format!("SELECT id FROM {table} WHERE name = ?");
        let row = sqlx::query(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row.get::<i64, _>(0)),
            None => bail!("no row named '{name}' in {table}"),
        }
    }
}

fn category_from_row(row: &SqliteRow) -> CatalogRecord {
    let mut record = CatalogRecord::new(EntityType::Category, row.get::<String, _>(1));
    record.description = non_blank(row.get::<Option<String>, _>(2));
    record
}

fn manufacturer_from_row(row: &SqliteRow) -> CatalogRecord {
    let mut record = CatalogRecord::new(EntityType::Manufacturer, row.get::<String, _>(1));
    record.phone = non_blank(row.get::<Option<String>, _>(2));
    record.address = non_blank(row.get::<Option<String>, _>(3));
    record.description = non_blank(row.get::<Option<String>, _>(4));
    record
}

fn product_from_row(row: &SqliteRow) -> CatalogRecord {
    let mut record = CatalogRecord::new(EntityType::Product, row.get::<String, _>(1));
    record.simple_name = non_blank(row.get::<Option<String>, _>(2));
    record.description = non_blank(row.get::<Option<String>, _>(3));
    record.category = row.get::<Option<String>, _>(4);
    record.manufacturer = row.get::<Option<String>, _>(5);
    record
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(parent) = sqlite_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };

    fs::create_dir_all(&parent).with_context(|| {
        format!(
            "cannot create '{}' for catalog database '{database_url}'",
            parent.display()
        )
    })
}

/// File behind a `sqlite:` url; `None` for in-memory or non-sqlite urls.
fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") {
        return None;
    }
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
