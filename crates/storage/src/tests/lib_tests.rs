use super::*;

async fn seeded() -> Storage {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.seed_demo_catalog().await.expect("seed");
    storage
}

fn names(records: &[CatalogRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("catalog.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn memory_urls_have_no_path() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/catalog.db?mode=rwc"),
        Some(PathBuf::from("./data/catalog.db"))
    );
}

#[tokio::test]
async fn seeding_twice_does_not_duplicate_rows() {
    let storage = seeded().await;
    let first = storage.list_products(None, None).await.expect("products");
    let summary = storage.seed_demo_catalog().await.expect("reseed");

    let categories = storage.list_categories().await.expect("categories");
    let products = storage.list_products(None, None).await.expect("products");
    assert_eq!(categories.len(), summary.categories);
    assert_eq!(products.len(), first.len());
    assert_eq!(products[0].features["width"].len(), 2);
}

#[tokio::test]
async fn categories_keep_insertion_order() {
    let storage = seeded().await;
    let categories = storage.list_categories().await.expect("categories");
    assert_eq!(
        &names(&categories)[..3],
        ["Access Gates", "Access Security", "Appliances"]
    );
    assert!(categories.iter().all(|c| c.is(EntityType::Category)));
    assert_eq!(categories[3].description, None);
    assert_eq!(categories[4].description, None);
    assert_eq!(
        categories[9].description.as_deref(),
        Some("Architectural paints, primers and specialty coatings.")
    );
}

#[tokio::test]
async fn lookups_ignore_case() {
    let storage = seeded().await;
    let category = storage
        .find_category("optical turnstiles")
        .await
        .expect("query")
        .expect("category");
    assert_eq!(category.name, "Optical Turnstiles");

    let manufacturer = storage
        .find_manufacturer("  boon edam usa ")
        .await
        .expect("query")
        .expect("manufacturer");
    assert_eq!(manufacturer.phone.as_deref(), Some("+1-910-814-3800"));
}

#[tokio::test]
async fn products_match_simple_name() {
    let storage = seeded().await;
    let product = storage
        .find_product("speed lane slide")
        .await
        .expect("query")
        .expect("product");
    assert_eq!(product.name, "Speed lane Slide by Boon Edam USA");
    assert_eq!(product.simple_name.as_deref(), Some("Speed lane Slide"));
    assert_eq!(product.category.as_deref(), Some("Optical Turnstiles"));
    assert_eq!(
        product.features["color"],
        vec!["black".to_string(), "white".to_string(), "gray".to_string()]
    );
}

#[tokio::test]
async fn filters_products_by_category_and_manufacturer() {
    let storage = seeded().await;

    let kenmore = storage
        .list_products(None, Some("Kenmore"))
        .await
        .expect("products");
    assert_eq!(kenmore.len(), 3);

    let dishwashers = storage
        .list_products(Some("Dishwashers"), Some("Kenmore"))
        .await
        .expect("products");
    assert_eq!(
        names(&dishwashers),
        ["24 inch Built-In Dishwasher by Kenmore", "28 inch Dishwasher by Kenmore"]
    );

    let none = storage
        .list_products(Some("Ceilings"), None)
        .await
        .expect("products");
    assert!(none.is_empty());
}

#[tokio::test]
async fn product_insert_links_category_and_manufacturer() {
    let storage = seeded().await;
    let makers = storage
        .manufacturers_for_category("Optical Turnstiles")
        .await
        .expect("manufacturers");
    assert_eq!(names(&makers), ["Boon Edam USA", "Delta Turnstiles"]);

    let categories = storage
        .categories_for_manufacturer("Boon Edam USA")
        .await
        .expect("categories");
    assert_eq!(
        names(&categories),
        ["Access Gates", "Access Security", "Optical Turnstiles", "Revolving Doors"]
    );
}

#[tokio::test]
async fn feature_values_are_distinct_per_category() {
    let storage = seeded().await;
    let colors = storage
        .feature_values_for_category("Optical Turnstiles", "Color")
        .await
        .expect("values");
    assert_eq!(colors, ["black", "white", "gray"]);

    let missing = storage
        .feature_values_for_category("Dishwashers", "color")
        .await
        .expect("values");
    assert!(missing.is_empty());
}

#[tokio::test]
async fn entity_lookup_prefers_categories() {
    let storage = seeded().await;
    storage
        .insert_manufacturer(&NewManufacturer {
            name: "Flooring",
            ..NewManufacturer::default()
        })
        .await
        .expect("manufacturer");

    let entity = storage
        .find_entity_by_name("flooring")
        .await
        .expect("query")
        .expect("entity");
    assert_eq!(entity.entity_type, EntityType::Category);

    let product = storage
        .find_entity_by_name("Tournex")
        .await
        .expect("query")
        .expect("entity");
    assert_eq!(product.entity_type, EntityType::Product);

    assert!(storage
        .find_entity_by_name("hovercraft")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn product_with_unknown_category_is_rejected() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let err = storage
        .insert_product(&NewProduct {
            name: "Mystery Box",
            category: Some("Nowhere"),
            ..NewProduct::default()
        })
        .await
        .expect_err("unknown category");
    assert!(err.to_string().contains("Nowhere"));
}
