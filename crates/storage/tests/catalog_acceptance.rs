use shared::domain::EntityType;
use storage::{NewManufacturer, NewProduct, Storage};

#[tokio::test]
async fn builds_a_catalog_from_scratch_and_reads_it_back() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    storage
        .insert_category("Ceilings", Some("Acoustic panels"))
        .await
        .expect("category");
    storage
        .insert_manufacturer(&NewManufacturer {
            name: "Homasote",
            phone: Some("+1-800-257-9491"),
            ..NewManufacturer::default()
        })
        .await
        .expect("manufacturer");
    let product = storage
        .insert_product(&NewProduct {
            name: "Homasote 440 by Homasote",
            simple_name: Some("Homasote 440"),
            category: Some("Ceilings"),
            manufacturer: Some("Homasote"),
            description: None,
        })
        .await
        .expect("product");
    storage
        .add_product_feature(product, "thickness", &["1/2 inch", "3/4 inch"])
        .await
        .expect("features");

    let makers = storage
        .manufacturers_for_category("ceilings")
        .await
        .expect("makers");
    assert_eq!(makers.len(), 1);
    assert_eq!(makers[0].phone.as_deref(), Some("+1-800-257-9491"));

    let entity = storage
        .find_entity_by_name("Homasote 440")
        .await
        .expect("lookup")
        .expect("entity");
    assert_eq!(entity.entity_type, EntityType::Product);
    assert_eq!(entity.features["thickness"].len(), 2);
    assert_eq!(entity.manufacturer.as_deref(), Some("Homasote"));
}
