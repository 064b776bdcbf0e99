use super::*;
use serde_json::json;
use tempfile::TempDir;

fn product(id: i64, embedding: Vec<f32>) -> Product {
    Product {
        id: ProductId::Number(id),
        title: format!("Product {id}"),
        category: "shoes".to_string(),
        images: vec![format!("https://img.example.com/{id}.jpg")],
        embedding,
        extra: Map::new(),
    }
}

#[test]
fn product_ids_keep_their_json_form() {
    let parsed: Vec<ProductId> =
        serde_json::from_value(json!([7, "sku-7"])).expect("ids should parse");

    assert_eq!(parsed[0], ProductId::Number(7));
    assert_eq!(parsed[1], ProductId::Text("sku-7".to_string()));
    assert_eq!(parsed[0].to_string(), "7");
    assert_eq!(parsed[1].to_string(), "sku-7");
    assert_eq!(
        serde_json::to_value(&parsed).expect("ids should serialize"),
        json!([7, "sku-7"])
    );
}

#[test]
fn unusual_ids_are_carried_verbatim() {
    let document = CatalogDocument::parse(
        r#"{"products": [
            {"id": 1, "title": "a"},
            {"id": 2.5, "title": "b"},
            {"id": 18446744073709551615, "title": "c"},
            {"title": "d"},
            {"id": null, "title": "e"}
        ]}"#,
        Path::new("catalog.json"),
    )
    .expect("catalog with odd ids should parse");

    let ids: Vec<&ProductId> = document.products.iter().map(|p| &p.id).collect();
    assert_eq!(ids[0], &ProductId::Number(1));
    assert_eq!(ids[1], &ProductId::Other(json!(2.5)));
    assert_eq!(ids[2], &ProductId::Other(json!(u64::MAX)));
    assert_eq!(ids[3], &ProductId::Missing);
    assert_eq!(ids[4], &ProductId::Other(Value::Null));
    assert_eq!(ids[1].to_string(), "2.5");
    assert_eq!(ids[3].to_string(), "<no id>");

    let written = serde_json::to_value(&document).expect("document should serialize");
    assert_eq!(written["products"][1]["id"], json!(2.5));
    assert_eq!(written["products"][2]["id"], json!(u64::MAX));
    assert!(written["products"][3].get("id").is_none());
    assert_eq!(written["products"][4]["id"], Value::Null);
}

#[test]
fn product_tolerates_nulls_and_missing_fields() {
    let parsed: Product = serde_json::from_value(json!({
        "id": 1,
        "title": null,
        "images": null,
        "embedding": null
    }))
    .expect("product should parse");

    assert_eq!(parsed.title, "");
    assert_eq!(parsed.category, "");
    assert!(parsed.images.is_empty());
    assert!(parsed.embedding.is_empty());
    assert_eq!(parsed.primary_image(), None);
}

#[test]
fn embedding_with_null_holes_is_dropped() {
    let parsed: Product = serde_json::from_value(json!({
        "id": 2,
        "embedding": [0.5, null, 1.0]
    }))
    .expect("product should parse");

    assert!(parsed.embedding.is_empty());
}

#[test]
fn unknown_fields_survive_a_round_trip() {
    let source = json!({
        "generatedBy": "catalog-export",
        "products": [{
            "id": "a1",
            "title": "Lamp",
            "category": "home",
            "images": ["https://img/1.jpg", "https://img/2.jpg"],
            "price": 19.99,
            "tags": ["desk", "light"]
        }]
    });

    let document: CatalogDocument =
        serde_json::from_value(source).expect("document should parse");
    assert_eq!(document.extra.get("generatedBy"), Some(&json!("catalog-export")));

    let written = serde_json::to_value(&document).expect("document should serialize");
    let product = &written["products"][0];
    assert_eq!(product["price"], json!(19.99));
    assert_eq!(product["tags"], json!(["desk", "light"]));
    assert_eq!(product["embedding"], json!([]));
    assert_eq!(written["generatedBy"], json!("catalog-export"));
}

#[test]
fn primary_image_skips_blank_entries() {
    let mut item = product(1, vec![]);
    item.images = vec!["  ".to_string(), "https://img/b.jpg".to_string()];
    assert_eq!(item.primary_image(), Some("https://img/b.jpg"));
}

#[test]
fn parse_requires_products_array() {
    let origin = Path::new("catalog.json");

    assert!(matches!(
        CatalogDocument::parse(r#"{"items": []}"#, origin),
        Err(CatalogError::MissingProducts(_))
    ));
    assert!(matches!(
        CatalogDocument::parse(r#"{"products": {}}"#, origin),
        Err(CatalogError::MissingProducts(_))
    ));
    assert!(matches!(
        CatalogDocument::parse("[1, 2", origin),
        Err(CatalogError::Parse { .. })
    ));
    assert!(matches!(
        CatalogDocument::parse(r#"{"products": [{"title": "no id"}]}"#, origin),
        Err(CatalogError::Parse { .. })
    ));

    let empty = CatalogDocument::parse(r#"{"products": []}"#, origin).expect("empty is valid");
    assert!(empty.products.is_empty());
}

#[test]
fn load_missing_file_fails() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let result = Catalog::load(temp_dir.path().join("absent.json"));
    assert!(matches!(result, Err(CatalogError::Read { .. })));
}

#[test]
fn load_normalizes_embeddings() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("catalog.json");
    CatalogDocument::new(vec![
        product(1, vec![3.0, 4.0]),
        product(2, vec![]),
        product(3, vec![0.0, 0.0]),
    ])
    .write_atomic(&path)
    .expect("should write catalog");

    let catalog = Catalog::load(&path).expect("should load catalog");

    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.embedded_count(), 1);
    assert_eq!(catalog.dimension(), Some(2));

    let first = catalog.entries()[0]
        .searchable_embedding()
        .expect("first product is searchable");
    assert!((first.as_slice()[0] - 0.6).abs() < 1e-6);
    assert!((first.as_slice()[1] - 0.8).abs() < 1e-6);

    assert!(catalog.entries()[1].embedding.is_none());
    assert!(
        catalog.entries()[2]
            .embedding
            .as_ref()
            .is_some_and(NormalizedVector::is_degenerate)
    );
    assert!(catalog.entries()[2].searchable_embedding().is_none());

    // normalized in place, the raw copy is not kept
    assert!(catalog.entries()[0].product.embedding.is_empty());
    assert_eq!(
        catalog.entries()[2]
            .embedding
            .as_ref()
            .map(NormalizedVector::len),
        Some(2)
    );
}

#[test]
fn non_finite_embeddings_are_excluded() {
    let catalog = Catalog::from_products(vec![
        product(1, vec![f32::INFINITY, 1.0]),
        product(2, vec![1.0, 1.0]),
    ]);

    assert!(catalog.entries()[0].embedding.is_none());
    assert_eq!(catalog.embedded_count(), 1);
}

#[test]
fn dimension_is_the_most_common_length() {
    let catalog = Catalog::from_products(vec![
        product(1, vec![1.0, 0.0, 0.0]),
        product(2, vec![0.0, 1.0]),
        product(3, vec![0.0, 0.0, 1.0]),
    ]);
    assert_eq!(catalog.dimension(), Some(3));

    let empty = Catalog::from_products(vec![product(1, vec![])]);
    assert_eq!(empty.dimension(), None);
    assert_eq!(empty.embedded_count(), 0);
}

#[test]
fn write_atomic_replaces_existing_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("out.json");
    std::fs::write(&path, "stale").expect("should write stale file");

    let document = CatalogDocument::new(vec![product(9, vec![1.0])]);
    document.write_atomic(&path).expect("should write catalog");

    let reread = CatalogDocument::read(&path).expect("should reread catalog");
    assert_eq!(reread, document);

    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
        .expect("should list dir")
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn write_atomic_into_missing_directory_fails() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("missing").join("out.json");

    let result = CatalogDocument::new(vec![]).write_atomic(&path);
    assert!(matches!(result, Err(CatalogError::Write { .. })));
}
