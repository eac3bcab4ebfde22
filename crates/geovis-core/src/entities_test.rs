use std::path::Path;

use super::*;

#[test]
fn canonical_name_is_first_form() {
    let set = AliasSet::new("New Balance", ["NB", "new balance"]);
    assert_eq!(set.name(), "New Balance");
    assert_eq!(set.forms(), &["new balance".to_string(), "nb".to_string()]);
}

#[test]
fn aliases_are_trimmed_lowercased_and_deduplicated() {
    let set = AliasSet::new("Acme", ["  ACME  ", "Acme Corp", "acme   corp", ""]);
    assert_eq!(set.forms(), &["acme".to_string(), "acme corp".to_string()]);
    assert_eq!(set.aliases(), &["acme corp".to_string()]);
}

#[test]
fn with_products_keeps_canonical_and_appends() {
    let set = AliasSet::new("Apple", Vec::<String>::new());
    let extended = set.with_products(["iPhone 15", "  ", "APPLE"]);
    assert_eq!(
        extended.forms(),
        &["apple".to_string(), "iphone 15".to_string()]
    );
    assert_eq!(set.forms().len(), 1, "original set must be unchanged");
}

#[test]
fn contains_is_case_insensitive() {
    let set = AliasSet::new("Globex", ["Globex Corporation"]);
    assert!(set.contains("GLOBEX corporation"));
    assert!(!set.contains("initech"));
}

#[test]
fn entity_alias_set_includes_products() {
    let entity = EntityConfig {
        name: "Acme".to_string(),
        aliases: vec!["Acme Inc".to_string()],
        products: vec!["Roadrunner Trap".to_string()],
    };
    assert_eq!(
        entity.alias_set().forms(),
        &[
            "acme".to_string(),
            "acme inc".to_string(),
            "roadrunner trap".to_string()
        ]
    );
}

#[test]
fn parse_entities_reads_brand_and_competitors() {
    let yaml = r"
brand:
  name: Acme
  aliases: [Acme Inc]
  products: [Roadrunner Trap]
competitors:
  - name: Globex
  - name: Initech
    aliases: [Initech LLC]
";
    let entities = parse_entities(yaml).expect("valid entities");
    assert_eq!(entities.brand.name, "Acme");
    assert_eq!(entities.competitors.len(), 2);
    assert!(entities.competitors[0].aliases.is_empty());
    assert_eq!(entities.competitor_aliases()[1].aliases(), &["initech llc"]);
}

#[test]
fn validate_rejects_empty_name() {
    let yaml = "brand:\n  name: '  '\n";
    let err = parse_entities(yaml).unwrap_err();
    assert!(err.to_string().contains("non-empty"), "got: {err}");
}

#[test]
fn validate_rejects_duplicate_names_case_insensitive() {
    let yaml = "brand:\n  name: Acme\ncompetitors:\n  - name: Globex\n  - name: GLOBEX\n";
    let err = parse_entities(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate entity name"), "got: {err}");
}

#[test]
fn validate_rejects_competitor_sharing_brand_alias() {
    let yaml = "brand:\n  name: Acme\n  aliases: [Roadrunner]\ncompetitors:\n  - name: Globex\n    aliases: [roadrunner]\n";
    let err = parse_entities(yaml).unwrap_err();
    assert!(err.to_string().contains("shares alias"), "got: {err}");
}

#[test]
fn load_entities_missing_file_is_io_error() {
    let err = load_entities(Path::new("/nonexistent/entities.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::EntitiesFileIo { .. }));
}

#[test]
fn parse_entities_malformed_yaml_is_parse_error() {
    let err = parse_entities("brand: [unterminated").unwrap_err();
    assert!(matches!(err, ConfigError::EntitiesFileParse(_)));
}

#[test]
fn load_entities_from_sample_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("entities.yaml");
    assert!(path.exists(), "entities.yaml missing at {path:?}");

    let entities = load_entities(&path).expect("failed to load entities.yaml");
    let brand = entities.brand_aliases();
    assert_eq!(brand.name(), "Acme");
    assert!(brand.contains("widget pro"));
    assert_eq!(entities.competitor_aliases().len(), 3);
}
