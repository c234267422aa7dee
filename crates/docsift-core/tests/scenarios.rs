use docsift_core::{
    CategoryKind, CategorySpec, DictionaryFile, DictionaryLoader, Engine, EngineConfig,
    EntityType, MatchSource, MeasureKind, Quantity, Warning,
};

fn org(name: &str, weight: f64) -> CategorySpec {
    CategorySpec::new(
        name,
        CategoryKind::Entity {
            entity_type: EntityType::Organization,
            subtype: None,
        },
        weight,
    )
}

fn gpe(name: &str, weight: f64) -> CategorySpec {
    CategorySpec::new(
        name,
        CategoryKind::Entity {
            entity_type: EntityType::Gpe,
            subtype: None,
        },
        weight,
    )
}

fn engine(file: DictionaryFile) -> Engine {
    let table = DictionaryLoader::new()
        .with_inline("scenario", file)
        .load()
        .unwrap();
    Engine::build(table, EngineConfig::default()).unwrap()
}

#[test]
fn test_two_orgs_and_a_currency_amount() {
    let engine = engine(
        DictionaryFile::new().with_category(org("org", 2.0).with_terms(["Apple Inc", "Microsoft"])),
    );

    let result = engine.process("Apple Inc and Microsoft announced a $2.5M deal.");

    let orgs: Vec<&str> = result
        .entities
        .iter()
        .filter(|e| e.entity_type == EntityType::Organization)
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(orgs, vec!["Apple Inc", "Microsoft"]);

    assert_eq!(result.measurements.len(), 1);
    let amount = &result.measurements[0];
    assert_eq!(amount.kind, MeasureKind::Currency);
    assert_eq!(amount.raw_text, "$2.5M");
    assert_eq!(amount.canonical_value, Quantity::Point(2_500_000.0));
    assert_eq!(amount.canonical_unit.symbol(), "USD");
}

#[test]
fn test_longer_flexible_span_beats_heavier_exact() {
    let engine = engine(
        DictionaryFile::new()
            .with_category(gpe("gpe.state", 3.0).with_terms(["New York"]))
            .with_category(gpe("gpe.city", 2.5).with_pattern(r"\bNew York City\b")),
    );

    let result = engine.process("She moved to New York City last year.");

    assert_eq!(result.entities.len(), 1);
    let city = &result.entities[0];
    assert_eq!(city.name, "New York City");
    assert_eq!(city.mentions[0].source, MatchSource::Flexible);
    assert!(city.metadata.categories.contains("gpe.city"));
    assert_eq!(result.stats.discarded, 1);
    assert_eq!(
        result.annotated_text,
        "She moved to ⟦E1|New York City⟧ last year."
    );
}

#[test]
fn test_kilogram_range() {
    let engine = engine(DictionaryFile::new());

    for text in ["Ship 10-15 kg of rice.", "Ship 10 to 15 kg of rice."] {
        let result = engine.process(text);
        assert_eq!(result.measurements.len(), 1, "{text}");
        let mass = &result.measurements[0];
        assert_eq!(mass.kind, MeasureKind::Mass);
        assert_eq!(mass.canonical_value, Quantity::Range(10.0, 15.0));
        assert_eq!(mass.canonical_unit.symbol(), "kg");
    }
}

#[test]
fn test_zero_length_document() {
    let engine = engine(DictionaryFile::new().with_category(org("org", 2.0).with_terms(["Acme"])));

    let result = engine.process("");

    assert!(result.domain_scores.is_empty());
    assert!(result.document_type_scores.is_empty());
    assert!(result.entities.is_empty());
    assert!(result.measurements.is_empty());
    assert_eq!(result.annotated_text, "");
    assert_eq!(result.warnings, vec![Warning::EmptyInput]);
}

#[test]
fn test_currency_range_inherits_scale() {
    let engine = engine(DictionaryFile::new());

    let result = engine.process("Valued at $10-20M by analysts.");
    assert_eq!(result.measurements.len(), 1);
    assert_eq!(
        result.measurements[0].canonical_value,
        Quantity::Range(10_000_000.0, 20_000_000.0)
    );
}

#[test]
fn test_currency_code_range() {
    let engine = engine(DictionaryFile::new());

    let result = engine.process("Valued at USD 10-20 million.");
    assert_eq!(result.measurements.len(), 1);
    assert_eq!(result.measurements[0].raw_text, "USD 10-20 million");
    assert_eq!(
        result.measurements[0].canonical_value,
        Quantity::Range(10_000_000.0, 20_000_000.0)
    );
}

#[test]
fn test_dollar_suffix_ranges() {
    let engine = engine(DictionaryFile::new());

    let result = engine.process("Costs 10-20 million dollars.");
    assert_eq!(result.measurements.len(), 1);
    assert_eq!(
        result.measurements[0].canonical_value,
        Quantity::Range(10_000_000.0, 20_000_000.0)
    );

    let result = engine.process("Paid 10 to 20 dollars.");
    assert_eq!(result.measurements.len(), 1);
    assert_eq!(
        result.measurements[0].canonical_value,
        Quantity::Range(10.0, 20.0)
    );
}

#[test]
fn test_routing_follows_configured_threshold() {
    let file = DictionaryFile::new()
        .with_category(
            CategorySpec::new("legal", CategoryKind::Keyword, 2.0)
                .with_domain("legal")
                .with_terms(["plaintiff", "defendant"]),
        )
        .with_category(
            CategorySpec::new("finance", CategoryKind::Keyword, 1.0)
                .with_domain("finance")
                .with_terms(["invoice"]),
        );
    let table = DictionaryLoader::new()
        .with_inline("scenario", file)
        .load()
        .unwrap();

    let text = "The plaintiff sued the defendant over an invoice.";

    // legal holds 4.0 of 5.0 = 80%.
    let strict = Engine::build(
        table.clone(),
        EngineConfig {
            routing_threshold: 90.0,
            ..EngineConfig::default()
        },
    )
    .unwrap();
    let routed = strict.process(text).routing;
    assert_eq!(routed.primary_domain.as_deref(), Some("legal"));
    assert!(!routed.deep_extraction);

    let lenient = Engine::build(table, EngineConfig::default()).unwrap();
    assert!(lenient.process(text).routing.deep_extraction);
}

#[test]
fn test_result_serializes_entity_ids_as_strings() {
    let engine = engine(DictionaryFile::new().with_category(org("org", 2.0).with_terms(["Acme"])));
    let result = engine.process("Acme met Acme.");

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["entities"][0]["id"], "E1");
    assert_eq!(json["entities"][0]["type"], "ORG");
    assert_eq!(json["entities"][0]["metadata"]["mention_count"], 2);
}
