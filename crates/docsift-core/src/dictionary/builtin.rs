//! The versioned flexible pattern set shipped with the engine.
//!
//! These categories are appended after every user dictionary. A user
//! category with the same name and kind adds its own terms and patterns to
//! the built-in one. Built-in entries keep their built-in weights; listing
//! one of them again at a different weight is a load error.

use crate::entity::EntityType;
use crate::measure::{unit_tokens, MeasureKind};

use super::category::CategoryKind;
use super::schema::{CategorySpec, DictionaryFile};

/// Bump whenever a pattern below changes what it matches.
pub const BUILTIN_PATTERN_VERSION: u32 = 2;

pub const BUILTIN_ORIGIN: &str = "<builtin>";

const NUM: &str = r"(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";
const RANGE_SEP: &str = r"(?:\s*[-–—]\s*|\s+to\s+)";
const CURRENCY_SYMBOL: &str = r"(?:US\$|\$|€|£)";
const CURRENCY_CODE: &str = r"\b(?:USD|EUR|GBP)";
const SCALE: &str = r"(?:\s?(?:bn|mn|[KMBTkmb])\b|\s(?:thousand|million|billion|trillion)\b)?";
const WORD_SCALE: &str = r"(?:\s(?:thousand|million|billion|trillion))?";
const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

const MEASURE_KINDS: [MeasureKind; 7] = [
    MeasureKind::Length,
    MeasureKind::Mass,
    MeasureKind::Volume,
    MeasureKind::Area,
    MeasureKind::Duration,
    MeasureKind::Data,
    MeasureKind::Percent,
];

#[must_use]
pub fn builtin_dictionary() -> DictionaryFile {
    let mut file = DictionaryFile::new().with_category(currency_category());

    for kind in MEASURE_KINDS {
        let weight = if kind == MeasureKind::Percent { 1.0 } else { 1.5 };
        file = file.with_category(
            CategorySpec::new(
                format!("measure.{kind}"),
                CategoryKind::Measurement { measure: kind },
                weight,
            )
            .with_pattern(quantity_pattern(kind)),
        );
    }

    file.with_category(
        CategorySpec::new(
            "date.iso",
            CategoryKind::Entity {
                entity_type: EntityType::Date,
                subtype: None,
            },
            1.5,
        )
        .with_pattern(r"\b\d{4}-\d{2}-\d{2}\b"),
    )
    .with_category(
        CategorySpec::new(
            "date.written",
            CategoryKind::Entity {
                entity_type: EntityType::Date,
                subtype: None,
            },
            1.5,
        )
        .with_pattern(format!(r"\b(?:{MONTHS})\s+\d{{1,2}},\s+\d{{4}}\b"))
        .with_pattern(format!(r"\b\d{{1,2}}\s+(?:{MONTHS})\s+\d{{4}}\b")),
    )
    .with_category(
        CategorySpec::new(
            "identifier.dated",
            CategoryKind::Entity {
                entity_type: EntityType::Identifier,
                subtype: Some("dated".into()),
            },
            2.0,
        )
        .with_pattern(r"\b[A-Z]{2,8}-(?:19|20)\d{2}-\d{2,8}\b"),
    )
    .with_category(predicate(
        "acquisition",
        r"\b(?:acquired|acquires|acquiring|agreed to (?:acquire|buy)|took over)\b",
    ))
    .with_category(predicate(
        "partnership",
        r"\b(?:partnered with|partners with|teamed up with|joint venture with|signed (?:an? )?(?:agreement|deal|contract) with)\b",
    ))
    .with_category(predicate(
        "investment",
        r"\b(?:invested in|invests in|investing in|led (?:a|the) funding round (?:in|for))\b",
    ))
    .with_category(predicate(
        "leadership",
        r"\b(?:chief executive (?:officer )?of|CEO of|co-founder of|founder of|chairman of|chairwoman of|president of)\b",
    ))
}

fn currency_category() -> CategorySpec {
    let point = format!(r"{CURRENCY_SYMBOL}\s?{NUM}{SCALE}");
    CategorySpec::new(
        format!("measure.{}", MeasureKind::Currency),
        CategoryKind::Measurement {
            measure: MeasureKind::Currency,
        },
        2.0,
    )
    .with_pattern(format!(r"{point}{RANGE_SEP}(?:{CURRENCY_SYMBOL}\s?)?{NUM}{SCALE}"))
    .with_pattern(point)
    .with_pattern(format!(
        r"{CURRENCY_CODE}\s?{NUM}{SCALE}{RANGE_SEP}(?:{CURRENCY_CODE}\s?)?{NUM}{SCALE}"
    ))
    .with_pattern(format!(r"{CURRENCY_CODE}\s?{NUM}{SCALE}"))
    .with_pattern(format!(
        r"\b{NUM}{WORD_SCALE}{RANGE_SEP}{NUM}{WORD_SCALE}\s(?:dollars|USD)\b"
    ))
    .with_pattern(format!(r"\b{NUM}{WORD_SCALE}\s(?:dollars|USD)\b"))
}

fn predicate(relation: &str, pattern: &str) -> CategorySpec {
    CategorySpec::new(
        format!("predicate.{relation}"),
        CategoryKind::Predicate {
            relation: relation.into(),
        },
        1.0,
    )
    .with_pattern(pattern)
}

/// Number, optional range, then one of the kind's unit tokens.
fn quantity_pattern(kind: MeasureKind) -> String {
    let mut tokens: Vec<&str> = unit_tokens(kind).collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    tokens.dedup();

    let units = tokens
        .iter()
        .map(|token| {
            let escaped = regex::escape(token);
            if token.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()) {
                format!(r"{escaped}\b")
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>()
        .join("|");

    format!(r"\b{NUM}(?:\s?(?:{units}){RANGE_SEP}{NUM}|{RANGE_SEP}{NUM})?\s?(?:{units})")
}
