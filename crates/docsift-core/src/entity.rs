use serde::{Deserialize, Serialize};

/// Entity types an `entity` category can assign to its mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "PERSON")]
    Person,
    #[serde(rename = "ORG")]
    Organization,
    #[serde(rename = "GPE")]
    Gpe,
    #[serde(rename = "LOC")]
    Location,
    #[serde(rename = "EVENT")]
    Event,
    #[serde(rename = "PRODUCT")]
    Product,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "ID")]
    Identifier,
}

impl EntityType {
    pub const ALL: [Self; 8] = [
        Self::Person,
        Self::Organization,
        Self::Gpe,
        Self::Location,
        Self::Event,
        Self::Product,
        Self::Date,
        Self::Identifier,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORG",
            Self::Gpe => "GPE",
            Self::Location => "LOC",
            Self::Event => "EVENT",
            Self::Product => "PRODUCT",
            Self::Date => "DATE",
            Self::Identifier => "ID",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSON" => Ok(Self::Person),
            "ORG" => Ok(Self::Organization),
            "GPE" => Ok(Self::Gpe),
            "LOC" => Ok(Self::Location),
            "EVENT" => Ok(Self::Event),
            "PRODUCT" => Ok(Self::Product),
            "DATE" => Ok(Self::Date),
            "ID" => Ok(Self::Identifier),
            _ => Err(crate::Error::InvalidEntityType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_roundtrip() {
        for ty in EntityType::ALL {
            let parsed: EntityType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_entity_type_serde_uses_short_labels() {
        let json = serde_json::to_string(&EntityType::Organization).unwrap();
        assert_eq!(json, "\"ORG\"");

        let parsed: EntityType = serde_json::from_str("\"GPE\"").unwrap();
        assert_eq!(parsed, EntityType::Gpe);
    }

    #[test]
    fn test_entity_type_invalid() {
        assert!("organization".parse::<EntityType>().is_err());
    }
}
