//! fabdb.net response models.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

/// Paginated envelope returned by `GET /cards`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub data: Vec<Card>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct PageLinks {
    pub first: Option<String>,
    pub last: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct PageMeta {
    pub current_page: u32,
    pub from: Option<u32>,
    pub last_page: u32,
    pub links: Vec<MetaLink>,
    pub path: String,
    /// fabdb.net sends this one as a string.
    pub per_page: serde_json::Value,
    pub to: Option<u32>,
    pub total: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct MetaLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

/// A single card as served by fabdb.net.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Card {
    #[serde(deserialize_with = "nullable")]
    #[allow(dead_code)]
    pub identifier: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub text: String,
    #[serde(deserialize_with = "nullable")]
    pub rarity: String,
    #[serde(deserialize_with = "nullable")]
    pub image: String,
    #[serde(rename = "sideboardTotal", deserialize_with = "nullable")]
    #[allow(dead_code)]
    pub sideboard_total: u32,
    #[serde(deserialize_with = "nullable")]
    pub printings: Vec<Printing>,
}

/// One printing of a card (set, language, finish).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct Printing {
    #[serde(deserialize_with = "nullable")]
    pub id: u64,
    #[serde(deserialize_with = "nullable")]
    pub language: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub text: String,
    #[serde(deserialize_with = "nullable")]
    pub flavour: String,
    #[serde(deserialize_with = "nullable")]
    pub sku: Sku,
    #[serde(deserialize_with = "nullable")]
    pub set: String,
    #[serde(deserialize_with = "nullable")]
    pub rarity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct Sku {
    #[serde(deserialize_with = "nullable")]
    pub sku: String,
    #[serde(deserialize_with = "nullable")]
    pub finish: String,
    #[serde(deserialize_with = "nullable")]
    pub set: CardSet,
    #[serde(deserialize_with = "nullable")]
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct CardSet {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub released: String,
    #[serde(deserialize_with = "nullable")]
    pub browseable: bool,
    #[serde(deserialize_with = "nullable")]
    pub draftable: bool,
}

/// Treats an explicit JSON `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Distinct set names across all printings, in alphabetical order.
pub fn unique_sets_from_printings(printings: &[Printing]) -> Vec<String> {
    printings
        .iter()
        .map(|p| p.sku.set.name.as_str())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printing(set_name: &str) -> Printing {
        Printing {
            sku: Sku {
                set: CardSet {
                    name: set_name.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_sets_deduplicates() {
        let printings = vec![
            printing("Welcome to Rathe"),
            printing("Arcane Rising"),
            printing("Welcome to Rathe"),
            printing(""),
        ];

        assert_eq!(
            unique_sets_from_printings(&printings),
            vec!["Arcane Rising".to_string(), "Welcome to Rathe".to_string()]
        );
    }

    #[test]
    fn test_card_deserializes_camel_case_sideboard() {
        let json = serde_json::json!({
            "identifier": "ARC000",
            "name": "Eye of Ophidia",
            "keywords": ["generic", "item"],
            "text": "Opt 2",
            "rarity": "F",
            "image": "https://example.com/arc000.png",
            "sideboardTotal": 1,
            "printings": [{
                "id": 7,
                "language": "en",
                "flavour": null,
                "sku": {"sku": "ARC000", "finish": "regular", "set": {"id": "ARC", "name": "Arcane Rising"}, "number": "000"},
                "set": "ARC",
                "rarity": "F",
                "edition": {}
            }]
        });

        let card: Card = serde_json::from_value(json).unwrap();
        assert_eq!(card.sideboard_total, 1);
        assert_eq!(card.printings[0].sku.set.id, "ARC");
        assert_eq!(card.printings[0].flavour, "");
    }

    #[test]
    fn test_nulls_in_nested_printing_fields_decode_as_defaults() {
        let json = serde_json::json!({
            "identifier": null,
            "name": null,
            "keywords": null,
            "sideboardTotal": null,
            "printings": [{
                "id": null,
                "sku": {
                    "sku": null,
                    "finish": null,
                    "number": null,
                    "set": {"id": null, "name": "Arcane Rising", "released": null, "browseable": null, "draftable": null}
                }
            }, {
                "sku": {"set": null}
            }]
        });

        let card: Card = serde_json::from_value(json).unwrap();
        assert_eq!(card.name, "");
        assert_eq!(card.identifier, "");
        assert_eq!(card.printings.len(), 2);
        assert_eq!(card.printings[0].sku.finish, "");
        assert_eq!(card.printings[0].sku.set.released, "");
        assert!(!card.printings[0].sku.set.browseable);
        assert_eq!(unique_sets_from_printings(&card.printings), vec!["Arcane Rising".to_string()]);
    }
}
