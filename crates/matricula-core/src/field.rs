//! Review field keys.
//!
//! A record exposes `tipo`, `valor`, and one document flag per party. Party
//! flags are positional: `doc_alienante_1` is the second grantor of the
//! record as extracted, whoever that is. Re-extracting a file with parties
//! reordered will attribute existing flags to different people.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::Record;

const GRANTOR_PREFIX: &str = "doc_alienante_";
const GRANTEE_PREFIX: &str = "doc_adquirente_";

/// Key of a single reviewable field within a record.
///
/// Ordering matches review order: type, value, grantors, grantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Tipo,
    Valor,
    DocAlienante(usize),
    DocAdquirente(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown review field key: {0:?}")]
pub struct UnknownFieldKey(pub String);

impl FieldKey {
    /// All keys a record exposes for review: `2 + grantors + grantees`.
    pub fn for_record(record: &Record) -> Vec<FieldKey> {
        let mut keys = Vec::with_capacity(2 + record.grantors.len() + record.grantees.len());
        keys.push(FieldKey::Tipo);
        keys.push(FieldKey::Valor);
        keys.extend((0..record.grantors.len()).map(FieldKey::DocAlienante));
        keys.extend((0..record.grantees.len()).map(FieldKey::DocAdquirente));
        keys
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Tipo => f.write_str("tipo"),
            FieldKey::Valor => f.write_str("valor"),
            FieldKey::DocAlienante(i) => write!(f, "{GRANTOR_PREFIX}{i}"),
            FieldKey::DocAdquirente(i) => write!(f, "{GRANTEE_PREFIX}{i}"),
        }
    }
}

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let positional = |rest: &str| -> Option<usize> {
            // Reject "+1", "01" and friends so parse/display stay bijective.
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            if rest.len() > 1 && rest.starts_with('0') {
                return None;
            }
            rest.parse().ok()
        };

        match s {
            "tipo" => Ok(FieldKey::Tipo),
            "valor" => Ok(FieldKey::Valor),
            _ => {
                if let Some(i) = s.strip_prefix(GRANTOR_PREFIX).and_then(positional) {
                    Ok(FieldKey::DocAlienante(i))
                } else if let Some(i) = s.strip_prefix(GRANTEE_PREFIX).and_then(positional) {
                    Ok(FieldKey::DocAdquirente(i))
                } else {
                    Err(UnknownFieldKey(s.to_string()))
                }
            }
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amount, Party};

    fn party(name: &str) -> Party {
        Party {
            name: name.into(),
            document: "000".into(),
            document_type: "CPF".into(),
        }
    }

    #[test]
    fn display_matches_persisted_keys() {
        assert_eq!(FieldKey::Tipo.to_string(), "tipo");
        assert_eq!(FieldKey::Valor.to_string(), "valor");
        assert_eq!(FieldKey::DocAlienante(0).to_string(), "doc_alienante_0");
        assert_eq!(FieldKey::DocAdquirente(12).to_string(), "doc_adquirente_12");
    }

    #[test]
    fn parses_persisted_keys() {
        assert_eq!("tipo".parse::<FieldKey>(), Ok(FieldKey::Tipo));
        assert_eq!("doc_alienante_3".parse::<FieldKey>(), Ok(FieldKey::DocAlienante(3)));
        assert_eq!("doc_adquirente_0".parse::<FieldKey>(), Ok(FieldKey::DocAdquirente(0)));
    }

    #[test]
    fn rejects_unknown_or_malformed_keys() {
        for bad in ["", "data", "doc_alienante_", "doc_alienante_x", "doc_adquirente_01", "doc_alienante_+1"] {
            assert!(bad.parse::<FieldKey>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn ordering_follows_review_order() {
        let mut keys = vec![
            FieldKey::DocAdquirente(0),
            FieldKey::DocAlienante(1),
            FieldKey::Valor,
            FieldKey::DocAlienante(0),
            FieldKey::Tipo,
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                FieldKey::Tipo,
                FieldKey::Valor,
                FieldKey::DocAlienante(0),
                FieldKey::DocAlienante(1),
                FieldKey::DocAdquirente(0),
            ]
        );
    }

    #[test]
    fn for_record_counts_both_party_lists() {
        let record = Record {
            kind: "doação".into(),
            amount: Amount {
                value: 0.0,
                currency: "BRL".into(),
            },
            date: String::new(),
            description: String::new(),
            pct: 50.0,
            grantors: vec![party("a"), party("b")],
            grantees: vec![party("c")],
        };
        let keys = FieldKey::for_record(&record);
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[2], FieldKey::DocAlienante(0));
        assert_eq!(keys[4], FieldKey::DocAdquirente(0));
    }
}
