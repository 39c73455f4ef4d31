//! Registry document types as produced by the extraction pipeline.
//!
//! JSON keys follow the extraction output (`registros`, `alienantes`, ...),
//! so a parsed record serializes back to the shape the reviewer uploaded.

use serde::{Deserialize, Serialize};

/// A party named in a record or as a property owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "documento")]
    pub document: String,
    #[serde(rename = "tipo_documento")]
    pub document_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    #[serde(rename = "valor")]
    pub value: f64,
    #[serde(rename = "moeda")]
    pub currency: String,
}

/// A single transaction entry of a matrícula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "valor")]
    pub amount: Amount,
    /// Free-form date string; the extraction output does not fix a format.
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "objeto")]
    pub description: String,
    pub pct: f64,
    #[serde(rename = "alienantes")]
    pub grantors: Vec<Party>,
    #[serde(rename = "adquirentes")]
    pub grantees: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "proprietarios")]
    pub owners: Vec<Party>,
    pub area: f64,
    #[serde(rename = "area_unidade")]
    pub area_unit: String,
}

/// A registry document: the property and its ordered transaction history.
///
/// Parsed fresh from every upload and never persisted; only the review
/// progress derived from it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matricula {
    #[serde(rename = "registros")]
    pub records: Vec<Record>,
    #[serde(rename = "bem")]
    pub property: Property,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_extraction_keys() {
        let record = Record {
            kind: "compra e venda".into(),
            amount: Amount {
                value: 250_000.0,
                currency: "BRL".into(),
            },
            date: "12/03/2015".into(),
            description: "venda do imóvel".into(),
            pct: 100.0,
            grantors: vec![Party {
                name: "Maria Souza".into(),
                document: "123.456.789-00".into(),
                document_type: "CPF".into(),
            }],
            grantees: vec![],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tipo"], "compra e venda");
        assert_eq!(json["valor"]["moeda"], "BRL");
        assert_eq!(json["alienantes"][0]["tipo_documento"], "CPF");
        assert!(json["adquirentes"].as_array().unwrap().is_empty());
    }
}
