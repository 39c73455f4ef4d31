//! Structural validation of uploaded matrícula JSON.
//!
//! Walks the whole document and records every violation instead of stopping
//! at the first one, so a reviewer sees everything wrong with a file at once.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{EmptyRecordSetError, SchemaValidationError, Violation, ViolationKind};
use crate::{Amount, Matricula, Party, Property, Record};

/// Validate an untrusted JSON value against the matrícula shape.
pub fn validate(value: &Value) -> Result<Matricula, SchemaValidationError> {
    let mut v = Validator::default();
    let parsed = v.matricula(value);
    match parsed {
        Some(m) if v.violations.is_empty() => Ok(m),
        _ => {
            debug!(violations = v.violations.len(), "schema validation failed");
            Err(SchemaValidationError {
                violations: v.violations,
            })
        }
    }
}

/// Validate raw upload bytes. Bytes that are not JSON yield a single
/// root-level violation.
pub fn validate_bytes(bytes: &[u8]) -> Result<Matricula, SchemaValidationError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| SchemaValidationError {
        violations: vec![Violation {
            path: "$".into(),
            kind: ViolationKind::Unparseable(e.to_string()),
        }],
    })?;
    validate(&value)
}

/// Gate applied before a document is paginated for review.
pub fn ensure_reviewable(file_name: &str, matricula: &Matricula) -> Result<(), EmptyRecordSetError> {
    if matricula.records.is_empty() {
        return Err(EmptyRecordSetError {
            file_name: file_name.to_string(),
        });
    }
    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct Validator {
    path: Vec<String>,
    violations: Vec<Violation>,
}

impl Validator {
    fn location(&self) -> String {
        if self.path.is_empty() {
            "$".to_string()
        } else {
            self.path.join(".")
        }
    }

    fn report(&mut self, kind: ViolationKind) {
        let path = self.location();
        self.violations.push(Violation { path, kind });
    }

    fn mismatch(&mut self, expected: &'static str, found: &Value) {
        self.report(ViolationKind::TypeMismatch {
            expected,
            found: type_name(found),
        });
    }

    /// Run `check` on `obj[key]` with the path extended by `key`,
    /// reporting a missing field when absent.
    fn field<T>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        check: impl FnOnce(&mut Self, &Value) -> Option<T>,
    ) -> Option<T> {
        self.path.push(key.to_string());
        let out = match obj.get(key) {
            Some(value) => check(self, value),
            None => {
                self.report(ViolationKind::Missing);
                None
            }
        };
        self.path.pop();
        out
    }

    fn string(&mut self, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.mismatch("string", other);
                None
            }
        }
    }

    /// Numbers, or strings holding a finite number.
    fn number(&mut self, value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        };
        if parsed.is_none() {
            self.mismatch("number", value);
        }
        parsed
    }

    fn object<'a>(&mut self, value: &'a Value) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(obj) => Some(obj),
            other => {
                self.mismatch("object", other);
                None
            }
        }
    }

    fn list<T>(&mut self, value: &Value, mut item: impl FnMut(&mut Self, &Value) -> Option<T>) -> Option<Vec<T>> {
        let Value::Array(items) = value else {
            self.mismatch("array", value);
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        let mut complete = true;
        for (i, element) in items.iter().enumerate() {
            self.path.push(i.to_string());
            match item(self, element) {
                Some(parsed) => out.push(parsed),
                None => complete = false,
            }
            self.path.pop();
        }
        complete.then_some(out)
    }

    fn party(&mut self, value: &Value) -> Option<Party> {
        let obj = self.object(value)?;
        let name = self.field(obj, "nome", Self::string);
        let document = self.field(obj, "documento", Self::string);
        let document_type = self.field(obj, "tipo_documento", Self::string);
        Some(Party {
            name: name?,
            document: document?,
            document_type: document_type?,
        })
    }

    fn amount(&mut self, value: &Value) -> Option<Amount> {
        let obj = self.object(value)?;
        let amount = self.field(obj, "valor", Self::number);
        let currency = self.field(obj, "moeda", Self::string);
        Some(Amount {
            value: amount?,
            currency: currency?,
        })
    }

    fn record(&mut self, value: &Value) -> Option<Record> {
        let obj = self.object(value)?;
        let kind = self.field(obj, "tipo", Self::string);
        let amount = self.field(obj, "valor", Self::amount);
        let date = self.field(obj, "data", Self::string);
        let description = self.field(obj, "objeto", Self::string);
        let pct = self.field(obj, "pct", Self::number);
        let grantors = self.field(obj, "alienantes", |v, x| v.list(x, Self::party));
        let grantees = self.field(obj, "adquirentes", |v, x| v.list(x, Self::party));
        Some(Record {
            kind: kind?,
            amount: amount?,
            date: date?,
            description: description?,
            pct: pct?,
            grantors: grantors?,
            grantees: grantees?,
        })
    }

    fn property(&mut self, value: &Value) -> Option<Property> {
        let obj = self.object(value)?;
        let owners = self.field(obj, "proprietarios", |v, x| v.list(x, Self::party));
        let area = self.field(obj, "area", Self::number);
        let area_unit = self.field(obj, "area_unidade", Self::string);
        Some(Property {
            owners: owners?,
            area: area?,
            area_unit: area_unit?,
        })
    }

    fn matricula(&mut self, value: &Value) -> Option<Matricula> {
        let obj = self.object(value)?;
        let records = self.field(obj, "registros", |v, x| v.list(x, Self::record));
        let property = self.field(obj, "bem", Self::property);
        Some(Matricula {
            records: records?,
            property: property?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn party(name: &str) -> Value {
        json!({ "nome": name, "documento": "123.456.789-00", "tipo_documento": "CPF" })
    }

    fn record() -> Value {
        json!({
            "tipo": "compra e venda",
            "valor": { "valor": 150000.0, "moeda": "BRL" },
            "data": "2010-05-04",
            "objeto": "transmissão do imóvel",
            "pct": 100,
            "alienantes": [party("Ana")],
            "adquirentes": [party("Bruno"), party("Carla")]
        })
    }

    fn document(records: Vec<Value>) -> Value {
        json!({
            "registros": records,
            "bem": { "proprietarios": [party("Carla")], "area": "360.5", "area_unidade": "m2" }
        })
    }

    fn paths(err: &SchemaValidationError) -> Vec<&str> {
        err.violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn accepts_well_formed_document() {
        let m = validate(&document(vec![record(), record()])).unwrap();
        assert_eq!(m.records.len(), 2);
        assert_eq!(m.records[0].grantees[1].name, "Carla");
        assert_eq!(m.records[0].pct, 100.0);
        // numeric strings are coerced
        assert_eq!(m.property.area, 360.5);
    }

    #[test]
    fn reports_every_violation_in_one_pass() {
        let mut broken = record();
        broken.as_object_mut().unwrap().remove("tipo");
        broken["valor"]["moeda"] = json!(986);
        broken["alienantes"][0]["documento"] = json!(null);
        let mut doc = document(vec![record(), broken]);
        doc["bem"]["area"] = json!(true);

        let err = validate(&doc).unwrap_err();
        assert_eq!(
            paths(&err),
            vec![
                "registros.1.tipo",
                "registros.1.valor.moeda",
                "registros.1.alienantes.0.documento",
                "bem.area",
            ]
        );
        assert_eq!(err.violations[0].kind, ViolationKind::Missing);
        assert_eq!(
            err.violations[1].kind,
            ViolationKind::TypeMismatch {
                expected: "string",
                found: "number"
            }
        );
    }

    #[test]
    fn rejects_non_object_root() {
        let err = validate(&json!([1, 2])).unwrap_err();
        assert_eq!(paths(&err), vec!["$"]);
    }

    #[test]
    fn missing_top_level_fields_are_both_reported() {
        let err = validate(&json!({})).unwrap_err();
        assert_eq!(paths(&err), vec!["registros", "bem"]);
    }

    #[test]
    fn unparseable_bytes_are_a_schema_error() {
        let err = validate_bytes(b"{ not json").unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(matches!(err.violations[0].kind, ViolationKind::Unparseable(_)));
    }

    #[test]
    fn violation_messages_name_the_field() {
        let err = validate(&json!({ "registros": "x", "bem": {} })).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("registros: expected array, got string"), "{text}");
        assert!(text.contains("bem.area_unidade: field required"), "{text}");
    }

    #[test]
    fn empty_record_list_is_valid_but_not_reviewable() {
        let m = validate(&document(vec![])).unwrap();
        let err = ensure_reviewable("vazio.json", &m).unwrap_err();
        assert_eq!(err.file_name, "vazio.json");
    }
}
