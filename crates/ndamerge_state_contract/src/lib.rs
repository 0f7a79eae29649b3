use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

pub const CONTRACT_ID: &str = "ndamerge.state_contract";
pub const CONTRACT_VERSION: &str = "1";

/// Tag shown when the prediction lands below the final cutoff.
pub const NEGATIVE_OUTCOME_TAG: &str = "NOT SELECTED ❌";
pub const NEGATIVE_OUTCOME_COLOR: &str = "#F44336";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Flag,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Flag => "flag",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Text(&'static str),
    Integer(i64),
    Flag(bool),
}

impl FieldDefault {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldDefault::Text(_) => FieldKind::Text,
            FieldDefault::Integer(_) => FieldKind::Integer,
            FieldDefault::Flag(_) => FieldKind::Flag,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldDefault::Text(v) => Value::String((*v).to_string()),
            FieldDefault::Integer(v) => Value::from(*v),
            FieldDefault::Flag(v) => Value::Bool(*v),
        }
    }

    /// JavaScript source literal for this default.
    pub fn to_js_literal(&self) -> String {
        self.to_json().to_string()
    }
}

/// Who fills a field when the lead form is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProducer {
    /// Collected directly from the form inputs.
    Form,
    /// Produced by the external scoring engine.
    Scoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub default: FieldDefault,
    pub producer: FieldProducer,
}

impl FieldDef {
    pub fn kind(&self) -> FieldKind {
        self.default.kind()
    }
}

pub const FIELDS_V1: [FieldDef; 15] = [
    FieldDef { name: "name", default: FieldDefault::Text("Cadet"), producer: FieldProducer::Form },
    FieldDef { name: "math", default: FieldDefault::Integer(0), producer: FieldProducer::Scoring },
    FieldDef { name: "gat", default: FieldDefault::Integer(0), producer: FieldProducer::Scoring },
    FieldDef { name: "written", default: FieldDefault::Integer(0), producer: FieldProducer::Scoring },
    FieldDef { name: "ssb", default: FieldDefault::Integer(0), producer: FieldProducer::Scoring },
    FieldDef { name: "total", default: FieldDefault::Integer(0), producer: FieldProducer::Scoring },
    FieldDef { name: "airMin", default: FieldDefault::Integer(1001), producer: FieldProducer::Scoring },
    FieldDef { name: "airMax", default: FieldDefault::Integer(9999), producer: FieldProducer::Scoring },
    FieldDef { name: "prob", default: FieldDefault::Integer(5), producer: FieldProducer::Scoring },
    FieldDef { name: "tag", default: FieldDefault::Text(NEGATIVE_OUTCOME_TAG), producer: FieldProducer::Scoring },
    FieldDef { name: "color", default: FieldDefault::Text(NEGATIVE_OUTCOME_COLOR), producer: FieldProducer::Scoring },
    FieldDef { name: "sectOk", default: FieldDefault::Flag(false), producer: FieldProducer::Scoring },
    FieldDef { name: "mathPass", default: FieldDefault::Flag(false), producer: FieldProducer::Scoring },
    FieldDef { name: "gatPass", default: FieldDefault::Flag(false), producer: FieldProducer::Scoring },
    FieldDef { name: "age", default: FieldDefault::Integer(17), producer: FieldProducer::Form },
];

pub fn fields() -> &'static [FieldDef] {
    &FIELDS_V1
}

pub fn field(name: &str) -> Option<&'static FieldDef> {
    FIELDS_V1.iter().find(|def| def.name == name)
}

pub fn is_field(name: &str) -> bool {
    field(name).is_some()
}

pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELDS_V1.iter().map(|def| def.name)
}

static DEFAULTS_JSON: OnceLock<Value> = OnceLock::new();
static CONTRACT_FINGERPRINT: OnceLock<String> = OnceLock::new();

/// Defaults as a JSON object, keys in contract order.
pub fn defaults_json() -> &'static Value {
    DEFAULTS_JSON.get_or_init(|| {
        let mut map = Map::new();
        for def in &FIELDS_V1 {
            map.insert(def.name.to_string(), def.default.to_json());
        }
        Value::Object(map)
    })
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn canonical_contract_text() -> String {
    let mut out = format!("{CONTRACT_ID}@{CONTRACT_VERSION}\n");
    for def in &FIELDS_V1 {
        out.push_str(def.name);
        out.push('\t');
        out.push_str(def.kind().as_str());
        out.push('\t');
        out.push_str(&def.default.to_js_literal());
        out.push('\t');
        out.push_str(match def.producer {
            FieldProducer::Form => "form",
            FieldProducer::Scoring => "scoring",
        });
        out.push('\n');
    }
    out
}

pub fn contract_fingerprint_sha256() -> String {
    CONTRACT_FINGERPRINT
        .get_or_init(|| hex_sha256(canonical_contract_text().as_bytes()))
        .clone()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_sha256(bytes)
}

#[derive(Debug, Clone)]
pub struct StateContractMetadata {
    pub contract_id: &'static str,
    pub contract_version: &'static str,
    pub contract_fingerprint_sha256: String,
    pub field_count: usize,
}

pub fn metadata() -> StateContractMetadata {
    StateContractMetadata {
        contract_id: CONTRACT_ID,
        contract_version: CONTRACT_VERSION,
        contract_fingerprint_sha256: contract_fingerprint_sha256(),
        field_count: FIELDS_V1.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_unique() {
        let mut names: Vec<&str> = field_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FIELDS_V1.len());
    }

    #[test]
    fn defaults_match_handoff_table() {
        let defaults = defaults_json();
        assert_eq!(defaults["name"], "Cadet");
        assert_eq!(defaults["math"], 0);
        assert_eq!(defaults["total"], 0);
        assert_eq!(defaults["airMin"], 1001);
        assert_eq!(defaults["airMax"], 9999);
        assert_eq!(defaults["prob"], 5);
        assert_eq!(defaults["tag"], NEGATIVE_OUTCOME_TAG);
        assert_eq!(defaults["color"], NEGATIVE_OUTCOME_COLOR);
        assert_eq!(defaults["sectOk"], false);
        assert_eq!(defaults["gatPass"], false);
        assert_eq!(defaults["age"], 17);
    }

    #[test]
    fn defaults_json_keeps_contract_order() {
        let keys: Vec<&str> = defaults_json()
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        let expected: Vec<&str> = field_names().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = contract_fingerprint_sha256();
        let b = contract_fingerprint_sha256();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn js_literals_are_valid_json_scalars() {
        assert_eq!(field("tag").expect("tag").default.to_js_literal(), "\"NOT SELECTED ❌\"");
        assert_eq!(field("airMax").expect("airMax").default.to_js_literal(), "9999");
        assert_eq!(field("sectOk").expect("sectOk").default.to_js_literal(), "false");
        assert!(field("window").is_none());
    }
}
