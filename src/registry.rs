//! Record-type registry.
//!
//! Maps each clinical record type to a structural validator for its
//! payload. The registry is an explicitly constructed lookup table,
//! injected wherever payloads are validated, so tests can substitute it.
//!
//! The numeric ranges here are the contract's only safety check against
//! malformed clinical data entering the store — they must not drift.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::record::RecordType;

/// Field-level validation report, keyed by payload field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationFailure {
    fn single(field: &str, message: &str) -> Self {
        let mut field_errors = BTreeMap::new();
        field_errors.insert(field.to_string(), vec![message.to_string()]);
        Self { field_errors }
    }
}

type Validator = fn(&Value) -> Result<Value, ValidationFailure>;

/// Lookup table from record type to payload validator. Validators
/// return a normalized payload: unknown fields stripped, defaults
/// applied.
pub struct RecordTypeRegistry {
    validators: HashMap<RecordType, Validator>,
}

impl RecordTypeRegistry {
    /// The standard clinical registry covering all eight record types.
    pub fn standard() -> Self {
        let mut validators: HashMap<RecordType, Validator> = HashMap::new();
        validators.insert(RecordType::Vitals, validate_vitals);
        validators.insert(RecordType::VisitNote, validate_visit_note);
        validators.insert(RecordType::Diagnosis, validate_diagnosis);
        validators.insert(RecordType::LabResult, validate_lab_result);
        validators.insert(RecordType::Medication, validate_medication);
        validators.insert(RecordType::Immunization, validate_immunization);
        validators.insert(RecordType::Allergy, validate_allergy);
        validators.insert(RecordType::Attachment, validate_attachment);
        Self { validators }
    }

    pub fn validate(
        &self,
        record_type: RecordType,
        payload: &Value,
    ) -> Result<Value, ValidationFailure> {
        match self.validators.get(&record_type) {
            Some(validator) => validator(payload),
            None => Err(ValidationFailure::single(
                "type",
                &format!("no validator registered for '{}'", record_type.as_str()),
            )),
        }
    }
}

// ── Field checker ────────────────────────────────────────────

/// Accumulates field errors while copying accepted fields into a
/// normalized output object.
struct Checker<'a> {
    obj: &'a Map<String, Value>,
    out: Map<String, Value>,
    errors: BTreeMap<String, Vec<String>>,
}

impl<'a> Checker<'a> {
    fn new(payload: &'a Value) -> Result<Self, ValidationFailure> {
        let obj = payload
            .as_object()
            .ok_or_else(|| ValidationFailure::single("payload", "expected an object"))?;
        Ok(Self {
            obj,
            out: Map::new(),
            errors: BTreeMap::new(),
        })
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_default().push(message.into());
    }

    fn require_int(&mut self, field: &str, min: i64, max: i64) {
        match self.obj.get(field).and_then(as_integral) {
            Some(n) if (min..=max).contains(&n) => {
                self.out.insert(field.into(), Value::from(n));
            }
            Some(n) => self.fail(field, format!("must be between {min} and {max}, got {n}")),
            None => self.fail(field, "required integer"),
        }
    }

    fn require_number(&mut self, field: &str, min: f64, max: f64) {
        match self.obj.get(field).and_then(Value::as_f64) {
            Some(n) if n >= min && n <= max => {
                self.out.insert(field.into(), self.obj[field].clone());
            }
            Some(n) => self.fail(field, format!("must be between {min} and {max}, got {n}")),
            None => self.fail(field, "required number"),
        }
    }

    fn require_string(&mut self, field: &str) {
        match self.obj.get(field).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => {
                self.out.insert(field.into(), Value::from(s));
            }
            Some(_) => self.fail(field, "must not be empty"),
            None => self.fail(field, "required string"),
        }
    }

    fn optional_string(&mut self, field: &str) {
        match self.obj.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => {
                self.out.insert(field.into(), Value::from(s.as_str()));
            }
            Some(_) => self.fail(field, "must be a string"),
        }
    }

    fn optional_enum(&mut self, field: &str, allowed: &[&str]) {
        match self.obj.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if allowed.contains(&s.as_str()) => {
                self.out.insert(field.into(), Value::from(s.as_str()));
            }
            Some(_) => self.fail(field, format!("must be one of {allowed:?}")),
        }
    }

    fn string_default(&mut self, field: &str, default: &str) {
        match self.obj.get(field) {
            None | Some(Value::Null) => {
                self.out.insert(field.into(), Value::from(default));
            }
            Some(Value::String(s)) if !s.is_empty() => {
                self.out.insert(field.into(), Value::from(s.as_str()));
            }
            Some(_) => self.fail(field, "must be a non-empty string"),
        }
    }

    fn require_date(&mut self, field: &str) {
        match self.obj.get(field).and_then(Value::as_str) {
            Some(s) if is_date_like(s) => {
                self.out.insert(field.into(), Value::from(s));
            }
            Some(_) => self.fail(field, "must be an ISO date"),
            None => self.fail(field, "required date"),
        }
    }

    fn optional_date(&mut self, field: &str) {
        match self.obj.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if is_date_like(s) => {
                self.out.insert(field.into(), Value::from(s.as_str()));
            }
            Some(_) => self.fail(field, "must be an ISO date"),
        }
    }

    fn require_uint(&mut self, field: &str) {
        match self.obj.get(field).and_then(as_integral) {
            Some(n) if n >= 0 => {
                self.out.insert(field.into(), Value::from(n));
            }
            Some(_) => self.fail(field, "must be >= 0"),
            None => self.fail(field, "required integer"),
        }
    }

    fn finish(self) -> Result<Value, ValidationFailure> {
        if self.errors.is_empty() {
            Ok(Value::Object(self.out))
        } else {
            Err(ValidationFailure {
                field_errors: self.errors,
            })
        }
    }
}

/// Read a JSON number as an integer, tolerating whole-valued floats
/// (`80.0` counts as `80`; `80.5` does not).
fn as_integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(f))
            .map(|f| f as i64)
    })
}

fn is_date_like(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// ── Per-type validators ──────────────────────────────────────

fn validate_vitals(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_int("heartRate", 20, 260);
    c.require_int("systolic", 50, 260);
    c.require_int("diastolic", 30, 200);
    c.require_number("tempC", 30.0, 45.0);
    c.require_number("spo2", 50.0, 100.0);
    c.finish()
}

fn validate_visit_note(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_string("chiefComplaint");
    c.optional_string("history");
    c.optional_string("exam");
    c.optional_string("plan");
    c.finish()
}

fn validate_diagnosis(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_string("code");
    c.string_default("system", "ICD-10");
    c.optional_string("display");
    c.optional_enum("clinicalStatus", &["active", "remission", "resolved"]);
    c.finish()
}

fn validate_lab_result(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_string("testName");
    c.require_number("value", f64::MIN, f64::MAX);
    c.optional_string("unit");
    c.optional_string("refRange");
    c.optional_enum("abnormal", &["H", "L", "N"]);
    c.finish()
}

fn validate_medication(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_string("name");
    c.optional_string("dose");
    c.optional_string("route");
    c.optional_string("frequency");
    c.optional_date("startDate");
    c.optional_date("endDate");
    c.finish()
}

fn validate_immunization(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_string("vaccine");
    c.require_date("date");
    c.optional_string("lot");
    c.finish()
}

fn validate_allergy(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_string("substance");
    c.optional_string("reaction");
    c.optional_enum("severity", &["mild", "moderate", "severe"]);
    c.finish()
}

fn validate_attachment(payload: &Value) -> Result<Value, ValidationFailure> {
    let mut c = Checker::new(payload)?;
    c.require_string("filename");
    c.require_string("mime");
    c.require_uint("size");
    c.optional_string("url");
    c.optional_string("sha256");
    c.finish()
}
