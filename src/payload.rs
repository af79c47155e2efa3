//! Per-action payload contracts.
//!
//! `validate` turns the untyped JSON payload of an action request into a
//! typed `ActionPayload` variant or rejects it with a field-path-qualified
//! message. Validation is purely structural and never touches state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::Action;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    /// The action name itself is not recognized. Distinct from shape
    /// errors so callers and metrics can attribute the failure correctly.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("invalid payload at '{path}': {message}")]
    Invalid { path: String, message: String },
}

impl PayloadError {
    fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        PayloadError::Invalid {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub item: String,
    pub expected: u64,
    pub actual: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelSpec {
    pub label: String,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

/// Validated payload, one variant per action. Exhaustive matching over
/// this type keeps new actions from being silently ignored downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ActionPayload {
    #[serde(rename = "request.approve")]
    RequestApprove { note: Option<String> },
    #[serde(rename = "receive.full")]
    ReceiveFull { note: Option<String> },
    #[serde(rename = "receive.partial")]
    ReceivePartial {
        missing: Vec<MissingItem>,
        note: Option<String>,
    },
    #[serde(rename = "reconcile.create")]
    ReconcileCreate { discrepancies: Vec<Discrepancy> },
    #[serde(rename = "reconcile.resolve")]
    ReconcileResolve { resolution: String },
    #[serde(rename = "pack.configure")]
    PackConfigure { parcels: Vec<ParcelSpec> },
    #[serde(rename = "pack.complete")]
    PackComplete { note: Option<String> },
    #[serde(rename = "merge.attach")]
    MergeAttach { child_chat_id: i64 },
    #[serde(rename = "merge.complete")]
    MergeComplete { note: Option<String> },
    #[serde(rename = "arrival.city")]
    ArrivalCity {
        city: String,
        hub: Option<String>,
        eta: Option<String>,
    },
    #[serde(rename = "handover.confirm")]
    HandoverConfirm {
        recipient: String,
        note: Option<String>,
    },
    #[serde(rename = "cancel")]
    Cancel { reason: String },
    #[serde(rename = "archive")]
    Archive { note: Option<String> },
}

/// Validate a raw payload against the schema of a known action.
pub fn validate(action: Action, raw: &Value) -> Result<ActionPayload, PayloadError> {
    let empty = Map::new();
    let map = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => return Err(PayloadError::invalid("payload", "expected a JSON object")),
    };

    match action {
        Action::RequestApprove => Ok(ActionPayload::RequestApprove {
            note: opt_string(map, "note", 500)?,
        }),
        Action::ReceiveFull => Ok(ActionPayload::ReceiveFull {
            note: opt_string(map, "note", 500)?,
        }),
        Action::ReceivePartial => Ok(ActionPayload::ReceivePartial {
            missing: missing_items(map)?,
            note: opt_string(map, "note", 500)?,
        }),
        Action::ReconcileCreate => Ok(ActionPayload::ReconcileCreate {
            discrepancies: discrepancies(map)?,
        }),
        Action::ReconcileResolve => Ok(ActionPayload::ReconcileResolve {
            resolution: req_string(map, "resolution", 1000)?,
        }),
        Action::PackConfigure => Ok(ActionPayload::PackConfigure {
            parcels: parcels(map)?,
        }),
        Action::PackComplete => Ok(ActionPayload::PackComplete {
            note: opt_string(map, "note", 500)?,
        }),
        Action::MergeAttach => Ok(ActionPayload::MergeAttach {
            child_chat_id: req_positive_i64(map, "child_chat_id")?,
        }),
        Action::MergeComplete => Ok(ActionPayload::MergeComplete {
            note: opt_string(map, "note", 500)?,
        }),
        Action::ArrivalCity => Ok(ActionPayload::ArrivalCity {
            city: req_string(map, "city", 120)?,
            hub: opt_string(map, "hub", 120)?,
            eta: opt_string(map, "eta", 64)?,
        }),
        Action::HandoverConfirm => Ok(ActionPayload::HandoverConfirm {
            recipient: req_string(map, "recipient", 200)?,
            note: opt_string(map, "note", 500)?,
        }),
        Action::Cancel => Ok(ActionPayload::Cancel {
            reason: req_string(map, "reason", 500)?,
        }),
        Action::Archive => Ok(ActionPayload::Archive {
            note: opt_string(map, "note", 500)?,
        }),
    }
}

/// Validate against an action referenced by wire name. Unrecognized names
/// yield `PayloadError::UnknownAction`.
pub fn validate_named(name: &str, raw: &Value) -> Result<(Action, ActionPayload), PayloadError> {
    let action =
        Action::parse(name).ok_or_else(|| PayloadError::UnknownAction(name.to_string()))?;
    let payload = validate(action, raw)?;
    Ok((action, payload))
}

fn missing_items(map: &Map<String, Value>) -> Result<Vec<MissingItem>, PayloadError> {
    let entries = req_array(map, "missing")?;
    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let path = format!("missing[{index}]");
        let entry = entry_object(entry, &path)?;
        items.push(MissingItem {
            name: req_string_at(entry, &path, "name", 200)?,
            quantity: req_quantity(entry, &path, "quantity")?,
        });
    }
    Ok(items)
}

fn discrepancies(map: &Map<String, Value>) -> Result<Vec<Discrepancy>, PayloadError> {
    let entries = req_array(map, "discrepancies")?;
    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let path = format!("discrepancies[{index}]");
        let entry = entry_object(entry, &path)?;
        out.push(Discrepancy {
            item: req_string_at(entry, &path, "item", 200)?,
            expected: req_count(entry, &path, "expected")?,
            actual: req_count(entry, &path, "actual")?,
            note: opt_string_at(entry, &path, "note", 500)?,
        });
    }
    Ok(out)
}

fn parcels(map: &Map<String, Value>) -> Result<Vec<ParcelSpec>, PayloadError> {
    let entries = req_array(map, "parcels")?;
    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let path = format!("parcels[{index}]");
        let entry = entry_object(entry, &path)?;
        let weight_path = format!("{path}.weight_kg");
        let weight_kg = match entry.get("weight_kg") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(_) => return Err(PayloadError::invalid(weight_path, "expected a number")),
            None => return Err(PayloadError::invalid(weight_path, "is required")),
        };
        if weight_kg <= 0.0 {
            return Err(PayloadError::invalid(weight_path, "must be greater than zero"));
        }
        let items = match entry.get("items") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => {
                let mut items = Vec::with_capacity(values.len());
                for (item_index, value) in values.iter().enumerate() {
                    let item_path = format!("{path}.items[{item_index}]");
                    match value {
                        Value::String(s) if s.chars().count() <= 200 => items.push(s.clone()),
                        Value::String(_) => {
                            return Err(PayloadError::invalid(
                                item_path,
                                "must be at most 200 characters",
                            ))
                        }
                        _ => return Err(PayloadError::invalid(item_path, "expected a string")),
                    }
                }
                items
            }
            Some(_) => {
                return Err(PayloadError::invalid(format!("{path}.items"), "expected an array"))
            }
        };
        out.push(ParcelSpec {
            label: req_string_at(entry, &path, "label", 120)?,
            weight_kg,
            items,
        });
    }
    Ok(out)
}

fn entry_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, PayloadError> {
    value
        .as_object()
        .ok_or_else(|| PayloadError::invalid(path, "expected an object"))
}

fn req_array<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a Vec<Value>, PayloadError> {
    match map.get(field) {
        Some(Value::Array(entries)) if !entries.is_empty() => Ok(entries),
        Some(Value::Array(_)) => Err(PayloadError::invalid(field, "must not be empty")),
        Some(_) => Err(PayloadError::invalid(field, "expected an array")),
        None => Err(PayloadError::invalid(field, "is required")),
    }
}

fn req_string(map: &Map<String, Value>, field: &str, max: usize) -> Result<String, PayloadError> {
    req_string_inner(map, field.to_string(), field, max)
}

fn req_string_at(
    map: &Map<String, Value>,
    path: &str,
    field: &str,
    max: usize,
) -> Result<String, PayloadError> {
    req_string_inner(map, format!("{path}.{field}"), field, max)
}

fn req_string_inner(
    map: &Map<String, Value>,
    path: String,
    field: &str,
    max: usize,
) -> Result<String, PayloadError> {
    match map.get(field) {
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                Err(PayloadError::invalid(path, "must not be empty"))
            } else if s.chars().count() > max {
                Err(PayloadError::invalid(
                    path,
                    format!("must be at most {max} characters"),
                ))
            } else {
                Ok(s.clone())
            }
        }
        Some(_) => Err(PayloadError::invalid(path, "expected a string")),
        None => Err(PayloadError::invalid(path, "is required")),
    }
}

fn opt_string(
    map: &Map<String, Value>,
    field: &str,
    max: usize,
) -> Result<Option<String>, PayloadError> {
    opt_string_inner(map, field.to_string(), field, max)
}

fn opt_string_at(
    map: &Map<String, Value>,
    path: &str,
    field: &str,
    max: usize,
) -> Result<Option<String>, PayloadError> {
    opt_string_inner(map, format!("{path}.{field}"), field, max)
}

fn opt_string_inner(
    map: &Map<String, Value>,
    path: String,
    field: &str,
    max: usize,
) -> Result<Option<String>, PayloadError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.chars().count() <= max => Ok(Some(s.clone())),
        Some(Value::String(_)) => Err(PayloadError::invalid(
            path,
            format!("must be at most {max} characters"),
        )),
        Some(_) => Err(PayloadError::invalid(path, "expected a string")),
    }
}

fn req_positive_i64(map: &Map<String, Value>, field: &str) -> Result<i64, PayloadError> {
    match map.get(field) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(value) if value > 0 => Ok(value),
            _ => Err(PayloadError::invalid(field, "must be a positive integer")),
        },
        Some(_) => Err(PayloadError::invalid(field, "expected an integer")),
        None => Err(PayloadError::invalid(field, "is required")),
    }
}

fn req_quantity(map: &Map<String, Value>, path: &str, field: &str) -> Result<u32, PayloadError> {
    let full_path = format!("{path}.{field}");
    match map.get(field) {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(value) if (1..=u32::MAX as u64).contains(&value) => Ok(value as u32),
            _ => Err(PayloadError::invalid(full_path, "must be at least 1")),
        },
        Some(_) => Err(PayloadError::invalid(full_path, "expected an integer")),
        None => Err(PayloadError::invalid(full_path, "is required")),
    }
}

fn req_count(map: &Map<String, Value>, path: &str, field: &str) -> Result<u64, PayloadError> {
    let full_path = format!("{path}.{field}");
    match map.get(field) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| PayloadError::invalid(&full_path, "must be a non-negative integer")),
        Some(_) => Err(PayloadError::invalid(full_path, "expected an integer")),
        None => Err(PayloadError::invalid(full_path, "is required")),
    }
}
