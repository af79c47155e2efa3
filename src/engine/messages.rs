//! Derived human text and system-message payloads.
//!
//! Both are deterministic functions of (action, from, to, validated
//! payload) so a replayed transition produces an identical message body.

use serde_json::{json, Value};

use crate::model::{Action, Status};
use crate::payload::ActionPayload;

/// Human-readable reason stored on the audit row.
pub fn derive_reason(payload: &ActionPayload) -> String {
    match payload {
        ActionPayload::RequestApprove { .. } => "Shipment request approved".to_string(),
        ActionPayload::ReceiveFull { .. } => "Goods received in full".to_string(),
        ActionPayload::ReceivePartial { missing, .. } => {
            format!("Goods received partially, {} item(s) missing", missing.len())
        }
        ActionPayload::ReconcileCreate { discrepancies } => format!(
            "Reconciliation opened with {} discrepanc{}",
            discrepancies.len(),
            if discrepancies.len() == 1 { "y" } else { "ies" }
        ),
        ActionPayload::ReconcileResolve { .. } => "Reconciliation resolved".to_string(),
        ActionPayload::PackConfigure { parcels } => {
            format!("Parcel configuration updated ({} parcel(s))", parcels.len())
        }
        ActionPayload::PackComplete { .. } => "Packing completed".to_string(),
        ActionPayload::MergeAttach { child_chat_id } => {
            format!("Shipment {child_chat_id} attached for consolidation")
        }
        ActionPayload::MergeComplete { .. } => "Consolidation completed, load in transit".to_string(),
        ActionPayload::ArrivalCity { city, .. } => format!("Arrived in {city}"),
        ActionPayload::HandoverConfirm { recipient, .. } => {
            format!("Handover confirmed by {recipient}")
        }
        ActionPayload::Cancel { reason } => format!("Cancelled: {reason}"),
        ActionPayload::Archive { .. } => "Shipment archived".to_string(),
    }
}

/// Structured payload of the system message emitted on a status change.
/// Shape is action-specific; every shape carries event/from/to.
pub fn system_payload(action: Action, from: Status, to: Status, payload: &ActionPayload) -> Value {
    let mut body = json!({
        "event": action.as_str(),
        "from": from,
        "to": to,
    });
    let extra = match payload {
        ActionPayload::ReceivePartial { missing, note } => json!({
            "missing": missing,
            "note": note,
        }),
        ActionPayload::ReconcileCreate { discrepancies } => json!({
            "discrepancies": discrepancies,
        }),
        ActionPayload::ReconcileResolve { resolution } => json!({
            "resolution": resolution,
        }),
        ActionPayload::PackComplete { note } => json!({
            "note": note,
        }),
        ActionPayload::MergeComplete { note } => json!({
            "note": note,
        }),
        ActionPayload::ArrivalCity { city, hub, eta } => json!({
            "city": city,
            "hub": hub,
            "eta": eta,
        }),
        ActionPayload::HandoverConfirm { recipient, note } => json!({
            "recipient": recipient,
            "note": note,
        }),
        ActionPayload::Cancel { reason } => json!({
            "reason": reason,
        }),
        ActionPayload::RequestApprove { note }
        | ActionPayload::ReceiveFull { note }
        | ActionPayload::Archive { note } => json!({
            "note": note,
        }),
        // No-change actions never emit system messages, but keep the
        // builder total over the payload type.
        ActionPayload::PackConfigure { parcels } => json!({
            "parcels": parcels.len(),
        }),
        ActionPayload::MergeAttach { child_chat_id } => json!({
            "child_chat_id": child_chat_id,
        }),
    };
    if let (Some(body_map), Some(extra_map)) = (body.as_object_mut(), extra.as_object()) {
        for (key, value) in extra_map {
            body_map.insert(key.clone(), value.clone());
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn receive_partial_embeds_missing_items() {
        let payload = ActionPayload::ReceivePartial {
            missing: vec![crate::payload::MissingItem {
                name: "SKU-1".to_string(),
                quantity: 2,
            }],
            note: None,
        };
        let body = system_payload(
            Action::ReceivePartial,
            Status::New,
            Status::Receive,
            &payload,
        );
        assert_eq!(body["event"], "receive.partial");
        assert_eq!(body["from"], "NEW");
        assert_eq!(body["to"], "RECEIVE");
        assert_eq!(body["missing"], json!([{"name": "SKU-1", "quantity": 2}]));
    }

    #[test]
    fn arrival_city_embeds_city_hub_eta() {
        let payload = ActionPayload::ArrivalCity {
            city: "Astana".to_string(),
            hub: Some("hub-1".to_string()),
            eta: Some("2d".to_string()),
        };
        let body = system_payload(
            Action::ArrivalCity,
            Status::InTransit,
            Status::OnDelivery,
            &payload,
        );
        assert_eq!(body["city"], "Astana");
        assert_eq!(body["hub"], "hub-1");
        assert_eq!(body["eta"], "2d");
    }

    #[test]
    fn builder_is_deterministic() {
        let payload = ActionPayload::Cancel {
            reason: "duplicate".to_string(),
        };
        let a = system_payload(Action::Cancel, Status::New, Status::Cancelled, &payload);
        let b = system_payload(Action::Cancel, Status::New, Status::Cancelled, &payload);
        assert_eq!(a, b);
        assert_eq!(derive_reason(&payload), "Cancelled: duplicate");
    }
}
