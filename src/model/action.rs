use serde::{Deserialize, Serialize};

/// The fixed set of operations a role may attempt against a shipment chat.
///
/// Wire names use the dotted `group.verb` form (`receive.full`); the enum
/// serializes to exactly those strings so action rows and system messages
/// round-trip through JSON unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "request.approve")]
    RequestApprove,
    #[serde(rename = "receive.full")]
    ReceiveFull,
    #[serde(rename = "receive.partial")]
    ReceivePartial,
    #[serde(rename = "reconcile.create")]
    ReconcileCreate,
    #[serde(rename = "reconcile.resolve")]
    ReconcileResolve,
    #[serde(rename = "pack.configure")]
    PackConfigure,
    #[serde(rename = "pack.complete")]
    PackComplete,
    #[serde(rename = "merge.attach")]
    MergeAttach,
    #[serde(rename = "merge.complete")]
    MergeComplete,
    #[serde(rename = "arrival.city")]
    ArrivalCity,
    #[serde(rename = "handover.confirm")]
    HandoverConfirm,
    #[serde(rename = "cancel")]
    Cancel,
    #[serde(rename = "archive")]
    Archive,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::RequestApprove,
        Action::ReceiveFull,
        Action::ReceivePartial,
        Action::ReconcileCreate,
        Action::ReconcileResolve,
        Action::PackConfigure,
        Action::PackComplete,
        Action::MergeAttach,
        Action::MergeComplete,
        Action::ArrivalCity,
        Action::HandoverConfirm,
        Action::Cancel,
        Action::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::RequestApprove => "request.approve",
            Action::ReceiveFull => "receive.full",
            Action::ReceivePartial => "receive.partial",
            Action::ReconcileCreate => "reconcile.create",
            Action::ReconcileResolve => "reconcile.resolve",
            Action::PackConfigure => "pack.configure",
            Action::PackComplete => "pack.complete",
            Action::MergeAttach => "merge.attach",
            Action::MergeComplete => "merge.complete",
            Action::ArrivalCity => "arrival.city",
            Action::HandoverConfirm => "handover.confirm",
            Action::Cancel => "cancel",
            Action::Archive => "archive",
        }
    }

    /// Parse a wire name. Returns `None` for unrecognized names; callers
    /// surface that as a distinct unknown-action error, not a shape error.
    pub fn parse(name: &str) -> Option<Action> {
        Action::ALL.iter().copied().find(|a| a.as_str() == name)
    }

    /// Human-readable label for presentation layers.
    pub fn label(&self) -> &'static str {
        match self {
            Action::RequestApprove => "Approve request",
            Action::ReceiveFull => "Receive in full",
            Action::ReceivePartial => "Receive partially",
            Action::ReconcileCreate => "Open reconciliation",
            Action::ReconcileResolve => "Resolve reconciliation",
            Action::PackConfigure => "Configure parcels",
            Action::PackComplete => "Complete packing",
            Action::MergeAttach => "Attach to consolidation",
            Action::MergeComplete => "Complete consolidation",
            Action::ArrivalCity => "Register city arrival",
            Action::HandoverConfirm => "Confirm handover",
            Action::Cancel => "Cancel shipment",
            Action::Archive => "Archive shipment",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::parse(action.as_str()), Some(action));
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
            let back: Action = serde_json::from_str(&json).unwrap();
            assert_eq!(back, action);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(Action::parse("receive.bogus"), None);
        assert_eq!(Action::parse(""), None);
    }
}
