use serde::{Deserialize, Serialize};

/// Lifecycle status of a shipment chat.
///
/// `Archived` and `Cancelled` are terminal: no action leads anywhere from
/// them. Every other status has at least one outgoing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Request,
    New,
    Receive,
    Reconcile,
    Pack,
    Merge,
    InTransit,
    OnDelivery,
    Delivered,
    Archived,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 11] = [
        Status::Request,
        Status::New,
        Status::Receive,
        Status::Reconcile,
        Status::Pack,
        Status::Merge,
        Status::InTransit,
        Status::OnDelivery,
        Status::Delivered,
        Status::Archived,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Request => "REQUEST",
            Status::New => "NEW",
            Status::Receive => "RECEIVE",
            Status::Reconcile => "RECONCILE",
            Status::Pack => "PACK",
            Status::Merge => "MERGE",
            Status::InTransit => "IN_TRANSIT",
            Status::OnDelivery => "ON_DELIVERY",
            Status::Delivered => "DELIVERED",
            Status::Archived => "ARCHIVED",
            Status::Cancelled => "CANCELLED",
        }
    }

    /// Terminal statuses admit no further actions.
    pub fn is_final(&self) -> bool {
        matches!(self, Status::Archived | Status::Cancelled)
    }

    /// Human-readable label for presentation layers. Must not be used to
    /// drive transition decisions.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Request => "Requested",
            Status::New => "New shipment",
            Status::Receive => "Goods received",
            Status::Reconcile => "Under reconciliation",
            Status::Pack => "Packing",
            Status::Merge => "Consolidation",
            Status::InTransit => "In transit",
            Status::OnDelivery => "Out for delivery",
            Status::Delivered => "Delivered",
            Status::Archived => "Archived",
            Status::Cancelled => "Cancelled",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Status::Request => "Customer request awaiting approval",
            Status::New => "Approved and waiting for goods to arrive",
            Status::Receive => "Goods checked in at the warehouse",
            Status::Reconcile => "Discrepancies are being resolved",
            Status::Pack => "Parcels are being configured and packed",
            Status::Merge => "Packed shipments are being consolidated",
            Status::InTransit => "Consolidated load is moving between hubs",
            Status::OnDelivery => "Arrived in the destination city, last mile",
            Status::Delivered => "Handed over to the recipient",
            Status::Archived => "Completed and archived",
            Status::Cancelled => "Cancelled before completion",
        }
    }

    /// Progress through the happy path, 0-100. Terminal statuses report
    /// the point at which the lifecycle ended.
    pub fn progress_percent(&self) -> u8 {
        match self {
            Status::Request => 0,
            Status::New => 10,
            Status::Receive => 25,
            Status::Reconcile => 35,
            Status::Pack => 50,
            Status::Merge => 60,
            Status::InTransit => 75,
            Status::OnDelivery => 90,
            Status::Delivered => 100,
            Status::Archived => 100,
            Status::Cancelled => 100,
        }
    }

    /// Display color (hex) for status badges.
    pub fn color(&self) -> &'static str {
        match self {
            Status::Request => "#9e9e9e",
            Status::New => "#2196f3",
            Status::Receive => "#03a9f4",
            Status::Reconcile => "#ff9800",
            Status::Pack => "#673ab7",
            Status::Merge => "#3f51b5",
            Status::InTransit => "#009688",
            Status::OnDelivery => "#00bcd4",
            Status::Delivered => "#4caf50",
            Status::Archived => "#607d8b",
            Status::Cancelled => "#f44336",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
