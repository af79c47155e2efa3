//! Pure transition legality check: RBAC first, then the graph.

use thiserror::Error;

use crate::model::{allowed_roles, next_status, Action, Role, Status};

/// Why a transition was rejected. The two causes stay distinguishable so
/// callers and metrics can attribute errors correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionCheckError {
    #[error("role {role} is not permitted to perform {action}")]
    RoleNotPermitted { action: Action, role: Role },
    #[error("action {action} is not allowed from status {status}")]
    StatusNotPermitted { action: Action, status: Status },
}

/// Decide whether `role` may perform `action` on a shipment currently in
/// `current`. Pure function of its three inputs, no I/O.
pub fn check(current: Status, action: Action, role: Role) -> Result<(), TransitionCheckError> {
    if !allowed_roles(action).contains(&role) {
        return Err(TransitionCheckError::RoleNotPermitted { action, role });
    }
    if next_status(current, action).is_none() {
        return Err(TransitionCheckError::StatusNotPermitted {
            action,
            status: current,
        });
    }
    Ok(())
}
