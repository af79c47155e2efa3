//! The compiled-in transition graph and RBAC matrix.
//!
//! Both are total functions over fixed enums, implemented as exhaustive
//! matches so adding an action or status without wiring it here fails to
//! compile. There is no runtime mutation API.

use super::{Action, Role, Status};

/// Target status for `(status, action)`, or `None` when the action is
/// illegal from that status regardless of role.
///
/// `Some(status)` with an unchanged status encodes the no-status-change
/// actions (`pack.configure` from PACK, `merge.attach` from MERGE): legal
/// to invoke, but they leave the shipment where it is.
pub fn next_status(status: Status, action: Action) -> Option<Status> {
    use Action::*;
    use Status::*;
    match (status, action) {
        (Request, RequestApprove) => Some(New),
        (New, ReceiveFull) | (New, ReceivePartial) => Some(Receive),
        (Receive, ReconcileCreate) => Some(Reconcile),
        (Reconcile, ReconcileResolve) => Some(Pack),
        (Pack, PackConfigure) => Some(Pack),
        (Pack, PackComplete) => Some(Merge),
        (Merge, MergeAttach) => Some(Merge),
        (Merge, MergeComplete) => Some(InTransit),
        (InTransit, ArrivalCity) => Some(OnDelivery),
        (OnDelivery, HandoverConfirm) => Some(Delivered),
        (Delivered, Archive) => Some(Archived),
        // Delivered shipments are archived, not cancelled.
        (s, Cancel) if !s.is_final() && s != Delivered => Some(Cancelled),
        _ => None,
    }
}

/// Roles permitted to attempt an action. Every action has a non-empty set.
pub fn allowed_roles(action: Action) -> &'static [Role] {
    const EVERYONE: &[Role] = &[Role::User, Role::Admin, Role::SuperAdmin];
    const STAFF: &[Role] = &[Role::Admin, Role::SuperAdmin];
    const SUPER_ONLY: &[Role] = &[Role::SuperAdmin];
    match action {
        Action::HandoverConfirm | Action::Cancel => EVERYONE,
        Action::Archive => SUPER_ONLY,
        _ => STAFF,
    }
}

/// Actions the given role can usefully trigger from the given status.
///
/// An action is listed when the role is permitted and the graph yields a
/// target *different* from the current status. Actions that are legal but
/// leave the status unchanged (`pack.configure`, `merge.attach`) are
/// deliberately excluded from listings while remaining independently
/// invocable; presentation layers surface those through dedicated screens.
pub fn available_actions(status: Status, role: Role) -> Vec<Action> {
    Action::ALL
        .iter()
        .copied()
        .filter(|action| allowed_roles(*action).contains(&role))
        .filter(|action| matches!(next_status(status, *action), Some(next) if next != status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn happy_path_walks_to_delivered() {
        let steps = [
            (Status::Request, Action::RequestApprove, Status::New),
            (Status::New, Action::ReceiveFull, Status::Receive),
            (Status::Receive, Action::ReconcileCreate, Status::Reconcile),
            (Status::Reconcile, Action::ReconcileResolve, Status::Pack),
            (Status::Pack, Action::PackComplete, Status::Merge),
            (Status::Merge, Action::MergeComplete, Status::InTransit),
            (Status::InTransit, Action::ArrivalCity, Status::OnDelivery),
            (Status::OnDelivery, Action::HandoverConfirm, Status::Delivered),
            (Status::Delivered, Action::Archive, Status::Archived),
        ];
        for (from, action, to) in steps {
            assert_eq!(next_status(from, action), Some(to), "{from} --{action}-->");
        }
    }

    #[test]
    fn terminal_statuses_admit_nothing() {
        for action in Action::ALL {
            assert_eq!(next_status(Status::Archived, action), None);
            assert_eq!(next_status(Status::Cancelled, action), None);
        }
    }

    #[test]
    fn cancel_reaches_every_active_status_except_delivered() {
        for status in Status::ALL {
            let expected = if status.is_final() || status == Status::Delivered {
                None
            } else {
                Some(Status::Cancelled)
            };
            assert_eq!(next_status(status, Action::Cancel), expected, "{status}");
        }
    }

    #[test]
    fn every_action_has_allowed_roles() {
        for action in Action::ALL {
            assert!(!allowed_roles(action).is_empty(), "{action}");
        }
    }

    #[test]
    fn no_change_actions_are_hidden_from_listings() {
        let listed = available_actions(Status::Pack, Role::Admin);
        assert!(listed.contains(&Action::PackComplete));
        assert!(!listed.contains(&Action::PackConfigure));
        // But the action itself is still legal from PACK.
        assert_eq!(next_status(Status::Pack, Action::PackConfigure), Some(Status::Pack));

        let listed = available_actions(Status::Merge, Role::Admin);
        assert!(listed.contains(&Action::MergeComplete));
        assert!(!listed.contains(&Action::MergeAttach));
    }

    #[test]
    fn user_sees_only_user_actions() {
        let listed = available_actions(Status::OnDelivery, Role::User);
        assert_eq!(listed, vec![Action::HandoverConfirm, Action::Cancel]);

        let listed = available_actions(Status::Delivered, Role::User);
        assert!(listed.is_empty());

        let listed = available_actions(Status::Delivered, Role::SuperAdmin);
        assert_eq!(listed, vec![Action::Archive]);
    }

    fn any_status() -> impl Strategy<Value = Status> {
        proptest::sample::select(Status::ALL.to_vec())
    }

    fn any_action() -> impl Strategy<Value = Action> {
        proptest::sample::select(Action::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn next_status_is_deterministic(status in any_status(), action in any_action()) {
            prop_assert_eq!(next_status(status, action), next_status(status, action));
        }

        #[test]
        fn listings_only_contain_status_changing_actions(
            status in any_status(),
            role in proptest::sample::select(Role::ALL.to_vec()),
        ) {
            for action in available_actions(status, role) {
                let next = next_status(status, action);
                prop_assert!(matches!(next, Some(n) if n != status));
                prop_assert!(allowed_roles(action).contains(&role));
            }
        }
    }
}
