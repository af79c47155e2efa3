// State/action/role model: fixed declarative data behind pure lookups.

pub mod action;
pub mod role;
pub mod status;
pub mod transitions;

pub use action::Action;
pub use role::Role;
pub use status::Status;
pub use transitions::{allowed_roles, available_actions, next_status};
