//! Per-kind [`Repository`](syncline_record::Repository) implementations
//! over the shared pool.
//!
//! Each module follows the same shape: a `FromRow` struct mirroring the
//! select list, a `From<Row>` conversion into the domain entity, and the
//! five repository operations. To-one associations are resolved with a
//! `LEFT JOIN users` in the select; only `posts` has multi-valued
//! associations, handled by its two-pass eager plan.

mod comments;
mod favorites;
mod files;
mod follows;
mod mentions;
mod notifications;
mod posts;
mod reactions;
mod shares;
mod tags;
mod users;

use syncline_core::{EntityId, UserRef};

/// Assemble a [`UserRef`] from joined columns, if the row has one.
pub(crate) fn user_ref(id: Option<i64>, login: Option<String>) -> Option<UserRef> {
    match (id, login) {
        (Some(id), Some(login)) => Some(UserRef::new(EntityId(id), login)),
        _ => None,
    }
}
