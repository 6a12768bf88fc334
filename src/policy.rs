use uuid::Uuid;

use crate::{db::users::User, AppError, AppResult};

/// Anything with a single owning user: a room's host, a message's author.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

pub fn can_modify(actor: &User, resource: &impl Owned) -> bool {
    actor.id == resource.owner_id()
}

pub fn ensure_can_modify(actor: &User, resource: &impl Owned) -> AppResult<()> {
    if can_modify(actor, resource) {
        Ok(())
    } else {
        Err(AppError::NotAuthorized)
    }
}
