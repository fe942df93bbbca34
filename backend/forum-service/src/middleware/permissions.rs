/// Authorization policy for forum-service
///
/// Posts and comments share one rule: anyone may read, only the owner or an
/// admin may update or delete. Resources expose their owner through
/// `OwnedResource`, so the policy never needs to know which field holds it.
use crate::auth::Actor;
use crate::error::AppError;
use crate::models::{Comment, Post};
use uuid::Uuid;

/// Anything with a single owning user.
pub trait OwnedResource {
    fn owner_id(&self) -> Uuid;

    /// Noun used in permission errors
    fn kind(&self) -> &'static str;
}

impl OwnedResource for Post {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }

    fn kind(&self) -> &'static str {
        "post"
    }
}

impl OwnedResource for Comment {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }

    fn kind(&self) -> &'static str {
        "comment"
    }
}

/// Reads are open to everyone, authenticated or not.
pub fn can_read<R: OwnedResource + ?Sized>(_actor: Option<&Actor>, _resource: &R) -> bool {
    true
}

/// Update/delete rule: owner or admin.
pub fn can_mutate<R: OwnedResource + ?Sized>(actor: &Actor, resource: &R) -> bool {
    actor.is_admin || actor.id == resource.owner_id()
}

/// `can_mutate` as a `Forbidden` error.
pub fn ensure_can_mutate<R: OwnedResource + ?Sized>(
    actor: &Actor,
    resource: &R,
) -> Result<(), AppError> {
    if can_mutate(actor, resource) {
        Ok(())
    } else {
        tracing::info!(
            actor_id = %actor.id,
            owner_id = %resource.owner_id(),
            kind = resource.kind(),
            "mutation denied"
        );
        Err(AppError::Forbidden(format!(
            "You don't have permission to modify this {}",
            resource.kind()
        )))
    }
}
