//! User administration behind the admin gate
//!
//! Two guards apply to every mutation of an existing account, independent of
//! the caller's own role: nobody modifies or deletes their own account through
//! these operations, and `super` accounts cannot be modified or deleted at all.

use cns_core::*;
use tracing::info;

use crate::state::AppState;

pub struct Accounts<'a> {
    state: &'a AppState,
}

/// Self-protection first, then super-protection
fn guard(actor: &Session, target: &User, verb: &str) -> Result<()> {
    if target.username == actor.username {
        return Err(CnsError::validation(format!("Cannot {} self", verb)));
    }
    if target.role.is_protected() {
        return Err(CnsError::Forbidden(format!("Cannot {} super user", verb)));
    }
    Ok(())
}

impl<'a> Accounts<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Accounts { state }
    }

    /// All users ordered by username, without password hashes
    pub fn list(&self) -> Result<Vec<UserView>> {
        Ok(self.state.store.users()?.iter().map(User::view).collect())
    }

    pub fn create(&self, input: NewUser) -> Result<UserView> {
        let draft = input.validate()?;
        let hash = self.state.passwords.hash(&draft.password)?;
        let user = User::new(draft.username, hash, draft.role).with_permissions(draft.permissions);
        let view = user.view();
        self.state.store.insert_user(user)?;
        Ok(view)
    }

    pub fn update_role(&self, actor: &Session, id: &UserId, update: RoleUpdate) -> Result<UserView> {
        let role = update.validate();
        let user = self.state.store.update_user(id, |user| {
            guard(actor, user, "update")?;
            user.role = role?;
            Ok(())
        })?;
        info!(user_id = %id, role = %user.role, by = %actor.username, "user role changed");
        Ok(user.view())
    }

    pub fn update_permissions(
        &self,
        actor: &Session,
        id: &UserId,
        update: PermissionsUpdate,
    ) -> Result<UserView> {
        let permissions = normalize_permissions(update.permissions);
        let user = self.state.store.update_user(id, |user| {
            guard(actor, user, "update")?;
            user.permissions = permissions;
            Ok(())
        })?;
        info!(user_id = %id, count = user.permissions.len(), by = %actor.username, "user permissions changed");
        Ok(user.view())
    }

    pub fn delete(&self, actor: &Session, id: &UserId) -> Result<()> {
        self.state
            .store
            .delete_user(id, |user| guard(actor, user, "delete"))?;
        Ok(())
    }
}
