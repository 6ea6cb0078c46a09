//! High-level credential store operations
//!
//! Read helpers on [`Store`] go straight to the committed tables. Every
//! mutation runs inside a [`StoreTxn`]: the single-row operations here open
//! and commit their own, while multi-step protocols (manager deletion) call
//! [`Store::begin`] and compose the transaction-level operations themselves.

use cns_core::*;
use tracing::{debug, info};

use crate::table::{child_of, composite_key, owner_prefix, TableKind};
use crate::{StorageEngine, StoreTxn};

/// High-level storage interface
#[derive(Clone)]
pub struct Store {
    engine: StorageEngine,
}

impl Store {
    pub fn new(engine: StorageEngine) -> Self {
        Store { engine }
    }

    /// Get storage engine reference
    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// Open a write transaction. Blocks while another one is open.
    pub fn begin(&self) -> StoreTxn<'_> {
        StoreTxn::begin(&self.engine)
    }

    fn table(&self, kind: TableKind) -> &crate::table::Table {
        self.engine.tables().get(kind)
    }

    // --- users ---

    pub fn user(&self, id: &UserId) -> Result<Option<User>> {
        self.table(TableKind::Users).get(id.as_str().as_bytes())
    }

    /// Exact, case-sensitive username lookup
    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.table(TableKind::UsersByName).get_raw(username.as_bytes())? {
            Some(id) => self.table(TableKind::Users).get(&id),
            None => Ok(None),
        }
    }

    /// All users, ordered by username
    pub fn users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.table(TableKind::Users).values()?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    pub fn count_users_with_role(&self, role: Role) -> Result<u64> {
        Ok(self.users()?.iter().filter(|u| u.role == role).count() as u64)
    }

    /// Insert a new user. Fails with `Conflict` when the username is taken.
    pub fn insert_user(&self, user: User) -> Result<()> {
        let mut txn = self.begin();
        txn.insert_user(&user)?;
        txn.commit()?;
        info!(user_id = %user.id, username = %user.username, role = %user.role, "user created");
        Ok(())
    }

    /// Apply `change` to a user under the writer lock.
    ///
    /// `change` sees the current row and may refuse the update by returning an
    /// error, which aborts the transaction.
    pub fn update_user<F>(&self, id: &UserId, change: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> Result<()>,
    {
        let mut txn = self.begin();
        let mut user = txn
            .user(id)?
            .ok_or_else(|| CnsError::not_found("User not found"))?;
        change(&mut user)?;
        txn.put(TableKind::Users, id.as_str(), &user)?;
        txn.commit()?;
        debug!(user_id = %id, "user updated");
        Ok(user)
    }

    /// Delete a user after `check` approves the current row
    pub fn delete_user<F>(&self, id: &UserId, check: F) -> Result<User>
    where
        F: FnOnce(&User) -> Result<()>,
    {
        let mut txn = self.begin();
        let user = txn
            .user(id)?
            .ok_or_else(|| CnsError::not_found("User not found"))?;
        check(&user)?;
        txn.remove(TableKind::Users, id.as_str());
        txn.remove(TableKind::UsersByName, user.username.as_str());
        txn.commit()?;
        info!(user_id = %id, username = %user.username, "user deleted");
        Ok(user)
    }

    // --- managers ---

    pub fn manager(&self, id: &ManagerId) -> Result<Option<Manager>> {
        self.table(TableKind::Managers).get(id.as_str().as_bytes())
    }

    pub fn managers(&self) -> Result<Vec<Manager>> {
        self.table(TableKind::Managers).values()
    }

    /// Number of associations owned by `id`
    pub fn count_owned(&self, id: &ManagerId) -> Result<u64> {
        self.table(TableKind::AssociationsByManager)
            .count_prefix(&owner_prefix(id.as_str()))
    }

    /// Associations owned by `id`, ordered by legal name
    pub fn associations_of(&self, id: &ManagerId) -> Result<Vec<Association>> {
        let index = self.table(TableKind::AssociationsByManager);
        let rows = self.table(TableKind::Associations);
        let mut owned = Vec::new();
        for (key, _) in index.scan_prefix(&owner_prefix(id.as_str()))? {
            if let Some(assoc_id) = child_of(&key) {
                if let Some(association) = rows.get::<Association>(assoc_id.as_bytes())? {
                    owned.push(association);
                }
            }
        }
        owned.sort_by(|a, b| a.legal_name.cmp(&b.legal_name));
        Ok(owned)
    }

    /// Insert a new manager. Fails with `Conflict` when the email is taken.
    pub fn insert_manager(&self, manager: Manager) -> Result<()> {
        let mut txn = self.begin();
        txn.claim_email(&manager.email, &manager.id)?;
        txn.put(TableKind::Managers, manager.id.as_str(), &manager)?;
        txn.commit()?;
        info!(manager_id = %manager.id, "manager created");
        Ok(())
    }

    pub fn update_manager<F>(&self, id: &ManagerId, change: F) -> Result<Manager>
    where
        F: FnOnce(&mut Manager),
    {
        let mut txn = self.begin();
        let current = txn
            .manager(id)?
            .ok_or_else(|| CnsError::not_found("Manager not found"))?;
        let mut updated = current.clone();
        change(&mut updated);
        updated.id = current.id.clone();

        if updated.email != current.email {
            txn.claim_email(&updated.email, id)?;
            txn.remove(TableKind::ManagersByEmail, current.email.as_str());
        }
        txn.put(TableKind::Managers, id.as_str(), &updated)?;
        txn.commit()?;
        debug!(manager_id = %id, "manager updated");
        Ok(updated)
    }

    // --- associations ---

    pub fn association(&self, id: &AssociationId) -> Result<Option<Association>> {
        self.table(TableKind::Associations).get(id.as_str().as_bytes())
    }

    pub fn associations(&self) -> Result<Vec<Association>> {
        self.table(TableKind::Associations).values()
    }

    /// Insert a new association owned by an existing manager
    pub fn insert_association(&self, association: Association) -> Result<()> {
        let mut txn = self.begin();
        txn.put_association(None, &association)?;
        txn.commit()?;
        info!(
            association_id = %association.id,
            manager_id = %association.manager_id,
            "association created"
        );
        Ok(())
    }

    /// Apply `change` to an association; a new owner must exist
    pub fn update_association<F>(&self, id: &AssociationId, change: F) -> Result<Association>
    where
        F: FnOnce(&mut Association) -> Result<()>,
    {
        let mut txn = self.begin();
        let current = txn
            .association(id)?
            .ok_or_else(|| CnsError::not_found("Association not found"))?;
        let mut updated = current.clone();
        change(&mut updated)?;
        updated.id = current.id.clone();

        txn.put_association(Some(&current), &updated)?;
        txn.commit()?;
        debug!(association_id = %id, "association updated");
        Ok(updated)
    }

    /// Remove an association. Returns whether it existed.
    pub fn delete_association(&self, id: &AssociationId) -> Result<bool> {
        let mut txn = self.begin();
        let existed = txn.remove_association(id)?;
        txn.commit()?;
        if existed {
            info!(association_id = %id, "association deleted");
        }
        Ok(existed)
    }
}

/// Row-level operations available inside a transaction
impl StoreTxn<'_> {
    pub fn user(&self, id: &UserId) -> Result<Option<User>> {
        self.get(TableKind::Users, id.as_str().as_bytes())
    }

    pub fn insert_user(&mut self, user: &User) -> Result<()> {
        if self.get_raw(TableKind::UsersByName, user.username.as_bytes())?.is_some() {
            return Err(CnsError::conflict("Username already exists"));
        }
        self.put(TableKind::Users, user.id.as_str(), user)?;
        self.put_raw(
            TableKind::UsersByName,
            user.username.as_str(),
            user.id.as_str().as_bytes().to_vec(),
        );
        Ok(())
    }

    pub fn manager(&self, id: &ManagerId) -> Result<Option<Manager>> {
        self.get(TableKind::Managers, id.as_str().as_bytes())
    }

    pub fn manager_exists(&self, id: &ManagerId) -> Result<bool> {
        Ok(self.get_raw(TableKind::Managers, id.as_str().as_bytes())?.is_some())
    }

    /// Point the email index at `owner`, refusing an address held by another manager
    fn claim_email(&mut self, email: &str, owner: &ManagerId) -> Result<()> {
        if let Some(holder) = self.get_raw(TableKind::ManagersByEmail, email.as_bytes())? {
            if holder != owner.as_str().as_bytes() {
                return Err(CnsError::conflict("Email already exists"));
            }
        }
        self.put_raw(
            TableKind::ManagersByEmail,
            email,
            owner.as_str().as_bytes().to_vec(),
        );
        Ok(())
    }

    pub fn association(&self, id: &AssociationId) -> Result<Option<Association>> {
        self.get(TableKind::Associations, id.as_str().as_bytes())
    }

    /// Ids of the associations currently owned by `manager`, as seen by this transaction
    pub fn owned_association_ids(&self, manager: &ManagerId) -> Result<Vec<AssociationId>> {
        self.scan_prefix(TableKind::AssociationsByManager, &owner_prefix(manager.as_str()))?
            .iter()
            .filter_map(|(key, _)| child_of(key))
            .map(AssociationId::parse)
            .collect()
    }

    /// Write `association`, keeping the owner index in step with `previous`.
    /// The owning manager must exist.
    pub fn put_association(&mut self, previous: Option<&Association>, association: &Association) -> Result<()> {
        if !self.manager_exists(&association.manager_id)? {
            return Err(CnsError::MissingReference("Manager not found".to_string()));
        }
        if let Some(previous) = previous {
            if previous.manager_id != association.manager_id {
                self.remove(
                    TableKind::AssociationsByManager,
                    composite_key(previous.manager_id.as_str(), previous.id.as_str()),
                );
            }
        }
        self.put(TableKind::Associations, association.id.as_str(), association)?;
        self.put_raw(
            TableKind::AssociationsByManager,
            composite_key(association.manager_id.as_str(), association.id.as_str()),
            Vec::new(),
        );
        Ok(())
    }

    pub fn remove_association(&mut self, id: &AssociationId) -> Result<bool> {
        let Some(association) = self.association(id)? else {
            return Ok(false);
        };
        self.remove(TableKind::Associations, id.as_str());
        self.remove(
            TableKind::AssociationsByManager,
            composite_key(association.manager_id.as_str(), id.as_str()),
        );
        Ok(true)
    }

    /// Move every association of `from` to `to`. Returns how many moved.
    pub fn reassign_associations(&mut self, from: &ManagerId, to: &ManagerId) -> Result<u64> {
        if !self.manager_exists(to)? {
            return Err(CnsError::MissingReference("reassignTo manager not found".to_string()));
        }
        let mut moved = 0;
        for assoc_id in self.owned_association_ids(from)? {
            let previous = self.association(&assoc_id)?.ok_or_else(|| {
                CnsError::Internal(format!("index entry for missing association {}", assoc_id))
            })?;
            let mut association = previous.clone();
            association.manager_id = to.clone();
            self.put_association(Some(&previous), &association)?;
            moved += 1;
        }
        Ok(moved)
    }

    /// Remove a manager row and its email index entry.
    ///
    /// Restricted like a foreign key: refuses while any association still
    /// references the manager. Returns whether the row existed.
    pub fn delete_manager(&mut self, id: &ManagerId) -> Result<bool> {
        let still_owned = self.owned_association_ids(id)?.len();
        if still_owned > 0 {
            return Err(CnsError::Constraint(format!(
                "manager {} is still referenced by {} associations",
                id, still_owned
            )));
        }
        let Some(manager) = self.manager(id)? else {
            return Ok(false);
        };
        self.remove(TableKind::Managers, id.as_str());
        self.remove(TableKind::ManagersByEmail, manager.email.as_str());
        Ok(true)
    }
}
