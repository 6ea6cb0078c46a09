//! Directory Manager: manager and association administration
//!
//! Owns the manager deletion protocol. A manager that still owns associations
//! can only be deleted together with a reassignment of those associations to
//! another existing manager, and the two writes commit as one transaction.

use cns_core::*;
use cns_engine::Store;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What a successful manager deletion did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    /// Whether the manager row existed
    pub existed: bool,
    /// Associations moved to the reassignment target
    pub reassigned: u64,
}

pub struct Directory<'a> {
    store: &'a Store,
}

impl<'a> Directory<'a> {
    pub fn new(store: &'a Store) -> Self {
        Directory { store }
    }

    // --- associations ---

    /// Associations matching `filter` on legal name, filter name or location,
    /// ordered by legal name, each with its manager embedded
    pub fn list_associations(&self, filter: &SearchFilter) -> Result<Vec<AssociationListing>> {
        let mut associations: Vec<Association> = self
            .store
            .associations()?
            .into_iter()
            .filter(|a| filter.matches(&[a.legal_name.as_str(), a.filter_name.as_str(), a.location.as_str()]))
            .collect();
        associations.sort_by(|a, b| a.legal_name.cmp(&b.legal_name).then_with(|| a.id.cmp(&b.id)));

        let managers: HashMap<ManagerId, Manager> = self
            .store
            .managers()?
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();

        Ok(associations
            .into_iter()
            .map(|association| {
                let manager = managers.get(&association.manager_id).cloned();
                if manager.is_none() {
                    warn!(association_id = %association.id, "association references a missing manager");
                }
                AssociationListing { association, manager }
            })
            .collect())
    }

    pub fn create_association(&self, input: NewAssociation) -> Result<Association> {
        let association = input.into_association()?;
        self.store.insert_association(association.clone())?;
        Ok(association)
    }

    pub fn update_association(&self, id: &AssociationId, patch: AssociationPatch) -> Result<Association> {
        let patch = patch.normalized()?;
        self.store.update_association(id, |association| patch.apply(association))
    }

    /// Delete an association; deleting an absent one also succeeds
    pub fn delete_association(&self, id: &AssociationId) -> Result<()> {
        if !self.store.delete_association(id)? {
            debug!(association_id = %id, "association already absent");
        }
        Ok(())
    }

    // --- managers ---

    /// Managers matching `filter` on name, email or initials, ordered by name,
    /// each with its associations embedded
    pub fn list_managers(&self, filter: &SearchFilter) -> Result<Vec<ManagerListing>> {
        let mut managers: Vec<Manager> = self
            .store
            .managers()?
            .into_iter()
            .filter(|m| filter.matches(&[m.name.as_str(), m.email.as_str(), m.initials.as_str()]))
            .collect();
        managers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let mut owned: HashMap<ManagerId, Vec<Association>> = HashMap::new();
        for association in self.store.associations()? {
            owned
                .entry(association.manager_id.clone())
                .or_default()
                .push(association);
        }

        Ok(managers
            .into_iter()
            .map(|manager| {
                let mut associations = owned.remove(&manager.id).unwrap_or_default();
                associations.sort_by(|a, b| a.legal_name.cmp(&b.legal_name));
                ManagerListing { manager, associations }
            })
            .collect())
    }

    pub fn create_manager(&self, input: NewManager) -> Result<Manager> {
        let manager = input.into_manager()?;
        self.store.insert_manager(manager.clone())?;
        Ok(manager)
    }

    pub fn update_manager(&self, id: &ManagerId, patch: ManagerPatch) -> Result<Manager> {
        let patch = patch.normalized()?;
        self.store.update_manager(id, |manager| patch.apply(manager))
    }

    /// Delete a manager, first moving its associations to `request.reassignTo`.
    ///
    /// The target is only looked at when the manager owns associations.
    ///
    /// * owns associations and no target: `Conflict` carrying the owned count
    /// * target missing or unparseable: `MissingReference`
    /// * target is the manager itself: `Validation`
    /// * any store failure: the transaction is dropped, nothing is written
    pub fn delete_manager(&self, id: &ManagerId, request: &DeleteManagerRequest) -> Result<Deletion> {
        // cheap precondition before taking the writer lock
        let owned = self.store.count_owned(id)?;
        if owned > 0 && !request.has_target() {
            return Err(owned_conflict(owned));
        }

        let mut txn = self.store.begin();

        // the owned set may have changed since the count
        let owned_now = txn.owned_association_ids(id)?.len() as u64;
        let mut reassigned = 0;
        if owned_now > 0 {
            let target = request.target()?.ok_or_else(|| owned_conflict(owned_now))?;
            if &target == id {
                return Err(CnsError::validation("reassignTo must be a different manager"));
            }
            reassigned = txn.reassign_associations(id, &target)?;
            debug!(manager_id = %id, target = %target, reassigned, "associations reassigned");
        }

        let existed = txn.delete_manager(id)?;
        txn.commit()?;

        info!(manager_id = %id, existed, reassigned, "manager deleted");
        Ok(Deletion { existed, reassigned })
    }
}

fn owned_conflict(owned: u64) -> CnsError {
    CnsError::owned_conflict("Manager has associations; provide reassignTo", owned)
}
