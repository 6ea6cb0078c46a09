//! Request payloads and the field-level validation shared by both services
//!
//! Every payload is deserialized leniently (missing strings become empty) and
//! then normalized: surrounding whitespace is trimmed and required fields are
//! checked, so handlers only ever see clean values.

use serde::Deserialize;
use std::collections::BTreeSet;

use crate::{Association, AssociationId, CnsError, Manager, ManagerId, Result, Role};

/// Trim and require a non-empty value
pub fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CnsError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trim every value; fail with a single message if any is empty
pub fn require_all(values: &mut [&mut String]) -> Result<()> {
    let mut missing = false;
    for value in values.iter_mut() {
        if value.trim().len() != value.len() {
            let trimmed = value.trim().to_string();
            **value = trimmed;
        }
        missing |= value.is_empty();
    }
    if missing {
        return Err(CnsError::validation("All fields required"));
    }
    Ok(())
}

/// Trim an optional patch field; a supplied field may not be blank
fn patch_field(field: &str, value: Option<String>) -> Result<Option<String>> {
    value.map(|v| required(field, &v).map_err(|_| {
        CnsError::validation(format!("{} must not be empty", field))
    }))
    .transpose()
}

/// Trim, drop blanks and de-duplicate a permission list
pub fn normalize_permissions(permissions: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    permissions
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Case-insensitive substring filter used by the list endpoints
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    needle: Option<String>,
}

impl SearchFilter {
    pub fn new(query: Option<&str>) -> Self {
        let needle = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        SearchFilter { needle }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_none()
    }

    /// True when no filter is set or any column contains the needle
    pub fn matches(&self, columns: &[&str]) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => columns.iter().any(|c| c.to_lowercase().contains(needle.as_str())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn normalized(self) -> Result<Self> {
        // usernames are matched exactly; only reject blanks
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(CnsError::validation("Username and password required"));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default, alias = "Username")]
    pub username: String,
    #[serde(default, alias = "Password")]
    pub password: String,
    #[serde(default, alias = "Role")]
    pub role: Option<String>,
    #[serde(default, alias = "Permissions")]
    pub permissions: Option<Vec<String>>,
}

/// Validated user creation request
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub permissions: BTreeSet<String>,
}

impl NewUser {
    pub fn validate(self) -> Result<UserDraft> {
        let username = required("username", &self.username)?;
        if self.password.is_empty() {
            return Err(CnsError::validation("password is required"));
        }
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => Role::User,
            Some(raw) => raw.parse()?,
        };
        if role.is_protected() {
            return Err(CnsError::validation("Cannot create super user"));
        }
        Ok(UserDraft {
            username,
            password: self.password,
            role,
            permissions: normalize_permissions(self.permissions.unwrap_or_default()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    #[serde(default, alias = "Role")]
    pub role: String,
}

impl RoleUpdate {
    pub fn validate(self) -> Result<Role> {
        let role: Role = required("role", &self.role)?.parse()?;
        if role.is_protected() {
            return Err(CnsError::validation("Cannot assign super role"));
        }
        Ok(role)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsUpdate {
    #[serde(default, alias = "Permissions")]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManager {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub titles: String,
    #[serde(default)]
    pub initials: String,
}

impl NewManager {
    pub fn into_manager(mut self) -> Result<Manager> {
        require_all(&mut [&mut self.name, &mut self.email, &mut self.titles, &mut self.initials])?;
        Ok(Manager {
            id: ManagerId::generate(),
            email: self.email,
            name: self.name,
            titles: self.titles,
            initials: self.initials,
        })
    }
}

/// Partial manager update; only supplied fields are applied
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub titles: Option<String>,
    pub initials: Option<String>,
}

impl ManagerPatch {
    pub fn normalized(self) -> Result<Self> {
        let patch = ManagerPatch {
            name: patch_field("name", self.name)?,
            email: patch_field("email", self.email)?,
            titles: patch_field("titles", self.titles)?,
            initials: patch_field("initials", self.initials)?,
        };
        if patch.is_empty() {
            return Err(CnsError::validation("No changes"));
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.titles.is_none() && self.initials.is_none()
    }

    pub fn apply(&self, manager: &mut Manager) {
        if let Some(name) = &self.name {
            manager.name = name.clone();
        }
        if let Some(email) = &self.email {
            manager.email = email.clone();
        }
        if let Some(titles) = &self.titles {
            manager.titles = titles.clone();
        }
        if let Some(initials) = &self.initials {
            manager.initials = initials.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssociation {
    #[serde(default)]
    pub legal_name: String,
    #[serde(default)]
    pub filter_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub manager_id: String,
}

impl NewAssociation {
    pub fn into_association(mut self) -> Result<Association> {
        require_all(&mut [
            &mut self.legal_name,
            &mut self.filter_name,
            &mut self.location,
            &mut self.manager_id,
        ])?;
        Ok(Association {
            id: AssociationId::generate(),
            legal_name: self.legal_name,
            filter_name: self.filter_name,
            location: self.location,
            manager_id: ManagerId::parse(&self.manager_id)?,
        })
    }
}

/// Partial association update; only supplied fields are applied
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationPatch {
    pub legal_name: Option<String>,
    pub filter_name: Option<String>,
    pub location: Option<String>,
    pub manager_id: Option<String>,
}

impl AssociationPatch {
    pub fn normalized(self) -> Result<Self> {
        let patch = AssociationPatch {
            legal_name: patch_field("legalName", self.legal_name)?,
            filter_name: patch_field("filterName", self.filter_name)?,
            location: patch_field("location", self.location)?,
            manager_id: patch_field("managerId", self.manager_id)?,
        };
        if patch.is_empty() {
            return Err(CnsError::validation("No changes"));
        }
        if let Some(manager_id) = &patch.manager_id {
            ManagerId::parse(manager_id)?;
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.legal_name.is_none()
            && self.filter_name.is_none()
            && self.location.is_none()
            && self.manager_id.is_none()
    }

    /// New owner requested by this patch, if any
    pub fn manager(&self) -> Result<Option<ManagerId>> {
        self.manager_id.as_deref().map(ManagerId::parse).transpose()
    }

    pub fn apply(&self, association: &mut Association) -> Result<()> {
        if let Some(legal_name) = &self.legal_name {
            association.legal_name = legal_name.clone();
        }
        if let Some(filter_name) = &self.filter_name {
            association.filter_name = filter_name.clone();
        }
        if let Some(location) = &self.location {
            association.location = location.clone();
        }
        if let Some(manager_id) = self.manager()? {
            association.manager_id = manager_id;
        }
        Ok(())
    }
}

/// Optional body of `DELETE /managers/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteManagerRequest {
    #[serde(default, rename = "reassignTo")]
    pub reassign_to: Option<String>,
}

impl DeleteManagerRequest {
    /// Whether a non-blank `reassignTo` was supplied
    pub fn has_target(&self) -> bool {
        self.reassign_to.as_deref().is_some_and(|raw| !raw.trim().is_empty())
    }

    /// Reassignment target; absent and blank are the same thing.
    /// A value that cannot be a manager id names no existing manager.
    pub fn target(&self) -> Result<Option<ManagerId>> {
        match self.reassign_to.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => ManagerId::parse(raw)
                .map(Some)
                .map_err(|_| CnsError::MissingReference("reassignTo manager not found".to_string())),
        }
    }
}
