//! Core data models, validation and session security for the CNS admin backend

pub mod auth;
pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;
pub use validation::*;

/// Result type alias for CNS operations
pub type Result<T> = std::result::Result<T, CnsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_validation() {
        assert!(ManagerId::parse("01HZY3J8Q2").is_ok());
        assert_eq!(ManagerId::parse("  abc ").unwrap().as_str(), "abc");

        assert!(ManagerId::parse("").is_err());
        assert!(ManagerId::parse("has space").is_err());
        assert!(ManagerId::parse("a/b").is_err());
        assert!(ManagerId::parse(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
        assert!(UserId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Super ".parse::<Role>().unwrap(), Role::Super);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
        assert!(Role::Super.is_protected());
        assert!(!Role::Admin.is_protected());
    }

    #[test]
    fn test_user_view_hides_hash() {
        let user = User::new("alice", "$argon2id$secret".into(), Role::Admin)
            .with_permissions(vec!["doc_parser".to_string()]);
        let json = serde_json::to_value(user.view()).unwrap();
        assert_eq!(json["Username"], "alice");
        assert_eq!(json["Role"], "admin");
        assert_eq!(json["Permissions"][0], "doc_parser");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_listing_flattens_record() {
        let manager = Manager {
            id: ManagerId::generate(),
            email: "alice@example.com".into(),
            name: "Alice Johnson".into(),
            titles: "Regional Manager".into(),
            initials: "AJ".into(),
        };
        let listing = AssociationListing {
            association: Association {
                id: AssociationId::generate(),
                legal_name: "Sunset Condos".into(),
                filter_name: "sunset".into(),
                location: "Tampa".into(),
                manager_id: manager.id.clone(),
            },
            manager: Some(manager),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["legalName"], "Sunset Condos");
        assert_eq!(json["manager"]["initials"], "AJ");
        assert_eq!(json["managerId"], json["manager"]["id"]);
    }
}
