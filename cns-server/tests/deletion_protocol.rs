//! Manager deletion with and without reassignment, end to end over the admin API

mod common;

use common::Harness;
use hyper::{Method, StatusCode};
use serde_json::json;

fn manager_path(id: &cns_core::ManagerId) -> String {
    format!("/api/admin/data/managers/{}", id)
}

#[tokio::test]
async fn test_manager_without_associations_is_deleted() {
    let h = Harness::new();
    let token = h.admin_token();
    let a = h.create_manager(&token, "Alice", "a@example.com").await;

    let resp = h.admin_call(Method::DELETE, &manager_path(&a), Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Deleted");
    assert_eq!(resp.body["reassigned"], 0);
    assert!(h.store().manager(&a).unwrap().is_none());
}

#[tokio::test]
async fn test_owner_without_target_conflicts_with_owned_count() {
    let h = Harness::new();
    let token = h.admin_token();
    let b = h.create_manager(&token, "Bob", "b@example.com").await;
    let x = h.create_association(&token, "X Condos", &b).await;

    let resp = h.admin_call(Method::DELETE, &manager_path(&b), Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.error(), "Manager has associations; provide reassignTo");
    assert_eq!(resp.body["owned"], 1);

    // a blank target is the same as no target
    let resp = h
        .admin_call(Method::DELETE, &manager_path(&b), Some(&token), Some(json!({ "reassignTo": "  " })))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    assert!(h.store().manager(&b).unwrap().is_some());
    assert_eq!(h.store().association(&x).unwrap().unwrap().manager_id, b);
}

#[tokio::test]
async fn test_unparseable_body_counts_as_no_target() {
    let h = Harness::new();
    let token = h.admin_token();
    let b = h.create_manager(&token, "Bob", "b@example.com").await;
    h.create_association(&token, "X Condos", &b).await;

    let resp = common::call_raw(&h.admin, Method::DELETE, &manager_path(&b), Some(&token), "{not json").await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["owned"], 1);
}

#[tokio::test]
async fn test_missing_target_changes_nothing() {
    let h = Harness::new();
    let token = h.admin_token();
    let b = h.create_manager(&token, "Bob", "b@example.com").await;
    let x = h.create_association(&token, "X Condos", &b).await;

    let resp = h
        .admin_call(
            Method::DELETE,
            &manager_path(&b),
            Some(&token),
            Some(json!({ "reassignTo": "no-such-manager" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error(), "reassignTo manager not found");

    assert!(h.store().manager(&b).unwrap().is_some());
    assert_eq!(h.store().association(&x).unwrap().unwrap().manager_id, b);
    assert_eq!(h.store().count_owned(&b).unwrap(), 1);
}

#[tokio::test]
async fn test_reassign_then_delete() {
    let h = Harness::new();
    let token = h.admin_token();
    let b = h.create_manager(&token, "Bob", "b@example.com").await;
    let c = h.create_manager(&token, "Carol", "c@example.com").await;
    let x = h.create_association(&token, "X Condos", &b).await;
    let y = h.create_association(&token, "Y Villas", &b).await;
    h.create_association(&token, "Z Homes", &c).await;

    let before_b = h.store().count_owned(&b).unwrap();
    let before_c = h.store().count_owned(&c).unwrap();

    let resp = h
        .admin_call(
            Method::DELETE,
            &manager_path(&b),
            Some(&token),
            Some(json!({ "reassignTo": c.as_str() })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    assert_eq!(resp.body["reassigned"], 2);

    assert!(h.store().manager(&b).unwrap().is_none());
    assert_eq!(h.store().association(&x).unwrap().unwrap().manager_id, c);
    assert_eq!(h.store().association(&y).unwrap().unwrap().manager_id, c);
    assert_eq!(h.store().count_owned(&c).unwrap(), before_c + before_b);
    assert_eq!(h.store().count_owned(&b).unwrap(), 0);

    // the listing reflects the move
    let resp = h
        .admin_call(Method::GET, "/api/admin/data/managers?q=carol", Some(&token), None)
        .await;
    let embedded: Vec<&str> = resp.body[0]["associations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["legalName"].as_str().unwrap())
        .collect();
    assert_eq!(embedded, vec!["X Condos", "Y Villas", "Z Homes"]);
}

#[tokio::test]
async fn test_target_ignored_for_manager_owning_nothing() {
    let h = Harness::new();
    let token = h.admin_token();
    let a = h.create_manager(&token, "Alice", "a@example.com").await;
    let b = h.create_manager(&token, "Bob", "b@example.com").await;

    let resp = h
        .admin_call(Method::DELETE, &manager_path(&a), Some(&token), Some(json!({ "reassignTo": a.as_str() })))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);

    let resp = h
        .admin_call(
            Method::DELETE,
            &manager_path(&b),
            Some(&token),
            Some(json!({ "reassignTo": "no such manager" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    assert!(h.store().managers().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_target_is_not_found() {
    let h = Harness::new();
    let token = h.admin_token();
    let b = h.create_manager(&token, "Bob", "b@example.com").await;
    let x = h.create_association(&token, "X Condos", &b).await;

    let resp = h
        .admin_call(
            Method::DELETE,
            &manager_path(&b),
            Some(&token),
            Some(json!({ "reassignTo": "no such manager" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error(), "reassignTo manager not found");
    assert_eq!(h.store().association(&x).unwrap().unwrap().manager_id, b);
}

#[tokio::test]
async fn test_reassign_to_self_is_rejected() {
    let h = Harness::new();
    let token = h.admin_token();
    let b = h.create_manager(&token, "Bob", "b@example.com").await;
    h.create_association(&token, "X Condos", &b).await;

    let resp = h
        .admin_call(
            Method::DELETE,
            &manager_path(&b),
            Some(&token),
            Some(json!({ "reassignTo": b.as_str() })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(h.store().manager(&b).unwrap().is_some());
}

#[tokio::test]
async fn test_deleting_absent_manager_succeeds() {
    let h = Harness::new();
    let token = h.admin_token();
    let resp = h
        .admin_call(Method::DELETE, "/api/admin/data/managers/never-existed", Some(&token), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["reassigned"], 0);
}

#[tokio::test]
async fn test_user_role_cannot_delete_managers() {
    let h = Harness::new();
    let admin = h.admin_token();
    let b = h.create_manager(&admin, "Bob", "b@example.com").await;

    let user = h.token("user1", cns_core::Role::User);
    let resp = h.admin_call(Method::DELETE, &manager_path(&b), Some(&user), None).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert!(h.store().manager(&b).unwrap().is_some());
}
