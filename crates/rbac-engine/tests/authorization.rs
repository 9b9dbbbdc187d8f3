//! End-to-end tests for role resolution and authorization.
//!
//! These tests drive the [`Authorizer`] against the in-memory store and check
//! the resolution contract: max-level merge with ties kept by the first
//! source, expiry exclusion, direct-only mode, action projection and the
//! distinction between "denied" and "could not decide".

use chrono::{Duration, Utc};
use rbac_engine::{Authorizer, MemoryAssignmentStore, RbacConfig, RbacError};
use rbac_model::{ActionPolicy, PrivilegeLevel, RoleFilter};
use std::sync::Arc;

/// Test fixture with the read/write/admin policy.
struct TestFixture {
    /// Facade under test.
    rbac: Authorizer,
    /// Store handle for outage simulation and row counts.
    store: MemoryAssignmentStore,
}

impl TestFixture {
    fn new() -> Self {
        let store = MemoryAssignmentStore::new();
        let policy = ActionPolicy::from_json(r#"{"read": 1, "write": 5, "admin": 10}"#).unwrap();
        let rbac = Authorizer::new(RbacConfig::new("docs", policy), Arc::new(store.clone())).unwrap();
        Self { rbac, store }
    }

    /// u1: level 3 on doc1, level 8 on team1; team1 contains doc1.
    async fn with_team_scenario(group_expiry: Option<chrono::DateTime<Utc>>) -> Self {
        let fixture = Self::new();
        fixture
            .rbac
            .grant_object_role("u1", "doc1", 3, None)
            .await
            .unwrap();
        fixture
            .rbac
            .grant_group_role("u1", "team1", 8, group_expiry)
            .await
            .unwrap();
        fixture.rbac.add_group_object("team1", "doc1").await.unwrap();
        fixture
    }
}

fn level(n: i64) -> PrivilegeLevel {
    PrivilegeLevel::new(n).unwrap()
}

#[tokio::test]
async fn test_group_role_outranks_lower_direct_role() {
    let fixture = TestFixture::with_team_scenario(None).await;

    let roles = fixture
        .rbac
        .resolve_object_roles("u1", Some("doc1"), true)
        .await
        .unwrap();

    assert_eq!(roles.len(), 1);
    let role = &roles[0];
    assert_eq!(role.object, "doc1");
    assert_eq!(role.level, level(8));
    assert!(role.inherited);
    assert_eq!(role.group_name(), "team1");
    assert_eq!(role.actions, vec!["read", "write"]);

    assert!(!fixture.rbac.is_allowed("u1", "doc1", "admin").await.unwrap());
    assert!(fixture.rbac.is_allowed("u1", "doc1", "write").await.unwrap());
}

#[tokio::test]
async fn test_expired_group_role_falls_back_to_direct() {
    let expired = Utc::now() - Duration::minutes(5);
    let fixture = TestFixture::with_team_scenario(Some(expired)).await;

    let roles = fixture
        .rbac
        .resolve_object_roles("u1", Some("doc1"), true)
        .await
        .unwrap();

    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].level, level(3));
    assert!(!roles[0].inherited);
    assert_eq!(roles[0].group, None);
    assert_eq!(roles[0].actions, vec!["read"]);
    assert!(!fixture.rbac.is_allowed("u1", "doc1", "write").await.unwrap());
}

#[tokio::test]
async fn test_equal_levels_keep_direct_role() {
    let fixture = TestFixture::new();
    fixture.rbac.grant_object_role("u1", "doc1", 5, None).await.unwrap();
    fixture.rbac.grant_group_role("u1", "team1", 5, None).await.unwrap();
    fixture.rbac.add_group_object("team1", "doc1").await.unwrap();

    let roles = fixture
        .rbac
        .resolve_object_roles("u1", None, true)
        .await
        .unwrap();
    assert_eq!(roles.len(), 1);
    assert!(!roles[0].inherited);
    assert_eq!(roles[0].expires_at, None);
}

#[tokio::test]
async fn test_expired_assignment_never_resolves() {
    let fixture = TestFixture::new();
    let past = Utc::now() - Duration::seconds(1);
    fixture
        .rbac
        .grant_object_role("u1", "doc1", 10, Some(past))
        .await
        .unwrap();

    assert!(fixture
        .rbac
        .resolve_object_roles("u1", None, true)
        .await
        .unwrap()
        .is_empty());
    assert!(!fixture.rbac.is_allowed("u1", "doc1", "read").await.unwrap());
}

#[tokio::test]
async fn test_future_expiry_is_reported() {
    let fixture = TestFixture::new();
    let later = Utc::now() + Duration::hours(2);
    fixture
        .rbac
        .grant_object_role("u1", "doc1", 5, Some(later))
        .await
        .unwrap();

    let roles = fixture
        .rbac
        .resolve_object_roles("u1", None, false)
        .await
        .unwrap();
    assert_eq!(roles[0].expires_at, Some(later));
}

#[tokio::test]
async fn test_direct_only_mode_ignores_groups() {
    let fixture = TestFixture::new();
    fixture.rbac.grant_group_role("u1", "team1", 8, None).await.unwrap();
    fixture.rbac.add_group_object("team1", "doc1").await.unwrap();
    fixture.rbac.add_group_object("team1", "doc2").await.unwrap();

    let direct = fixture
        .rbac
        .resolve_object_roles("u1", None, false)
        .await
        .unwrap();
    assert!(direct.is_empty());

    let inherited = fixture
        .rbac
        .resolve_object_roles("u1", None, true)
        .await
        .unwrap();
    let objects: Vec<&str> = inherited.iter().map(|r| r.object.as_str()).collect();
    assert_eq!(objects, vec!["doc1", "doc2"]);
}

#[tokio::test]
async fn test_unknown_subject_resolves_empty() {
    let fixture = TestFixture::new();

    assert!(fixture
        .rbac
        .resolve_object_roles("nobody", None, true)
        .await
        .unwrap()
        .is_empty());
    assert!(fixture
        .rbac
        .resolve_group_roles("nobody", None)
        .await
        .unwrap()
        .is_empty());
    assert!(!fixture.rbac.is_allowed("nobody", "doc1", "read").await.unwrap());
}

#[tokio::test]
async fn test_regrant_replaces_level_and_expiry() {
    let fixture = TestFixture::new();
    let later = Utc::now() + Duration::days(1);
    let first = fixture
        .rbac
        .grant_object_role("u1", "doc1", 3, Some(later))
        .await
        .unwrap();
    let second = fixture
        .rbac
        .grant_object_role("u1", "doc1", 10, None)
        .await
        .unwrap();

    assert_eq!(fixture.store.assignment_count().await, 1);
    assert_eq!(first.id, second.id);

    let roles = fixture
        .rbac
        .resolve_object_roles("u1", Some("doc1"), false)
        .await
        .unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].level, level(10));
    assert_eq!(roles[0].expires_at, None);
    assert!(fixture.rbac.is_allowed("u1", "doc1", "admin").await.unwrap());
}

#[tokio::test]
async fn test_group_roles() {
    let fixture = TestFixture::new();
    fixture.rbac.grant_group_role("u1", "team1", 10, None).await.unwrap();
    fixture.rbac.grant_group_role("u1", "team2", 1, None).await.unwrap();
    fixture
        .rbac
        .grant_group_role("u1", "team3", 5, Some(Utc::now() - Duration::minutes(1)))
        .await
        .unwrap();
    fixture.rbac.grant_group_role("u2", "team1", 5, None).await.unwrap();

    let all = fixture.rbac.list_user_group_roles("u1").await.unwrap();
    let groups: Vec<&str> = all.iter().map(|r| r.group.as_str()).collect();
    assert_eq!(groups, vec!["team1", "team2"]);
    assert_eq!(all[0].actions, vec!["admin", "read", "write"]);

    let one = fixture
        .rbac
        .resolve_group_roles("u1", Some("team2"))
        .await
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].actions, vec!["read"]);

    let holders = fixture.rbac.list_group_roles("team1").await.unwrap();
    let subjects: Vec<&str> = holders.iter().map(|r| r.subject.as_str()).collect();
    assert_eq!(subjects, vec!["u1", "u2"]);
}

#[tokio::test]
async fn test_list_user_object_roles_with_filter() {
    let fixture = TestFixture::new();
    fixture.rbac.grant_object_role("u1", "doc9", 2, None).await.unwrap();
    fixture.rbac.grant_group_role("u1", "team1", 6, None).await.unwrap();
    fixture.rbac.grant_group_role("u1", "team2", 4, None).await.unwrap();
    fixture.rbac.add_group_object("team1", "doc1").await.unwrap();
    fixture.rbac.add_group_object("team2", "doc2").await.unwrap();

    let all = fixture
        .rbac
        .list_user_object_roles("u1", &RoleFilter::all())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let direct = fixture
        .rbac
        .list_user_object_roles("u1", &RoleFilter::all().inherited(false))
        .await
        .unwrap();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].object, "doc9");

    let via_team2 = fixture
        .rbac
        .list_user_object_roles("u1", &RoleFilter::from_group("team2"))
        .await
        .unwrap();
    assert_eq!(via_team2.len(), 1);
    assert_eq!(via_team2[0].object, "doc2");
}

#[tokio::test]
async fn test_list_object_roles_across_subjects() {
    let fixture = TestFixture::with_team_scenario(None).await;
    fixture.rbac.grant_object_role("u2", "doc1", 10, None).await.unwrap();
    fixture.rbac.grant_group_role("u3", "team1", 1, None).await.unwrap();

    let roles = fixture
        .rbac
        .list_object_roles("doc1", &RoleFilter::all())
        .await
        .unwrap();
    let summary: Vec<(&str, u32, bool)> = roles
        .iter()
        .map(|r| (r.subject.as_str(), r.level.value(), r.inherited))
        .collect();
    assert_eq!(
        summary,
        vec![("u1", 8, true), ("u2", 10, false), ("u3", 1, true)]
    );

    let inherited = fixture
        .rbac
        .list_object_roles("doc1", &RoleFilter::all().inherited(true))
        .await
        .unwrap();
    assert_eq!(inherited.len(), 2);
}

#[tokio::test]
async fn test_membership_management() {
    let fixture = TestFixture::new();
    fixture.rbac.grant_group_role("u1", "team1", 5, None).await.unwrap();
    fixture.rbac.add_group_object("team1", "doc2").await.unwrap();
    fixture.rbac.add_group_object("team1", "doc1").await.unwrap();
    fixture.rbac.add_group_object("team1", "doc1").await.unwrap();

    assert_eq!(
        fixture.rbac.list_group_objects("team1").await.unwrap(),
        vec!["doc1".to_string(), "doc2".to_string()]
    );
    assert!(fixture.rbac.is_allowed("u1", "doc2", "write").await.unwrap());

    assert!(fixture.rbac.remove_group_object("team1", "doc2").await.unwrap());
    assert!(!fixture.rbac.is_allowed("u1", "doc2", "read").await.unwrap());
    assert!(fixture.rbac.list_group_objects("empty").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_outage_is_an_error_not_a_denial() {
    let fixture = TestFixture::with_team_scenario(None).await;
    fixture.store.set_available(false);

    assert!(matches!(
        fixture.rbac.is_allowed("u1", "doc1", "read").await,
        Err(RbacError::StoreUnavailable(_))
    ));
    assert!(matches!(
        fixture.rbac.resolve_object_roles("u1", None, true).await,
        Err(RbacError::StoreUnavailable(_))
    ));
    assert!(matches!(
        fixture.rbac.grant_object_role("u1", "doc2", 1, None).await,
        Err(RbacError::StoreUnavailable(_))
    ));

    fixture.store.set_available(true);
    assert!(fixture.rbac.is_allowed("u1", "doc1", "read").await.unwrap());
}

#[tokio::test]
async fn test_purge_expired_keeps_active_roles() {
    let fixture = TestFixture::new();
    fixture
        .rbac
        .grant_object_role("u1", "doc1", 5, Some(Utc::now() - Duration::hours(1)))
        .await
        .unwrap();
    fixture.rbac.grant_object_role("u1", "doc2", 5, None).await.unwrap();

    assert_eq!(fixture.rbac.purge_expired().await.unwrap(), 1);
    assert_eq!(fixture.store.assignment_count().await, 1);
    assert!(fixture.rbac.is_allowed("u1", "doc2", "write").await.unwrap());
}

#[tokio::test]
async fn test_concurrent_resolution() {
    let fixture = TestFixture::with_team_scenario(None).await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let rbac = fixture.rbac.clone();
        handles.push(tokio::spawn(async move {
            let action = if i % 2 == 0 { "write" } else { "admin" };
            (action, rbac.is_allowed("u1", "doc1", action).await.unwrap())
        }));
    }

    for handle in handles {
        let (action, allowed) = handle.await.unwrap();
        assert_eq!(allowed, action == "write");
    }
}
