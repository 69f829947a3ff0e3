//! Integration tests for PgTenantAccountDaoImpl.

mod common;

use bmm_core::{BmmError, OrderBy, PageInput};
use bmm_db::{
    PgTenantAccountDaoImpl, Relation, TenantAccountClearInput, TenantAccountCreateInput,
    TenantAccountDao, TenantAccountFilterInput, TenantAccountStatus, TenantAccountUpdateInput,
    TOTAL_COUNT_KEY,
};
use common::{seed_tenant, seed_user, Fixture, TestDatabase};
use uuid::Uuid;

fn account_input(fixture: &Fixture, account_number: &str) -> TenantAccountCreateInput {
    TenantAccountCreateInput {
        account_number: account_number.to_string(),
        tenant_id: Some(fixture.tenant_id),
        tenant_org: "tenant-org".to_string(),
        infrastructure_provider_id: fixture.provider_id,
        infrastructure_provider_org: "provider-org".to_string(),
        subscription_id: Some("sub-1".to_string()),
        subscription_tier: Some("gold".to_string()),
        tenant_contact_id: Some(fixture.user_id),
        status: TenantAccountStatus::Invited,
        created_by: None,
    }
}

#[tokio::test]
async fn test_create_and_lookup_with_relations() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgTenantAccountDaoImpl::new(db.pool());

    let account = dao
        .create(None, account_input(&fixture, "ACC-0001"))
        .await
        .expect("Failed to create account");

    let found = dao
        .get_by_account_number(
            None,
            "ACC-0001",
            &[Relation::Tenant, Relation::TenantContact, Relation::InfrastructureProvider],
        )
        .await
        .expect("Failed to get account");
    assert_eq!(found.id, account.id);
    assert_eq!(found.tenant.as_ref().map(|t| t.id), Some(fixture.tenant_id));
    assert_eq!(
        found.tenant_contact.as_ref().and_then(|u| u.email.as_deref()),
        Some("jane@example.com")
    );
    assert_eq!(
        found.infrastructure_provider.as_ref().map(|p| p.id),
        Some(fixture.provider_id)
    );

    let err = dao
        .get_by_account_number(None, "ACC-9999", &[])
        .await
        .expect_err("Found a missing account");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_duplicate_account_number_is_conflict() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgTenantAccountDaoImpl::new(db.pool());

    dao.create(None, account_input(&fixture, "ACC-0001"))
        .await
        .expect("Failed to create account");
    let err = dao
        .create(None, account_input(&fixture, "ACC-0001"))
        .await
        .expect_err("Duplicate account accepted");
    assert!(matches!(err, BmmError::Conflict(_)));
}

#[tokio::test]
async fn test_blank_account_number_is_rejected() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgTenantAccountDaoImpl::new(db.pool());

    let err = dao
        .create(None, account_input(&fixture, "   "))
        .await
        .expect_err("Blank account number accepted");
    assert!(matches!(err, BmmError::Validation(_)));
}

#[tokio::test]
async fn test_order_by_contact_full_name() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgTenantAccountDaoImpl::new(db.pool());

    let zed = seed_user(db.pg(), "zed@example.com", "Zed", "Zulu").await;
    let amy = seed_user(db.pg(), "amy@example.com", "Amy", "Alpha").await;

    for (number, contact) in [("ACC-1", zed), ("ACC-2", amy), ("ACC-3", fixture.user_id)] {
        let mut input = account_input(&fixture, number);
        input.tenant_contact_id = Some(contact);
        dao.create(None, input).await.expect("Failed to create account");
    }

    let page = dao
        .get_all(
            None,
            TenantAccountFilterInput::default(),
            PageInput::default().with_order_by(OrderBy::asc("tenant_contact_full_name")),
            &[],
        )
        .await
        .expect("Failed to list accounts");
    let numbers: Vec<_> = page.items.iter().map(|a| a.account_number.as_str()).collect();
    assert_eq!(numbers, vec!["ACC-2", "ACC-3", "ACC-1"]);
}

#[tokio::test]
async fn test_order_by_tenant_org_name() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgTenantAccountDaoImpl::new(db.pool());

    let acme = seed_tenant(db.pg(), "acme", None).await;
    let mut first = account_input(&fixture, "ACC-1");
    first.tenant_id = Some(fixture.tenant_id);
    let mut second = account_input(&fixture, "ACC-2");
    second.tenant_id = Some(acme);
    dao.create(None, first).await.expect("Failed to create account");
    dao.create(None, second).await.expect("Failed to create account");

    let page = dao
        .get_all(
            None,
            TenantAccountFilterInput::default(),
            PageInput::default().with_order_by(OrderBy::desc("tenant_org_name")),
            &[],
        )
        .await
        .expect("Failed to list accounts");
    let numbers: Vec<_> = page.items.iter().map(|a| a.account_number.as_str()).collect();
    assert_eq!(numbers, vec!["ACC-1", "ACC-2"]);
}

#[tokio::test]
async fn test_filters_counts_and_search() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgTenantAccountDaoImpl::new(db.pool());

    dao.create(None, account_input(&fixture, "ACC-1"))
        .await
        .expect("Failed to create account");
    let mut ready = account_input(&fixture, "ACC-2");
    ready.status = TenantAccountStatus::Ready;
    ready.tenant_org = "other-org".to_string();
    ready.tenant_id = None;
    dao.create(None, ready).await.expect("Failed to create account");

    let count = dao
        .get_count(
            None,
            TenantAccountFilterInput {
                infrastructure_provider_id: Some(fixture.provider_id),
                tenant_orgs: Some(vec!["tenant-org".to_string()]),
                ..TenantAccountFilterInput::default()
            },
        )
        .await
        .expect("Failed to count accounts");
    assert_eq!(count, 1);

    let found = dao
        .get_all(
            None,
            TenantAccountFilterInput {
                search_query: Some("other".to_string()),
                ..TenantAccountFilterInput::default()
            },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to search accounts");
    assert_eq!(found.total(), 1);
    assert_eq!(found.items[0].account_number, "ACC-2");

    let counts = dao
        .get_count_by_status(None, Some(fixture.provider_id), None)
        .await
        .expect("Failed to count by status");
    assert_eq!(counts.get("Invited"), Some(&1));
    assert_eq!(counts.get("Ready"), Some(&1));
    assert_eq!(counts.get("Pending"), Some(&0));
    assert_eq!(counts.get(TOTAL_COUNT_KEY), Some(&2));

    let scoped = dao
        .get_count_by_status(None, None, Some(fixture.tenant_id))
        .await
        .expect("Failed to count by status");
    assert_eq!(scoped.get(TOTAL_COUNT_KEY), Some(&1));
}

#[tokio::test]
async fn test_update_clear_delete() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgTenantAccountDaoImpl::new(db.pool());

    let account = dao
        .create(None, account_input(&fixture, "ACC-1"))
        .await
        .expect("Failed to create account");

    let updated = dao
        .update(
            None,
            TenantAccountUpdateInput {
                id: account.id,
                status: Some(TenantAccountStatus::Ready),
                subscription_tier: Some("platinum".to_string()),
                ..TenantAccountUpdateInput::default()
            },
        )
        .await
        .expect("Failed to update account");
    assert_eq!(updated.status, TenantAccountStatus::Ready);
    assert_eq!(updated.subscription_tier.as_deref(), Some("platinum"));
    assert_eq!(updated.subscription_id.as_deref(), Some("sub-1"));

    let cleared = dao
        .clear(
            None,
            TenantAccountClearInput {
                id: account.id,
                subscription_id: true,
                tenant_contact_id: true,
                ..TenantAccountClearInput::default()
            },
        )
        .await
        .expect("Failed to clear account");
    assert!(cleared.subscription_id.is_none());
    assert!(cleared.tenant_contact_id.is_none());
    assert_eq!(cleared.tenant_id, Some(fixture.tenant_id));

    dao.delete(None, account.id).await.expect("Failed to delete account");
    let err = dao
        .get_by_id(None, account.id, &[])
        .await
        .expect_err("Deleted account still visible");
    assert!(err.is_not_found());

    let err = dao
        .clear(
            None,
            TenantAccountClearInput {
                id: Uuid::new_v4(),
                subscription_tier: true,
                ..TenantAccountClearInput::default()
            },
        )
        .await
        .expect_err("Cleared a missing account");
    assert!(err.is_not_found());
}
