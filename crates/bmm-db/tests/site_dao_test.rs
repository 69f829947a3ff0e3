//! Integration tests for PgSiteDaoImpl.

mod common;

use bmm_core::{OrderBy, PageInput};
use bmm_db::{
    PgSiteDaoImpl, Relation, SiteClearInput, SiteContact, SiteCreateInput, SiteDao,
    SiteFilterInput, SiteLocation, SiteStatus, SiteUpdateInput, TOTAL_COUNT_KEY,
};
use common::{seed_provider, TestDatabase};
use uuid::Uuid;

fn site_input(provider_id: Uuid, name: &str) -> SiteCreateInput {
    SiteCreateInput {
        name: name.to_string(),
        display_name: Some(name.to_uppercase()),
        description: Some("West coast datacenter".to_string()),
        org: "provider-org".to_string(),
        infrastructure_provider_id: provider_id,
        site_controller_version: None,
        site_agent_version: None,
        registration_token: Some("token".to_string()),
        registration_token_expiration: None,
        serial_console_hostname: None,
        is_serial_console_enabled: false,
        serial_console_idle_timeout: None,
        serial_console_max_session_length: None,
        is_serial_console_ssh_keys_enabled: false,
        location: Some(SiteLocation {
            city: Some("Santa Clara".to_string()),
            state: Some("CA".to_string()),
            country: Some("US".to_string()),
        }),
        contact: Some(SiteContact {
            email: Some("noc@example.com".to_string()),
        }),
        status: SiteStatus::Pending,
        created_by: None,
    }
}

#[tokio::test]
async fn test_create_round_trips_json_columns() {
    let db = TestDatabase::new().await;
    let provider_id = seed_provider(db.pg(), "provider-org").await;
    let dao = PgSiteDaoImpl::new(db.pool());

    let site = dao
        .create(None, site_input(provider_id, "sjc1"))
        .await
        .expect("Failed to create site");
    assert!(!site.is_online());

    let found = dao
        .get_by_id(None, site.id, &[Relation::InfrastructureProvider])
        .await
        .expect("Failed to get site");
    let location = found.location.as_ref().map(|l| l.0.clone()).unwrap_or_default();
    assert_eq!(location.city.as_deref(), Some("Santa Clara"));
    assert_eq!(
        found.contact.as_ref().and_then(|c| c.0.email.clone()).as_deref(),
        Some("noc@example.com")
    );
    assert_eq!(found.infrastructure_provider.map(|p| p.id), Some(provider_id));
}

#[tokio::test]
async fn test_update_and_clear() {
    let db = TestDatabase::new().await;
    let provider_id = seed_provider(db.pg(), "provider-org").await;
    let dao = PgSiteDaoImpl::new(db.pool());
    let site = dao
        .create(None, site_input(provider_id, "sjc1"))
        .await
        .expect("Failed to create site");

    let updated = dao
        .update(
            None,
            SiteUpdateInput {
                id: site.id,
                status: Some(SiteStatus::Registered),
                is_serial_console_enabled: Some(true),
                serial_console_idle_timeout: Some(300),
                contact: Some(SiteContact {
                    email: Some("ops@example.com".to_string()),
                }),
                ..SiteUpdateInput::default()
            },
        )
        .await
        .expect("Failed to update site");
    assert!(updated.is_online());
    assert!(updated.is_serial_console_enabled);
    assert_eq!(updated.serial_console_idle_timeout, Some(300));
    assert_eq!(
        updated.contact.and_then(|c| c.0.email).as_deref(),
        Some("ops@example.com")
    );

    let cleared = dao
        .clear(
            None,
            SiteClearInput {
                id: site.id,
                registration_token: true,
                location: true,
                ..SiteClearInput::default()
            },
        )
        .await
        .expect("Failed to clear site");
    assert!(cleared.registration_token.is_none());
    assert!(cleared.location.is_none());
    assert!(cleared.description.is_some());
}

#[tokio::test]
async fn test_get_all_with_filters_and_search() {
    let db = TestDatabase::new().await;
    let provider_id = seed_provider(db.pg(), "provider-org").await;
    let other_provider = seed_provider(db.pg(), "other-org").await;
    let dao = PgSiteDaoImpl::new(db.pool());

    for name in ["sjc1", "sjc2", "ams1"] {
        dao.create(None, site_input(provider_id, name))
            .await
            .expect("Failed to create site");
    }
    dao.create(None, site_input(other_provider, "sjc9"))
        .await
        .expect("Failed to create site");

    let page = dao
        .get_all(
            None,
            SiteFilterInput {
                infrastructure_provider_ids: Some(vec![provider_id]),
                search_query: Some("sjc".to_string()),
                ..SiteFilterInput::default()
            },
            PageInput::default().with_order_by(OrderBy::desc("name")),
            &[],
        )
        .await
        .expect("Failed to list sites");
    let names: Vec<_> = page.items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["sjc2", "sjc1"]);

    let none = dao
        .get_all(
            None,
            SiteFilterInput {
                names: Some(Vec::new()),
                ..SiteFilterInput::default()
            },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to list sites");
    assert_eq!(none.total(), 0);
}

#[tokio::test]
async fn test_delete_and_count_by_status() {
    let db = TestDatabase::new().await;
    let provider_id = seed_provider(db.pg(), "provider-org").await;
    let dao = PgSiteDaoImpl::new(db.pool());

    let a = dao
        .create(None, site_input(provider_id, "a"))
        .await
        .expect("Failed to create site");
    let b = dao
        .create(None, site_input(provider_id, "b"))
        .await
        .expect("Failed to create site");
    dao.update(
        None,
        SiteUpdateInput {
            id: b.id,
            status: Some(SiteStatus::Registered),
            ..SiteUpdateInput::default()
        },
    )
    .await
    .expect("Failed to update site");

    dao.delete(None, a.id).await.expect("Failed to delete site");
    assert!(dao.get_by_id(None, a.id, &[]).await.unwrap_err().is_not_found());

    let counts = dao
        .get_count_by_status(None, Some(provider_id))
        .await
        .expect("Failed to count sites");
    assert_eq!(counts.get("Pending"), Some(&0));
    assert_eq!(counts.get("Registered"), Some(&1));
    assert_eq!(counts.get(TOTAL_COUNT_KEY), Some(&1));
}
