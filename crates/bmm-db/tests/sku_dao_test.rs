//! Integration tests for PgSkuDaoImpl.

mod common;

use bmm_core::PageInput;
use bmm_db::{
    PgSkuDaoImpl, Relation, SkuClearInput, SkuCreateInput, SkuDao, SkuFilterInput,
    SkuUpdateInput,
};
use common::{seed_site, Fixture, TestDatabase};
use serde_json::json;

fn sku_input(fixture: &Fixture, id: &str, machines: &[&str]) -> SkuCreateInput {
    SkuCreateInput {
        id: id.to_string(),
        site_id: fixture.site_id,
        device_type: Some("gpu".to_string()),
        components: Some(json!({ "cpu": { "count": 2 }, "gpu": { "count": 8 } })),
        associated_machine_ids: machines.iter().map(|m| (*m).to_string()).collect(),
    }
}

#[tokio::test]
async fn test_create_and_get() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgSkuDaoImpl::new(db.pool());

    let sku = dao
        .create(None, sku_input(&fixture, "sku-a", &["m-1", "m-2"]))
        .await
        .expect("Failed to create sku");
    assert_eq!(sku.associated_machine_ids, vec!["m-1", "m-2"]);

    let found = dao
        .get(None, "sku-a", &[Relation::Site])
        .await
        .expect("Failed to get sku");
    assert_eq!(found.components, Some(json!({ "cpu": { "count": 2 }, "gpu": { "count": 8 } })));
    assert_eq!(found.site.map(|s| s.id), Some(fixture.site_id));
}

#[tokio::test]
async fn test_filter_by_associated_machine() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgSkuDaoImpl::new(db.pool());

    dao.create(None, sku_input(&fixture, "sku-a", &["m-1", "m-2"]))
        .await
        .expect("Failed to create sku");
    dao.create(None, sku_input(&fixture, "sku-b", &["m-3"]))
        .await
        .expect("Failed to create sku");
    let mut cpu = sku_input(&fixture, "sku-c", &[]);
    cpu.device_type = Some("cpu".to_string());
    dao.create(None, cpu).await.expect("Failed to create sku");

    let page = dao
        .get_all(
            None,
            SkuFilterInput {
                associated_machine_ids: vec!["m-2".to_string(), "m-3".to_string()],
                ..SkuFilterInput::default()
            },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to list skus");
    assert_eq!(page.total(), 2);

    let gpus = dao
        .get_all(
            None,
            SkuFilterInput {
                site_ids: vec![fixture.site_id],
                device_types: vec!["gpu".to_string()],
                ..SkuFilterInput::default()
            },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to list skus");
    assert_eq!(gpus.total(), 2);

    let all = dao
        .get_all(None, SkuFilterInput::default(), PageInput::default(), &[])
        .await
        .expect("Failed to list skus");
    assert_eq!(all.total(), 3);
}

#[tokio::test]
async fn test_empty_site_ids_does_not_filter() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let site_b = seed_site(db.pg(), fixture.provider_id, "site-b").await;
    let dao = PgSkuDaoImpl::new(db.pool());

    dao.create(None, sku_input(&fixture, "sku-a", &["m-1"]))
        .await
        .expect("Failed to create sku");
    let mut at_b = sku_input(&fixture, "sku-b", &["m-2"]);
    at_b.site_id = site_b;
    dao.create(None, at_b).await.expect("Failed to create sku");

    let everything = dao
        .get_all(
            None,
            SkuFilterInput { site_ids: vec![], ..SkuFilterInput::default() },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to list skus");
    assert_eq!(everything.total(), 2);

    let only_b = dao
        .get_all(
            None,
            SkuFilterInput { site_ids: vec![site_b], ..SkuFilterInput::default() },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to list skus");
    assert_eq!(only_b.total(), 1);
    assert_eq!(only_b.items[0].id, "sku-b");
}

#[tokio::test]
async fn test_update_clear_and_hard_delete() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let dao = PgSkuDaoImpl::new(db.pool());

    dao.create(None, sku_input(&fixture, "sku-a", &["m-1"]))
        .await
        .expect("Failed to create sku");

    let updated = dao
        .update(
            None,
            SkuUpdateInput {
                id: "sku-a".to_string(),
                associated_machine_ids: Some(Vec::new()),
                ..SkuUpdateInput::default()
            },
        )
        .await
        .expect("Failed to update sku");
    assert!(updated.associated_machine_ids.is_empty());
    assert_eq!(updated.device_type.as_deref(), Some("gpu"));

    let cleared = dao
        .clear(
            None,
            SkuClearInput {
                id: "sku-a".to_string(),
                components: true,
                ..SkuClearInput::default()
            },
        )
        .await
        .expect("Failed to clear sku");
    assert!(cleared.components.is_none());

    dao.delete(None, "sku-a").await.expect("Failed to delete sku");
    dao.delete(None, "sku-a").await.expect("Deleting a missing sku is not an error");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sku")
        .fetch_one(db.pg())
        .await
        .expect("Failed to count rows");
    assert_eq!(count, 0);

    assert!(dao.get(None, "sku-a", &[]).await.unwrap_err().is_not_found());
}
