//! Tests for TursoStore against a temporary libsql database

use super::*;
use crate::db::DatabaseService;
use tempfile::TempDir;

async fn create_test_store() -> Result<(TursoStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DatabaseService::new(db_path).await?);
    Ok((TursoStore::new(db), temp_dir))
}

/// CEO with two reports, the first of which has one report of its own
async fn seed(store: &TursoStore) -> Result<(OrgNode, OrgNode, OrgNode, OrgNode)> {
    let ceo = store.create(OrgNode::new("Alice", "CEO", "", None)).await?;
    let cto = store
        .create(OrgNode::new("Grace", "CTO", "", Some(ceo.id.clone())))
        .await?;
    let cfo = store
        .create(OrgNode::new("Carl", "CFO", "", Some(ceo.id.clone())))
        .await?;
    let eng = store
        .create(OrgNode::new("Linus", "ENG", "", Some(cto.id.clone())))
        .await?;
    Ok((ceo, cto, cfo, eng))
}

#[test]
fn test_parse_timestamp_accepts_both_formats() {
    assert!(TursoStore::parse_timestamp("2025-01-15 10:30:00").is_ok());
    assert!(TursoStore::parse_timestamp("2025-01-15T10:30:00+00:00").is_ok());
    assert!(TursoStore::parse_timestamp("yesterday").is_err());
}

#[tokio::test]
async fn test_create_and_find_round_trip() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;

    let created = store
        .create(OrgNode::new("Alice", "CEO", "Founder", None))
        .await?;

    let by_id = store.find_by_id(&created.id).await?.expect("node exists");
    assert_eq!(by_id, created);

    let by_role = store.find_by_role("CEO").await?.expect("role exists");
    assert_eq!(by_role.id, created.id);

    assert!(store.find_by_id("missing").await?.is_none());
    assert!(store.find_by_role("CFO").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_role_is_unique_violation() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let ceo = store.create(OrgNode::new("Alice", "CEO", "", None)).await?;

    let err = store
        .create(OrgNode::new("Bob", "CEO", "", Some(ceo.id.clone())))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::UniqueViolation {
            constraint: UniqueConstraint::Role,
            ..
        }
    ));
    assert_eq!(store.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_second_root_is_rejected() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    store.create(OrgNode::new("Alice", "CEO", "", None)).await?;

    let err = store
        .create(OrgNode::new("Bob", "CHAIR", "", None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::UniqueViolation {
            constraint: UniqueConstraint::SingleRoot,
            ..
        }
    ));
    assert_eq!(store.find_roots().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_parent_is_missing_reference() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    store.create(OrgNode::new("Alice", "CEO", "", None)).await?;

    let err = store
        .create(OrgNode::new("Bob", "VP", "", Some("ghost".to_string())))
        .await
        .unwrap_err();

    match err {
        StoreError::MissingReference { id } => assert_eq!(id, "ghost"),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_children_and_subtree_ordering() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let (ceo, cto, cfo, eng) = seed(&store).await?;

    let children = store.find_direct_children(&ceo.id).await?;
    let ids: Vec<_> = children.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec![cto.id.as_str(), cfo.id.as_str()]);

    let subtree = store.find_subtree(&ceo.id).await?;
    let ids: Vec<_> = subtree.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![ceo.id.as_str(), cto.id.as_str(), cfo.id.as_str(), eng.id.as_str()]
    );

    let partial = store.find_subtree(&cto.id).await?;
    assert_eq!(partial.len(), 2);
    assert!(store.find_subtree("missing").await?.is_empty());
    assert!(store.find_direct_children("missing").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_many_is_atomic() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let ceo = store.create(OrgNode::new("Alice", "CEO", "", None)).await?;

    let vp = OrgNode::new("Bob", "VP", "", Some(ceo.id.clone()));
    let report = OrgNode::new("Dan", "MGR", "", Some(vp.id.clone()));
    let clash = OrgNode::new("Eve", "CEO", "", Some(vp.id.clone()));

    let err = store
        .create_many(vec![vp.clone(), report.clone(), clash])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { .. }));
    assert_eq!(store.count().await?, 1);

    let created = store.create_many(vec![vp.clone(), report]).await?;
    assert_eq!(created.len(), 2);
    assert_eq!(store.find_subtree(&vp.id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_update_applies_patch() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let (_ceo, cto, cfo, _eng) = seed(&store).await?;

    let patch = NodePatch {
        name: Some("Grace Hopper".to_string()),
        parent_id: Some(Some(cfo.id.clone())),
        ..Default::default()
    };
    let updated = store.update(&cto.id, patch).await?;

    assert_eq!(updated.name, "Grace Hopper");
    assert_eq!(updated.role, "CTO");
    assert_eq!(updated.parent_id.as_deref(), Some(cfo.id.as_str()));
    assert!(updated.modified_at >= cto.modified_at);

    let stored = store.find_by_id(&cto.id).await?.expect("node exists");
    assert_eq!(stored, updated);
    Ok(())
}

#[tokio::test]
async fn test_update_missing_node_is_not_found() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;

    let err = store
        .update("missing", NodePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn test_update_role_collision_rolls_back() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let (_ceo, cto, _cfo, _eng) = seed(&store).await?;

    let patch = NodePatch {
        name: Some("Renamed".to_string()),
        role: Some("CFO".to_string()),
        ..Default::default()
    };
    let err = store.update(&cto.id, patch).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::UniqueViolation {
            constraint: UniqueConstraint::Role,
            ..
        }
    ));

    let stored = store.find_by_id(&cto.id).await?.expect("node exists");
    assert_eq!(stored.name, "Grace");
    Ok(())
}

#[tokio::test]
async fn test_delete_with_reports_is_rejected() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let (_ceo, cto, _cfo, eng) = seed(&store).await?;

    let err = store.delete(&cto.id).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingReference { .. }));

    store.delete(&eng.id).await?;
    store.delete(&cto.id).await?;
    assert!(store.find_by_id(&cto.id).await?.is_none());

    let err = store.delete(&cto.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn test_apply_batch_reparents_then_deletes() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let (ceo, cto, _cfo, eng) = seed(&store).await?;

    store
        .apply_batch(vec![
            BatchWrite::Reparent {
                id: eng.id.clone(),
                parent_id: Some(ceo.id.clone()),
            },
            BatchWrite::Delete { id: cto.id.clone() },
        ])
        .await?;

    assert!(store.find_by_id(&cto.id).await?.is_none());
    let moved = store.find_by_id(&eng.id).await?.expect("node exists");
    assert_eq!(moved.parent_id.as_deref(), Some(ceo.id.as_str()));
    assert_eq!(store.count().await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_apply_batch_failure_rolls_back_everything() -> Result<()> {
    let (store, _temp_dir) = create_test_store().await?;
    let (ceo, cto, _cfo, eng) = seed(&store).await?;

    let err = store
        .apply_batch(vec![
            BatchWrite::Reparent {
                id: eng.id.clone(),
                parent_id: Some(ceo.id.clone()),
            },
            BatchWrite::Delete {
                id: "missing".to_string(),
            },
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let untouched = store.find_by_id(&eng.id).await?.expect("node exists");
    assert_eq!(untouched.parent_id.as_deref(), Some(cto.id.as_str()));
    assert_eq!(store.count().await?, 4);
    Ok(())
}

#[tokio::test]
async fn test_data_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("reopen.db");

    let ceo_id = {
        let db = Arc::new(DatabaseService::new(db_path.clone()).await?);
        let store = TursoStore::new(db.clone());
        let ceo = store.create(OrgNode::new("Alice", "CEO", "", None)).await?;
        db.db_close().await?;
        ceo.id
    };

    let db = Arc::new(DatabaseService::new(db_path).await?);
    let store = TursoStore::new(db);
    let roots = store.find_roots().await?;
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, ceo_id);
    Ok(())
}
