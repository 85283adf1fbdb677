//! Node Store Contract Tests
//!
//! The same expectations checked against every `NodeStore` backend:
//! write-time constraint enforcement, batch atomicity and subtree order.

#[cfg(test)]
mod store_contract {
    use anyhow::Result;
    use orgchart_core::db::{
        DatabaseService, InMemoryStore, NodeStore, StoreError, TursoStore, UniqueConstraint,
    };
    use orgchart_core::models::{BatchWrite, NodePatch, OrgNode};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn backends() -> Result<Vec<(&'static str, Arc<dyn NodeStore>, Option<TempDir>)>> {
        let temp_dir = TempDir::new()?;
        let db = Arc::new(DatabaseService::new(temp_dir.path().join("contract.db")).await?);

        let memory: Arc<dyn NodeStore> = Arc::new(InMemoryStore::new());
        let libsql: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));

        Ok(vec![
            ("memory", memory, None),
            ("libsql", libsql, Some(temp_dir)),
        ])
    }

    /// ceo → {cto → {eng}, cfo}
    async fn seed(store: &Arc<dyn NodeStore>) -> Result<[OrgNode; 4]> {
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
        Ok([ceo, cto, cfo, eng])
    }

    #[tokio::test]
    async fn test_write_time_constraints() -> Result<()> {
        for (backend, store, _guard) in backends().await? {
            let [ceo, cto, ..] = seed(&store).await?;

            let role = store
                .create(OrgNode::new("X", "CTO", "", Some(ceo.id.clone())))
                .await
                .unwrap_err();
            assert!(
                matches!(
                    role,
                    StoreError::UniqueViolation {
                        constraint: UniqueConstraint::Role,
                        ..
                    }
                ),
                "{backend}: {role:?}"
            );

            let root = store
                .create(OrgNode::new("X", "CHAIR", "", None))
                .await
                .unwrap_err();
            assert!(
                matches!(
                    root,
                    StoreError::UniqueViolation {
                        constraint: UniqueConstraint::SingleRoot,
                        ..
                    }
                ),
                "{backend}: {root:?}"
            );

            let dangling = store
                .update(
                    &cto.id,
                    NodePatch {
                        parent_id: Some(Some("ghost".to_string())),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert!(
                matches!(dangling, StoreError::MissingReference { .. }),
                "{backend}: {dangling:?}"
            );

            assert_eq!(store.count().await?, 4, "{backend}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_orders_and_lookups() -> Result<()> {
        for (backend, store, _guard) in backends().await? {
            let [ceo, cto, cfo, eng] = seed(&store).await?;

            let all: Vec<String> = store.find_all().await?.into_iter().map(|n| n.id).collect();
            assert_eq!(
                all,
                vec![ceo.id.clone(), cto.id.clone(), cfo.id.clone(), eng.id.clone()],
                "{backend}"
            );

            let subtree: Vec<String> = store
                .find_subtree(&ceo.id)
                .await?
                .into_iter()
                .map(|n| n.id)
                .collect();
            assert_eq!(
                subtree,
                vec![ceo.id.clone(), cto.id.clone(), cfo.id.clone(), eng.id.clone()],
                "{backend}"
            );

            let roots = store.find_roots().await?;
            assert_eq!(roots.len(), 1, "{backend}");
            assert_eq!(roots[0].id, ceo.id, "{backend}");

            assert_eq!(
                store.find_by_role("ENG").await?.map(|n| n.id),
                Some(eng.id),
                "{backend}"
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_batches_are_all_or_nothing() -> Result<()> {
        for (backend, store, _guard) in backends().await? {
            let [ceo, cto, _cfo, eng] = seed(&store).await?;

            let failed = store
                .apply_batch(vec![
                    BatchWrite::Reparent {
                        id: eng.id.clone(),
                        parent_id: Some(ceo.id.clone()),
                    },
                    // ceo still has reports, so the delete fails
                    BatchWrite::Delete { id: ceo.id.clone() },
                ])
                .await;
            assert!(failed.is_err(), "{backend}");

            let eng_now = store.find_by_id(&eng.id).await?.expect("eng exists");
            assert_eq!(eng_now.parent_id.as_deref(), Some(cto.id.as_str()), "{backend}");

            let a = OrgNode::new("A", "A", "", Some(ceo.id.clone()));
            let b = OrgNode::new("B", "B", "", Some(a.id.clone()));
            let clash = OrgNode::new("C", "ENG", "", Some(a.id.clone()));
            assert!(store.create_many(vec![a, b, clash]).await.is_err(), "{backend}");
            assert_eq!(store.count().await?, 4, "{backend}");
        }
        Ok(())
    }
}
