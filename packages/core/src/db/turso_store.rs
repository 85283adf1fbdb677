//! TursoStore - NodeStore Implementation for Turso/libsql Backend
//!
//! This module implements the `NodeStore` trait on top of `DatabaseService`.
//!
//! # Design Principles
//!
//! 1. **Row Conversion**: Handles libsql::Row → OrgNode conversion in one place
//! 2. **Constraint Classification**: SQLite constraint failures become typed
//!    `StoreError` variants so the service can map them to business errors
//! 3. **Explicit Transactions**: Multi-statement writes run inside
//!    `BEGIN IMMEDIATE … COMMIT` and roll back on the first failure
//! 4. **Recursive Subtrees**: One recursive CTE per subtree, ordered by depth
//!
//! # Examples
//!
//! ```rust,no_run
//! use orgchart_core::db::{DatabaseService, NodeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/orgchart.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let node = store.find_by_role("CEO").await?;
//!     Ok(())
//! }
//! ```

use crate::db::error::{DatabaseError, StoreError, UniqueConstraint};
use crate::db::node_store::NodeStore;
use crate::db::DatabaseService;
use crate::models::{BatchWrite, NodePatch, OrgNode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::params::IntoParams;
use libsql::{Connection, Row};
use std::sync::Arc;

/// Column list shared by every SELECT (order matters for `row_to_node`)
const NODE_COLUMNS: &str = "id, name, role, description, parent_id, created_at, modified_at";

/// TursoStore implements NodeStore for the libsql backend
pub struct TursoStore {
    /// Underlying database service (connection + schema management)
    db: Arc<DatabaseService>,
}

impl TursoStore {
    /// Create a new TursoStore wrapper
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use orgchart_core::db::{TursoStore, DatabaseService};
    /// # use std::sync::Arc;
    /// # use std::path::PathBuf;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Arc::new(DatabaseService::new(PathBuf::from("./orgchart.db")).await?);
    /// let store = TursoStore::new(db);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        Ok(self.db.connect_with_timeout().await?)
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    /// Rows written by this store use RFC3339.
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    /// Convert libsql::Row to OrgNode
    ///
    /// # Row Format
    ///
    /// Expected columns (in order, see `NODE_COLUMNS`):
    /// - id (TEXT)
    /// - name (TEXT)
    /// - role (TEXT)
    /// - description (TEXT)
    /// - parent_id (TEXT, nullable)
    /// - created_at (TEXT)
    /// - modified_at (TEXT)
    fn row_to_node(row: &Row) -> Result<OrgNode> {
        let id: String = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let role: String = row.get(2).context("Failed to get role")?;
        let description: String = row.get(3).context("Failed to get description")?;
        let parent_id: Option<String> = row.get(4).context("Failed to get parent_id")?;
        let created_at_str: String = row.get(5).context("Failed to get created_at")?;
        let modified_at_str: String = row.get(6).context("Failed to get modified_at")?;

        let created_at =
            Self::parse_timestamp(&created_at_str).context("Failed to parse created_at")?;
        let modified_at =
            Self::parse_timestamp(&modified_at_str).context("Failed to parse modified_at")?;

        Ok(OrgNode {
            id,
            name,
            role,
            description,
            parent_id,
            created_at,
            modified_at,
        })
    }

    /// Run a SELECT and convert every row while the statement is live
    async fn query_nodes(
        conn: &Connection,
        sql: &str,
        params: impl IntoParams + Send,
    ) -> Result<Vec<OrgNode>, StoreError> {
        let mut stmt = conn.prepare(sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare query: {}", e))
        })?;

        let mut rows = stmt.query(params).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute query: {}", e))
        })?;

        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to fetch row: {}", e)))?
        {
            let node = Self::row_to_node(&row).map_err(|e| StoreError::Corrupt(format!("{:#}", e)))?;
            nodes.push(node);
        }

        Ok(nodes)
    }

    async fn query_one(
        conn: &Connection,
        sql: &str,
        params: impl IntoParams + Send,
    ) -> Result<Option<OrgNode>, StoreError> {
        Ok(Self::query_nodes(conn, sql, params).await?.into_iter().next())
    }

    /// Map a libsql failure to a typed store error
    ///
    /// `reference` names the node a foreign key failure is about: the parent
    /// for inserts and reparents, the deleted node for deletes.
    fn classify(err: libsql::Error, context: &str, reference: Option<&str>) -> StoreError {
        let message = err.to_string();

        if message.contains("UNIQUE constraint failed") {
            let constraint = if message.contains("org_nodes.role") {
                UniqueConstraint::Role
            } else if message.contains("idx_org_nodes_single_root") {
                UniqueConstraint::SingleRoot
            } else {
                UniqueConstraint::Id
            };
            return StoreError::unique_violation(constraint, message);
        }

        if message.contains("FOREIGN KEY constraint failed") {
            return StoreError::missing_reference(reference.unwrap_or_default());
        }

        StoreError::Database(DatabaseError::sql_execution(format!(
            "{}: {}",
            context, message
        )))
    }

    async fn insert_node(conn: &Connection, node: &OrgNode) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO org_nodes (id, name, role, description, parent_id, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                node.id.as_str(),
                node.name.as_str(),
                node.role.as_str(),
                node.description.as_str(),
                node.parent_id.as_deref(),
                node.created_at.to_rfc3339(),
                node.modified_at.to_rfc3339(),
            ),
        )
        .await
        .map_err(|e| Self::classify(e, "Failed to insert node", node.parent_id.as_deref()))?;

        Ok(())
    }

    async fn reparent_row(
        conn: &Connection,
        id: &str,
        parent_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let rows_affected = conn
            .execute(
                "UPDATE org_nodes SET parent_id = ?, modified_at = ? WHERE id = ?",
                (parent_id, Utc::now().to_rfc3339(), id),
            )
            .await
            .map_err(|e| Self::classify(e, "Failed to reparent node", parent_id))?;

        if rows_affected == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    async fn delete_row(conn: &Connection, id: &str) -> Result<(), StoreError> {
        let rows_affected = conn
            .execute("DELETE FROM org_nodes WHERE id = ?", [id])
            .await
            .map_err(|e| Self::classify(e, "Failed to delete node", Some(id)))?;

        if rows_affected == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    async fn begin(conn: &Connection) -> Result<(), StoreError> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(())
    }

    async fn commit(conn: &Connection) -> Result<(), StoreError> {
        if let Err(e) = conn.execute("COMMIT", ()).await {
            Self::rollback(conn).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to commit transaction: {}",
                e
            ))
            .into());
        }
        Ok(())
    }

    async fn rollback(conn: &Connection) {
        if let Err(e) = conn.execute("ROLLBACK", ()).await {
            tracing::warn!("Rollback failed: {}", e);
        }
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<OrgNode>, StoreError> {
        let conn = self.conn().await?;
        Self::query_one(
            &conn,
            &format!("SELECT {} FROM org_nodes WHERE id = ?", NODE_COLUMNS),
            [id],
        )
        .await
    }

    async fn find_by_role(&self, role: &str) -> Result<Option<OrgNode>, StoreError> {
        let conn = self.conn().await?;
        Self::query_one(
            &conn,
            &format!("SELECT {} FROM org_nodes WHERE role = ?", NODE_COLUMNS),
            [role],
        )
        .await
    }

    async fn find_roots(&self) -> Result<Vec<OrgNode>, StoreError> {
        let conn = self.conn().await?;
        Self::query_nodes(
            &conn,
            &format!(
                "SELECT {} FROM org_nodes WHERE parent_id IS NULL ORDER BY rowid ASC",
                NODE_COLUMNS
            ),
            (),
        )
        .await
    }

    async fn find_all(&self) -> Result<Vec<OrgNode>, StoreError> {
        let conn = self.conn().await?;
        Self::query_nodes(
            &conn,
            &format!("SELECT {} FROM org_nodes ORDER BY rowid ASC", NODE_COLUMNS),
            (),
        )
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM org_nodes", ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to count nodes: {}", e)))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .ok_or_else(|| StoreError::Corrupt("COUNT(*) returned no row".to_string()))?;
        let count: i64 = row
            .get(0)
            .map_err(|e| StoreError::Corrupt(format!("Failed to read count: {}", e)))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn find_direct_children(&self, id: &str) -> Result<Vec<OrgNode>, StoreError> {
        let conn = self.conn().await?;
        Self::query_nodes(
            &conn,
            &format!(
                "SELECT {} FROM org_nodes WHERE parent_id = ? ORDER BY rowid ASC",
                NODE_COLUMNS
            ),
            [id],
        )
        .await
    }

    async fn find_subtree(&self, id: &str) -> Result<Vec<OrgNode>, StoreError> {
        let conn = self.conn().await?;
        // Depth is capped at the row count so a corrupt cycle terminates;
        // duplicates it would produce are caught by tree projection.
        let sql = "WITH RECURSIVE subtree(id, depth) AS (
                SELECT id, 0 FROM org_nodes WHERE id = ?
                UNION ALL
                SELECT child.id, subtree.depth + 1
                FROM org_nodes child
                JOIN subtree ON child.parent_id = subtree.id
                WHERE subtree.depth < (SELECT COUNT(*) FROM org_nodes)
            )
            SELECT n.id, n.name, n.role, n.description, n.parent_id, n.created_at, n.modified_at
            FROM subtree
            JOIN org_nodes n ON n.id = subtree.id
            ORDER BY subtree.depth ASC, n.rowid ASC";

        Self::query_nodes(&conn, sql, [id]).await
    }

    async fn create(&self, node: OrgNode) -> Result<OrgNode, StoreError> {
        let conn = self.conn().await?;
        Self::insert_node(&conn, &node).await?;
        tracing::debug!("Inserted node {} ({})", node.id, node.role);
        Ok(node)
    }

    async fn create_many(&self, nodes: Vec<OrgNode>) -> Result<Vec<OrgNode>, StoreError> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        for node in &nodes {
            if let Err(e) = Self::insert_node(&conn, node).await {
                Self::rollback(&conn).await;
                return Err(e);
            }
        }

        Self::commit(&conn).await?;
        tracing::debug!("Inserted {} nodes in one transaction", nodes.len());
        Ok(nodes)
    }

    async fn update(&self, id: &str, patch: NodePatch) -> Result<OrgNode, StoreError> {
        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        let result = async {
            let mut node = Self::query_one(
                &conn,
                &format!("SELECT {} FROM org_nodes WHERE id = ?", NODE_COLUMNS),
                [id],
            )
            .await?
            .ok_or_else(|| StoreError::not_found(id))?;

            patch.apply_to(&mut node);

            conn.execute(
                "UPDATE org_nodes SET name = ?, role = ?, description = ?, parent_id = ?, modified_at = ?
                 WHERE id = ?",
                (
                    node.name.as_str(),
                    node.role.as_str(),
                    node.description.as_str(),
                    node.parent_id.as_deref(),
                    node.modified_at.to_rfc3339(),
                    id,
                ),
            )
            .await
            .map_err(|e| Self::classify(e, "Failed to update node", node.parent_id.as_deref()))?;

            Ok::<OrgNode, StoreError>(node)
        }
        .await;

        match result {
            Ok(node) => {
                Self::commit(&conn).await?;
                Ok(node)
            }
            Err(e) => {
                Self::rollback(&conn).await;
                Err(e)
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn().await?;
        Self::delete_row(&conn, id).await
    }

    async fn apply_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }

        let conn = self.conn().await?;
        Self::begin(&conn).await?;

        for write in &writes {
            let result = match write {
                BatchWrite::Reparent { id, parent_id } => {
                    Self::reparent_row(&conn, id, parent_id.as_deref()).await
                }
                BatchWrite::Delete { id } => Self::delete_row(&conn, id).await,
            };

            if let Err(e) = result {
                Self::rollback(&conn).await;
                return Err(e);
            }
        }

        Self::commit(&conn).await?;
        tracing::debug!("Applied batch of {} writes", writes.len());
        Ok(())
    }
}

#[cfg(test)]
#[path = "turso_store_test.rs"]
mod turso_store_test;
