use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::audit_log::{self, AuditAction};
use crate::request_id::current_request_id;

/// Best-effort audit trail writer. Entries are recorded after the primary
/// transaction commits; failures are logged and swallowed so an audit outage
/// never fails a business operation.
#[derive(Clone)]
pub struct AuditLogger {
    db_pool: Arc<DbPool>,
}

impl AuditLogger {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn record(
        &self,
        table_name: &str,
        record_id: impl ToString,
        action: AuditAction,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
        actor_id: Uuid,
    ) {
        let request_meta =
            current_request_id().map(|rid| json!({ "request_id": rid.as_str() }).to_string());

        let entry = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            table_name: Set(table_name.to_string()),
            record_id: Set(record_id.to_string()),
            action: Set(action),
            old_values: Set(old_values.map(|v| v.to_string())),
            new_values: Set(new_values.map(|v| v.to_string())),
            actor_id: Set(actor_id),
            request_meta: Set(request_meta),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = entry.insert(&*self.db_pool).await {
            warn!(
                table = table_name,
                action = %action,
                error = %e,
                "Failed to write audit log entry"
            );
        }
    }
}

/// Serializes a row into the JSON snapshot stored in old/new_values.
pub fn snapshot<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "Failed to serialize audit snapshot");
            None
        }
    }
}
