use sea_orm::{ColumnTrait, QueryFilter};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{party, vehicle};
use crate::errors::ServiceError;

/// Read-only lookups into the party/vehicle master data. Rows are maintained
/// outside the lifecycle core (seeded or managed by the admin surface); the
/// lifecycle services only ever resolve and snapshot them.
#[derive(Clone)]
pub struct DirectoryService {
    db_pool: Arc<DbPool>,
}

impl DirectoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Fetches an active party or fails with NotFound.
    pub async fn require_party(&self, party_id: Uuid) -> Result<party::Model, ServiceError> {
        party::Entity::find_active()
            .filter(party::Column::Id.eq(party_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(party_id = %party_id, "Party not found");
                ServiceError::NotFound(format!("Party {} not found", party_id))
            })
    }

    /// Fetches an active vehicle or fails with NotFound.
    pub async fn require_vehicle(&self, vehicle_id: Uuid) -> Result<vehicle::Model, ServiceError> {
        vehicle::Entity::find_active()
            .filter(vehicle::Column::Id.eq(vehicle_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(vehicle_id = %vehicle_id, "Vehicle not found");
                ServiceError::NotFound(format!("Vehicle {} not found", vehicle_id))
            })
    }
}
