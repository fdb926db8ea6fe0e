use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::error;

use crate::entities::sequence_counter;
use crate::errors::ServiceError;

pub const CONSIGNMENT_SEQUENCE: &str = "consignment";
pub const INVOICE_SEQUENCE: &str = "invoice";
pub const PAYMENT_SEQUENCE: &str = "payment";

/// Claims the next value of a named counter inside the caller's transaction.
///
/// The increment is a single UPDATE so concurrent claimants serialize on the
/// row and never observe the same value; the value is read back in the same
/// transaction. A rolled-back caller leaves a gap, which is acceptable.
/// First use inserts the row at 1.
pub async fn next_value<C>(conn: &C, name: &str) -> Result<i64, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let result = sequence_counter::Entity::update_many()
        .col_expr(
            sequence_counter::Column::LastValue,
            Expr::col(sequence_counter::Column::LastValue).add(1),
        )
        .col_expr(sequence_counter::Column::UpdatedAt, Expr::value(now))
        .filter(sequence_counter::Column::Name.eq(name))
        .exec(conn)
        .await
        .map_err(|e| {
            error!(counter = name, error = %e, "Failed to increment sequence counter");
            ServiceError::DatabaseError(e)
        })?;

    if result.rows_affected == 0 {
        let seeded = sequence_counter::ActiveModel {
            name: Set(name.to_string()),
            last_value: Set(1),
            updated_at: Set(now),
        };
        seeded.insert(conn).await.map_err(|e| {
            error!(counter = name, error = %e, "Failed to seed sequence counter");
            ServiceError::DatabaseError(e)
        })?;
        return Ok(1);
    }

    let row = sequence_counter::Entity::find_by_id(name.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| {
            ServiceError::InternalError(format!("sequence counter '{}' vanished mid-claim", name))
        })?;

    Ok(row.last_value)
}

/// Zero-padded human-readable code, e.g. `GR0001`. Values past 9999 widen
/// naturally.
pub fn format_code(prefix: &str, value: i64) -> String {
    format!("{}{:04}", prefix, value)
}

pub async fn next_gr_number<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    Ok(format_code("GR", next_value(conn, CONSIGNMENT_SEQUENCE).await?))
}

pub async fn next_invoice_number<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    Ok(format_code("INV", next_value(conn, INVOICE_SEQUENCE).await?))
}

pub async fn next_payment_number<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    Ok(format_code("PAY", next_value(conn, PAYMENT_SEQUENCE).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_zero_padded_to_four_digits() {
        assert_eq!(format_code("GR", 1), "GR0001");
        assert_eq!(format_code("INV", 42), "INV0042");
        assert_eq!(format_code("PAY", 9999), "PAY9999");
    }

    #[test]
    fn codes_widen_past_four_digits() {
        assert_eq!(format_code("GR", 10000), "GR10000");
        assert_eq!(format_code("INV", 123456), "INV123456");
    }
}
