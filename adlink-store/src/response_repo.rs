use adlink_core::repository::ResponseRepository;
use adlink_core::{CoreError, CoreResult};
use adlink_shared::{NewResponse, OfferResponse, ResponseStatus, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::map_db_err;
use crate::market_store::SqliteTransaction;

const RESPONSE_COLUMNS: &str =
    "id, offer_id, channel_id, responder_id, message, proposed_price, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ResponseRow {
    id: i64,
    offer_id: i64,
    channel_id: i64,
    responder_id: i64,
    message: Option<String>,
    proposed_price: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResponseRow> for OfferResponse {
    type Error = CoreError;

    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        Ok(OfferResponse {
            id: row.id,
            offer_id: row.offer_id,
            channel_id: row.channel_id,
            responder_id: row.responder_id,
            message: row.message,
            proposed_price: row.proposed_price,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ResponseRepository for SqliteTransaction {
    async fn insert_response(
        &mut self,
        responder_id: UserId,
        offer_id: i64,
        response: &NewResponse,
    ) -> CoreResult<OfferResponse> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO offer_responses (offer_id, channel_id, responder_id, message, proposed_price, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            RESPONSE_COLUMNS
        );

        let row = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(offer_id)
            .bind(response.channel_id)
            .bind(responder_id)
            .bind(&response.message)
            .bind(response.proposed_price)
            .bind(ResponseStatus::Pending.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        row.try_into()
    }

    async fn get_response(&mut self, id: i64) -> CoreResult<Option<OfferResponse>> {
        let sql = format!("SELECT {} FROM offer_responses WHERE id = ?", RESPONSE_COLUMNS);
        sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .map(OfferResponse::try_from)
            .transpose()
    }

    async fn list_responses_for_offer(&mut self, offer_id: i64) -> CoreResult<Vec<OfferResponse>> {
        let sql = format!(
            "SELECT {} FROM offer_responses WHERE offer_id = ? ORDER BY id ASC",
            RESPONSE_COLUMNS
        );
        let rows = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(offer_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        rows.into_iter().map(OfferResponse::try_from).collect()
    }

    async fn update_response_status(
        &mut self,
        id: i64,
        status: ResponseStatus,
    ) -> CoreResult<OfferResponse> {
        let sql = format!(
            "UPDATE offer_responses SET status = ?, updated_at = ? WHERE id = ? RETURNING {}",
            RESPONSE_COLUMNS
        );
        let row = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| CoreError::not_found("response", id))?;

        row.try_into()
    }
}
