use adlink_core::repository::OfferRepository;
use adlink_core::{CoreError, CoreResult};
use adlink_shared::{NewOffer, Offer, OfferFilter, OfferStatus, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::database::map_db_err;
use crate::market_store::SqliteTransaction;

const OFFER_COLUMNS: &str =
    "id, title, description, category, budget, placement_deadline, created_by, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: i64,
    title: String,
    description: Option<String>,
    category: Option<String>,
    budget: i64,
    placement_deadline: Option<DateTime<Utc>>,
    created_by: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = CoreError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        Ok(Offer {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            budget: row.budget,
            placement_deadline: row.placement_deadline,
            created_by: row.created_by,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OfferRepository for SqliteTransaction {
    async fn insert_offer(
        &mut self,
        created_by: UserId,
        offer: &NewOffer,
        status: OfferStatus,
    ) -> CoreResult<Offer> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO offers (title, description, category, budget, placement_deadline, created_by, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            OFFER_COLUMNS
        );

        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(offer.title.trim())
            .bind(&offer.description)
            .bind(&offer.category)
            .bind(offer.budget)
            .bind(offer.placement_deadline)
            .bind(created_by)
            .bind(status.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        row.try_into()
    }

    async fn get_offer(&mut self, id: i64) -> CoreResult<Option<Offer>> {
        let sql = format!("SELECT {} FROM offers WHERE id = ?", OFFER_COLUMNS);
        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        row.map(Offer::try_from).transpose()
    }

    async fn list_offers(&mut self, filter: &OfferFilter) -> CoreResult<Vec<Offer>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM offers WHERE 1 = 1", OFFER_COLUMNS));
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(created_by) = filter.created_by {
            query.push(" AND created_by = ").push_bind(created_by);
        }
        // ids are assigned in creation order
        query.push(" ORDER BY id DESC");

        let rows = query
            .build_query_as::<OfferRow>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        rows.into_iter().map(Offer::try_from).collect()
    }

    async fn update_offer_status(&mut self, id: i64, status: OfferStatus) -> CoreResult<Offer> {
        let sql = format!(
            "UPDATE offers SET status = ?, updated_at = ? WHERE id = ? RETURNING {}",
            OFFER_COLUMNS
        );
        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| CoreError::not_found("offer", id))?;

        row.try_into()
    }
}
