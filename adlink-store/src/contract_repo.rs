use adlink_core::repository::ContractRepository;
use adlink_core::{CoreError, CoreResult};
use adlink_shared::{Contract, ContractStatus, NewContract, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::map_db_err;
use crate::market_store::SqliteTransaction;

const CONTRACT_COLUMNS: &str = "id, offer_id, response_id, advertiser_id, channel_owner_id, price, status, \
                                placement_deadline, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ContractRow {
    id: i64,
    offer_id: i64,
    response_id: i64,
    advertiser_id: i64,
    channel_owner_id: i64,
    price: i64,
    status: String,
    placement_deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = CoreError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        Ok(Contract {
            id: row.id,
            offer_id: row.offer_id,
            response_id: row.response_id,
            advertiser_id: row.advertiser_id,
            channel_owner_id: row.channel_owner_id,
            price: row.price,
            status: row.status.parse()?,
            placement_deadline: row.placement_deadline,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ContractRepository for SqliteTransaction {
    async fn insert_contract(&mut self, contract: &NewContract) -> CoreResult<Contract> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO contracts (offer_id, response_id, advertiser_id, channel_owner_id, price, status, placement_deadline, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            CONTRACT_COLUMNS
        );

        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(contract.offer_id)
            .bind(contract.response_id)
            .bind(contract.advertiser_id)
            .bind(contract.channel_owner_id)
            .bind(contract.price)
            .bind(ContractStatus::Active.as_str())
            .bind(contract.placement_deadline)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        row.try_into()
    }

    async fn get_contract(&mut self, id: i64) -> CoreResult<Option<Contract>> {
        let sql = format!("SELECT {} FROM contracts WHERE id = ?", CONTRACT_COLUMNS);
        sqlx::query_as::<_, ContractRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .map(Contract::try_from)
            .transpose()
    }

    async fn find_contract_for_offer(&mut self, offer_id: i64) -> CoreResult<Option<Contract>> {
        let sql = format!("SELECT {} FROM contracts WHERE offer_id = ?", CONTRACT_COLUMNS);
        sqlx::query_as::<_, ContractRow>(&sql)
            .bind(offer_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .map(Contract::try_from)
            .transpose()
    }

    async fn list_contracts_for_user(&mut self, user_id: UserId) -> CoreResult<Vec<Contract>> {
        let sql = format!(
            "SELECT {} FROM contracts WHERE advertiser_id = ? OR channel_owner_id = ? ORDER BY id ASC",
            CONTRACT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        rows.into_iter().map(Contract::try_from).collect()
    }

    async fn update_contract_status(
        &mut self,
        id: i64,
        status: ContractStatus,
    ) -> CoreResult<Contract> {
        let sql = format!(
            "UPDATE contracts SET status = ?, updated_at = ? WHERE id = ? RETURNING {}",
            CONTRACT_COLUMNS
        );
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| CoreError::not_found("contract", id))?;

        row.try_into()
    }
}
