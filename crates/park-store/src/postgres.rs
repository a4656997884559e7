use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::CatalogError;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Cage, CageFilter, CageId, CageStatus, Dinosaur, DinosaurFilter, DinosaurId, OccupancyUpdate,
    Result, StoreError,
    store::{CageStore, DinosaurStore},
};

const CAGE_COLUMNS: &str =
    "id, cage_type, capacity, current_capacity, status, created_at, updated_at";
const DINOSAUR_COLUMNS: &str = "id, cage_id, name, species, diet, created_at, updated_at";

/// PostgreSQL-backed park store.
#[derive(Clone)]
pub struct PostgresParkStore {
    pool: PgPool,
}

impl PostgresParkStore {
    /// Creates a new PostgreSQL park store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_cage(row: PgRow) -> Result<Cage> {
        Ok(Cage {
            id: CageId::from_uuid(row.try_get::<Uuid, _>("id")?),
            cage_type: parse_column(&row, "cage_type")?,
            capacity: count_from_db(row.try_get("capacity")?)?,
            current_capacity: count_from_db(row.try_get("current_capacity")?)?,
            status: parse_column(&row, "status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_dinosaur(row: PgRow) -> Result<Dinosaur> {
        Ok(Dinosaur {
            id: DinosaurId::from_uuid(row.try_get::<Uuid, _>("id")?),
            cage_id: row
                .try_get::<Option<Uuid>, _>("cage_id")?
                .map(CageId::from_uuid),
            name: row.try_get("name")?,
            species: parse_column(&row, "species")?,
            diet: parse_column(&row, "diet")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr<Err = CatalogError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: CatalogError| StoreError::InvalidData(format!("column {column}: {e}")))
}

/// Locks the cage row until the transaction ends and returns its occupancy
/// and status.
async fn lock_cage(
    tx: &mut Transaction<'_, Postgres>,
    id: CageId,
) -> Result<(u32, CageStatus)> {
    let row: Option<(i32, String)> =
        sqlx::query_as("SELECT current_capacity, status FROM cages WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?;

    match row {
        Some((occupancy, status)) => {
            let status = status.parse().map_err(|e: CatalogError| {
                StoreError::InvalidData(format!("column status: {e}"))
            })?;
            Ok((count_from_db(occupancy)?, status))
        }
        None => Err(StoreError::cage_not_found(id)),
    }
}

fn count_from_db(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative count {value}")))
}

fn count_to_db(value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("count {value} out of range")))
}

#[async_trait]
impl CageStore for PostgresParkStore {
    async fn create_cage(&self, cage: &Cage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cages (id, cage_type, capacity, current_capacity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(cage.id.as_uuid())
        .bind(cage.cage_type.as_str())
        .bind(count_to_db(cage.capacity)?)
        .bind(count_to_db(cage.current_capacity)?)
        .bind(cage.status.as_str())
        .bind(cage.created_at)
        .bind(cage.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_cage(&self, id: CageId) -> Result<Cage> {
        let row = sqlx::query(&format!("SELECT {CAGE_COLUMNS} FROM cages WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_cage(row),
            None => Err(StoreError::cage_not_found(id)),
        }
    }

    async fn list_cages(&self, filter: &CageFilter) -> Result<Vec<Cage>> {
        let mut sql = format!("SELECT {CAGE_COLUMNS} FROM cages WHERE 1=1");
        if filter.status.is_some() {
            sql.push_str(" AND status = $1");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_cage).collect()
    }

    async fn update_cage_status(
        &self,
        id: CageId,
        status: CageStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let (occupancy, _) = lock_cage(&mut tx, id).await?;

        if status.is_down() && occupancy > 0 {
            return Err(StoreError::cage_conflict(
                id,
                format!("cannot power down with {occupancy} occupants"),
            ));
        }

        sqlx::query("UPDATE cages SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(at)
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn add_dinosaur(&self, update: &OccupancyUpdate) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Row locks on both records hold off any competing writer until commit.
        let (occupancy, status) = lock_cage(&mut tx, update.cage_id).await?;

        let link: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT cage_id FROM dinosaurs WHERE id = $1 FOR UPDATE")
                .bind(update.dinosaur_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let link = match link {
            Some(link) => link,
            None => return Err(StoreError::dinosaur_not_found(update.dinosaur_id)),
        };

        if occupancy != update.expected_occupancy {
            return Err(StoreError::cage_conflict(
                update.cage_id,
                format!(
                    "expected occupancy {}, found {occupancy}",
                    update.expected_occupancy
                ),
            ));
        }
        if status.is_down() {
            return Err(StoreError::cage_conflict(update.cage_id, "cage is powered down"));
        }
        if let Some(current) = link {
            return Err(StoreError::dinosaur_conflict(
                update.dinosaur_id,
                format!("already lives in cage {current}"),
            ));
        }

        sqlx::query("UPDATE cages SET current_capacity = $1, updated_at = $2 WHERE id = $3")
            .bind(count_to_db(update.occupancy)?)
            .bind(update.updated_at)
            .bind(update.cage_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE dinosaurs SET cage_id = $1, updated_at = $2 WHERE id = $3")
            .bind(update.cage_id.as_uuid())
            .bind(update.updated_at)
            .bind(update.dinosaur_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            cage_id = %update.cage_id,
            dinosaur_id = %update.dinosaur_id,
            occupancy = update.occupancy,
            "dinosaur linked to cage"
        );
        Ok(())
    }

    async fn remove_dinosaur(&self, update: &OccupancyUpdate) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let (occupancy, _) = lock_cage(&mut tx, update.cage_id).await?;

        let link: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT cage_id FROM dinosaurs WHERE id = $1 FOR UPDATE")
                .bind(update.dinosaur_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let link = match link {
            Some(link) => link,
            None => return Err(StoreError::dinosaur_not_found(update.dinosaur_id)),
        };

        if occupancy != update.expected_occupancy {
            return Err(StoreError::cage_conflict(
                update.cage_id,
                format!(
                    "expected occupancy {}, found {occupancy}",
                    update.expected_occupancy
                ),
            ));
        }
        if link != Some(update.cage_id.as_uuid()) {
            return Err(StoreError::dinosaur_conflict(
                update.dinosaur_id,
                format!("does not live in cage {}", update.cage_id),
            ));
        }

        sqlx::query("UPDATE cages SET current_capacity = $1, updated_at = $2 WHERE id = $3")
            .bind(count_to_db(update.occupancy)?)
            .bind(update.updated_at)
            .bind(update.cage_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE dinosaurs SET cage_id = NULL, updated_at = $1 WHERE id = $2")
            .bind(update.updated_at)
            .bind(update.dinosaur_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            cage_id = %update.cage_id,
            dinosaur_id = %update.dinosaur_id,
            occupancy = update.occupancy,
            "dinosaur unlinked from cage"
        );
        Ok(())
    }
}

#[async_trait]
impl DinosaurStore for PostgresParkStore {
    async fn create_dinosaur(&self, dinosaur: &Dinosaur) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO dinosaurs (id, cage_id, name, species, diet, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(dinosaur.id.as_uuid())
        .bind(dinosaur.cage_id.map(|id| id.as_uuid()))
        .bind(&dinosaur.name)
        .bind(dinosaur.species.as_str())
        .bind(dinosaur.diet.as_str())
        .bind(dinosaur.created_at)
        .bind(dinosaur.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_dinosaur(&self, id: DinosaurId) -> Result<Dinosaur> {
        let row = sqlx::query(&format!(
            "SELECT {DINOSAUR_COLUMNS} FROM dinosaurs WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_dinosaur(row),
            None => Err(StoreError::dinosaur_not_found(id)),
        }
    }

    async fn list_dinosaurs(&self) -> Result<Vec<Dinosaur>> {
        let rows = sqlx::query(&format!(
            "SELECT {DINOSAUR_COLUMNS} FROM dinosaurs ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_dinosaur).collect()
    }

    async fn list_dinosaurs_by_cage(
        &self,
        cage_id: CageId,
        filter: &DinosaurFilter,
    ) -> Result<Vec<Dinosaur>> {
        let mut sql = format!("SELECT {DINOSAUR_COLUMNS} FROM dinosaurs WHERE cage_id = $1");
        if filter.species.is_some() {
            sql.push_str(" AND species = $2");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut query = sqlx::query(&sql).bind(cage_id.as_uuid());
        if let Some(species) = filter.species {
            query = query.bind(species.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_dinosaur).collect()
    }

    async fn update_dinosaur_name(
        &self,
        id: DinosaurId,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE dinosaurs SET name = $1, updated_at = $2 WHERE id = $3")
            .bind(name)
            .bind(at)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::dinosaur_not_found(id));
        }
        Ok(())
    }
}
