//! SQLite parking store implementation.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Occupancy, ParkingLot, ParkingSpot, Reservation, SpotStatus, User};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{LotUpdate, ParkingStore, StoreError, StoreResult};

/// SQLite-backed parking store.
///
/// The spot claim runs as a single conditional `UPDATE ... RETURNING` inside
/// the booking transaction, so concurrent bookings cannot take the same spot;
/// resize and delete are equally all-or-nothing transactions.
#[derive(Clone)]
pub struct SqliteParkingStore {
    pool: Pool<Sqlite>,
}

impl SqliteParkingStore {
    /// Connects to the database and ensures the schema is present.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every new `:memory:` connection is a distinct database, so those
        // URLs get a single-connection pool.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Runs database migrations.
    async fn run_migrations(&self) -> StoreResult<()> {
        self.pool
            .execute(SCHEMA_SQL)
            .await
            .map_err(|e| StoreError::Other(format!("migration error: {e}")))?;

        tracing::debug!("Database schema ensured");
        Ok(())
    }
}

// =============================================================================
// Row types
// =============================================================================

fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Other(format!("invalid timestamp in database: {e}")))
}

fn parse_id(value: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StoreError::Other(format!("invalid id in database: {e}")))
}

/// Database row for User.
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    phone: Option<String>,
    is_admin: bool,
    created_at: String,
}

impl UserRow {
    fn try_into_user(self) -> StoreResult<User> {
        Ok(User {
            id: parse_id(&self.id)?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            phone: self.phone,
            is_admin: self.is_admin,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Database row for ParkingLot.
#[derive(Debug, FromRow)]
struct LotRow {
    id: String,
    name: String,
    address: String,
    pin_code: String,
    price_per_hour: f64,
    maximum_spots: i64,
    created_at: String,
}

impl LotRow {
    fn try_into_lot(self) -> StoreResult<ParkingLot> {
        Ok(ParkingLot {
            id: parse_id(&self.id)?,
            name: self.name,
            address: self.address,
            pin_code: self.pin_code,
            price_per_hour: self.price_per_hour,
            maximum_spots: self.maximum_spots as u32,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Database row for ParkingSpot.
#[derive(Debug, FromRow)]
struct SpotRow {
    id: String,
    lot_id: String,
    spot_number: String,
    status: String,
    created_at: String,
}

impl SpotRow {
    fn try_into_spot(self) -> StoreResult<ParkingSpot> {
        let status = SpotStatus::from_code(&self.status)
            .ok_or_else(|| StoreError::Other(format!("unknown spot status: {}", self.status)))?;
        Ok(ParkingSpot {
            id: parse_id(&self.id)?,
            lot_id: parse_id(&self.lot_id)?,
            spot_number: self.spot_number,
            status,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Database row for Reservation.
#[derive(Debug, FromRow)]
struct ReservationRow {
    id: String,
    spot_id: String,
    user_id: String,
    vehicle_number: String,
    parking_timestamp: String,
    leaving_timestamp: Option<String>,
    parking_cost: Option<f64>,
}

impl ReservationRow {
    fn try_into_reservation(self) -> StoreResult<Reservation> {
        let leaving_timestamp = match self.leaving_timestamp {
            Some(value) => Some(parse_timestamp(&value)?),
            None => None,
        };
        Ok(Reservation {
            id: parse_id(&self.id)?,
            spot_id: parse_id(&self.spot_id)?,
            user_id: parse_id(&self.user_id)?,
            vehicle_number: self.vehicle_number,
            parking_timestamp: parse_timestamp(&self.parking_timestamp)?,
            leaving_timestamp,
            parking_cost: self.parking_cost,
        })
    }
}

/// Maps a unique-constraint violation on the users table to `AlreadyExists`.
fn map_user_conflict(e: sqlx::Error, username: &str, email: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let field = if db.message().contains("email") {
                email
            } else {
                username
            };
            return StoreError::already_exists("User", field.to_string());
        }
    }
    StoreError::Database(e)
}

// =============================================================================
// Store implementation
// =============================================================================

#[async_trait]
impl ParkingStore for SqliteParkingStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, phone, is_admin, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(user.is_admin)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_user_conflict(e, &user.username, &user.email))?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::try_into_user).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::try_into_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::try_into_user).transpose()
    }

    async fn list_members(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE is_admin = 0 ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(UserRow::try_into_user).collect()
    }

    async fn set_admin(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("User", id.to_string()));
        }
        Ok(())
    }

    async fn create_lot(&self, lot: ParkingLot) -> StoreResult<ParkingLot> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO parking_lots (id, name, address, pin_code, price_per_hour, \
             maximum_spots, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(lot.id.to_string())
        .bind(&lot.name)
        .bind(&lot.address)
        .bind(&lot.pin_code)
        .bind(lot.price_per_hour)
        .bind(lot.maximum_spots as i64)
        .bind(lot.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for sequence in 1..=lot.maximum_spots {
            let spot = ParkingSpot::new(lot.id, sequence);
            sqlx::query(
                "INSERT INTO parking_spots (id, lot_id, spot_number, status, created_at) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(spot.id.to_string())
            .bind(spot.lot_id.to_string())
            .bind(&spot.spot_number)
            .bind(spot.status.as_code())
            .bind(spot.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(lot)
    }

    async fn get_lot(&self, id: Uuid) -> StoreResult<Option<ParkingLot>> {
        let row: Option<LotRow> = sqlx::query_as("SELECT * FROM parking_lots WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(LotRow::try_into_lot).transpose()
    }

    async fn list_lots(&self) -> StoreResult<Vec<ParkingLot>> {
        let rows: Vec<LotRow> =
            sqlx::query_as("SELECT * FROM parking_lots ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(LotRow::try_into_lot).collect()
    }

    async fn update_lot(&self, id: Uuid, update: LotUpdate) -> StoreResult<ParkingLot> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        let row: Option<LotRow> = sqlx::query_as("SELECT * FROM parking_lots WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?;
        let lot = row
            .ok_or_else(|| StoreError::not_found("ParkingLot", &id_str))?
            .try_into_lot()?;

        let spots: Vec<SpotRow> = sqlx::query_as(
            "SELECT * FROM parking_spots WHERE lot_id = ? ORDER BY spot_number ASC",
        )
        .bind(&id_str)
        .fetch_all(&mut *tx)
        .await?;
        let current = spots.len() as u32;

        if update.maximum_spots > current {
            for sequence in (current + 1)..=update.maximum_spots {
                let spot = ParkingSpot::new(id, sequence);
                sqlx::query(
                    "INSERT INTO parking_spots (id, lot_id, spot_number, status, created_at) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(spot.id.to_string())
                .bind(spot.lot_id.to_string())
                .bind(&spot.spot_number)
                .bind(spot.status.as_code())
                .bind(spot.created_at.to_rfc3339())
                .execute(&mut *tx)
                .await?;
            }
        } else if update.maximum_spots < current {
            // Dropping the transaction on the error path rolls every change
            // back, so a blocked shrink leaves the lot untouched.
            let candidates = &spots[update.maximum_spots as usize..];
            if candidates.iter().any(|s| s.status == "O") {
                return Err(StoreError::OccupiedSpots { id: id_str });
            }
            for candidate in candidates {
                sqlx::query("DELETE FROM parking_spots WHERE id = ?")
                    .bind(&candidate.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query(
            "UPDATE parking_lots SET name = ?, address = ?, pin_code = ?, price_per_hour = ?, \
             maximum_spots = ? WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.address)
        .bind(&update.pin_code)
        .bind(update.price_per_hour)
        .bind(update.maximum_spots as i64)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ParkingLot {
            name: update.name,
            address: update.address,
            pin_code: update.pin_code,
            price_per_hour: update.price_per_hour,
            maximum_spots: update.maximum_spots,
            ..lot
        })
    }

    async fn delete_lot(&self, id: Uuid) -> StoreResult<()> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM parking_lots WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("ParkingLot", id_str));
        }

        let occupied: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM parking_spots WHERE lot_id = ? AND status = 'O'",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?;
        if occupied > 0 {
            return Err(StoreError::OccupiedSpots { id: id_str });
        }

        // Spots go with the lot via ON DELETE CASCADE; closed reservation
        // history is kept.
        sqlx::query("DELETE FROM parking_lots WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn lot_occupancy(&self, lot_id: Uuid) -> StoreResult<Occupancy> {
        let (available, occupied): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(CASE WHEN status = 'A' THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN status = 'O' THEN 1 ELSE 0 END), 0) \
             FROM parking_spots WHERE lot_id = ?",
        )
        .bind(lot_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(Occupancy {
            available: available as u32,
            occupied: occupied as u32,
        })
    }

    async fn list_spots(&self, lot_id: Uuid) -> StoreResult<Vec<ParkingSpot>> {
        let rows: Vec<SpotRow> = sqlx::query_as(
            "SELECT * FROM parking_spots WHERE lot_id = ? ORDER BY spot_number ASC",
        )
        .bind(lot_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SpotRow::try_into_spot).collect()
    }

    async fn get_spot(&self, id: Uuid) -> StoreResult<Option<ParkingSpot>> {
        let row: Option<SpotRow> = sqlx::query_as("SELECT * FROM parking_spots WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(SpotRow::try_into_spot).transpose()
    }

    async fn open_reservation(
        &self,
        lot_id: Uuid,
        user_id: Uuid,
        vehicle_number: &str,
    ) -> StoreResult<(Reservation, ParkingSpot)> {
        let lot_id_str = lot_id.to_string();
        let mut tx = self.pool.begin().await?;

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM parking_lots WHERE id = ?")
            .bind(&lot_id_str)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("ParkingLot", lot_id_str));
        }

        // Conditional claim of the first free spot by spot number. Zero rows
        // means another booking got there first or the lot is full; either
        // way there is no spot to hand out.
        let row: Option<SpotRow> = sqlx::query_as(
            "UPDATE parking_spots SET status = 'O' \
             WHERE id = (SELECT id FROM parking_spots WHERE lot_id = ? AND status = 'A' \
                         ORDER BY spot_number ASC LIMIT 1) \
             RETURNING id, lot_id, spot_number, status, created_at",
        )
        .bind(&lot_id_str)
        .fetch_optional(&mut *tx)
        .await?;
        let spot = row.ok_or(StoreError::NoAvailableSpot)?.try_into_spot()?;

        let reservation = Reservation::new(spot.id, user_id, vehicle_number);
        sqlx::query(
            "INSERT INTO reservations (id, spot_id, user_id, vehicle_number, \
             parking_timestamp, leaving_timestamp, parking_cost) VALUES (?, ?, ?, ?, ?, NULL, NULL)",
        )
        .bind(reservation.id.to_string())
        .bind(reservation.spot_id.to_string())
        .bind(reservation.user_id.to_string())
        .bind(&reservation.vehicle_number)
        .bind(reservation.parking_timestamp.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((reservation, spot))
    }

    async fn close_reservation(
        &self,
        id: Uuid,
        leaving: DateTime<Utc>,
        cost: f64,
    ) -> StoreResult<Reservation> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        let row: Option<ReservationRow> =
            sqlx::query_as("SELECT * FROM reservations WHERE id = ?")
                .bind(&id_str)
                .fetch_optional(&mut *tx)
                .await?;
        let mut reservation = row
            .ok_or_else(|| StoreError::not_found("Reservation", &id_str))?
            .try_into_reservation()?;

        // Guarded on the open state so a second release cannot rewrite the
        // fixed cost.
        let result = sqlx::query(
            "UPDATE reservations SET leaving_timestamp = ?, parking_cost = ? \
             WHERE id = ? AND leaving_timestamp IS NULL",
        )
        .bind(leaving.to_rfc3339())
        .bind(cost)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyReleased { id: id_str });
        }

        sqlx::query("UPDATE parking_spots SET status = 'A' WHERE id = ?")
            .bind(reservation.spot_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        reservation.leaving_timestamp = Some(leaving);
        reservation.parking_cost = Some(cost);
        Ok(reservation)
    }

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        let row: Option<ReservationRow> =
            sqlx::query_as("SELECT * FROM reservations WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(ReservationRow::try_into_reservation).transpose()
    }

    async fn open_reservation_for_spot(&self, spot_id: Uuid) -> StoreResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(
            "SELECT * FROM reservations WHERE spot_id = ? AND leaving_timestamp IS NULL",
        )
        .bind(spot_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ReservationRow::try_into_reservation).transpose()
    }

    async fn list_open_reservations(&self, user_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            "SELECT * FROM reservations WHERE user_id = ? AND leaving_timestamp IS NULL \
             ORDER BY parking_timestamp ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(ReservationRow::try_into_reservation)
            .collect()
    }

    async fn list_closed_reservations(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            "SELECT * FROM reservations WHERE user_id = ? AND leaving_timestamp IS NOT NULL \
             ORDER BY leaving_timestamp DESC LIMIT ?",
        )
        .bind(user_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(ReservationRow::try_into_reservation)
            .collect()
    }
}

/// SQL schema definition
const SCHEMA_SQL: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    phone TEXT,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Parking lots table
CREATE TABLE IF NOT EXISTS parking_lots (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    address TEXT NOT NULL,
    pin_code TEXT NOT NULL,
    price_per_hour REAL NOT NULL,
    maximum_spots INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

-- Parking spots table
CREATE TABLE IF NOT EXISTS parking_spots (
    id TEXT PRIMARY KEY NOT NULL,
    lot_id TEXT NOT NULL REFERENCES parking_lots(id) ON DELETE CASCADE,
    spot_number TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'A',  -- A-Available, O-Occupied
    created_at TEXT NOT NULL,
    UNIQUE (lot_id, spot_number)
);

-- Reservations table. spot_id is deliberately unconstrained so closed
-- history survives lot deletion; user deletion cascades.
CREATE TABLE IF NOT EXISTS reservations (
    id TEXT PRIMARY KEY NOT NULL,
    spot_id TEXT NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    vehicle_number TEXT NOT NULL,
    parking_timestamp TEXT NOT NULL,
    leaving_timestamp TEXT,
    parking_cost REAL
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_parking_spots_lot ON parking_spots(lot_id);
CREATE INDEX IF NOT EXISTS idx_parking_spots_lot_status ON parking_spots(lot_id, status);
CREATE INDEX IF NOT EXISTS idx_reservations_user ON reservations(user_id);
CREATE INDEX IF NOT EXISTS idx_reservations_spot ON reservations(spot_id);
"#;
