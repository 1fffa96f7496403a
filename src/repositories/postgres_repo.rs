use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bb8_postgres::bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::error::SqlState;
use bb8_postgres::tokio_postgres::{NoTls, Row};
use tracing::warn;
use crate::models::booking::Booking;
use crate::models::place::Place;
use crate::models::user::User;
use crate::repositories::{Store, StoreError, StoreResult};

pub const RETRY_LIMIT: usize = 5;

const SCHEMA: &str = include_str!("schema.sql");

const PLACE_COLUMNS: &str = "id, owner_id, title, address, photos, description, perks, \
    extra_info, check_in, check_out, max_guests, price";

const BOOKING_COLUMNS: &str = "id, place_id, user_id, check_in, check_out, number_of_guests, \
    guest_name, guest_phone, price";

pub struct PostgresConnectionRepo {
    postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresConnectionRepo {
    pub fn new(
        postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
    ) -> Self {
        Self {
            postgres_connection
        }
    }

    async fn get_postgres_connection(
        &self,
    ) -> anyhow::Result<PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        for _ in 0..RETRY_LIMIT {
            match self.postgres_connection.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!("Failed to retrieve postgres connection due to: {}, retrying in 3s", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                    continue;
                }
            }
        }

        Err(anyhow!("Failed to retrieve a valid connection from postgres pool, BAILING"))
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        conn.batch_execute(SCHEMA)
            .await
            .context("Failed to bootstrap database schema")
    }
}

#[async_trait]
impl Store for PostgresConnectionRepo {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let conn = self.get_postgres_connection().await?;
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4);",
            &[&user.id, &user.name, &user.email, &user.password_hash],
        )
        .await
        .map_err(|e| write_error(e, "Failed to insert user"))?;

        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_opt(
                "SELECT id, name, email, password_hash FROM users WHERE id = $1;",
                &[&id],
            )
            .await
            .context("Failed to retrieve user by id")?;

        Ok(row.map(|r| parse_row_into_user(&r)).transpose()?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_opt(
                "SELECT id, name, email, password_hash FROM users WHERE email = $1;",
                &[&email],
            )
            .await
            .context("Failed to retrieve user by email")?;

        Ok(row.map(|r| parse_row_into_user(&r)).transpose()?)
    }

    async fn insert_place(&self, place: &Place) -> StoreResult<()> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!(
            "INSERT INTO places ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);",
            PLACE_COLUMNS
        );
        conn.execute(
            &stmt,
            &[
                &place.id,
                &place.owner_id,
                &place.title,
                &place.address,
                &place.photos,
                &place.description,
                &place.perks,
                &place.extra_info,
                &place.check_in,
                &place.check_out,
                &place.max_guests,
                &place.price,
            ],
        )
        .await
        .map_err(|e| write_error(e, "Failed to insert place"))?;

        Ok(())
    }

    async fn find_place(&self, id: &str) -> StoreResult<Option<Place>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!("SELECT {} FROM places WHERE id = $1;", PLACE_COLUMNS);
        let row = conn
            .query_opt(&stmt, &[&id])
            .await
            .context("Failed to retrieve place")?;

        Ok(row.map(|r| parse_row_into_place(&r)).transpose()?)
    }

    async fn list_places(&self) -> StoreResult<Vec<Place>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!("SELECT {} FROM places ORDER BY created_at, id;", PLACE_COLUMNS);
        let rows = conn
            .query(&stmt, &[])
            .await
            .context("Failed to list places")?;

        Ok(rows.iter().map(parse_row_into_place).collect::<anyhow::Result<_>>()?)
    }

    async fn list_places_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Place>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!(
            "SELECT {} FROM places WHERE owner_id = $1 ORDER BY created_at, id;",
            PLACE_COLUMNS
        );
        let rows = conn
            .query(&stmt, &[&owner_id])
            .await
            .context("Failed to list places by owner")?;

        Ok(rows.iter().map(parse_row_into_place).collect::<anyhow::Result<_>>()?)
    }

    async fn update_place_if_owner(&self, place: &Place, owner_id: &str) -> StoreResult<bool> {
        let conn = self.get_postgres_connection().await?;
        let updated = conn
            .execute(
                "UPDATE places SET title = $3, address = $4, photos = $5, description = $6, \
                 perks = $7, extra_info = $8, check_in = $9, check_out = $10, max_guests = $11, \
                 price = $12 WHERE id = $1 AND owner_id = $2;",
                &[
                    &place.id,
                    &owner_id,
                    &place.title,
                    &place.address,
                    &place.photos,
                    &place.description,
                    &place.perks,
                    &place.extra_info,
                    &place.check_in,
                    &place.check_out,
                    &place.max_guests,
                    &place.price,
                ],
            )
            .await
            .context("Failed to update place")?;

        Ok(updated == 1)
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!(
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9);",
            BOOKING_COLUMNS
        );
        conn.execute(
            &stmt,
            &[
                &booking.id,
                &booking.place_id,
                &booking.user_id,
                &booking.check_in,
                &booking.check_out,
                &booking.number_of_guests,
                &booking.guest_name,
                &booking.guest_phone,
                &booking.price,
            ],
        )
        .await
        .map_err(|e| write_error(e, "Failed to insert booking"))?;

        Ok(())
    }

    async fn find_booking(&self, id: &str) -> StoreResult<Option<Booking>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!("SELECT {} FROM bookings WHERE id = $1;", BOOKING_COLUMNS);
        let row = conn
            .query_opt(&stmt, &[&id])
            .await
            .context("Failed to retrieve booking")?;

        Ok(row.map(|r| parse_row_into_booking(&r)).transpose()?)
    }

    async fn list_bookings_by_user(&self, user_id: &str) -> StoreResult<Vec<Booking>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at, id;",
            BOOKING_COLUMNS
        );
        let rows = conn
            .query(&stmt, &[&user_id])
            .await
            .context("Failed to list bookings")?;

        Ok(rows.iter().map(parse_row_into_booking).collect::<anyhow::Result<_>>()?)
    }
}

fn write_error(
    e: bb8_postgres::tokio_postgres::Error,
    context: &'static str,
) -> StoreError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let constraint = e
            .as_db_error()
            .and_then(|db| db.constraint())
            .unwrap_or_default();
        if constraint.contains("email") {
            return StoreError::Duplicate("email");
        }
        return StoreError::Duplicate("id");
    }

    StoreError::Backend(anyhow::Error::new(e).context(context))
}

fn parse_row_into_user(
    row: &Row,
) -> anyhow::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
    })
}

fn parse_row_into_place(
    row: &Row,
) -> anyhow::Result<Place> {
    Ok(Place {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        address: row.try_get("address")?,
        photos: row.try_get("photos")?,
        description: row.try_get("description")?,
        perks: row.try_get("perks")?,
        extra_info: row.try_get("extra_info")?,
        check_in: row.try_get("check_in")?,
        check_out: row.try_get("check_out")?,
        max_guests: row.try_get("max_guests")?,
        price: row.try_get("price")?,
    })
}

fn parse_row_into_booking(
    row: &Row,
) -> anyhow::Result<Booking> {
    Ok(Booking {
        id: row.try_get("id")?,
        place_id: row.try_get("place_id")?,
        user_id: row.try_get("user_id")?,
        check_in: row.try_get("check_in")?,
        check_out: row.try_get("check_out")?,
        number_of_guests: row.try_get("number_of_guests")?,
        guest_name: row.try_get("guest_name")?,
        guest_phone: row.try_get("guest_phone")?,
        price: row.try_get("price")?,
    })
}
