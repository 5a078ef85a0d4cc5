use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Concert, ConcertId, Money, NewConcert, NewOrder, Order, OrderId, Result, StoreError, Ticket,
    TicketId,
    store::{Store, Visibility},
};

const CONCERT_COLUMNS: &str = "id, title, subtitle, date, ticket_price, venue, venue_address, \
     city, state, zip, additional_information, published_at, created_at, updated_at";

const TICKET_COLUMNS: &str = "id, concert_id, order_id, created_at, updated_at";

const ORDER_COLUMNS: &str =
    "id, email, concert_id, ticket_quantity, amount, created_at, updated_at";

/// Foreign keys declared in `migrations/001_create_ticketing_tables.sql`.
const TICKETS_CONCERT_FK: &str = "tickets_concert_id_fkey";
const ORDERS_CONCERT_FK: &str = "orders_concert_id_fkey";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_concert(row: PgRow) -> Result<Concert> {
        Ok(Concert {
            id: ConcertId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            subtitle: row.try_get("subtitle")?,
            date: row.try_get("date")?,
            ticket_price: Money::from_cents(row.try_get("ticket_price")?),
            venue: row.try_get("venue")?,
            venue_address: row.try_get("venue_address")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            zip: row.try_get("zip")?,
            additional_information: row.try_get("additional_information")?,
            published_at: row.try_get("published_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_ticket(row: PgRow) -> Result<Ticket> {
        Ok(Ticket {
            id: TicketId::new(row.try_get("id")?),
            concert_id: ConcertId::new(row.try_get("concert_id")?),
            order_id: row.try_get::<Option<i64>, _>("order_id")?.map(OrderId::new),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Maps an order row; tickets are attached by the caller.
    fn row_to_order(row: PgRow) -> Result<Order> {
        let ticket_quantity: i64 = row.try_get("ticket_quantity")?;
        let ticket_quantity = u32::try_from(ticket_quantity)
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            email: row.try_get("email")?,
            concert_id: ConcertId::new(row.try_get("concert_id")?),
            ticket_quantity,
            amount: Money::from_cents(row.try_get("amount")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            tickets: Vec::new(),
        })
    }

    /// Translates foreign-key violations on `concert_id` into `ConcertNotFound`.
    fn map_concert_fk(concert_id: ConcertId) -> impl FnOnce(sqlx::Error) -> StoreError {
        move |e| {
            if let sqlx::Error::Database(ref db_err) = e
                && matches!(
                    db_err.constraint(),
                    Some(TICKETS_CONCERT_FK) | Some(ORDERS_CONCERT_FK)
                )
            {
                return StoreError::ConcertNotFound(concert_id);
            }
            StoreError::Database(e)
        }
    }

    async fn insert_order_in(tx: &mut Transaction<'_, Postgres>, order: &NewOrder) -> Result<Order> {
        let sql = format!(
            "INSERT INTO orders (email, concert_id, ticket_quantity, amount) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&order.email)
            .bind(order.concert_id.as_i64())
            .bind(i64::from(order.ticket_quantity))
            .bind(order.amount.cents())
            .fetch_one(&mut **tx)
            .await
            .map_err(Self::map_concert_fk(order.concert_id))?;

        Self::row_to_order(row)
    }

    /// Locks up to `quantity` available tickets and assigns them to `order_id`.
    ///
    /// `SKIP LOCKED` keeps concurrent reservations on disjoint rows; a caller
    /// that cannot lock enough rows gets `InsufficientTickets` and the
    /// transaction is expected to be rolled back.
    async fn claim_in(
        tx: &mut Transaction<'_, Postgres>,
        concert_id: ConcertId,
        order_id: OrderId,
        quantity: u32,
    ) -> Result<Vec<Ticket>> {
        let candidates: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM tickets
            WHERE concert_id = $1 AND order_id IS NULL
            ORDER BY id ASC
            LIMIT $2
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(concert_id.as_i64())
        .bind(i64::from(quantity))
        .fetch_all(&mut **tx)
        .await?;

        if candidates.len() < quantity as usize {
            return Err(StoreError::InsufficientTickets {
                concert_id,
                requested: quantity,
                available: candidates.len() as u32,
            });
        }

        let sql = format!(
            "UPDATE tickets SET order_id = $1, updated_at = NOW() \
             WHERE id = ANY($2) RETURNING {TICKET_COLUMNS}"
        );
        let rows = sqlx::query(&sql)
            .bind(order_id.as_i64())
            .bind(&candidates)
            .fetch_all(&mut **tx)
            .await?;

        let mut tickets = rows
            .into_iter()
            .map(Self::row_to_ticket)
            .collect::<Result<Vec<_>>>()?;
        tickets.sort_by_key(|t| t.id);
        Ok(tickets)
    }

    async fn attach_tickets(&self, mut order: Order) -> Result<Order> {
        order.tickets = self.tickets_for_order(order.id).await?;
        Ok(order)
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_concert(&self, concert: NewConcert) -> Result<Concert> {
        let sql = format!(
            "INSERT INTO concerts (title, subtitle, date, ticket_price, venue, venue_address, \
             city, state, zip, additional_information, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {CONCERT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&concert.title)
            .bind(&concert.subtitle)
            .bind(concert.date)
            .bind(concert.ticket_price.cents())
            .bind(&concert.venue)
            .bind(&concert.venue_address)
            .bind(&concert.city)
            .bind(&concert.state)
            .bind(&concert.zip)
            .bind(&concert.additional_information)
            .bind(concert.published_at)
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_concert(row)
    }

    async fn get_concert(&self, id: ConcertId, visibility: Visibility) -> Result<Option<Concert>> {
        let mut sql = format!("SELECT {CONCERT_COLUMNS} FROM concerts WHERE id = $1");
        if visibility == Visibility::Published {
            sql.push_str(" AND published_at IS NOT NULL");
        }

        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_concert).transpose()
    }

    async fn list_concerts(&self, visibility: Visibility) -> Result<Vec<Concert>> {
        let mut sql = format!("SELECT {CONCERT_COLUMNS} FROM concerts");
        if visibility == Visibility::Published {
            sql.push_str(" WHERE published_at IS NOT NULL");
        }
        sql.push_str(" ORDER BY id ASC");

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_concert).collect()
    }

    async fn insert_tickets(&self, concert_id: ConcertId, quantity: u32) -> Result<Vec<Ticket>> {
        if quantity == 0 {
            // Still report a missing concert, as the insert would have.
            return match self.get_concert(concert_id, Visibility::All).await? {
                Some(_) => Ok(Vec::new()),
                None => Err(StoreError::ConcertNotFound(concert_id)),
            };
        }

        let sql = format!(
            "INSERT INTO tickets (concert_id) \
             SELECT $1 FROM generate_series(1, $2) \
             RETURNING {TICKET_COLUMNS}"
        );
        let rows = sqlx::query(&sql)
            .bind(concert_id.as_i64())
            .bind(i64::from(quantity))
            .fetch_all(&self.pool)
            .await
            .map_err(Self::map_concert_fk(concert_id))?;

        let mut tickets = rows
            .into_iter()
            .map(Self::row_to_ticket)
            .collect::<Result<Vec<_>>>()?;
        tickets.sort_by_key(|t| t.id);

        tracing::debug!(%concert_id, quantity, "tickets inserted");
        Ok(tickets)
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_ticket).collect()
    }

    async fn available_tickets(
        &self,
        concert_id: ConcertId,
        limit: Option<u32>,
    ) -> Result<Vec<Ticket>> {
        let mut sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets \
             WHERE concert_id = $1 AND order_id IS NULL ORDER BY id ASC"
        );
        if limit.is_some() {
            sql.push_str(" LIMIT $2");
        }

        let mut query = sqlx::query(&sql).bind(concert_id.as_i64());
        if let Some(limit) = limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_ticket).collect()
    }

    async fn count_available_tickets(&self, concert_id: ConcertId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tickets WHERE concert_id = $1 AND order_id IS NULL",
        )
        .bind(concert_id.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn tickets_for_order(&self, order_id: OrderId) -> Result<Vec<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE order_id = $1 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(order_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_ticket).collect()
    }

    async fn reserve_tickets(
        &self,
        concert_id: ConcertId,
        order_id: OrderId,
        quantity: u32,
    ) -> Result<Vec<Ticket>> {
        let mut tx = self.pool.begin().await?;

        // Lock the order row so it cannot be deleted mid-reservation.
        let order_concert_id: Option<i64> =
            sqlx::query_scalar("SELECT concert_id FROM orders WHERE id = $1 FOR SHARE")
                .bind(order_id.as_i64())
                .fetch_optional(&mut *tx)
                .await?;

        let order_concert_id = order_concert_id
            .map(ConcertId::new)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        if order_concert_id != concert_id {
            return Err(StoreError::ConcertMismatch {
                order_id,
                order_concert_id,
                concert_id,
            });
        }

        let tickets = Self::claim_in(&mut tx, concert_id, order_id, quantity).await?;
        tx.commit().await?;
        Ok(tickets)
    }

    async fn reserve_for_new_order(&self, order: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let mut created = Self::insert_order_in(&mut tx, &order).await?;
        created.tickets =
            Self::claim_in(&mut tx, order.concert_id, created.id, order.ticket_quantity).await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn release_tickets(&self, order_id: OrderId) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE tickets SET order_id = NULL, updated_at = NOW() WHERE order_id = $1",
        )
        .bind(order_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let created = Self::insert_order_in(&mut tx, &order).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.attach_tickets(Self::row_to_order(row)?).await?)),
            None => Ok(None),
        }
    }

    async fn find_order_by_email(&self, email: &str) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE email = $1 ORDER BY id ASC LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.attach_tickets(Self::row_to_order(row)?).await?)),
            None => Ok(None),
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        // One query for all tickets instead of one per order.
        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE order_id = ANY($1) ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql).bind(&ids).fetch_all(&self.pool).await?;
        for ticket in rows.into_iter().map(Self::row_to_ticket) {
            let ticket = ticket?;
            if let Some(order) = orders.iter_mut().find(|o| Some(o.id) == ticket.order_id) {
                order.tickets.push(ticket);
            }
        }

        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
