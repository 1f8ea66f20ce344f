use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use foodhub_types::domain::cart::{CartEntry, CartLine};
use foodhub_types::domain::error::OrderError;
use foodhub_types::domain::meal::Meal;
use foodhub_types::domain::order::{
    Order, OrderIntent, OrderItem, OrderStatus, PaymentStatus, ScheduleType,
};
use foodhub_types::ports::cart_repository::CartRepository;
use foodhub_types::ports::meal_repository::MealRepository;
use foodhub_types::ports::order_repository::{OrderRepository, RepoError};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const MIGRATIONS: [&str; 6] = [
    include_str!("../migrations/0001_create_meals.sql"),
    include_str!("../migrations/0002_create_cart_lines.sql"),
    include_str!("../migrations/0003_create_orders.sql"),
    include_str!("../migrations/0004_create_order_items.sql"),
    include_str!("../migrations/0005_index_orders_customer.sql"),
    include_str!("../migrations/0006_index_order_items_provider.sql"),
];

const ORDER_COLUMNS: &str = "id, customer_id, delivery_address, status, payment_status, \
     schedule_type, scheduled_at, note, total_amount, created_at, updated_at";

const CART_LINE_COLUMNS: &str = "id, customer_id, meal_id, quantity, created_at";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_decimal(raw: &str) -> Result<Decimal, RepoError> {
    Decimal::from_str(raw).map_err(db_err)
}

fn parse_uuid(raw: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(raw).map_err(db_err)
}

fn parse_quantity(raw: i64) -> Result<u32, RepoError> {
    u32::try_from(raw).map_err(db_err)
}

#[derive(FromRow)]
struct DbMeal {
    id: String,
    provider_id: String,
    title: String,
    description: Option<String>,
    price: String,
    is_available: bool,
}

impl DbMeal {
    fn into_meal(self) -> Result<Meal, RepoError> {
        Ok(Meal {
            id: parse_uuid(&self.id)?,
            provider_id: self.provider_id,
            title: self.title,
            description: self.description,
            price: parse_decimal(&self.price)?,
            is_available: self.is_available,
        })
    }
}

#[derive(FromRow)]
struct DbCartLine {
    id: String,
    customer_id: String,
    meal_id: String,
    quantity: i64,
    created_at: String,
}

impl DbCartLine {
    fn into_line(self) -> Result<CartLine, RepoError> {
        Ok(CartLine {
            id: parse_uuid(&self.id)?,
            customer_id: self.customer_id,
            meal_id: parse_uuid(&self.meal_id)?,
            quantity: parse_quantity(self.quantity)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbCartEntry {
    id: String,
    customer_id: String,
    meal_id: String,
    quantity: i64,
    created_at: String,
    provider_id: String,
    title: String,
    description: Option<String>,
    price: String,
    is_available: bool,
}

impl DbCartEntry {
    fn into_entry(self) -> Result<CartEntry, RepoError> {
        let meal = DbMeal {
            id: self.meal_id.clone(),
            provider_id: self.provider_id,
            title: self.title,
            description: self.description,
            price: self.price,
            is_available: self.is_available,
        }
        .into_meal()?;
        let line = DbCartLine {
            id: self.id,
            customer_id: self.customer_id,
            meal_id: self.meal_id,
            quantity: self.quantity,
            created_at: self.created_at,
        }
        .into_line()?;
        Ok(CartEntry { line, meal })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    customer_id: String,
    delivery_address: String,
    status: String,
    payment_status: String,
    schedule_type: String,
    scheduled_at: Option<String>,
    note: Option<String>,
    total_amount: String,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepoError> {
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| db_err(format!("unknown order status {}", self.status)))?;
        let payment_status = PaymentStatus::parse(&self.payment_status)
            .ok_or_else(|| db_err(format!("unknown payment status {}", self.payment_status)))?;
        let scheduled_at = self.scheduled_at.as_deref().map(parse_ts).transpose()?;
        Ok(Order {
            id: parse_uuid(&self.id)?,
            customer_id: self.customer_id,
            delivery_address: self.delivery_address,
            status,
            payment_status,
            schedule_type: ScheduleType::parse_lenient(&self.schedule_type),
            scheduled_at,
            note: self.note,
            total_amount: parse_decimal(&self.total_amount)?,
            items,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrderItem {
    order_id: String,
    meal_id: String,
    provider_id: String,
    meal_title: String,
    quantity: i64,
    unit_price: String,
    sub_total: String,
}

impl DbOrderItem {
    fn into_item(self) -> Result<OrderItem, RepoError> {
        Ok(OrderItem {
            order_id: parse_uuid(&self.order_id)?,
            meal_id: parse_uuid(&self.meal_id)?,
            provider_id: self.provider_id,
            meal_title: self.meal_title,
            quantity: parse_quantity(self.quantity)?,
            unit_price: parse_decimal(&self.unit_price)?,
            sub_total: parse_decimal(&self.sub_total)?,
        })
    }
}

async fn load_items<'e, E>(exec: E, order_id: &str) -> Result<Vec<OrderItem>, RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows: Vec<DbOrderItem> = sqlx::query_as(
        "SELECT order_id, meal_id, provider_id, meal_title, quantity, unit_price, sub_total
         FROM order_items WHERE order_id = ? ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(exec)
    .await
    .map_err(db_err)?;
    rows.into_iter().map(DbOrderItem::into_item).collect()
}

async fn load_meal<'e, E>(exec: E, id: Uuid) -> Result<Option<Meal>, RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<DbMeal> = sqlx::query_as(
        "SELECT id, provider_id, title, description, price, is_available FROM meals WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(exec)
    .await
    .map_err(db_err)?;
    row.map(DbMeal::into_meal).transpose()
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }
        tracing::debug!(url = database_url, "sqlite store ready");

        Ok(Self { pool })
    }

    async fn hydrate(&self, rows: Vec<DbOrder>) -> Result<Vec<Order>, RepoError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = load_items(&self.pool, &row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    async fn fetch_orders(&self, sql: &str, bind: Option<&str>) -> Result<Vec<Order>, RepoError> {
        let mut query = sqlx::query_as::<_, DbOrder>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        self.hydrate(rows).await
    }
}

#[async_trait]
impl MealRepository for SqliteRepo {
    async fn get_meal(&self, id: Uuid) -> Result<Option<Meal>, RepoError> {
        load_meal(&self.pool, id).await
    }

    async fn list_meals(&self, provider_id: Option<&str>) -> Result<Vec<Meal>, RepoError> {
        let rows: Vec<DbMeal> = match provider_id {
            Some(provider) => sqlx::query_as(
                "SELECT id, provider_id, title, description, price, is_available FROM meals
                 WHERE provider_id = ? ORDER BY title, id",
            )
            .bind(provider)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
            None => sqlx::query_as(
                "SELECT id, provider_id, title, description, price, is_available FROM meals
                 ORDER BY title, id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
        };
        rows.into_iter().map(DbMeal::into_meal).collect()
    }

    async fn save_meal(&self, meal: Meal) -> Result<Meal, RepoError> {
        sqlx::query(
            "INSERT INTO meals (id, provider_id, title, description, price, is_available)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                provider_id = excluded.provider_id,
                title = excluded.title,
                description = excluded.description,
                price = excluded.price,
                is_available = excluded.is_available",
        )
        .bind(meal.id.to_string())
        .bind(&meal.provider_id)
        .bind(&meal.title)
        .bind(&meal.description)
        .bind(meal.price.to_string())
        .bind(meal.is_available)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(meal)
    }
}

#[async_trait]
impl CartRepository for SqliteRepo {
    async fn cart_snapshot(&self, customer_id: &str) -> Result<Vec<CartEntry>, RepoError> {
        let rows: Vec<DbCartEntry> = sqlx::query_as(
            "SELECT c.id, c.customer_id, c.meal_id, c.quantity, c.created_at,
                    m.provider_id, m.title, m.description, m.price, m.is_available
             FROM cart_lines c JOIN meals m ON m.id = c.meal_id
             WHERE c.customer_id = ?
             ORDER BY c.created_at, c.rowid",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbCartEntry::into_entry).collect()
    }

    async fn add_line(
        &self,
        customer_id: &str,
        meal_id: Uuid,
        quantity: u32,
    ) -> Result<CartLine, RepoError> {
        let line = CartLine::new(customer_id, meal_id, quantity)?;
        // The guard leaves an existing line untouched (and returns no row)
        // when the merged quantity would not fit a u32.
        let row: Option<DbCartLine> = sqlx::query_as(&format!(
            "INSERT INTO cart_lines ({CART_LINE_COLUMNS}) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (customer_id, meal_id) DO UPDATE SET quantity = quantity + excluded.quantity
             WHERE cart_lines.quantity + excluded.quantity <= ?
             RETURNING {CART_LINE_COLUMNS}"
        ))
        .bind(line.id.to_string())
        .bind(&line.customer_id)
        .bind(line.meal_id.to_string())
        .bind(i64::from(line.quantity))
        .bind(ts(&line.created_at))
        .bind(i64::from(u32::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        match row {
            Some(row) => row.into_line(),
            None => Err(OrderError::InvalidQuantity.into()),
        }
    }

    async fn set_quantity(
        &self,
        customer_id: &str,
        line_id: Uuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, RepoError> {
        let row: Option<DbCartLine> = sqlx::query_as(&format!(
            "UPDATE cart_lines SET quantity = ? WHERE id = ? AND customer_id = ?
             RETURNING {CART_LINE_COLUMNS}"
        ))
        .bind(i64::from(quantity))
        .bind(line_id.to_string())
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbCartLine::into_line).transpose()
    }

    async fn remove_line(&self, customer_id: &str, line_id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM cart_lines WHERE id = ? AND customer_id = ?")
            .bind(line_id.to_string())
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn clear(&self, customer_id: &str) -> Result<u64, RepoError> {
        let res = sqlx::query("DELETE FROM cart_lines WHERE customer_id = ?")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn materialize(
        &self,
        customer_id: &str,
        intent: &OrderIntent,
    ) -> Result<Option<Order>, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Claiming the cart with a write first takes the database write lock,
        // so a concurrent checkout of the same cart waits and then finds it
        // empty. Rolling back (or dropping `tx` on error) restores the cart.
        let claimed: Vec<DbCartLine> = sqlx::query_as(&format!(
            "DELETE FROM cart_lines WHERE customer_id = ? RETURNING {CART_LINE_COLUMNS}"
        ))
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;
        if claimed.is_empty() {
            tx.rollback().await.map_err(db_err)?;
            return Ok(None);
        }

        let mut lines = claimed
            .into_iter()
            .map(DbCartLine::into_line)
            .collect::<Result<Vec<_>, _>>()?;
        lines.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            let meal = load_meal(&mut *tx, line.meal_id)
                .await?
                .ok_or_else(|| db_err(format!("meal {} missing", line.meal_id)))?;
            entries.push(CartEntry { line, meal });
        }

        let order = match Order::from_cart(customer_id, intent, &entries) {
            Ok(order) => order,
            Err(rejected) => {
                tx.rollback().await.map_err(db_err)?;
                return Err(rejected.into());
            }
        };

        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(order.id.to_string())
        .bind(&order.customer_id)
        .bind(&order.delivery_address)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.schedule_type.as_str())
        .bind(order.scheduled_at.as_ref().map(ts))
        .bind(&order.note)
        .bind(order.total_amount.to_string())
        .bind(ts(&order.created_at))
        .bind(ts(&order.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items
                    (order_id, position, meal_id, provider_id, meal_title, quantity, unit_price, sub_total)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(item.order_id.to_string())
            .bind(position as i64)
            .bind(item.meal_id.to_string())
            .bind(&item.provider_id)
            .bind(&item.meal_title)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.to_string())
            .bind(item.sub_total.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(Some(order))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        self.fetch_orders(
            &format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC"),
            None,
        )
        .await
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, RepoError> {
        self.fetch_orders(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?
                 ORDER BY created_at DESC, rowid DESC"
            ),
            Some(customer_id),
        )
        .await
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Order>, RepoError> {
        self.fetch_orders(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders o
                 WHERE EXISTS (
                    SELECT 1 FROM order_items i WHERE i.order_id = o.id AND i.provider_id = ?
                 )
                 ORDER BY o.created_at DESC, o.rowid DESC"
            ),
            Some(provider_id),
        )
        .await
    }

    async fn latest_paid(&self, customer_id: &str) -> Result<Option<Order>, RepoError> {
        let mut orders = self
            .fetch_orders(
                &format!(
                    "SELECT {ORDER_COLUMNS} FROM orders
                     WHERE customer_id = ? AND payment_status = 'PAID'
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                Some(customer_id),
            )
            .await?;
        Ok(orders.pop())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        let updated =
            sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(next.as_str())
                .bind(ts(&Utc::now()))
                .bind(id.to_string())
                .bind(expected.as_str())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}
