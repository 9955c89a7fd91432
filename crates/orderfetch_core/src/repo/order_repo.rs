//! Order store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Expose root, join, id-list and flat-join reads over the order schema.
//! - Map SQL rows into entities with explicit resolved/pending edges.
//!
//! # Invariants
//! - Root reads are ordered by order id ascending.
//! - Child reads are ordered by order id, then order item id ascending.
//! - Persisted enum values that cannot be decoded are rejected, not masked.

use crate::db::DbError;
use crate::model::order::{
    Address, Association, Delivery, DeliveryId, DeliveryStatus, FlatRow, Item, Member, MemberId,
    Order, OrderId, OrderItem, OrderStatus,
};
use crate::model::view::OrderSummary;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::cell::Cell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

const ORDER_ROOT_SQL: &str = "SELECT
    o.id AS order_id,
    o.status AS order_status,
    o.order_date AS order_date,
    o.member_id AS member_id,
    o.delivery_id AS delivery_id
FROM orders o
INNER JOIN members m ON m.id = o.member_id
WHERE 1 = 1";

const ORDER_TO_ONE_COLUMNS: &str = "
    o.id AS order_id,
    o.status AS order_status,
    o.order_date AS order_date,
    m.id AS member_id,
    m.name AS member_name,
    m.city AS member_city,
    m.street AS member_street,
    m.zipcode AS member_zipcode,
    d.id AS delivery_id,
    d.city AS delivery_city,
    d.street AS delivery_street,
    d.zipcode AS delivery_zipcode,
    d.status AS delivery_status";

const ORDER_ITEM_COLUMNS: &str = "
    oi.id AS order_item_id,
    oi.order_id AS item_order_id,
    oi.order_price AS order_price,
    oi.count AS count,
    i.id AS item_id,
    i.name AS item_name,
    i.price AS item_price";

const TO_ONE_JOINS: &str = "
FROM orders o
INNER JOIN members m ON m.id = o.member_id
INNER JOIN deliveries d ON d.id = o.delivery_id";

const COLLECTION_JOINS: &str = "
INNER JOIN order_items oi ON oi.order_id = o.id
INNER JOIN items i ON i.id = oi.item_id";

const ORDER_ITEM_SQL: &str = "SELECT
    oi.id AS order_item_id,
    oi.order_id AS item_order_id,
    oi.order_price AS order_price,
    oi.count AS count,
    i.id AS item_id,
    i.name AS item_name,
    i.price AS item_price
FROM order_items oi
INNER JOIN items i ON i.id = oi.item_id";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure for order reads.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A referenced row does not exist.
    NotFound { table: &'static str, id: i64 },
    /// Persisted data cannot be converted into a valid entity.
    InvalidData(String),
    /// The session scope already ended.
    SessionClosed,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "row {id} not found in `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted order data: {message}"),
            Self::SessionClosed => write!(f, "store session is closed"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
            Self::SessionClosed => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search criteria shared by every root read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// SQL `LIKE` pattern on the member name. Blank values are ignored.
    pub member_name: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn by_member_name(name: impl Into<String>) -> Self {
        Self {
            member_name: Some(name.into()),
            status: None,
        }
    }

    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            member_name: None,
            status: Some(status),
        }
    }
}

/// Offset/limit window over roots ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    pub fn first(limit: u32) -> Self {
        Self::new(0, limit)
    }
}

/// Primitive reads consumed by the fetch strategies.
///
/// An implementation is one open store session: lazy edges can only be
/// resolved through it while `is_open()` holds.
pub trait OrderRepository {
    /// Orders only; member, delivery and items stay pending.
    fn fetch_roots(&self, filter: &OrderFilter, page: Option<Page>) -> StoreResult<Vec<Order>>;
    /// Orders with member and delivery joined; items stay pending.
    fn fetch_roots_with_to_one(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
    /// Orders with every edge joined. One entry per joined order line, so a
    /// logical order repeats once per line; repeats share one allocation.
    fn fetch_roots_with_to_one_and_collection(
        &self,
        filter: &OrderFilter,
    ) -> StoreResult<Vec<Rc<Order>>>;
    /// Same as `fetch_roots_with_to_one`, windowed in SQL.
    fn fetch_roots_paged(
        &self,
        filter: &OrderFilter,
        offset: u32,
        limit: u32,
    ) -> StoreResult<Vec<Order>>;
    /// Lines of every listed order in one `IN (...)` read.
    fn fetch_children_by_root_ids(
        &self,
        ids: &[OrderId],
    ) -> StoreResult<HashMap<OrderId, Vec<OrderItem>>>;
    /// One denormalized row per (order, line) pair.
    fn fetch_flat_join(&self, filter: &OrderFilter) -> StoreResult<Vec<FlatRow>>;
    /// To-one data projected straight into summaries.
    fn fetch_order_summaries(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderSummary>>;
    fn load_member(&self, id: MemberId) -> StoreResult<Member>;
    fn load_delivery(&self, id: DeliveryId) -> StoreResult<Delivery>;
    fn load_order_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderItem>>;
    /// Statements executed by this session so far.
    fn round_trips(&self) -> u32;
    fn is_open(&self) -> bool;
}

/// SQLite-backed order store session.
pub struct SqliteOrderRepository<'conn> {
    conn: &'conn Connection,
    round_trips: Cell<u32>,
    open: Cell<bool>,
}

impl<'conn> SqliteOrderRepository<'conn> {
    /// Opens a session over a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            round_trips: Cell::new(0),
            open: Cell::new(true),
        }
    }

    /// Ends the session scope. Later reads fail with `SessionClosed`.
    pub fn close(&self) {
        if self.open.replace(false) {
            debug!(
                "event=store_session_close module=repo status=ok round_trips={}",
                self.round_trips.get()
            );
        }
    }

    fn begin_round_trip(&self, operation: &'static str) -> StoreResult<()> {
        if !self.open.get() {
            return Err(StoreError::SessionClosed);
        }
        let count = self.round_trips.get() + 1;
        self.round_trips.set(count);
        debug!("event=store_read module=repo operation={operation} round_trip={count}");
        Ok(())
    }

    fn query_to_one(&self, filter: &OrderFilter, page: Option<Page>) -> StoreResult<Vec<Order>> {
        let mut sql = format!("SELECT{ORDER_TO_ONE_COLUMNS}{TO_ONE_JOINS} WHERE 1 = 1");
        let mut bind_values = Vec::new();
        push_filter(&mut sql, &mut bind_values, filter);
        sql.push_str(" ORDER BY o.id ASC");
        push_page(&mut sql, &mut bind_values, page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            let mut order = parse_order_with_to_one(row)?;
            order.items = Association::pending(order.id);
            orders.push(order);
        }
        Ok(orders)
    }
}

impl OrderRepository for SqliteOrderRepository<'_> {
    fn fetch_roots(&self, filter: &OrderFilter, page: Option<Page>) -> StoreResult<Vec<Order>> {
        self.begin_round_trip("fetch_roots")?;
        let mut sql = String::from(ORDER_ROOT_SQL);
        let mut bind_values = Vec::new();
        push_filter(&mut sql, &mut bind_values, filter);
        sql.push_str(" ORDER BY o.id ASC");
        push_page(&mut sql, &mut bind_values, page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            let id: OrderId = row.get("order_id")?;
            orders.push(Order {
                id,
                status: parse_order_status(&row.get::<_, String>("order_status")?)?,
                order_date: row.get("order_date")?,
                member: Association::pending(row.get("member_id")?),
                delivery: Association::pending(row.get("delivery_id")?),
                items: Association::pending(id),
            });
        }
        Ok(orders)
    }

    fn fetch_roots_with_to_one(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        self.begin_round_trip("fetch_roots_with_to_one")?;
        self.query_to_one(filter, None)
    }

    fn fetch_roots_with_to_one_and_collection(
        &self,
        filter: &OrderFilter,
    ) -> StoreResult<Vec<Rc<Order>>> {
        self.begin_round_trip("fetch_roots_with_to_one_and_collection")?;
        let mut sql = format!(
            "SELECT{ORDER_TO_ONE_COLUMNS},{ORDER_ITEM_COLUMNS}{TO_ONE_JOINS}{COLLECTION_JOINS} WHERE 1 = 1"
        );
        let mut bind_values = Vec::new();
        push_filter(&mut sql, &mut bind_values, filter);
        sql.push_str(" ORDER BY o.id ASC, oi.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;

        // Identity map: every joined row refers to the single in-memory order.
        let mut row_roots: Vec<OrderId> = Vec::new();
        let mut entities: HashMap<OrderId, Order> = HashMap::new();
        while let Some(row) = rows.next()? {
            let line = parse_order_item(row)?;
            let order_id = line.order_id;
            if !entities.contains_key(&order_id) {
                let mut order = parse_order_with_to_one(row)?;
                order.items = Association::Resolved(Vec::new());
                entities.insert(order_id, order);
            }
            if let Some(Association::Resolved(items)) =
                entities.get_mut(&order_id).map(|order| &mut order.items)
            {
                items.push(line);
            }
            row_roots.push(order_id);
        }

        let shared: HashMap<OrderId, Rc<Order>> = entities
            .into_iter()
            .map(|(order_id, order)| (order_id, Rc::new(order)))
            .collect();
        Ok(row_roots
            .iter()
            .filter_map(|order_id| shared.get(order_id).map(Rc::clone))
            .collect())
    }

    fn fetch_roots_paged(
        &self,
        filter: &OrderFilter,
        offset: u32,
        limit: u32,
    ) -> StoreResult<Vec<Order>> {
        self.begin_round_trip("fetch_roots_paged")?;
        self.query_to_one(filter, Some(Page::new(offset, limit)))
    }

    fn fetch_children_by_root_ids(
        &self,
        ids: &[OrderId],
    ) -> StoreResult<HashMap<OrderId, Vec<OrderItem>>> {
        let mut children: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        if ids.is_empty() {
            return Ok(children);
        }

        self.begin_round_trip("fetch_children_by_root_ids")?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "{ORDER_ITEM_SQL}
             WHERE oi.order_id IN ({placeholders})
             ORDER BY oi.order_id ASC, oi.id ASC;"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(ids.iter()))?;
        while let Some(row) = rows.next()? {
            let line = parse_order_item(row)?;
            children.entry(line.order_id).or_default().push(line);
        }
        Ok(children)
    }

    fn fetch_flat_join(&self, filter: &OrderFilter) -> StoreResult<Vec<FlatRow>> {
        self.begin_round_trip("fetch_flat_join")?;
        let mut sql = format!(
            "SELECT
                o.id AS order_id,
                m.name AS member_name,
                o.order_date AS order_date,
                o.status AS order_status,
                d.city AS delivery_city,
                d.street AS delivery_street,
                d.zipcode AS delivery_zipcode,
                i.name AS item_name,
                oi.order_price AS order_price,
                oi.count AS count{TO_ONE_JOINS}{COLLECTION_JOINS}
             WHERE 1 = 1"
        );
        let mut bind_values = Vec::new();
        push_filter(&mut sql, &mut bind_values, filter);
        sql.push_str(" ORDER BY o.id ASC, oi.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut flat_rows = Vec::new();
        while let Some(row) = rows.next()? {
            flat_rows.push(FlatRow {
                order_id: row.get("order_id")?,
                member_name: row.get("member_name")?,
                order_date: row.get("order_date")?,
                status: parse_order_status(&row.get::<_, String>("order_status")?)?,
                address: parse_address(row, "delivery")?,
                item_name: row.get("item_name")?,
                order_price: row.get("order_price")?,
                count: row.get("count")?,
            });
        }
        Ok(flat_rows)
    }

    fn fetch_order_summaries(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> StoreResult<Vec<OrderSummary>> {
        self.begin_round_trip("fetch_order_summaries")?;
        let mut sql = format!(
            "SELECT
                o.id AS order_id,
                m.name AS member_name,
                o.order_date AS order_date,
                o.status AS order_status,
                d.city AS delivery_city,
                d.street AS delivery_street,
                d.zipcode AS delivery_zipcode{TO_ONE_JOINS}
             WHERE 1 = 1"
        );
        let mut bind_values = Vec::new();
        push_filter(&mut sql, &mut bind_values, filter);
        sql.push_str(" ORDER BY o.id ASC");
        push_page(&mut sql, &mut bind_values, page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(OrderSummary {
                order_id: row.get("order_id")?,
                member_name: row.get("member_name")?,
                order_date: row.get("order_date")?,
                status: parse_order_status(&row.get::<_, String>("order_status")?)?,
                address: parse_address(row, "delivery")?,
            });
        }
        Ok(summaries)
    }

    fn load_member(&self, id: MemberId) -> StoreResult<Member> {
        self.begin_round_trip("load_member")?;
        self.conn
            .query_row(
                "SELECT
                    id AS member_id,
                    name AS member_name,
                    city AS member_city,
                    street AS member_street,
                    zipcode AS member_zipcode
                 FROM members
                 WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Member {
                        id: row.get("member_id")?,
                        name: row.get("member_name")?,
                        address: Address::new(
                            row.get::<_, String>("member_city")?,
                            row.get::<_, String>("member_street")?,
                            row.get::<_, String>("member_zipcode")?,
                        ),
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound {
                table: "members",
                id,
            })
    }

    fn load_delivery(&self, id: DeliveryId) -> StoreResult<Delivery> {
        self.begin_round_trip("load_delivery")?;
        let mut stmt = self.conn.prepare(
            "SELECT
                id AS delivery_id,
                city AS delivery_city,
                street AS delivery_street,
                zipcode AS delivery_zipcode,
                status AS delivery_status
             FROM deliveries
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_delivery(row),
            None => Err(StoreError::NotFound {
                table: "deliveries",
                id,
            }),
        }
    }

    fn load_order_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        self.begin_round_trip("load_order_items")?;
        let mut stmt = self.conn.prepare(&format!(
            "{ORDER_ITEM_SQL}
             WHERE oi.order_id = ?1
             ORDER BY oi.id ASC;"
        ))?;
        let mut rows = stmt.query([order_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_order_item(row)?);
        }
        Ok(items)
    }

    fn round_trips(&self) -> u32 {
        self.round_trips.get()
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}

fn push_filter(sql: &mut String, bind_values: &mut Vec<Value>, filter: &OrderFilter) {
    if let Some(status) = filter.status {
        sql.push_str(" AND o.status = ?");
        bind_values.push(Value::Text(order_status_to_db(status).to_string()));
    }

    if let Some(name) = filter
        .member_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        sql.push_str(" AND m.name LIKE ?");
        bind_values.push(Value::Text(name.to_string()));
    }
}

fn push_page(sql: &mut String, bind_values: &mut Vec<Value>, page: Option<Page>) {
    if let Some(page) = page {
        sql.push_str(" LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(page.limit)));
        bind_values.push(Value::Integer(i64::from(page.offset)));
    }
}

fn parse_order_with_to_one(row: &Row<'_>) -> StoreResult<Order> {
    let id: OrderId = row.get("order_id")?;
    let member = Member {
        id: row.get("member_id")?,
        name: row.get("member_name")?,
        address: parse_address(row, "member")?,
    };

    Ok(Order {
        id,
        status: parse_order_status(&row.get::<_, String>("order_status")?)?,
        order_date: row.get("order_date")?,
        member: Association::Resolved(member),
        delivery: Association::Resolved(parse_delivery(row)?),
        items: Association::pending(id),
    })
}

fn parse_delivery(row: &Row<'_>) -> StoreResult<Delivery> {
    let status_text: String = row.get("delivery_status")?;
    let status = parse_delivery_status(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid delivery status `{status_text}` in deliveries.status"
        ))
    })?;

    Ok(Delivery {
        id: row.get("delivery_id")?,
        address: parse_address(row, "delivery")?,
        status,
    })
}

fn parse_order_item(row: &Row<'_>) -> StoreResult<OrderItem> {
    Ok(OrderItem {
        id: row.get("order_item_id")?,
        order_id: row.get("item_order_id")?,
        item: Item {
            id: row.get("item_id")?,
            name: row.get("item_name")?,
            price: row.get("item_price")?,
        },
        order_price: row.get("order_price")?,
        count: row.get("count")?,
    })
}

fn parse_address(row: &Row<'_>, prefix: &str) -> StoreResult<Address> {
    Ok(Address {
        city: row.get(format!("{prefix}_city").as_str())?,
        street: row.get(format!("{prefix}_street").as_str())?,
        zipcode: row.get(format!("{prefix}_zipcode").as_str())?,
    })
}

fn parse_order_status(value: &str) -> StoreResult<OrderStatus> {
    match value {
        "ordered" => Ok(OrderStatus::Ordered),
        "canceled" => Ok(OrderStatus::Canceled),
        other => Err(StoreError::InvalidData(format!(
            "invalid order status `{other}` in orders.status"
        ))),
    }
}

pub(crate) fn order_status_to_db(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Ordered => "ordered",
        OrderStatus::Canceled => "canceled",
    }
}

fn parse_delivery_status(value: &str) -> Option<DeliveryStatus> {
    match value {
        "ready" => Some(DeliveryStatus::Ready),
        "comp" => Some(DeliveryStatus::Comp),
        _ => None,
    }
}

pub(crate) fn delivery_status_to_db(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Ready => "ready",
        DeliveryStatus::Comp => "comp",
    }
}
