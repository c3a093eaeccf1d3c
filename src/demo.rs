//! Example CRUD sequence against an `orders` table.
//!
//! Creates the `mes` database (where the dialect has databases), creates the
//! table, inserts three orders, reads order 16, renumbers order 17 to 18 and
//! deletes order 16.

use crate::db::{DeleteTarget, SchemaKind, Session};
use crate::error::DbResult;
use crate::models::{DatabaseType, Row, SqlFragment};
use serde::Serialize;
use tracing::info;

pub const DEMO_DATABASE: &str = "mes";
pub const DEMO_TABLE: &str = "orders";

const MYSQL_ORDERS_BODY: &str = "(
    id INT NOT NULL AUTO_INCREMENT,
    done VARCHAR(1) NOT NULL DEFAULT '',
    delivered INT NOT NULL DEFAULT 0,
    start TIME,
    end TIME,
    client VARCHAR(30) NOT NULL,
    number INT NOT NULL,
    workpiece VARCHAR(2) NOT NULL,
    quantity INT NOT NULL,
    due_date INT NOT NULL,
    late_pen INT NOT NULL,
    early_pen INT NOT NULL,
    PRIMARY KEY (id))";

const SQLITE_ORDERS_BODY: &str = "(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    done VARCHAR(1) NOT NULL DEFAULT '',
    delivered INTEGER NOT NULL DEFAULT 0,
    start TIME,
    end TIME,
    client VARCHAR(30) NOT NULL,
    number INTEGER NOT NULL,
    workpiece VARCHAR(2) NOT NULL,
    quantity INTEGER NOT NULL,
    due_date INTEGER NOT NULL,
    late_pen INTEGER NOT NULL,
    early_pen INTEGER NOT NULL)";

/// Column definitions of the `orders` table for a dialect.
pub fn orders_table_body(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::MySQL => MYSQL_ORDERS_BODY,
        DatabaseType::SQLite => SQLITE_ORDERS_BODY,
    }
}

/// One order row for the insert step.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub client: &'a str,
    pub number: i64,
    pub workpiece: &'a str,
    pub quantity: i64,
    pub due_date: i64,
    pub late_pen: i64,
    pub early_pen: i64,
}

impl NewOrder<'_> {
    fn values(&self, start: &str) -> SqlFragment {
        SqlFragment::new(
            "(start, client, number, workpiece, quantity, due_date, late_pen, early_pen) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(start)
        .bind(self.client)
        .bind(self.number)
        .bind(self.workpiece)
        .bind(self.quantity)
        .bind(self.due_date)
        .bind(self.late_pen)
        .bind(self.early_pen)
    }
}

const DEMO_ORDERS: [NewOrder<'static>; 3] = [
    NewOrder {
        client: "Client AA",
        number: 15,
        workpiece: "P2",
        quantity: 6,
        due_date: 3,
        late_pen: 5,
        early_pen: 10,
    },
    NewOrder {
        client: "Client AB",
        number: 16,
        workpiece: "P5",
        quantity: 4,
        due_date: 5,
        late_pen: 10,
        early_pen: 5,
    },
    NewOrder {
        client: "Client AC",
        number: 17,
        workpiece: "P6",
        quantity: 2,
        due_date: 7,
        late_pen: 15,
        early_pen: 5,
    },
];

/// What each demo step produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DemoReport {
    pub database: Option<String>,
    pub inserted: u64,
    pub selected: Vec<Row>,
    pub updated: u64,
    pub deleted: u64,
}

/// Run the example sequence on `session`.
pub async fn run_demo(session: &mut Session) -> DbResult<DemoReport> {
    let db_type = session.executor().db_type();
    let mut report = DemoReport::default();

    if db_type.supports_database_selection() {
        session
            .create_schema_object(SchemaKind::Database, DEMO_DATABASE, "", None)
            .await?;
        report.database = Some(DEMO_DATABASE.to_string());
    }
    session
        .create_schema_object(
            SchemaKind::Table,
            DEMO_TABLE,
            orders_table_body(db_type),
            None,
        )
        .await?;

    let start = chrono::Local::now().format("%H:%M:%S").to_string();
    for order in &DEMO_ORDERS {
        report.inserted += session
            .insert_row(DEMO_TABLE, &order.values(&start), None)
            .await?;
    }

    report.selected = session
        .select_rows(
            "*",
            DEMO_TABLE,
            &SqlFragment::new("WHERE number = ?").bind(16),
            None,
        )
        .await?;

    report.updated = session
        .update_rows(
            DEMO_TABLE,
            &SqlFragment::new("number = ?").bind(18),
            &SqlFragment::new("WHERE number = ?").bind(17),
            None,
            None,
        )
        .await?;

    report.deleted = session
        .delete_rows(
            &DeleteTarget::Rows {
                from: DEMO_TABLE.to_string(),
                filter: SqlFragment::new("WHERE number = ?").bind(16),
            },
            None,
            None,
        )
        .await?;

    info!(
        inserted = report.inserted,
        selected = report.selected.len(),
        updated = report.updated,
        deleted = report.deleted,
        "Demo finished"
    );
    Ok(report)
}
