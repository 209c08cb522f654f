use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentId, Availability, AvailabilityRecord, AvailabilityStatus,
    BookingStatus, Employee, Outcome, Partition, Sale, TimeRange,
};

use super::{
    ChangeEvent, ChangeFeed, MIGRATION_001_INITIAL, MIGRATION_002_AVAILABILITY,
    MIGRATION_003_APPOINTMENTS, Table,
};

const SALE_COLUMNS: &str = "id, price, employee_amount, shop_amount, created_at, employee_id";

const APPOINTMENT_COLUMNS: &str = "id, date, starts_at, ends_at, client_name, client_phone, \
    service, employee_name, status, outcome, confirmed_at, confirmed_by";

/// Fixed-width UTC timestamps so that text comparison matches time order.
fn encode_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

fn encode_time(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

fn decode_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S").with_context(|| format!("Invalid time: {}", s))
}

/// Repository for persisting and querying the shop's data.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            changes: ChangeFeed::new(),
        }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        for (name, sql) in [
            ("001", MIGRATION_001_INITIAL),
            ("002", MIGRATION_002_AVAILABILITY),
            ("003", MIGRATION_003_APPOINTMENTS),
        ] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to run migration {}", name))?;
        }
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Receive an event after every committed write.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    // ========================
    // Employee operations
    // ========================

    pub async fn save_employee(&self, employee: &Employee) -> Result<()> {
        sqlx::query("INSERT INTO employees (id, name, created_at) VALUES (?, ?, ?)")
            .bind(employee.id.to_string())
            .bind(&employee.name)
            .bind(encode_timestamp(employee.created_at))
            .execute(&self.pool)
            .await
            .context("Failed to save employee")?;

        self.changes.publish(Table::Employees);
        Ok(())
    }

    pub async fn get_employee_by_name(&self, name: &str) -> Result<Option<Employee>> {
        let row = sqlx::query("SELECT id, name, created_at FROM employees WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch employee by name")?;

        row.as_ref().map(Self::row_to_employee).transpose()
    }

    /// List all employees ordered by name.
    pub async fn list_employees(&self) -> Result<Vec<Employee>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM employees ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list employees")?;

        rows.iter().map(Self::row_to_employee).collect()
    }

    fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Employee {
            id: Uuid::parse_str(&id_str).context("Invalid employee ID")?,
            name: row.get("name"),
            created_at: decode_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Sale operations
    // ========================

    /// Save a sale into the given partition.
    pub async fn save_sale(&self, partition: Partition, sale: &Sale) -> Result<()> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?)",
            partition.table(),
            SALE_COLUMNS
        );

        sqlx::query(&query)
            .bind(sale.id.to_string())
            .bind(sale.price)
            .bind(sale.employee_amount)
            .bind(sale.shop_amount)
            .bind(encode_timestamp(sale.created_at))
            .bind(sale.employee_id.map(|id| id.to_string()))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to save sale in {} partition", partition))?;

        self.changes.publish(Table::Sales);
        Ok(())
    }

    /// List a partition's sales, ascending by creation time, optionally
    /// limited to an inclusive time range.
    pub async fn list_sales(
        &self,
        partition: Partition,
        range: Option<TimeRange>,
    ) -> Result<Vec<Sale>> {
        let mut query = format!("SELECT {} FROM {}", SALE_COLUMNS, partition.table());
        if range.is_some() {
            query.push_str(" WHERE created_at >= ? AND created_at <= ?");
        }
        query.push_str(" ORDER BY created_at");

        let mut sql_query = sqlx::query(&query);
        if let Some(range) = range {
            sql_query = sql_query
                .bind(encode_timestamp(range.start))
                .bind(encode_timestamp(range.end));
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {} sales", partition))?;

        rows.iter().map(Self::row_to_sale).collect()
    }

    /// Move every live sale created before `cutoff` into the archive.
    /// Returns how many sales were moved.
    pub async fn archive_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let cutoff = encode_timestamp(cutoff);
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let moved = sqlx::query(&format!(
            "INSERT INTO sales_archived ({cols}) \
             SELECT {cols} FROM sales_live WHERE created_at < ?",
            cols = SALE_COLUMNS
        ))
        .bind(&cutoff)
        .execute(&mut *tx)
        .await
        .context("Failed to copy sales into the archive")?
        .rows_affected();

        sqlx::query("DELETE FROM sales_live WHERE created_at < ?")
            .bind(&cutoff)
            .execute(&mut *tx)
            .await
            .context("Failed to clear archived sales from the live partition")?;

        tx.commit().await.context("Failed to commit archive")?;

        if moved > 0 {
            self.changes.publish(Table::Sales);
        }
        Ok(moved)
    }

    pub async fn count_sales(&self, partition: Partition) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) as count FROM {}", partition.table()))
            .fetch_one(&self.pool)
            .await
            .context("Failed to count sales")?;

        Ok(row.get("count"))
    }

    fn row_to_sale(row: &sqlx::sqlite::SqliteRow) -> Result<Sale> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");
        let employee_id_str: Option<String> = row.get("employee_id");

        Ok(Sale {
            id: Uuid::parse_str(&id_str).context("Invalid sale ID")?,
            price: row.get("price"),
            employee_amount: row.get("employee_amount"),
            shop_amount: row.get("shop_amount"),
            created_at: decode_timestamp(&created_at_str)?,
            employee_id: employee_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid employee ID on sale")?,
        })
    }

    // ========================
    // Availability operations
    // ========================

    /// Insert or replace an employee's availability.
    pub async fn upsert_availability(&self, record: &AvailabilityRecord) -> Result<()> {
        let availability = &record.availability;

        sqlx::query(
            r#"
            INSERT INTO availability (employee_id, status, lunch_at, back_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (employee_id) DO UPDATE SET
                status = excluded.status,
                lunch_at = excluded.lunch_at,
                back_at = excluded.back_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.employee_id.to_string())
        .bind(availability.status().as_str())
        .bind(availability.lunch_at().map(encode_time))
        .bind(availability.back_at().map(encode_time))
        .bind(encode_timestamp(record.updated_at))
        .execute(&self.pool)
        .await
        .context("Failed to save availability")?;

        self.changes.publish(Table::Availability);
        Ok(())
    }

    pub async fn list_availability(&self) -> Result<Vec<AvailabilityRecord>> {
        let rows = sqlx::query(
            "SELECT employee_id, status, lunch_at, back_at, updated_at FROM availability",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list availability")?;

        rows.iter().map(Self::row_to_availability).collect()
    }

    fn row_to_availability(row: &sqlx::sqlite::SqliteRow) -> Result<AvailabilityRecord> {
        let employee_id_str: String = row.get("employee_id");
        let status_str: String = row.get("status");
        let lunch_at_str: Option<String> = row.get("lunch_at");
        let back_at_str: Option<String> = row.get("back_at");
        let updated_at_str: String = row.get("updated_at");

        let status: AvailabilityStatus = status_str
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid availability status: {}", e))?;
        let lunch_at = lunch_at_str.as_deref().map(decode_time).transpose()?;
        let back_at = back_at_str.as_deref().map(decode_time).transpose()?;

        Ok(AvailabilityRecord {
            employee_id: Uuid::parse_str(&employee_id_str).context("Invalid employee ID")?,
            availability: Availability::from_parts(status, lunch_at, back_at)
                .map_err(|e| anyhow::anyhow!("Inconsistent availability row: {}", e))?,
            updated_at: decode_timestamp(&updated_at_str)?,
        })
    }

    // ========================
    // Appointment operations
    // ========================

    pub async fn save_appointment(&self, appointment: &Appointment) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO appointments ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            APPOINTMENT_COLUMNS
        ))
        .bind(appointment.id.to_string())
        .bind(appointment.date.to_string())
        .bind(encode_time(appointment.starts_at))
        .bind(encode_time(appointment.ends_at))
        .bind(&appointment.client_name)
        .bind(&appointment.client_phone)
        .bind(&appointment.service)
        .bind(&appointment.employee_name)
        .bind(appointment.status.as_str())
        .bind(appointment.outcome.map(|o| o.as_str()))
        .bind(appointment.confirmed_at.map(encode_timestamp))
        .bind(&appointment.confirmed_by)
        .execute(&self.pool)
        .await
        .context("Failed to save appointment")?;

        self.changes.publish(Table::Appointments);
        Ok(())
    }

    pub async fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE id = ?",
            APPOINTMENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch appointment")?;

        row.as_ref().map(Self::row_to_appointment).transpose()
    }

    /// List a day's appointments ordered by start time.
    pub async fn list_appointments_on(&self, date: NaiveDate) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE date = ? ORDER BY starts_at",
            APPOINTMENT_COLUMNS
        ))
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list appointments")?;

        rows.iter().map(Self::row_to_appointment).collect()
    }

    /// Persist the confirmation fields of an appointment.
    pub async fn update_appointment_outcome(&self, appointment: &Appointment) -> Result<()> {
        sqlx::query(
            "UPDATE appointments SET outcome = ?, confirmed_at = ?, confirmed_by = ? WHERE id = ?",
        )
        .bind(appointment.outcome.map(|o| o.as_str()))
        .bind(appointment.confirmed_at.map(encode_timestamp))
        .bind(&appointment.confirmed_by)
        .bind(appointment.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update appointment")?;

        self.changes.publish(Table::Appointments);
        Ok(())
    }

    fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Result<Appointment> {
        let id_str: String = row.get("id");
        let date_str: String = row.get("date");
        let starts_at_str: String = row.get("starts_at");
        let ends_at_str: String = row.get("ends_at");
        let status_str: String = row.get("status");
        let outcome_str: Option<String> = row.get("outcome");
        let confirmed_at_str: Option<String> = row.get("confirmed_at");

        Ok(Appointment {
            id: Uuid::parse_str(&id_str).context("Invalid appointment ID")?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .context("Invalid appointment date")?,
            starts_at: decode_time(&starts_at_str)?,
            ends_at: decode_time(&ends_at_str)?,
            client_name: row.get("client_name"),
            client_phone: row.get("client_phone"),
            service: row.get("service"),
            employee_name: row.get("employee_name"),
            status: BookingStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid booking status: {}", status_str))?,
            outcome: outcome_str
                .map(|s| {
                    Outcome::from_str(&s).ok_or_else(|| anyhow::anyhow!("Invalid outcome: {}", s))
                })
                .transpose()?,
            confirmed_at: confirmed_at_str
                .as_deref()
                .map(decode_timestamp)
                .transpose()?,
            confirmed_by: row.get("confirmed_by"),
        })
    }
}
