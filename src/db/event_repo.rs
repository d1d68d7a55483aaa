use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use super::is_identifier;
use crate::models::{CellValue, DateRange, Event, EventRow};

pub struct EventRepository {
    pool: SqlitePool,
    table: String,
}

impl EventRepository {
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> Result<Self, sqlx::Error> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(sqlx::Error::Configuration(
                format!("Invalid table name '{}'", table).into(),
            ));
        }
        Ok(Self { pool, table })
    }

    /// Insert the event, or update every fetched column if the id already exists.
    ///
    /// Annotation columns (activity_block, persona, ...) are left alone on update.
    pub async fn upsert(&self, event: &Event) -> Result<(), sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO "{}" (event_id, calendar_name, calendar_id, summary, description, "start", "end",
                              start_date, end_date, duration_minutes, duration_hours, timezone, offsite, location)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_id) DO UPDATE SET
                calendar_name = excluded.calendar_name,
                calendar_id = excluded.calendar_id,
                summary = excluded.summary,
                description = excluded.description,
                "start" = excluded."start",
                "end" = excluded."end",
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                duration_minutes = excluded.duration_minutes,
                duration_hours = excluded.duration_hours,
                timezone = excluded.timezone,
                offsite = excluded.offsite,
                location = excluded.location
            "#,
            self.table
        );

        sqlx::query(&sql)
            .bind(&event.event_id)
            .bind(&event.calendar_name)
            .bind(&event.calendar_id)
            .bind(&event.summary)
            .bind(&event.description)
            .bind(event.start.to_rfc3339())
            .bind(event.end.to_rfc3339())
            .bind(event.start_date())
            .bind(event.end_date())
            .bind(event.duration_minutes())
            .bind(event.duration_hours())
            .bind(&event.timezone)
            .bind(event.offsite())
            .bind(&event.location)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[cfg(test)]
    pub async fn get(&self, event_id: &str) -> Result<Option<EventRow>, sqlx::Error> {
        let sql = format!(r#"SELECT * FROM "{}" WHERE event_id = ?"#, self.table);
        let row = sqlx::query(&sql)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(to_event_row).transpose()
    }

    pub async fn exists(&self, event_id: &str) -> Result<bool, sqlx::Error> {
        let sql = format!(r#"SELECT 1 FROM "{}" WHERE event_id = ?"#, self.table);
        let row = sqlx::query(&sql)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// All rows whose start date falls inside the range, ordered by start.
    pub async fn list_range(&self, range: &DateRange) -> Result<Vec<EventRow>, sqlx::Error> {
        let sql = format!(
            r#"SELECT * FROM "{}" WHERE DATE(start_date) BETWEEN ? AND ? ORDER BY start_date, "start""#,
            self.table
        );
        let rows = sqlx::query(&sql)
            .bind(range.start().to_string())
            .bind(range.end().to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(to_event_row).collect()
    }

    /// Distinct start dates inside the range, ascending.
    pub async fn distinct_dates(&self, range: &DateRange) -> Result<Vec<NaiveDate>, sqlx::Error> {
        let sql = format!(
            r#"SELECT DISTINCT DATE(start_date) AS day FROM "{}"
               WHERE DATE(start_date) BETWEEN ? AND ? ORDER BY day"#,
            self.table
        );
        let days: Vec<(Option<String>,)> = sqlx::query_as(&sql)
            .bind(range.start().to_string())
            .bind(range.end().to_string())
            .fetch_all(&self.pool)
            .await?;

        Ok(days
            .into_iter()
            .filter_map(|(day,)| day)
            .filter_map(|day| NaiveDate::parse_from_str(&day, "%Y-%m-%d").ok())
            .collect())
    }

    pub async fn list_on_date(&self, date: NaiveDate) -> Result<Vec<EventRow>, sqlx::Error> {
        let sql = format!(
            r#"SELECT * FROM "{}" WHERE DATE(start_date) = ? ORDER BY start_date, "start""#,
            self.table
        );
        let rows = sqlx::query(&sql)
            .bind(date.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(to_event_row).collect()
    }

    /// Overwrite the given columns of an existing row. Returns rows affected.
    pub async fn update_columns(
        &self,
        event_id: &str,
        values: Vec<(String, CellValue)>,
    ) -> Result<u64, sqlx::Error> {
        if values.is_empty() {
            return Ok(0);
        }
        if let Some((bad, _)) = values.iter().find(|(column, _)| !is_identifier(column)) {
            return Err(sqlx::Error::ColumnNotFound(bad.clone()));
        }

        let set_clause = values
            .iter()
            .map(|(column, _)| format!(r#""{}" = ?"#, column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"UPDATE "{}" SET {} WHERE event_id = ?"#,
            self.table, set_clause
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in values {
            query = match value {
                CellValue::Text(s) => query.bind(s),
                CellValue::Integer(i) => query.bind(i),
                CellValue::Real(f) => query.bind(f),
            };
        }
        let result = query.bind(event_id).execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    #[cfg(test)]
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, self.table);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

/// Read every column of a row, normalizing NULL to empty text.
fn to_event_row(row: &SqliteRow) -> Result<EventRow, sqlx::Error> {
    let mut event_row = EventRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            CellValue::empty()
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => CellValue::Integer(row.try_get_unchecked(index)?),
                "REAL" => CellValue::Real(row.try_get_unchecked(index)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get_unchecked(index)?;
                    CellValue::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => CellValue::Text(row.try_get_unchecked(index)?),
            }
        };
        event_row.set(column.name(), value);
    }
    Ok(event_row)
}
