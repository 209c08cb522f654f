// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use barberdesk::application::ShopService;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(ShopService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = ShopService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn time(time_str: &str) -> NaiveTime {
    NaiveTime::parse_from_str(time_str, "%H:%M").unwrap()
}

/// Helper to parse an RFC 3339 instant into DateTime<Utc>
pub fn at(instant: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(instant)
        .unwrap()
        .with_timezone(&Utc)
}

/// Test fixture: two barbers, A and B
pub struct StandardStaff;

impl StandardStaff {
    pub async fn create(service: &ShopService) -> Result<()> {
        service.create_employee("A".into()).await?;
        service.create_employee("B".into()).await?;
        Ok(())
    }

    /// Staff plus the two sales of the reference day, 2024-06-01 (UTC)
    pub async fn create_with_sales(service: &ShopService) -> Result<()> {
        Self::create(service).await?;
        let today = date("2024-06-01");
        service
            .record_sale_on(Some("A"), 10000, 6000, at("2024-06-01T09:00:00Z"), today, &Utc)
            .await?;
        service
            .record_sale_on(Some("B"), 8000, 5000, at("2024-06-01T10:00:00Z"), today, &Utc)
            .await?;
        Ok(())
    }
}
