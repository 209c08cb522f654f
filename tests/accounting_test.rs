mod common;

use anyhow::Result;
use barberdesk::application::AppError;
use barberdesk::domain::{EmployeeFilter, Partition, PeriodSelection, Totals, UNASSIGNED_NAME};
use chrono::{FixedOffset, Utc};
use common::{StandardStaff, at, date, test_service};

#[tokio::test]
async fn test_today_totals_and_ranking() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create_with_sales(&service).await?;

    let today = date("2024-06-01");
    let report = service
        .accounting_on(PeriodSelection::day(today), &EmployeeFilter::All, today, &Utc)
        .await;

    assert_eq!(
        report.totals,
        Totals {
            revenue: 18000,
            employees: 11000,
            shop: 7000
        }
    );
    let ranking: Vec<(&str, i64)> = report
        .top_earners
        .iter()
        .map(|r| (r.name.as_str(), r.total))
        .collect();
    assert_eq!(ranking, vec![("A", 10000), ("B", 8000)]);

    let summary: Vec<(&str, i64, i64, i64)> = report
        .summary
        .iter()
        .map(|s| (s.name.as_str(), s.sales, s.earned, s.generated))
        .collect();
    assert_eq!(summary, vec![("A", 1, 6000, 10000), ("B", 1, 5000, 8000)]);
    assert_eq!(report.employees, vec!["A", "B"]);

    Ok(())
}

#[tokio::test]
async fn test_named_filter() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create_with_sales(&service).await?;

    let today = date("2024-06-01");
    let report = service
        .accounting_on(
            PeriodSelection::day(today),
            &EmployeeFilter::Named("B".into()),
            today,
            &Utc,
        )
        .await;

    assert_eq!(report.sales.len(), 1);
    assert_eq!(report.sales[0].employee_name, "B");
    assert_eq!(
        report.totals,
        Totals {
            revenue: 8000,
            employees: 5000,
            shop: 3000
        }
    );
    assert!(report.top_earners.is_empty());
    assert!(report.summary.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_close_day_moves_sales_to_archive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create_with_sales(&service).await?;
    let repo = service.repository();

    assert_eq!(repo.count_sales(Partition::Live).await?, 2);
    assert_eq!(repo.count_sales(Partition::Archived).await?, 0);

    // Closing the same day moves nothing
    assert_eq!(service.close_day_on(date("2024-06-01"), &Utc).await?, 0);

    let next_day = date("2024-06-02");
    assert_eq!(service.close_day_on(next_day, &Utc).await?, 2);
    assert_eq!(repo.count_sales(Partition::Live).await?, 0);
    assert_eq!(repo.count_sales(Partition::Archived).await?, 2);

    // The closed day is now served from the archive
    let report = service
        .accounting_on(
            PeriodSelection::day(date("2024-06-01")),
            &EmployeeFilter::All,
            next_day,
            &Utc,
        )
        .await;
    assert_eq!(report.totals.revenue, 18000);

    // And today starts empty
    let report = service
        .accounting_on(PeriodSelection::day(next_day), &EmployeeFilter::All, next_day, &Utc)
        .await;
    assert!(report.sales.is_empty());
    assert_eq!(report.totals, Totals::default());

    Ok(())
}

#[tokio::test]
async fn test_current_month_merges_archive_and_live() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;
    let today = date("2024-06-20");

    // Backdated sales land in the archive
    service
        .record_sale_on(Some("A"), 5000, 2500, at("2024-06-19T17:00:00Z"), today, &Utc)
        .await?;
    service
        .record_sale_on(Some("B"), 7000, 3500, at("2024-06-02T11:00:00Z"), today, &Utc)
        .await?;
    service
        .record_sale_on(Some("A"), 9000, 4500, at("2024-05-31T11:00:00Z"), today, &Utc)
        .await?;
    service
        .record_sale_on(Some("B"), 3000, 1500, at("2024-06-20T09:30:00Z"), today, &Utc)
        .await?;
    service
        .record_sale_on(None, 2000, 0, at("2024-06-20T08:00:00Z"), today, &Utc)
        .await?;

    let repo = service.repository();
    assert_eq!(repo.count_sales(Partition::Archived).await?, 3);
    assert_eq!(repo.count_sales(Partition::Live).await?, 2);

    let report = service
        .accounting_on(PeriodSelection::month(today), &EmployeeFilter::All, today, &Utc)
        .await;

    let prices: Vec<i64> = report.sales.iter().map(|s| s.sale.price).collect();
    assert_eq!(prices, vec![7000, 5000, 2000, 3000]);
    assert_eq!(report.totals.revenue, 17000);
    assert_eq!(report.sales[2].employee_name, UNASSIGNED_NAME);

    let generated: i64 = report.summary.iter().map(|s| s.generated).sum();
    assert_eq!(generated, report.totals.revenue);

    let mut ids: Vec<_> = report.sales.iter().map(|s| s.sale.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), report.sales.len());

    Ok(())
}

#[tokio::test]
async fn test_past_month_reads_archive_only() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;
    let today = date("2024-06-20");

    service
        .record_sale_on(Some("A"), 9000, 4500, at("2024-05-31T11:00:00Z"), today, &Utc)
        .await?;
    service
        .record_sale_on(Some("A"), 3000, 1500, at("2024-06-20T09:30:00Z"), today, &Utc)
        .await?;

    let report = service
        .accounting_on(
            PeriodSelection::month(date("2024-05-15")),
            &EmployeeFilter::All,
            today,
            &Utc,
        )
        .await;

    assert_eq!(report.sales.len(), 1);
    assert_eq!(report.totals.revenue, 9000);

    Ok(())
}

#[tokio::test]
async fn test_day_boundaries_follow_local_zone() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;
    let tz = FixedOffset::west_opt(4 * 3600).unwrap();
    let today = date("2024-06-01");

    // 23:30 local on May 31st
    service
        .record_sale_on(Some("A"), 4000, 2000, at("2024-06-01T03:30:00Z"), today, &tz)
        .await?;
    // 00:30 local on June 1st
    service
        .record_sale_on(Some("A"), 6000, 3000, at("2024-06-01T04:30:00Z"), today, &tz)
        .await?;

    let report = service
        .accounting_on(PeriodSelection::day(today), &EmployeeFilter::All, today, &tz)
        .await;
    assert_eq!(report.totals.revenue, 6000);

    let report = service
        .accounting_on(
            PeriodSelection::day(date("2024-05-31")),
            &EmployeeFilter::All,
            today,
            &tz,
        )
        .await;
    assert_eq!(report.totals.revenue, 4000);

    Ok(())
}

#[tokio::test]
async fn test_record_sale_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;
    let now = at("2024-06-01T09:00:00Z");
    let today = date("2024-06-01");

    let result = service
        .record_sale_on(Some("A"), 0, 0, now, today, &Utc)
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service
        .record_sale_on(Some("A"), 5000, -1, now, today, &Utc)
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service
        .record_sale_on(Some("A"), 5000, 6000, now, today, &Utc)
        .await;
    assert!(matches!(
        result,
        Err(AppError::EmployeeAmountExceedsPrice {
            price: 5000,
            employee_amount: 6000
        })
    ));

    let result = service
        .record_sale_on(Some("Nobody"), 5000, 1000, now, today, &Utc)
        .await;
    assert!(matches!(result, Err(AppError::EmployeeNotFound(_))));

    assert_eq!(service.repository().count_sales(Partition::Live).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_employee_names_are_unique() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;

    let result = service.create_employee("A".into()).await;
    assert!(matches!(result, Err(AppError::EmployeeAlreadyExists(_))));

    let result = service.create_employee("   ".into()).await;
    assert!(matches!(result, Err(AppError::InvalidEmployeeName(_))));

    let result = service.create_employee(UNASSIGNED_NAME.into()).await;
    assert!(matches!(result, Err(AppError::InvalidEmployeeName(_))));
    let result = service.create_employee(" Unassigned ".into()).await;
    assert!(matches!(result, Err(AppError::InvalidEmployeeName(_))));

    let names: Vec<String> = service
        .list_employees()
        .await?
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["A", "B"]);

    Ok(())
}
