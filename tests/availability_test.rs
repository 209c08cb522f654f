mod common;

use anyhow::Result;
use barberdesk::application::AppError;
use barberdesk::domain::{
    Availability, AvailabilityError, AvailabilityRequest, AvailabilityStatus, LunchBreak,
};
use common::{StandardStaff, test_service, time};

#[tokio::test]
async fn test_set_and_list_availability() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;
    service.create_employee("C".into()).await?;

    service
        .set_availability(
            "A",
            AvailabilityRequest::new(AvailabilityStatus::Available)
                .lunch_at(time("13:00"))
                .back_at(time("14:00")),
        )
        .await?;
    service
        .set_availability(
            "B",
            AvailabilityRequest::new(AvailabilityStatus::AtLunch).back_at(time("14:30")),
        )
        .await?;

    let entries = service.list_availability().await?;
    let names: Vec<&str> = entries.iter().map(|e| e.employee.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    assert_eq!(
        entries[0].availability(),
        Availability::Available {
            lunch: Some(LunchBreak {
                leaves_at: time("13:00"),
                back_at: time("14:00"),
            })
        }
    );
    assert_eq!(entries[0].availability().summary(), "Lunch at 13:00.");
    assert_eq!(entries[1].availability().summary(), "Back at 14:30.");

    // Never set: counts as available all day
    assert!(entries[2].record.is_none());
    assert_eq!(entries[2].availability().summary(), "Available all day.");

    Ok(())
}

#[tokio::test]
async fn test_latest_status_replaces_previous() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;

    service
        .set_availability(
            "A",
            AvailabilityRequest::new(AvailabilityStatus::AtLunch).back_at(time("14:00")),
        )
        .await?;
    service
        .set_availability("A", AvailabilityRequest::new(AvailabilityStatus::Unavailable))
        .await?;

    let entries = service.list_availability().await?;
    let a = &entries[0];
    assert_eq!(
        a.availability(),
        Availability::Unavailable { back_at: None }
    );
    assert_eq!(a.availability().summary(), "Not back today.");

    Ok(())
}

#[tokio::test]
async fn test_unavailable_with_return_time() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;

    let record = service
        .set_availability(
            "B",
            AvailabilityRequest::new(AvailabilityStatus::Unavailable).back_at(time("16:00")),
        )
        .await?;
    assert_eq!(record.availability.back_at(), Some(time("16:00")));

    let entries = service.list_availability().await?;
    assert_eq!(entries[1].availability().summary(), "Back at 16:00.");

    Ok(())
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;

    let result = service
        .set_availability(
            "A",
            AvailabilityRequest::new(AvailabilityStatus::Available).lunch_at(time("13:00")),
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::InvalidAvailability(AvailabilityError::MissingLunchTimes))
    ));

    let result = service
        .set_availability("A", AvailabilityRequest::new(AvailabilityStatus::AtLunch))
        .await;
    assert!(matches!(
        result,
        Err(AppError::InvalidAvailability(AvailabilityError::MissingReturnTime))
    ));

    let result = service
        .set_availability(
            "A",
            AvailabilityRequest::new(AvailabilityStatus::Unavailable).all_day(false),
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::InvalidAvailability(AvailabilityError::MissingReturnTime))
    ));

    let result = service
        .set_availability("Nobody", AvailabilityRequest::new(AvailabilityStatus::Available))
        .await;
    assert!(matches!(result, Err(AppError::EmployeeNotFound(_))));

    // Nothing was stored
    let entries = service.list_availability().await?;
    assert!(entries.iter().all(|e| e.record.is_none()));

    Ok(())
}

#[tokio::test]
async fn test_status_board_groups_names() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardStaff::create(&service).await?;
    service.create_employee("C".into()).await?;

    service
        .set_availability(
            "B",
            AvailabilityRequest::new(AvailabilityStatus::AtLunch).back_at(time("14:00")),
        )
        .await?;
    service
        .set_availability("C", AvailabilityRequest::new(AvailabilityStatus::Unavailable))
        .await?;

    let board = service.status_board().await?;
    // A never set a status
    assert!(board.available.is_empty());
    assert_eq!(board.at_lunch, vec!["B"]);
    assert_eq!(board.unavailable, vec!["C"]);

    service
        .set_availability("A", AvailabilityRequest::new(AvailabilityStatus::Available))
        .await?;
    let board = service.status_board().await?;
    assert_eq!(board.available, vec!["A"]);

    Ok(())
}
