use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use tokio::sync::broadcast;

use crate::domain::{
    Amount, Appointment, AppointmentId, Availability, AvailabilityRecord, AvailabilityRequest,
    AvailabilityStatus, Employee, EmployeeFilter, Outcome, Partition, PeriodSelection, Sale,
    UNASSIGNED_NAME, rank_all_earners,
};
use crate::storage::{ChangeEvent, Repository};

use super::{
    Accountant, AccountingBoard, AccountingReport, AppError, DashboardSummary, StatusBoard,
};

/// Application service for the shop: the single entry point for the CLI
/// and any other client.
pub struct ShopService {
    repo: Repository,
}

/// Employee together with their current availability, if ever set.
pub struct EmployeeStatus {
    pub employee: Employee,
    pub record: Option<AvailabilityRecord>,
}

impl EmployeeStatus {
    /// Employees with no recorded status count as available all day.
    pub fn availability(&self) -> Availability {
        self.record
            .as_ref()
            .map(|r| r.availability.clone())
            .unwrap_or(Availability::Available { lunch: None })
    }
}

impl ShopService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.repo.subscribe()
    }

    // ========================
    // Employee operations
    // ========================

    pub async fn create_employee(&self, name: String) -> Result<Employee, AppError> {
        let name = name.trim().to_string();
        // The unassigned bucket has no row of its own.
        if name.is_empty() || name.eq_ignore_ascii_case(UNASSIGNED_NAME) {
            return Err(AppError::InvalidEmployeeName(name));
        }
        if self.repo.get_employee_by_name(&name).await?.is_some() {
            return Err(AppError::EmployeeAlreadyExists(name));
        }

        let employee = Employee::new(name);
        self.repo.save_employee(&employee).await?;
        tracing::info!(employee = %employee.name, "Employee created");
        Ok(employee)
    }

    pub async fn get_employee(&self, name: &str) -> Result<Employee, AppError> {
        self.repo
            .get_employee_by_name(name)
            .await?
            .ok_or_else(|| AppError::EmployeeNotFound(name.to_string()))
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.repo.list_employees().await?)
    }

    // ========================
    // Sale operations
    // ========================

    /// Record a sale in the shop's local time zone.
    pub async fn record_sale(
        &self,
        employee_name: Option<&str>,
        price: Amount,
        employee_amount: Amount,
        at: DateTime<Utc>,
    ) -> Result<Sale, AppError> {
        let today = Local::now().date_naive();
        self.record_sale_on(employee_name, price, employee_amount, at, today, &Local)
            .await
    }

    /// Record a sale. Sales from before `today` go straight to the archive
    /// so a day is only ever served from one partition.
    pub async fn record_sale_on<Tz: TimeZone>(
        &self,
        employee_name: Option<&str>,
        price: Amount,
        employee_amount: Amount,
        at: DateTime<Utc>,
        today: NaiveDate,
        tz: &Tz,
    ) -> Result<Sale, AppError> {
        if price <= 0 {
            return Err(AppError::InvalidAmount(format!(
                "price must be positive, got {}",
                price
            )));
        }
        if employee_amount < 0 {
            return Err(AppError::InvalidAmount(format!(
                "employee amount cannot be negative, got {}",
                employee_amount
            )));
        }
        if employee_amount > price {
            return Err(AppError::EmployeeAmountExceedsPrice {
                price,
                employee_amount,
            });
        }

        let employee_id = match employee_name {
            Some(name) => Some(self.get_employee(name).await?.id),
            None => None,
        };

        let partition = if at.with_timezone(tz).date_naive() < today {
            Partition::Archived
        } else {
            Partition::Live
        };

        let sale = Sale::new(employee_id, price, employee_amount, at);
        self.repo.save_sale(partition, &sale).await?;
        tracing::info!(
            sale = %sale.id,
            price,
            employee_amount,
            %partition,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Move every live sale from before today into the archive.
    pub async fn close_day(&self) -> Result<u64, AppError> {
        self.close_day_on(Local::now().date_naive(), &Local).await
    }

    pub async fn close_day_on<Tz: TimeZone>(
        &self,
        today: NaiveDate,
        tz: &Tz,
    ) -> Result<u64, AppError> {
        let cutoff = PeriodSelection::day(today).range_in(tz)?.start;
        let moved = self.repo.archive_before(cutoff).await?;
        tracing::info!(moved, %cutoff, "Day closed");
        Ok(moved)
    }

    // ========================
    // Availability operations
    // ========================

    pub async fn set_availability(
        &self,
        employee_name: &str,
        request: AvailabilityRequest,
    ) -> Result<AvailabilityRecord, AppError> {
        let employee = self.get_employee(employee_name).await?;
        let availability = request.validate()?;

        let record = AvailabilityRecord {
            employee_id: employee.id,
            availability,
            updated_at: Utc::now(),
        };
        self.repo.upsert_availability(&record).await?;
        tracing::info!(
            employee = %employee.name,
            status = %record.availability.status(),
            "Availability updated"
        );
        Ok(record)
    }

    /// Every employee with their current availability, ordered by name.
    pub async fn list_availability(&self) -> Result<Vec<EmployeeStatus>, AppError> {
        let employees = self.repo.list_employees().await?;
        let mut records: HashMap<_, _> = self
            .repo
            .list_availability()
            .await?
            .into_iter()
            .map(|r| (r.employee_id, r))
            .collect();

        Ok(employees
            .into_iter()
            .map(|employee| {
                let record = records.remove(&employee.id);
                EmployeeStatus { employee, record }
            })
            .collect())
    }

    /// Employees grouped by their recorded status. Those who never set one
    /// are left off the board.
    pub async fn status_board(&self) -> Result<StatusBoard, AppError> {
        let mut board = StatusBoard::default();
        for entry in self.list_availability().await? {
            let Some(record) = entry.record else {
                continue;
            };
            let name = entry.employee.name;
            match record.availability.status() {
                AvailabilityStatus::Available => board.available.push(name),
                AvailabilityStatus::AtLunch => board.at_lunch.push(name),
                AvailabilityStatus::Unavailable => board.unavailable.push(name),
            }
        }
        Ok(board)
    }

    // ========================
    // Appointment operations
    // ========================

    pub async fn add_appointment(&self, appointment: Appointment) -> Result<Appointment, AppError> {
        if !appointment.is_valid_slot() {
            return Err(AppError::InvalidAppointment(format!(
                "end {} must be after start {}",
                appointment.ends_at.format("%H:%M"),
                appointment.starts_at.format("%H:%M")
            )));
        }
        if appointment.client_name.trim().is_empty() {
            return Err(AppError::InvalidAppointment(
                "client name is required".to_string(),
            ));
        }
        if let Some(name) = &appointment.employee_name {
            self.get_employee(name).await?;
        }

        self.repo.save_appointment(&appointment).await?;
        tracing::info!(
            appointment = %appointment.id,
            date = %appointment.date,
            client = %appointment.client_name,
            "Appointment booked"
        );
        Ok(appointment)
    }

    /// A day's appointments ordered by start time.
    pub async fn appointments_on(&self, date: NaiveDate) -> Result<Vec<Appointment>, AppError> {
        Ok(self.repo.list_appointments_on(date).await?)
    }

    /// Record what happened with an appointment, confirmed by the owner.
    pub async fn confirm_appointment(
        &self,
        id: AppointmentId,
        outcome: Outcome,
    ) -> Result<Appointment, AppError> {
        let mut appointment = self
            .repo
            .get_appointment(id)
            .await?
            .ok_or_else(|| AppError::AppointmentNotFound(id.to_string()))?;

        appointment.confirm(outcome, Utc::now());
        self.repo.update_appointment_outcome(&appointment).await?;
        tracing::info!(appointment = %id, %outcome, "Appointment outcome confirmed");
        Ok(appointment)
    }

    // ========================
    // Accounting
    // ========================

    /// Accounting report for a period in the shop's local time zone.
    pub async fn accounting(
        &self,
        selection: PeriodSelection,
        filter: &EmployeeFilter,
    ) -> AccountingReport {
        self.accounting_on(selection, filter, Local::now().date_naive(), &Local)
            .await
    }

    pub async fn accounting_on<Tz: TimeZone>(
        &self,
        selection: PeriodSelection,
        filter: &EmployeeFilter,
        today: NaiveDate,
        tz: &Tz,
    ) -> AccountingReport {
        let accountant = Accountant::new(self.repo.clone());
        accountant.run(selection, today, tz).await.report(filter)
    }

    /// A board over this shop's records, refreshed by the caller.
    pub fn board(&self) -> AccountingBoard<Repository, Local> {
        AccountingBoard::new(Accountant::new(self.repo.clone()), Local)
    }

    // ========================
    // Dashboard
    // ========================

    pub async fn dashboard(&self) -> Result<DashboardSummary, AppError> {
        self.dashboard_on(Local::now().date_naive(), &Local).await
    }

    pub async fn dashboard_on<Tz: TimeZone>(
        &self,
        today: NaiveDate,
        tz: &Tz,
    ) -> Result<DashboardSummary, AppError> {
        let status = self.status_board().await?;

        let accountant = Accountant::new(self.repo.clone());
        let day = accountant.run(PeriodSelection::day(today), today, tz).await;
        let month = accountant
            .run(PeriodSelection::month(today), today, tz)
            .await;

        let revenue_today = day.report(&EmployeeFilter::All).totals.revenue;
        let revenue_month = month.report(&EmployeeFilter::All).totals.revenue;
        let monthly_ranking = rank_all_earners(&month.sales);
        let employee_of_the_month = monthly_ranking.first().cloned();

        Ok(DashboardSummary {
            status,
            revenue_today,
            revenue_month,
            monthly_ranking,
            employee_of_the_month,
        })
    }
}
