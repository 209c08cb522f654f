use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{AccountingReport, DashboardSummary, ShopService};
use crate::domain::{
    Appointment, AvailabilityRequest, AvailabilityStatus, BookingStatus, EmployeeFilter, Outcome,
    PeriodSelection, format_amount, hhmm, parse_amount,
};
use crate::io::Exporter;

/// Barberdesk - accounting and front desk for a barbershop
#[derive(Parser)]
#[command(name = "barberdesk")]
#[command(about = "Sales, staff availability and appointments for a barbershop")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BARBERDESK_DB", default_value = "barberdesk.db")]
    pub database: String,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Employee management commands
    #[command(subcommand)]
    Employee(EmployeeCommands),

    /// Record a completed sale
    Sale {
        /// Price charged to the client (e.g., "18000" or "18.000")
        price: String,

        /// Employee who did the service (omit for unassigned)
        #[arg(short, long)]
        employee: Option<String>,

        /// Employee's share of the price
        #[arg(long)]
        employee_amount: String,

        /// Time of the sale (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Move every sale from before today into the archive
    CloseDay,

    /// Staff availability commands
    #[command(subcommand)]
    Status(StatusCommands),

    /// Appointment commands
    #[command(subcommand)]
    Agenda(AgendaCommands),

    /// Sales, totals and earnings for a day or month
    Accounting {
        /// Day to report (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Report the whole month containing the date
        #[arg(long)]
        month: bool,

        /// Only show this employee's sales
        #[arg(short, long)]
        employee: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Owner overview: staff status, revenue and monthly ranking
    Dashboard {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum EmployeeCommands {
    /// Add an employee
    Add {
        /// Employee name (must be unique)
        name: String,
    },

    /// List all employees
    List,
}

#[derive(Subcommand)]
pub enum StatusCommands {
    /// Set an employee's availability
    Set {
        /// Employee name
        employee: String,

        /// Status: available, at_lunch, unavailable
        status: String,

        /// Available all day, or not back today when unavailable
        #[arg(long)]
        all_day: Option<bool>,

        /// Lunch start (HH:MM)
        #[arg(long)]
        lunch_at: Option<String>,

        /// Return time (HH:MM)
        #[arg(long)]
        back_at: Option<String>,
    },

    /// Show every employee's availability
    List,
}

#[derive(Subcommand)]
pub enum AgendaCommands {
    /// Book an appointment
    Add {
        /// Client name
        client: String,

        /// Start time (HH:MM)
        #[arg(long)]
        start: String,

        /// End time (HH:MM)
        #[arg(long)]
        end: String,

        /// Service requested
        #[arg(short, long)]
        service: String,

        /// Day of the appointment (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Client phone number
        #[arg(long)]
        phone: Option<String>,

        /// Requested employee (omit for anyone)
        #[arg(short, long)]
        employee: Option<String>,

        /// Mark the booking as already confirmed by the client
        #[arg(long)]
        confirmed: bool,
    },

    /// List a day's appointments
    List {
        /// Day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Confirm the client attended
    Attended {
        /// Appointment ID
        id: String,
    },

    /// Confirm the client did not show up
    NoShow {
        /// Appointment ID
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                ShopService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Employee(employee_cmd) => {
                let service = ShopService::connect(&self.database).await?;
                run_employee_command(&service, employee_cmd).await?;
            }

            Commands::Sale {
                price,
                employee,
                employee_amount,
                at,
            } => {
                let service = ShopService::connect(&self.database).await?;
                let price = parse_amount(&price).with_context(|| {
                    format!("Invalid price '{}'. Use '18000' or '18.000'", price)
                })?;
                let employee_amount = parse_amount(&employee_amount).with_context(|| {
                    format!("Invalid employee amount '{}'", employee_amount)
                })?;
                let at = match at {
                    Some(s) => parse_instant(&s)?,
                    None => Utc::now(),
                };

                let sale = service
                    .record_sale(employee.as_deref(), price, employee_amount, at)
                    .await?;
                println!(
                    "Recorded sale: {} (employee {}, shop {})",
                    format_amount(sale.price),
                    format_amount(sale.employee_amount),
                    format_amount(sale.shop_amount)
                );
                println!("  ID: {}", sale.id);
            }

            Commands::CloseDay => {
                let service = ShopService::connect(&self.database).await?;
                let moved = service.close_day().await?;
                println!("Archived {} sale(s).", moved);
            }

            Commands::Status(status_cmd) => {
                let service = ShopService::connect(&self.database).await?;
                run_status_command(&service, status_cmd).await?;
            }

            Commands::Agenda(agenda_cmd) => {
                let service = ShopService::connect(&self.database).await?;
                run_agenda_command(&service, agenda_cmd).await?;
            }

            Commands::Accounting {
                date,
                month,
                employee,
                format,
            } => {
                let service = ShopService::connect(&self.database).await?;
                let date = match date {
                    Some(s) => parse_date(&s)?,
                    None => Local::now().date_naive(),
                };
                let selection = if month {
                    PeriodSelection::month(date)
                } else {
                    PeriodSelection::day(date)
                };
                let filter = EmployeeFilter::from_option(employee);

                let report = service.accounting(selection, &filter).await;
                print_accounting(&report, &format)?;
            }

            Commands::Dashboard { format } => {
                let service = ShopService::connect(&self.database).await?;
                let summary = service.dashboard().await?;
                match format.as_str() {
                    "json" => Exporter::new(std::io::stdout().lock()).dashboard_json(&summary)?,
                    _ => print_dashboard(&summary),
                }
            }
        }

        Ok(())
    }
}

async fn run_employee_command(service: &ShopService, cmd: EmployeeCommands) -> Result<()> {
    match cmd {
        EmployeeCommands::Add { name } => {
            let employee = service.create_employee(name).await?;
            println!("Added employee: {}", employee.name);
        }

        EmployeeCommands::List => {
            let employees = service.list_employees().await?;
            if employees.is_empty() {
                println!("No employees found.");
            } else {
                println!("{:<20} {:<12}", "NAME", "SINCE");
                println!("{}", "-".repeat(33));
                for employee in employees {
                    println!(
                        "{:<20} {:<12}",
                        truncate(&employee.name, 20),
                        employee.created_at.with_timezone(&Local).format("%Y-%m-%d")
                    );
                }
            }
        }
    }

    Ok(())
}

async fn run_status_command(service: &ShopService, cmd: StatusCommands) -> Result<()> {
    match cmd {
        StatusCommands::Set {
            employee,
            status,
            all_day,
            lunch_at,
            back_at,
        } => {
            let status: AvailabilityStatus = status.parse().map_err(|e| {
                anyhow::anyhow!(
                    "{}. Valid statuses: available, at_lunch, unavailable",
                    e
                )
            })?;

            let mut request = AvailabilityRequest::new(status);
            if let Some(all_day) = all_day {
                request = request.all_day(all_day);
            }
            if let Some(time) = lunch_at.as_deref().map(parse_time).transpose()? {
                request = request.lunch_at(time);
            }
            if let Some(time) = back_at.as_deref().map(parse_time).transpose()? {
                request = request.back_at(time);
            }

            let record = service.set_availability(&employee, request).await?;
            println!(
                "{}: {} {}",
                employee,
                record.availability.status().label(),
                record.availability.summary()
            );
        }

        StatusCommands::List => {
            let entries = service.list_availability().await?;
            if entries.is_empty() {
                println!("No employees found.");
            } else {
                println!("{:<20} {:<12} DETAIL", "EMPLOYEE", "STATUS");
                println!("{}", "-".repeat(55));
                for entry in entries {
                    let availability = entry.availability();
                    println!(
                        "{:<20} {:<12} {}",
                        truncate(&entry.employee.name, 20),
                        availability.status().label(),
                        availability.summary()
                    );
                }
            }
        }
    }

    Ok(())
}

async fn run_agenda_command(service: &ShopService, cmd: AgendaCommands) -> Result<()> {
    match cmd {
        AgendaCommands::Add {
            client,
            start,
            end,
            service: requested,
            date,
            phone,
            employee,
            confirmed,
        } => {
            let date = match date {
                Some(s) => parse_date(&s)?,
                None => Local::now().date_naive(),
            };
            let mut appointment =
                Appointment::new(date, parse_time(&start)?, parse_time(&end)?, client, requested);
            if let Some(phone) = phone {
                appointment = appointment.with_phone(phone);
            }
            if let Some(employee) = employee {
                appointment = appointment.with_employee(employee);
            }
            if confirmed {
                appointment = appointment.with_status(BookingStatus::Confirmed);
            }

            let appointment = service.add_appointment(appointment).await?;
            println!(
                "Booked {} on {} {}-{} ({})",
                appointment.client_name,
                appointment.date.format("%Y-%m-%d"),
                hhmm(appointment.starts_at),
                hhmm(appointment.ends_at),
                appointment.service
            );
            println!("  ID: {}", appointment.id);
        }

        AgendaCommands::List { date } => {
            let date = match date {
                Some(s) => parse_date(&s)?,
                None => Local::now().date_naive(),
            };
            let appointments = service.appointments_on(date).await?;
            if appointments.is_empty() {
                println!("No appointments on {}.", date.format("%Y-%m-%d"));
            } else {
                println!(
                    "{:<11} {:<18} {:<15} {:<12} {:<10} {:<9} ID",
                    "TIME", "CLIENT", "SERVICE", "EMPLOYEE", "BOOKING", "OUTCOME"
                );
                println!("{}", "-".repeat(115));
                for appt in appointments {
                    println!(
                        "{:<11} {:<18} {:<15} {:<12} {:<10} {:<9} {}",
                        format!("{}-{}", hhmm(appt.starts_at), hhmm(appt.ends_at)),
                        truncate(&appt.client_name, 18),
                        truncate(&appt.service, 15),
                        truncate(appt.employee_label(), 12),
                        appt.status.as_str(),
                        appt.outcome.map(|o| o.as_str()).unwrap_or("-"),
                        appt.id
                    );
                }
            }
        }

        AgendaCommands::Attended { id } => {
            confirm_outcome(service, &id, Outcome::Attended).await?;
        }

        AgendaCommands::NoShow { id } => {
            confirm_outcome(service, &id, Outcome::NoShow).await?;
        }
    }

    Ok(())
}

async fn confirm_outcome(service: &ShopService, id: &str, outcome: Outcome) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("Invalid appointment ID '{}'", id))?;
    let appointment = service.confirm_appointment(id, outcome).await?;
    println!(
        "{} at {}: {}",
        appointment.client_name,
        hhmm(appointment.starts_at),
        outcome
    );
    Ok(())
}

fn print_accounting(report: &AccountingReport, format: &str) -> Result<()> {
    match format {
        "json" => Exporter::new(std::io::stdout().lock()).accounting_json(report)?,
        "csv" => {
            Exporter::new(std::io::stdout().lock()).accounting_csv(report)?;
        }
        _ => print_accounting_table(report),
    }
    Ok(())
}

fn print_accounting_table(report: &AccountingReport) {
    match report.selection {
        Some(selection) => {
            let (first, last) = selection.days();
            if first == last {
                println!("Accounting for {}", first.format("%Y-%m-%d"));
            } else {
                println!(
                    "Accounting for {} to {}",
                    first.format("%Y-%m-%d"),
                    last.format("%Y-%m-%d")
                );
            }
        }
        None => {
            // Failed passes come back empty; details are in the log
            println!("No accounting data available.");
            return;
        }
    }
    if let EmployeeFilter::Named(name) = &report.filter {
        println!("Employee: {}", name);
    }
    println!();

    if report.sales.is_empty() {
        println!("No sales found.");
        return;
    }

    println!(
        "{:<17} {:<20} {:>12} {:>12} {:>12}",
        "TIME", "EMPLOYEE", "PRICE", "EMPLOYEE", "SHOP"
    );
    println!("{}", "-".repeat(77));
    for row in &report.sales {
        println!(
            "{:<17} {:<20} {:>12} {:>12} {:>12}",
            row.sale.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            truncate(&row.employee_name, 20),
            format_amount(row.sale.price),
            format_amount(row.sale.employee_amount),
            format_amount(row.sale.shop_amount)
        );
    }
    println!("{}", "-".repeat(77));
    println!(
        "{:<17} {:<20} {:>12} {:>12} {:>12}",
        "TOTAL",
        "",
        format_amount(report.totals.revenue),
        format_amount(report.totals.employees),
        format_amount(report.totals.shop)
    );

    if !report.top_earners.is_empty() {
        println!();
        println!("Top earners:");
        for (i, rank) in report.top_earners.iter().enumerate() {
            println!(
                "  {}. {:<20} {:>12}",
                i + 1,
                truncate(&rank.name, 20),
                format_amount(rank.total)
            );
        }
    }

    if !report.summary.is_empty() {
        println!();
        println!(
            "{:<20} {:>6} {:>12} {:>12}",
            "EMPLOYEE", "SALES", "EARNED", "GENERATED"
        );
        println!("{}", "-".repeat(53));
        for entry in &report.summary {
            println!(
                "{:<20} {:>6} {:>12} {:>12}",
                truncate(&entry.name, 20),
                entry.sales,
                format_amount(entry.earned),
                format_amount(entry.generated)
            );
        }
    }
}

fn print_dashboard(summary: &DashboardSummary) {
    println!("Staff");
    println!("  {:<12} {}", "Available:", join_or_dash(&summary.status.available));
    println!("  {:<12} {}", "At lunch:", join_or_dash(&summary.status.at_lunch));
    println!("  {:<12} {}", "Unavailable:", join_or_dash(&summary.status.unavailable));
    println!();

    println!("Revenue today:      {:>12}", format_amount(summary.revenue_today));
    println!("Revenue this month: {:>12}", format_amount(summary.revenue_month));

    if let Some(best) = &summary.employee_of_the_month {
        println!();
        println!(
            "Employee of the month: {} ({})",
            best.name,
            format_amount(best.total)
        );
    }

    if !summary.monthly_ranking.is_empty() {
        println!();
        println!("Monthly ranking:");
        for (i, rank) in summary.monthly_ranking.iter().enumerate() {
            println!(
                "  {}. {:<20} {:>12}",
                i + 1,
                truncate(&rank.name, 20),
                format_amount(rank.total)
            );
        }
    }
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}

fn parse_time(time_str: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time_str, "%H:%M")
        .with_context(|| format!("Invalid time '{}'. Use HH:MM", time_str))
}

fn parse_instant(instant_str: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(instant_str)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid time '{}'. Use RFC 3339", instant_str))
}
