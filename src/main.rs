use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_appender::rolling;

use hrm_lite::{
    ApiClient, Config, Coordinator, HrGateway,
    form::{AttendanceForm, EmployeeForm},
    model::AttendanceStatus,
    store::today,
};

#[derive(Parser)]
#[command(name = "hrm-lite", about = "Employee records and daily attendance")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the workspace and print today's numbers (default)
    Summary,
    AddEmployee {
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        department: String,
    },
    DeleteEmployee {
        /// Server id or employee code
        employee: String,
    },
    Mark {
        /// Server id or employee code
        employee: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "Present")]
        status: AttendanceStatus,
    },
    /// List attendance, optionally for one employee
    Attendance {
        #[arg(long)]
        employee: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "hrm-lite.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .pretty()
        .init();

    info!(api = %config.api_base_url, "Client starting...");

    let coordinator =
        Coordinator::new(ApiClient::new(&config.api_base_url)).with_notice_ttl(config.toast_ttl);

    if coordinator.load().await.is_err() {
        let page = coordinator.page();
        eprintln!("{}", page.error.unwrap_or_default());
        return Ok(ExitCode::FAILURE);
    }

    let outcome = match cli.command.unwrap_or(Command::Summary) {
        Command::Summary => Ok(()),
        Command::AddEmployee {
            employee_id,
            full_name,
            email,
            department,
        } => {
            let mut form = EmployeeForm::new(employee_id, full_name, email, department);
            form.submit(&coordinator).await.map_err(|e| e.to_string())
        }
        Command::DeleteEmployee { employee } => match resolve_employee(&coordinator, &employee) {
            Some(id) => coordinator
                .delete_employee(&id)
                .await
                .map_err(|e| e.to_string()),
            None => Err(format!("No employee matches {employee:?}")),
        },
        Command::Mark {
            employee,
            date,
            status,
        } => {
            let mut form = AttendanceForm::for_day(date.unwrap_or_else(today));
            form.employee_id = resolve_employee(&coordinator, &employee).unwrap_or_default();
            form.status = status;
            form.submit(&coordinator).await.map_err(|e| e.to_string())
        }
        Command::Attendance { employee } => {
            let filter = employee.and_then(|e| resolve_employee(&coordinator, &e));
            print_attendance(&coordinator, filter.as_deref()).await
        }
    };

    if let Some(notice) = coordinator.active_notice() {
        println!("{notice}");
    }
    print_summary(&coordinator);

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(message) => {
            error!(error = %message, "Command failed");
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Accepts either the server-assigned id or the human-facing employee code.
fn resolve_employee<G: HrGateway>(coordinator: &Coordinator<G>, key: &str) -> Option<String> {
    let store = coordinator.store();
    store
        .employees()
        .iter()
        .find(|e| e.id == key || e.employee_id == key)
        .map(|e| e.id.clone())
}

async fn print_attendance<G: HrGateway>(
    coordinator: &Coordinator<G>,
    employee_id: Option<&str>,
) -> Result<(), String> {
    let records = coordinator
        .gateway()
        .list_attendance(employee_id)
        .await
        .map_err(|e| e.to_string())?;

    let store = coordinator.store();
    if records.is_empty() {
        println!("No attendance records yet.");
    }
    for rec in &records {
        println!("{}  {:<24} {}", rec.day(), store.display_name(rec), rec.status);
    }
    Ok(())
}

fn print_summary<G: HrGateway>(coordinator: &Coordinator<G>) {
    let stats = coordinator.daily_stats(today());
    println!(
        "Employees: {}  Present: {}  Absent: {}  Rate: {:.0}%",
        stats.total_employees, stats.present, stats.absent, stats.rate
    );
    if let Some(day) = stats.last_updated {
        println!("Updated: {day}");
    }
}
