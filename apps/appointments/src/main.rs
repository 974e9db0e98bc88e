use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use booking_client::{
    load_settings, AppointmentsScreen, AppointmentsView, CatalogState, DraftField, HttpBackend,
    ServiceCatalog, SubmitOutcome,
};
use clap::{Parser, Subcommand};
use shared::domain::{AppointmentId, ServiceId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    /// Settings file; `appointments.toml` is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    Services,
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        service: i64,
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.api_base_url = server_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(api_base_url = %settings.api_base_url, "appointments: starting");

    let backend = Arc::new(HttpBackend::from_settings(&settings)?);
    let catalog =
        Arc::new(ServiceCatalog::new(backend.clone()).with_retry(settings.catalog_retry()));
    let screen = AppointmentsScreen::new(backend, Arc::clone(&catalog));

    match cli.command {
        Command::List { page } => {
            screen.show_page(page).await?;
            print_page(&screen.view());
        }
        Command::Services => {
            let services = screen.load_catalog().await;
            if catalog.state() == CatalogState::Unavailable {
                bail!("service catalog unavailable");
            }
            for service in services {
                println!("{:>5}  {}", service.id.0, service.name);
            }
        }
        Command::Edit {
            id,
            service,
            date,
            time,
            page,
        } => {
            let page = screen.show_page(page).await?;
            screen.load_catalog().await;
            screen
                .open_edit(AppointmentId(id))
                .with_context(|| format!("appointment {id} is not on page {page}"))?;
            screen.update_draft(DraftField::Service(Some(ServiceId(service))))?;
            screen.update_draft(DraftField::Date(date))?;
            screen.update_draft(DraftField::Time(time))?;

            match screen.submit_edit().await {
                SubmitOutcome::Succeeded => {
                    println!("updated appointment_id={id}");
                    print_page(&screen.view());
                }
                SubmitOutcome::Invalid(error) => bail!("invalid edit: {error}"),
                SubmitOutcome::Failed(error) => bail!("edit rejected: {error}"),
                SubmitOutcome::InProgress | SubmitOutcome::NoDraft => {
                    bail!("edit was not submitted")
                }
            }
        }
    }

    Ok(())
}

fn print_page(view: &AppointmentsView) {
    if let Some(error) = &view.error {
        println!("could not load appointments: {error}");
    }
    if view.is_empty {
        println!("no upcoming appointments on page {}", view.page);
    }
    for row in &view.rows {
        println!(
            "{:>5}  {} {}  {:<20}  {}",
            row.appointment_id.0,
            row.appointment_date,
            row.appointment_time,
            row.service.name,
            row.status.as_str()
        );
    }

    let pages: Vec<String> = view
        .page_numbers
        .iter()
        .map(|&n| {
            if n == view.page.get() {
                format!("[{n}]")
            } else {
                n.to_string()
            }
        })
        .collect();
    if !pages.is_empty() {
        println!("pages: {} of {}", pages.join(" "), view.total_pages);
    }
}
