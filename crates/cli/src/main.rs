use clap::{Args, Parser, Subcommand};
use console::Term;
use intake_core::{
    render::render_roster, run_dashboard, Dashboard, FileSlot, IntakeConfig, IntakeForm,
    RelayClient, SlotStore, TransportMode, CHANNEL_NAME, PATIENT_INPUT_EVENT, SUBMITTED_SLOT,
};
use intake_transport::PusherSubscription;
use intake_types::{PatientField, RosterEntry, StatusTag};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod prompt;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Patient intake form and staff dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one patient record to the relay
    Submit {
        #[command(flatten)]
        fields: FieldArgs,
        /// Status to relay the record with
        #[arg(long, default_value = "submitted")]
        status: StatusTag,
        /// Relay origin (overrides INTAKE_RELAY_URL)
        #[arg(long)]
        relay_url: Option<String>,
    },
    /// Fill in the intake form interactively
    Form {
        /// Relay each answer as `filling` so dashboards follow along
        #[arg(long)]
        live: bool,
        /// Relay origin (overrides INTAKE_RELAY_URL)
        #[arg(long)]
        relay_url: Option<String>,
    },
    /// Watch the staff dashboard
    Dashboard {
        /// Websocket URL of the channel service (overrides PUSHER_WS_URL)
        #[arg(long)]
        ws_url: Option<String>,
        /// Directory holding the submitted-patients slot (overrides INTAKE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print the persisted submitted patients
    Roster {
        /// Directory holding the submitted-patients slot (overrides INTAKE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

/// One flag per form field.
#[derive(Args, Default)]
struct FieldArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    date_of_birth: Option<String>,
    /// male, female or other
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    emergency_contact: Option<String>,
    /// english, spanish, french, german, chinese, arabic, hindi or other
    #[arg(long)]
    preferred_language: Option<String>,
    #[arg(long)]
    nationality: Option<String>,
    #[arg(long)]
    religion: Option<String>,
}

impl FieldArgs {
    fn pairs(&self) -> Vec<(PatientField, &str)> {
        [
            (PatientField::FirstName, &self.first_name),
            (PatientField::LastName, &self.last_name),
            (PatientField::DateOfBirth, &self.date_of_birth),
            (PatientField::Gender, &self.gender),
            (PatientField::Phone, &self.phone),
            (PatientField::Email, &self.email),
            (PatientField::Address, &self.address),
            (PatientField::EmergencyContact, &self.emergency_contact),
            (PatientField::PreferredLanguage, &self.preferred_language),
            (PatientField::Nationality, &self.nationality),
            (PatientField::Religion, &self.religion),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }

    fn into_form(self) -> anyhow::Result<IntakeForm> {
        let mut form = IntakeForm::new();
        for (field, value) in self.pairs() {
            form.set(field, value)?;
        }
        Ok(form)
    }
}

/// Dashboards on a local-transport relay connect to the relay's own websocket.
fn local_ws_url(relay_url: &str) -> String {
    let base = relay_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}/app/local?protocol=7")
}

fn dashboard_ws_url(cfg: &IntakeConfig, ws_url: Option<String>) -> anyhow::Result<String> {
    if let Some(url) = ws_url {
        return Ok(url);
    }
    match cfg.transport() {
        TransportMode::Local if cfg.pusher().ws_url.is_none() => Ok(local_ws_url(cfg.relay_url())),
        _ => Ok(cfg.pusher().websocket_url()?),
    }
}

fn read_roster(slot: &FileSlot) -> anyhow::Result<Vec<RosterEntry>> {
    match slot.load()? {
        Some(contents) => Ok(serde_json::from_str(&contents)?),
        None => Ok(Vec::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = IntakeConfig::from_env()?;

    match cli.command {
        Some(Commands::Submit {
            fields,
            status,
            relay_url,
        }) => {
            let client = RelayClient::new(relay_url.as_deref().unwrap_or(cfg.relay_url()));
            let mut form = fields.into_form()?;
            let id = form.draft().id.clone();
            let result = match status {
                StatusTag::Submitted => form.submit(&client).await,
                StatusTag::Filling => form.report_progress(&client).await,
                StatusTag::Inactive => form.abandon(&client).await,
            };
            match result {
                Ok(res) => {
                    tracing::info!("relayed patient {} as {}", id, status);
                    println!("{} ({}): {}", id, status, res.message);
                }
                Err(e) => {
                    tracing::error!("Relay error: {:?}", e);
                    anyhow::bail!("Error relaying patient {}: {}", id, e);
                }
            }
        }
        Some(Commands::Form { live, relay_url }) => {
            let client = RelayClient::new(relay_url.as_deref().unwrap_or(cfg.relay_url()));
            prompt::run_form(&client, live).await?;
        }
        Some(Commands::Dashboard { ws_url, data_dir }) => {
            let url = dashboard_ws_url(&cfg, ws_url)?;
            let dir = data_dir.unwrap_or_else(|| cfg.data_dir().to_path_buf());
            let mut dashboard = Dashboard::mount(FileSlot::new(&dir, SUBMITTED_SLOT));

            let term = Term::stdout();
            let show = |d: &Dashboard<FileSlot>| {
                let _ = term.clear_screen();
                print!("{}", render_roster(d.roster()));
            };
            show(&dashboard);

            tracing::info!("++ Dashboard connecting to {}", url);
            let subscription =
                PusherSubscription::connect(&url, CHANNEL_NAME, PATIENT_INPUT_EVENT).await?;
            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            run_dashboard(subscription, &mut dashboard, shutdown, show).await?;
            tracing::info!("-- Dashboard stopped with {} patients", dashboard.roster().len());
        }
        Some(Commands::Roster { data_dir }) => {
            let dir = data_dir.unwrap_or_else(|| cfg.data_dir().to_path_buf());
            let entries = read_roster(&FileSlot::new(&dir, SUBMITTED_SLOT))?;
            if entries.is_empty() {
                println!("No patients found.");
            } else {
                for entry in entries {
                    println!(
                        "ID: {}, Name: {}, Date of Birth: {}",
                        entry.record.id,
                        entry.record.full_name(),
                        entry.record.date_of_birth
                    );
                }
            }
        }
        None => {
            println!("Use 'intake --help' for commands");
        }
    }

    Ok(())
}
