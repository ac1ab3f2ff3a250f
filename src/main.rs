use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use workforce_pulse::auth::InMemorySessions;
use workforce_pulse::client::{
    HealthMonitor, PredictionSource, Predictor, ScoringClient, HEALTH_POLL_INTERVAL,
};
use workforce_pulse::dataset::DatasetStore;
use workforce_pulse::filter::FilterStore;
use workforce_pulse::models::PerformanceCategory;
use workforce_pulse::scoring::{Education, RemoteFrequency, ScoringInput};
use workforce_pulse::settings::{style_variables, DashboardSettings};
use workforce_pulse::{ingest, logging, report, server};

#[derive(Parser)]
#[command(name = "workforce-pulse")]
#[command(about = "Employee performance dashboard pipeline and scoring service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scoring HTTP service
    Serve {
        #[arg(long, env = "PULSE_PORT", default_value_t = 8787)]
        port: u16,
        /// Comma separated bearer tokens accepted by the service
        #[arg(long, env = "PULSE_API_TOKENS", value_delimiter = ',')]
        tokens: Vec<String>,
    },
    /// Load a CSV or JSON upload and summarize it
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Generate a markdown dashboard report
    Report {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "department")]
        departments: Vec<String>,
        #[arg(long = "category")]
        categories: Vec<PerformanceCategory>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Score one employee, simulating locally when the service is offline
    Predict(PredictArgs),
    /// Inspect or change persisted dashboard settings
    Settings {
        #[arg(long, env = "PULSE_SETTINGS", default_value = "dashboard-settings.json")]
        path: PathBuf,
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print settings and the style variables they produce
    Show,
    /// Turn the dark theme on or off
    SetDarkMode {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Remove stored settings
    Reset,
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long, env = "PULSE_ENDPOINT", default_value = "http://127.0.0.1:8787")]
    endpoint: String,
    #[arg(long, env = "PULSE_TOKEN")]
    token: Option<String>,
    #[arg(long, default_value_t = 30.0)]
    age: f64,
    #[arg(long, default_value = "Unknown")]
    gender: String,
    #[arg(long, default_value = "Unknown")]
    department: String,
    #[arg(long, default_value = "Bachelor's")]
    education: String,
    #[arg(long, default_value = "Employee")]
    job_title: String,
    #[arg(long, default_value_t = 0.0)]
    years_at_company: f64,
    #[arg(long, default_value_t = 5000.0)]
    salary: f64,
    #[arg(long, default_value_t = 5.0)]
    team_size: f64,
    #[arg(long, default_value = "Hybrid")]
    remote: String,
    #[arg(long, default_value_t = 40.0)]
    work_hours: f64,
    #[arg(long, default_value_t = 0.0)]
    projects: f64,
    #[arg(long, default_value_t = 0.0)]
    overtime: f64,
    #[arg(long, default_value_t = 0.0)]
    sick_days: f64,
    #[arg(long, default_value_t = 0.0)]
    training: f64,
    #[arg(long, default_value_t = 0.0)]
    promotions: f64,
    #[arg(long, default_value_t = 3.0)]
    satisfaction: f64,
}

impl PredictArgs {
    fn to_input(&self) -> anyhow::Result<ScoringInput> {
        let education = Education::ALL
            .into_iter()
            .find(|e| e.label() == self.education)
            .with_context(|| format!("unknown education level: {}", self.education))?;
        let remote = RemoteFrequency::ALL
            .into_iter()
            .find(|r| r.label() == self.remote)
            .with_context(|| format!("unknown remote frequency: {}", self.remote))?;

        Ok(ScoringInput {
            age: self.age,
            gender: self.gender.clone(),
            department: self.department.clone(),
            education,
            job_title: self.job_title.clone(),
            years_at_company: self.years_at_company,
            salary: self.salary,
            team_size: self.team_size,
            remote,
            work_hours: self.work_hours,
            projects: self.projects,
            overtime: self.overtime,
            sick_days: self.sick_days,
            training: self.training,
            promotions: self.promotions,
            satisfaction: self.satisfaction,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, tokens } => {
            let sessions = InMemorySessions::new();
            let tokens = if tokens.is_empty() {
                let generated = Uuid::new_v4().to_string();
                println!("No tokens configured; generated bearer token {generated}");
                vec![generated]
            } else {
                tokens
            };
            for token in tokens.iter().filter(|t| !t.trim().is_empty()) {
                sessions.insert_token(token.trim(), "dashboard@service.local");
            }

            let state = Arc::new(server::AppState {
                sessions: Arc::new(sessions),
            });
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            server::serve(addr, state)
                .await
                .context("scoring service stopped")?;
        }
        Commands::Import { file } => {
            let dataset = load_dataset(&file)?;
            let summary = dataset.summary();

            println!(
                "Loaded {} employees from {}.",
                summary.total_employees,
                file.display()
            );
            println!(
                "Average performance {:.1}, average satisfaction {:.1}.",
                summary.avg_performance, summary.avg_satisfaction
            );
            println!("Departments:");
            for stats in dataset.department_stats() {
                println!(
                    "- {}: {} employees, performance {:.1}",
                    stats.department, stats.employee_count, stats.avg_performance
                );
            }
        }
        Commands::Report {
            file,
            departments,
            categories,
            out,
        } => {
            let dataset = load_dataset(&file)?;
            let mut filters = FilterStore::new();
            filters.set_departments(departments);
            filters.set_categories(categories);

            let report = report::build_report(&dataset, &filters, chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Predict(args) => {
            let input = args.to_input()?;
            let client = Arc::new(ScoringClient::new(args.endpoint.clone(), args.token.clone())?);
            let monitor = HealthMonitor::spawn(client.clone(), HEALTH_POLL_INTERVAL);
            let status = monitor.ready().await;
            println!("Scoring service is {status}.");

            let predictor = Predictor::with_monitor(client, monitor);
            let outcome = predictor.predict(&input).await?;
            let prediction = outcome.prediction;

            if outcome.source == PredictionSource::Simulation {
                println!("Using local simulation mode.");
            }
            println!(
                "Performance score {:.1} ({} performer), attrition risk {}, confidence {:.1}%",
                prediction.performance_score,
                prediction.risk_level,
                prediction.attrition_risk,
                prediction.confidence
            );
            println!(
                "Probabilities: low {:.2}, medium {:.2}, high {:.2}",
                prediction.probabilities.low,
                prediction.probabilities.medium,
                prediction.probabilities.high
            );
            println!("Recommendations:");
            for tip in prediction.recommendations.iter() {
                println!("- {tip}");
            }
        }
        Commands::Settings { path, action } => match action {
            SettingsAction::Show => {
                let settings = DashboardSettings::load(&path);
                println!("{}", serde_json::to_string_pretty(&settings)?);
                let style = style_variables(&settings);
                println!("dark class: {}", style.dark_class);
                for (property, value) in style.properties.iter() {
                    println!("{property}: {value}");
                }
            }
            SettingsAction::SetDarkMode { enabled } => {
                let mut settings = DashboardSettings::load(&path);
                settings.dark_mode = enabled;
                settings.save(&path)?;
                println!("Dark mode {}.", if enabled { "enabled" } else { "disabled" });
            }
            SettingsAction::Reset => {
                DashboardSettings::clear(&path)?;
                println!("Settings reset to defaults.");
            }
        },
    }

    Ok(())
}

fn load_dataset(file: &std::path::Path) -> anyhow::Result<DatasetStore> {
    let records = ingest::load_file(file)
        .with_context(|| format!("failed to load {}", file.display()))?;
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let mut dataset = DatasetStore::new();
    dataset.replace_dataset(records, name);
    Ok(dataset)
}
