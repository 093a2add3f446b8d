use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use careboard::{
    config::AppConfig,
    detail::TaskDetail,
    model::{category, ProfilePatch, Role, UserProfile},
    watch::{ChangeFeed, SseChangeFeed},
    wizard::AddTaskWizard,
    BackendClient, TaskBoard,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "careboard",
    about = "Careboard: task coordination for seniors and volunteers",
    version,
    arg_required_else_help = true
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the task backend
    #[arg(long, env = "CAREBOARD_API_URL", global = true)]
    api_url: Option<String>,

    /// Act as this account (an email address)
    #[arg(long, env = "CAREBOARD_USER", global = true)]
    user: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CAREBOARD_LOG", global = true)]
    log: Option<String>,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. JSON output (--json flags) is
    /// unaffected. Use this flag when piping output to other tools.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the development backend in the foreground.
    ///
    /// Serves the same REST dialect as the hosted backend, against an
    /// in-memory store, with a per-user SSE change feed.
    ///
    /// Examples:
    ///   careboard serve --seed
    ///   careboard serve --port 5050
    Serve {
        /// Port to bind on 127.0.0.1
        #[arg(long, env = "CAREBOARD_PORT")]
        port: Option<u16>,
        /// Load the demo task board and two demo accounts
        #[arg(long)]
        seed: bool,
    },
    /// Work with the task board.
    ///
    /// Elders see their own requests; volunteers see the tasks the
    /// matcher picks for them. Every mutation reloads the board from the
    /// backend before returning.
    ///
    /// Examples:
    ///   careboard tasks list --user elder@example.com
    ///   careboard tasks add --category Groceries --title "Milk run" \
    ///       --body "Two bags from the store" --date 2025-11-03
    ///   careboard tasks accept task-7 --user volunteer@example.com
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
    /// Manage user accounts.
    ///
    /// Examples:
    ///   careboard users show elder@example.com
    ///   careboard users register new@example.com --first-name Alma \
    ///       --last-name Reyes --role elder --latitude 30.26 --longitude -97.74
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Follow the change feed for an account and reload on every event.
    ///
    /// Prints one line per change with the new board shape. Reconnects
    /// on its own if the backend goes away. Stop with Ctrl-C.
    ///
    /// Examples:
    ///   careboard watch --user elder@example.com
    Watch,
}

#[derive(Subcommand)]
enum TasksAction {
    /// List the active board (or completed history with --history).
    List {
        /// Show completed tasks instead of the active board
        #[arg(long)]
        history: bool,
        /// Print the raw task records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task in full, volunteer contact details included.
    Show {
        /// Task id, e.g. task-7
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Create a task by walking the add-task flow.
    Add {
        /// Task category, e.g. Groceries or Transportation
        #[arg(long)]
        category: String,
        #[arg(long)]
        title: String,
        /// What the helper needs to know
        #[arg(long)]
        body: String,
        /// When the help is needed (e.g. 2025-11-03). Required unless --now.
        #[arg(long)]
        date: Option<String>,
        /// Ask for help as soon as possible
        #[arg(long, conflicts_with = "date")]
        now: bool,
        /// Offer payment for this task
        #[arg(long)]
        paid: bool,
    },
    /// Edit a pending task. Only the flags you pass change.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a task permanently.
    Delete { id: String },
    /// Accept a pending task as the acting volunteer.
    Accept { id: String },
    /// Mark an accepted task as completed.
    Complete { id: String },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Create an account.
    Register {
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// "elder" or "volunteer"
        #[arg(long, default_value = "elder")]
        role: String,
        #[arg(long, default_value_t = 0.0)]
        latitude: f64,
        #[arg(long, default_value_t = 0.0)]
        longitude: f64,
        /// Categories a volunteer takes on (repeat the flag per skill)
        #[arg(long = "skill")]
        skills: Vec<String>,
        /// Travel radius in kilometres (volunteers)
        #[arg(long, default_value_t = 0.0)]
        distance: f64,
    },
    /// Show an account.
    Show {
        email: String,
        #[arg(long)]
        json: bool,
    },
    /// Update account fields. Only the flags you pass change.
    Update {
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        latitude: Option<f64>,
        #[arg(long)]
        longitude: Option<f64>,
        #[arg(long = "skill")]
        skills: Vec<String>,
        #[arg(long)]
        distance: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once, before any tracing calls.
    let log_level = args.log.clone().unwrap_or_else(|| "info".to_string());
    let log_format =
        std::env::var("CAREBOARD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let log_dir = std::env::var("CAREBOARD_LOG_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(std::path::PathBuf::from);
    let _file_guard = setup_logging(&log_level, log_dir.as_deref(), &log_format);

    let quiet = args.quiet;
    match args.command {
        Command::Serve { port, seed } => {
            let config = AppConfig::new(args.api_url, port, args.user, args.log);
            careboard::server::start_server(config.port, seed).await?;
        }
        Command::Tasks { action } => {
            let config = AppConfig::new(args.api_url, None, args.user, args.log);
            run_tasks(action, &config, quiet).await?;
        }
        Command::Users { action } => {
            let config = AppConfig::new(args.api_url, None, args.user, args.log);
            run_users(action, &config, quiet).await?;
        }
        Command::Watch => {
            let config = AppConfig::new(args.api_url, None, args.user, args.log);
            run_watch(&config).await?;
        }
    }

    Ok(())
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

async fn run_tasks(action: TasksAction, config: &AppConfig, quiet: bool) -> Result<()> {
    let user = acting_user(config)?;
    let client = BackendClient::new(config.api_url.clone());
    let board = TaskBoard::new(client.clone(), &user);
    board.refresh().await?;

    match action {
        TasksAction::List { history, json } => {
            let (active, done) = board.partition().await;
            let rows = if history { done } else { active };
            if json {
                println!("{}", serde_json::to_string(&rows)?);
            } else if rows.is_empty() {
                println!("No tasks.");
            } else {
                println!(
                    "{:<10} {:<11} {:<15} {:<13} TITLE",
                    "ID", "STATUS", "CATEGORY", "DATE"
                );
                println!("{}", "-".repeat(72));
                for t in &rows {
                    println!(
                        "{:<10} {:<11} {:<15} {:<13} {}",
                        t.id,
                        t.status.as_str(),
                        t.category,
                        format_date(&t.date),
                        t.title
                    );
                }
                println!("\n{} task(s)", rows.len());
            }
        }

        TasksAction::Show { id, json } => {
            let Some(task) = board.task(&id).await else {
                eprintln!("Task not found: {id}");
                std::process::exit(1);
            };
            let detail = TaskDetail::load(&client, task).await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&serde_json::json!({
                        "task": detail.task,
                        "volunteer": detail.volunteer,
                    }))?
                );
            } else {
                print_task_detail(&detail);
            }
        }

        TasksAction::Add {
            category,
            title,
            body,
            date,
            now,
            paid,
        } => {
            let elder = client.fetch_user(&user).await?;
            let mut wizard = AddTaskWizard::new();
            wizard.next()?;
            wizard.set_category(category);
            wizard.next()?;
            wizard.set_title(&title);
            wizard.set_body(body);
            wizard.next()?;
            if now {
                wizard.choose_now();
            } else {
                wizard.choose_later(date.context("pass --date or --now")?);
            }
            wizard.next()?;
            wizard.set_payment(paid);
            wizard.next()?;
            let created = wizard.submit(&board, &elder).await?;
            if !quiet {
                println!("Created {}: {}", created.id, title);
            }
        }

        TasksAction::Edit {
            id,
            title,
            body,
            date,
            category,
        } => {
            let Some(mut task) = board.task(&id).await else {
                eprintln!("Task not found: {id}");
                std::process::exit(1);
            };
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(body) = body {
                task.body = body;
            }
            if let Some(date) = date {
                task.date = date;
            }
            if let Some(category) = category {
                task.category = category;
            }
            board.edit_task(task).await?;
            if !quiet {
                println!("Updated {id}");
            }
        }

        TasksAction::Delete { id } => {
            board.delete_task(&id).await?;
            if !quiet {
                println!("Deleted {id}");
            }
        }

        TasksAction::Accept { id } => {
            board.accept_task(&id, &user).await?;
            if !quiet {
                println!("Accepted {id}");
            }
        }

        TasksAction::Complete { id } => {
            board.complete_task(&id).await?;
            if !quiet {
                println!("Completed {id}");
            }
        }
    }

    Ok(())
}

fn print_task_detail(detail: &TaskDetail) {
    let t = &detail.task;
    println!("{}  [{}]", t.title, category::icon_for(&t.category));
    println!("{}", "-".repeat(72));
    println!("{:<12} {}", "Id:", t.id);
    println!("{:<12} {}", "Status:", t.status.as_str());
    println!("{:<12} {}", "Category:", t.category);
    println!("{:<12} {}", "When:", format_date(&t.date));
    if !t.address.is_empty() {
        println!("{:<12} {}", "Where:", t.address);
    }
    let requester = if t.elder_name.is_empty() {
        t.elder_id.as_str()
    } else {
        t.elder_name.as_str()
    };
    println!("{:<12} {}", "Requested:", requester);
    match &detail.volunteer {
        Some(v) => {
            let contact = if v.phone_number.is_empty() {
                v.email.clone()
            } else {
                format!("{} ({})", v.email, v.phone_number)
            };
            println!("{:<12} {} {}", "Volunteer:", v.full_name(), contact);
        }
        None if !t.volunteer_id.is_empty() => {
            println!("{:<12} {}", "Volunteer:", t.volunteer_id);
        }
        None => {}
    }
    if !t.body.is_empty() {
        println!("\n{}", t.body);
    }
}

// ─── Users ───────────────────────────────────────────────────────────────────

async fn run_users(action: UsersAction, config: &AppConfig, quiet: bool) -> Result<()> {
    let client = BackendClient::new(config.api_url.clone());

    match action {
        UsersAction::Register {
            email,
            first_name,
            last_name,
            phone,
            role,
            latitude,
            longitude,
            skills,
            distance,
        } => {
            let user = UserProfile {
                email: email.clone(),
                first_name,
                last_name,
                phone_number: phone,
                role: Role::normalize(&role),
                latitude,
                longitude,
                skills,
                distance,
                ..Default::default()
            };
            client.create_user(&user).await?;
            if !quiet {
                println!("Registered {email}");
            }
        }

        UsersAction::Show { email, json } => {
            let user = client.fetch_user(&email).await?;
            if json {
                println!("{}", serde_json::to_string(&user)?);
            } else {
                println!("{:<12} {}", "Email:", user.email);
                println!("{:<12} {}", "Name:", user.full_name());
                println!("{:<12} {}", "Role:", user.role);
                if !user.phone_number.is_empty() {
                    println!("{:<12} {}", "Phone:", user.phone_number);
                }
                println!(
                    "{:<12} {:.4}, {:.4}",
                    "Location:", user.latitude, user.longitude
                );
                if user.role == Role::Volunteer {
                    println!("{:<12} {}", "Skills:", user.skills.join(", "));
                    println!("{:<12} {} km", "Radius:", user.distance);
                }
            }
        }

        UsersAction::Update {
            email,
            first_name,
            last_name,
            phone,
            latitude,
            longitude,
            skills,
            distance,
        } => {
            let patch = ProfilePatch {
                first_name,
                last_name,
                phone_number: phone,
                latitude,
                longitude,
                skills: if skills.is_empty() { None } else { Some(skills) },
                distance,
            };
            client.update_user(&email, &patch).await?;
            if !quiet {
                println!("Updated {email}");
            }
        }
    }

    Ok(())
}

// ─── Watch ───────────────────────────────────────────────────────────────────

async fn run_watch(config: &AppConfig) -> Result<()> {
    let user = acting_user(config)?;
    let client = BackendClient::new(config.api_url.clone());
    let board = Arc::new(TaskBoard::new(client, &user));
    if let Err(err) = board.refresh().await {
        warn!(error = %err, "initial load failed, will retry on the next change");
    }

    let feed = SseChangeFeed::new(config.api_url.clone());
    let mut changes = feed.subscribe(&user).await?;

    let (active, done) = board.partition().await;
    println!(
        "Watching {user}: {} active, {} done. Ctrl-C to stop.",
        active.len(),
        done.len()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = changes.next() => {
                let Some(change) = change else { break };
                if let Err(err) = board.refresh().await {
                    warn!(error = %err, "reload failed");
                    continue;
                }
                let (active, done) = board.partition().await;
                println!(
                    "rev {:>4}: {} active, {} done",
                    change.revision,
                    active.len(),
                    done.len()
                );
            }
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn acting_user(config: &AppConfig) -> Result<String> {
    config
        .user
        .clone()
        .context("no account set; pass --user or set CAREBOARD_USER")
}

/// Render the stored date string for table output. Dates arrive either
/// as `YYYY-MM-DD` from the date picker or RFC 3339 from "help now";
/// anything else is shown as it came.
fn format_date(raw: &str) -> String {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return ts.format("%b %e %Y %H:%M").to_string();
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%b %e %Y").to_string();
    }
    raw.to_string()
}

/// Initialize the tracing subscriber.
/// If `log_dir` is set, logs go to both stderr and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
fn setup_logging(
    log_level: &str,
    log_dir: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(dir) = log_dir {
        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e}, falling back to stderr",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(log_level)
                    .with_writer(std::io::stderr)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_env_filter(log_level)
                    .with_writer(std::io::stderr)
                    .compact()
                    .init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, "careboard.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .with_writer(std::io::stderr)
            .init();
        None
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .with_writer(std::io::stderr)
            .compact()
            .init();
        None
    }
}
