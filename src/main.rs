use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdesk::api::ApiClient;
use taskdesk::config::{self, Config};
use taskdesk::format::{opt, relative_time, truncate};
use taskdesk::models::employee::EmployeePayload;
use taskdesk::models::objective::ObjectivePayload;
use taskdesk::models::task::{NewNote, TaskFilter, TaskPayload, TaskStats};
use taskdesk::session::Session;
use taskdesk::sync::{EmployeeDirectory, NotificationCenter, ObjectiveBoard, Poller, TaskBoard};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let mut cfg = config::load();
    init_tracing(cfg.json_logs);
    cfg.override_api_url(args.api_url.as_deref());
    cfg.validate()?;

    let session = Session::new(cfg.session_file.clone());
    let client = ApiClient::new(&cfg, session.clone()).context("failed to build API client")?;

    let result = match args.command {
        cli::Commands::Login { email, password } => {
            let user = client.auth().login(&email, &password).await?;
            println!("Signed in as {} ({})", user.display_name(), user.role);
            Ok(())
        }
        cli::Commands::Logout => {
            session.load_cached();
            client.auth().logout().await;
            println!("Signed out.");
            Ok(())
        }
        cli::Commands::Whoami => handle_whoami(&client).await,
        cli::Commands::ChangePassword { current, new } => {
            require_session(&session)?;
            client.auth().change_password(&current, &new).await?;
            println!("Password changed.");
            Ok(())
        }
        cli::Commands::Notifications { command } => {
            require_session(&session)?;
            handle_notification_command(command, &client, &cfg).await
        }
        cli::Commands::Tasks { command } => {
            require_session(&session)?;
            handle_task_command(command, &client, &cfg).await
        }
        cli::Commands::Objectives { command } => {
            require_session(&session)?;
            handle_objective_command(command, &client, &cfg).await
        }
        cli::Commands::Employees { command } => {
            require_session(&session)?;
            handle_employee_command(command, &client, &cfg).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:#}", e);
    }
    result
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "taskdesk=info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn require_session(session: &Session) -> anyhow::Result<()> {
    if !session.load_cached() {
        anyhow::bail!("not signed in; run `taskdesk login --email <email>` first");
    }
    Ok(())
}

async fn handle_whoami(client: &ApiClient) -> anyhow::Result<()> {
    let Some(user) = client.auth().restore().await? else {
        println!("Not signed in.");
        return Ok(());
    };

    println!("Email:    {}", user.email);
    println!("Name:     {}", opt(user.name.as_deref()));
    println!("Role:     {}", user.role);
    println!("Employee: {}", opt(user.employee_id.as_deref()));

    if !user.is_admin() {
        match client.auth().profile().await {
            Ok(profile) => {
                println!("Title:    {}", opt(profile.title.as_deref()));
                println!("Dept:     {}", opt(profile.department.as_deref()));
            }
            Err(e) => tracing::debug!(error = %e, "profile lookup failed"),
        }
    }
    Ok(())
}

fn poll_every(cfg: &Config, override_secs: Option<u64>) -> Duration {
    override_secs
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or(cfg.poll_interval)
}

async fn handle_notification_command(
    cmd: cli::NotificationCommands,
    client: &ApiClient,
    cfg: &Config,
) -> anyhow::Result<()> {
    let center = NotificationCenter::new(client, cfg.consistency);

    match cmd {
        cli::NotificationCommands::List { unread } => {
            center.refresh().await?;
            let items = if unread {
                center.unread().await
            } else {
                center.notifications().await
            };
            if items.is_empty() {
                println!("No notifications.");
                return Ok(());
            }

            let now = Utc::now();
            println!("{:<38} {:<6} {:<20} {:<16} MESSAGE", "ID", "READ", "TYPE", "WHEN");
            for n in items {
                let when = n
                    .created_at
                    .map(|ts| relative_time(ts, now))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:<38} {:<6} {:<20} {:<16} {}",
                    n.id,
                    if n.is_read { "yes" } else { "no" },
                    n.kind,
                    when,
                    truncate(&n.message, 60)
                );
            }
            let summary = center.summary().await;
            println!("\n{} total, {} unread", summary.total, summary.unread);
        }
        cli::NotificationCommands::Count => {
            let count = client.notifications().unread_count().await?;
            println!("{}", count);
        }
        cli::NotificationCommands::Read { id } => {
            center.mark_as_read(&id).await?;
            println!("Marked {} as read.", id);
        }
        cli::NotificationCommands::ReadAll => {
            center.refresh().await?;
            let changed = center.mark_all_as_read().await?;
            println!("Marked {} notifications as read.", changed);
        }
        cli::NotificationCommands::Delete { id } => {
            center.delete(&id).await?;
            println!("Notification deleted.");
        }
        cli::NotificationCommands::Watch { interval } => {
            let every = poll_every(cfg, interval);
            let mut poller = Poller::spawn(center.refresher(), client.session(), every);
            let mut auth = client.session().subscribe();
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            let mut last = None;

            println!("Watching notifications every {}s (Ctrl-C to stop)", every.as_secs());
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let summary = center.summary().await;
                        if last != Some(summary) && summary.total > 0 {
                            println!(
                                "[{}] {} unread of {}",
                                Utc::now().format("%H:%M:%S"),
                                summary.unread,
                                summary.total
                            );
                            last = Some(summary);
                        }
                    }
                    changed = auth.changed() => {
                        if changed.is_err() || !auth.borrow_and_update().is_signed_in() {
                            println!("Session ended; sign in again to resume.");
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            poller.shutdown();
        }
    }
    Ok(())
}

fn task_filter(args: cli::TaskFilterArgs) -> TaskFilter {
    TaskFilter {
        status: args.status,
        priority: args.priority,
        assigned_to: args.assigned_to,
        objective_id: args.objective,
        search: args.search,
    }
}

fn task_payload(fields: cli::TaskFields) -> TaskPayload {
    TaskPayload {
        title: fields.title,
        description: fields.description,
        status: fields.status,
        priority: fields.priority,
        assigned_to: fields.assign,
        assigned_to_multiple: fields.also_assign,
        due_date: fields.due,
        objective_id: fields.objective,
        completion_percentage: fields.progress,
        ..Default::default()
    }
}

fn print_tasks(tasks: &[taskdesk::models::task::Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    println!(
        "{:<38} {:<12} {:<8} {:<20} {:<12} TITLE",
        "ID", "STATUS", "PRIORITY", "ASSIGNEE", "DUE"
    );
    for t in tasks {
        println!(
            "{:<38} {:<12} {:<8} {:<20} {:<12} {}",
            t.id,
            t.status,
            t.priority.map(|p| p.as_str()).unwrap_or("-"),
            truncate(opt(t.assigned_to_name.as_deref().or(t.assigned_to.as_deref())), 17),
            opt(t.due_date.as_deref()),
            truncate(&t.title, 50)
        );
    }
}

fn print_stats(stats: &TaskStats) {
    println!("Total:       {}", stats.total);
    println!("Not started: {}", stats.not_started);
    println!("In progress: {}", stats.in_progress);
    println!("Completed:   {}", stats.completed);
    println!("Cancelled:   {}", stats.cancelled);
}

async fn handle_task_command(cmd: cli::TaskCommands, client: &ApiClient, cfg: &Config) -> anyhow::Result<()> {
    let api = client.tasks();
    let board = |filter: TaskFilter| TaskBoard::new(api.query(filter), client.session().clone(), cfg.consistency);

    match cmd {
        cli::TaskCommands::List { filter } => {
            let board = board(task_filter(filter));
            board.refresh().await?;
            print_tasks(&board.tasks().await);
        }
        cli::TaskCommands::Show { id } => {
            let t = api.get(&id).await?;
            println!("ID:          {}", t.id);
            println!("Title:       {}", t.title);
            println!("Status:      {}", t.status);
            println!("Priority:    {}", t.priority.map(|p| p.as_str()).unwrap_or("-"));
            println!("Assignee:    {}", opt(t.assigned_to_name.as_deref().or(t.assigned_to.as_deref())));
            if !t.assigned_to_multiple.is_empty() {
                println!("Also:        {}", t.assigned_to_multiple.join(", "));
            }
            println!("Due:         {}", opt(t.due_date.as_deref()));
            println!("Objective:   {}", opt(t.objective_id.as_deref()));
            if let Some(pct) = t.completion_percentage {
                println!("Progress:    {}%", pct);
            }
            if let Some(done) = t.completed_at {
                println!("Completed:   {}", done.format("%Y-%m-%d %H:%M"));
            }
            if let Some(desc) = t.description.as_deref().filter(|d| !d.is_empty()) {
                println!("\n{}", desc);
            }
        }
        cli::TaskCommands::Mine => {
            let board = TaskBoard::new(api.my_tasks(), client.session().clone(), cfg.consistency);
            board.refresh().await?;
            print_tasks(&board.tasks().await);
        }
        cli::TaskCommands::Create { fields } => {
            let payload = task_payload(fields);
            if payload.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
                anyhow::bail!("--title is required");
            }
            match board(TaskFilter::default()).create(&payload).await? {
                Some(task) => println!("Task created: {}", task.id),
                None => println!("Task created."),
            }
        }
        cli::TaskCommands::Update { id, fields } => {
            let payload = task_payload(fields);
            if payload.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            board(TaskFilter::default()).update(&id, &payload).await?;
            println!("Task {} updated.", id);
        }
        cli::TaskCommands::Status { id, status } => {
            board(TaskFilter::default()).set_status(&id, status).await?;
            println!("Task {} is now {}.", id, status);
        }
        cli::TaskCommands::Delete { id } => {
            board(TaskFilter::default()).delete(&id).await?;
            println!("Task deleted.");
        }
        cli::TaskCommands::Upload { id, file } => {
            let receipt = board(TaskFilter::default()).upload_file(&id, &file).await?;
            match receipt.attachment_url {
                Some(url) => println!("Uploaded: {}", url),
                None => println!("{}", receipt.message.as_deref().unwrap_or("File uploaded.")),
            }
        }
        cli::TaskCommands::Attachments { id } => {
            let files = api.attachments(&id).await?;
            if files.is_empty() {
                println!("No attachments.");
                return Ok(());
            }
            println!("{:<30} {:<20} {:<10} URL", "FILE", "UPLOADED BY", "SIZE");
            for a in files {
                println!(
                    "{:<30} {:<20} {:<10} {}",
                    truncate(opt(a.file_name.as_deref()), 27),
                    truncate(opt(a.uploaded_by_name.as_deref()), 17),
                    a.file_size.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                    opt(a.url())
                );
            }
        }
        cli::TaskCommands::Notes { id } => {
            let notes = api.notes(&id).await?;
            if notes.is_empty() {
                println!("No notes.");
                return Ok(());
            }
            let now = Utc::now();
            for n in notes {
                let when = n.created_at.map(|ts| relative_time(ts, now)).unwrap_or_default();
                let progress = n.progress.map(|p| format!(" [{}%]", p)).unwrap_or_default();
                println!("{} ({}){}", opt(n.updated_by_name.as_deref()), when, progress);
                println!("  {}", opt(n.notes.as_deref()));
            }
        }
        cli::TaskCommands::Note { id, text, progress } => {
            let note = NewNote {
                notes: text,
                progress,
                ..Default::default()
            };
            api.add_note(&id, &note).await?;
            println!("Note added.");
        }
        cli::TaskCommands::Stats { local } => {
            let stats = if local {
                let board = board(TaskFilter::default());
                board.refresh().await?;
                board.stats().await
            } else {
                api.stats().await?
            };
            print_stats(&stats);
        }
        cli::TaskCommands::Watch { interval, filter } => {
            let every = poll_every(cfg, interval);
            let board = board(task_filter(filter));
            let mut poller = Poller::spawn(board.refresher(), client.session(), every);
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            let mut last: Option<TaskStats> = None;

            println!("Watching tasks every {}s (Ctrl-C to stop)", every.as_secs());
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !client.session().is_authenticated() {
                            println!("Session ended; sign in again to resume.");
                            break;
                        }
                        let stats = board.stats().await;
                        if stats.total > 0 && last.as_ref() != Some(&stats) {
                            println!(
                                "[{}] {} tasks: {} not started, {} in progress, {} completed",
                                Utc::now().format("%H:%M:%S"),
                                stats.total,
                                stats.not_started,
                                stats.in_progress,
                                stats.completed
                            );
                            last = Some(stats);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            poller.shutdown();
        }
    }
    Ok(())
}

fn objective_payload(fields: cli::ObjectiveFields) -> ObjectivePayload {
    ObjectivePayload {
        title: fields.title,
        description: fields.description,
        deadline: fields.deadline,
        department: fields.department,
        priority: fields.priority,
        status: fields.status,
    }
}

async fn handle_objective_command(
    cmd: cli::ObjectiveCommands,
    client: &ApiClient,
    cfg: &Config,
) -> anyhow::Result<()> {
    let board = ObjectiveBoard::new(client, cfg.consistency);

    match cmd {
        cli::ObjectiveCommands::List => {
            board.refresh().await?;
            let objectives = board.objectives().await;
            if objectives.is_empty() {
                println!("No objectives found.");
                return Ok(());
            }
            println!("{:<38} {:<12} {:<8} {:<12} TITLE", "ID", "STATUS", "PRIORITY", "DEADLINE");
            for o in objectives {
                println!(
                    "{:<38} {:<12} {:<8} {:<12} {}",
                    o.id,
                    o.status.map(|s| s.as_str()).unwrap_or("-"),
                    o.priority.map(|p| p.as_str()).unwrap_or("-"),
                    opt(o.deadline.as_deref()),
                    truncate(&o.title, 50)
                );
            }
        }
        cli::ObjectiveCommands::Show { id } => {
            let o = client.objectives().get(&id).await?;
            println!("ID:         {}", o.id);
            println!("Title:      {}", o.title);
            println!("Status:     {}", o.status.map(|s| s.as_str()).unwrap_or("-"));
            println!("Priority:   {}", o.priority.map(|p| p.as_str()).unwrap_or("-"));
            println!("Deadline:   {}", opt(o.deadline.as_deref()));
            println!("Department: {}", opt(o.department.as_deref()));
            if let Some(desc) = o.description.as_deref().filter(|d| !d.is_empty()) {
                println!("\n{}", desc);
            }
        }
        cli::ObjectiveCommands::Create { fields } => {
            let payload = objective_payload(fields);
            if payload.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
                anyhow::bail!("--title is required");
            }
            match board.create(&payload).await? {
                Some(o) => println!("Objective created: {}", o.id),
                None => println!("Objective created."),
            }
        }
        cli::ObjectiveCommands::Update { id, fields } => {
            let payload = objective_payload(fields);
            if payload.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            board.update(&id, &payload).await?;
            println!("Objective {} updated.", id);
        }
        cli::ObjectiveCommands::Delete { id } => {
            board.delete(&id).await?;
            println!("Objective deleted.");
        }
    }
    Ok(())
}

fn employee_payload(fields: cli::EmployeeFields) -> EmployeePayload {
    EmployeePayload {
        name: fields.name,
        email: fields.email,
        role: fields.role,
        department: fields.department,
        title: fields.title,
        location: fields.location,
        experience_years: fields.experience,
        bio: fields.bio,
        skills: fields.skills,
        linkedin_url: fields.linkedin,
        telegram_chat_id: fields.telegram,
        ..Default::default()
    }
}

fn print_defaults(passwords: &[String]) {
    if !passwords.is_empty() {
        println!("Initial password: any of {}", passwords.join(", "));
    }
}

async fn handle_employee_command(
    cmd: cli::EmployeeCommands,
    client: &ApiClient,
    cfg: &Config,
) -> anyhow::Result<()> {
    let include_inactive = matches!(cmd, cli::EmployeeCommands::List { all: true });
    let directory = EmployeeDirectory::new(client, include_inactive, cfg.consistency);

    match cmd {
        cli::EmployeeCommands::List { .. } => {
            directory.refresh().await?;
            let employees = directory.employees().await;
            if employees.is_empty() {
                println!("No employees found.");
                return Ok(());
            }
            println!(
                "{:<38} {:<24} {:<30} {:<11} {:<16} ACTIVE",
                "ID", "NAME", "EMAIL", "ROLE", "DEPARTMENT"
            );
            for e in employees {
                println!(
                    "{:<38} {:<24} {:<30} {:<11} {:<16} {}",
                    e.id,
                    truncate(&e.name, 21),
                    truncate(&e.email, 27),
                    e.role,
                    truncate(opt(e.department.as_deref()), 13),
                    e.is_active
                );
            }
        }
        cli::EmployeeCommands::Show { id } => {
            let e = client.employees().get(&id).await?;
            println!("ID:         {}", e.id);
            println!("Name:       {}", e.name);
            println!("Email:      {}", e.email);
            println!("Role:       {}", e.role);
            println!("Title:      {}", opt(e.title.as_deref()));
            println!("Department: {}", opt(e.department.as_deref()));
            println!("Location:   {}", opt(e.location.as_deref()));
            println!("Active:     {}", e.is_active);
            if !e.skills.is_empty() {
                println!("Skills:     {}", e.skills.join(", "));
            }
            println!("Photo:      {}", opt(e.photo_url.as_deref()));
            println!("JD:         {}", opt(e.job_description_url.as_deref()));
        }
        cli::EmployeeCommands::Create { fields } => {
            let payload = employee_payload(fields);
            if payload.name.is_none() || payload.email.is_none() {
                anyhow::bail!("--name and --email are required");
            }
            let (created, login) = directory.create(&payload).await?;
            match created {
                Some(e) => println!("Employee created: {}", e.id),
                None => println!("Employee created."),
            }
            print_defaults(&login.default_passwords);
        }
        cli::EmployeeCommands::Update { id, fields } => {
            let payload = employee_payload(fields);
            if payload.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            directory.update(&id, &payload).await?;
            println!("Employee {} updated.", id);
        }
        cli::EmployeeCommands::Deactivate { id } => {
            directory.deactivate(&id).await?;
            println!("Employee {} deactivated.", id);
        }
        cli::EmployeeCommands::Activate { id } => {
            directory.set_active(&id, true).await?;
            println!("Employee {} activated.", id);
        }
        cli::EmployeeCommands::Remove { id, yes } => {
            if !yes {
                anyhow::bail!("permanent deletion cannot be undone; re-run with --yes");
            }
            directory.delete_permanently(&id).await?;
            println!("Employee {} permanently deleted.", id);
        }
        cli::EmployeeCommands::ResetPassword { id } => {
            let reset = directory.reset_password(&id).await?;
            println!("{}", reset.message.as_deref().unwrap_or("Password reset."));
            print_defaults(&reset.default_passwords);
        }
        cli::EmployeeCommands::UploadPhoto { id, file } => {
            match directory.upload_photo(&id, &file).await? {
                Some(url) => println!("Photo uploaded: {}", url),
                None => println!("Photo uploaded."),
            }
        }
        cli::EmployeeCommands::RemovePhoto { id } => {
            directory.remove_photo(&id).await?;
            println!("Photo removed.");
        }
        cli::EmployeeCommands::JdLink { id, url } => {
            directory.set_job_description(&id, &url).await?;
            if url.trim().is_empty() {
                println!("Job description link cleared.");
            } else {
                println!("Job description link updated.");
            }
        }
    }
    Ok(())
}
