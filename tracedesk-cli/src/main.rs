mod cli;
mod prompts;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::{ColoredString, Colorize};

use tracedesk_core::theme::{apply_theme, toggle_theme};
use tracedesk_core::{
    export, ApiClient, ClientConfig, CoverageBand, CoverageStats, CritiquePanel, MatrixStore,
    Organization, RemediationSeverity, Requirement, RowSelection, Session, SessionHandle,
    StateStorage, TestCase, TestCaseStatus, Theme, TraceabilityItem, TraceabilityMapping,
    WebhookCritic,
};

use crate::cli::{Cli, Command, ExportFormat, OrgCommand, ReqCommand, TestCommand, TraceCommand};

/// Test case ids shown per row in compact mode
const COMPACT_TEST_LIMIT: usize = 20;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = ClientConfig::from_env()?;
    if let Some(server) = &cli.server {
        config = config.with_server_url(server);
    }

    log::debug!(
        "Server {} (state file {:?})",
        config.server_url,
        config.state_path
    );

    let storage = StateStorage::new(&config.state_path);
    let session = SessionHandle::new(Session::init(storage.clone())?);
    let client = ApiClient::connect(&config, session.clone())?.on_auth_expired(|| {
        eprintln!(
            "{}",
            "Your session has expired. Run `tracedesk login` to sign in again.".yellow()
        );
    });

    match &cli.command {
        Command::Login { email } => login(&client, email.as_deref())?,
        Command::Logout => {
            client.auth().logout()?;
            println!("{}", "Logged out.".green());
        }
        Command::Register { name, email } => register(&client, name.as_deref(), email.as_deref())?,
        Command::Whoami => whoami(&client, &session)?,
        Command::Req(cmd) => handle_req_command(&client, cmd)?,
        Command::Tests(cmd) => handle_test_command(&client, cmd)?,
        Command::Trace(cmd) => handle_trace_command(&client, cmd)?,
        Command::Org(cmd) => handle_org_command(&client, cmd)?,
        Command::Matrix {
            compact,
            output,
            format,
        } => {
            let store = load_matrix(&client)?;
            match output {
                Some(path) => {
                    match format {
                        ExportFormat::Json => export::export_json(store.rows(), store.mappings(), path)?,
                        ExportFormat::Markdown => {
                            export::export_markdown(store.rows(), store.mappings(), path)?
                        }
                    }
                    println!("Exported matrix: {}", path.display().to_string().green());
                    println!("  Rows: {}", store.rows().len());
                    println!("  Mappings: {}", store.mappings().len());
                }
                None => print_matrix(&store, *compact),
            }
        }
        Command::Critique { clicks, all } => critique(&client, &config, clicks, *all)?,
        Command::Theme { name } => {
            let theme = match name {
                Some(name) => {
                    let theme = Theme::parse(name)
                        .with_context(|| format!("Unknown theme '{}' (use light or dark)", name))?;
                    apply_theme(&storage, theme)?
                }
                None => toggle_theme(&storage)?,
            };
            println!("Theme: {}", theme_label(theme));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

// =============================================================================
// Account
// =============================================================================

fn login(client: &ApiClient, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(e) => e.to_string(),
        None => inquire::Text::new("Email:").prompt()?,
    };
    let password = prompts::prompt_password("Password:")?;

    let response = client.auth().login(&email, &password)?;
    let name = response
        .user
        .and_then(|u| u.name)
        .unwrap_or_else(|| email.clone());
    println!("{} {}", "Signed in as".green(), name.bold());
    Ok(())
}

fn register(client: &ApiClient, name: Option<&str>, email: Option<&str>) -> Result<()> {
    let request = prompts::prompt_registration(name, email)?;
    let profile = client.auth().register(&request)?;
    println!("{}", "Account created.".green());
    if let Some(id) = profile.id {
        println!("  ID: {}", id);
    }
    println!("Run `tracedesk login` to sign in.");
    Ok(())
}

fn whoami(client: &ApiClient, session: &SessionHandle) -> Result<()> {
    if !session.is_authenticated() {
        println!("{}", "Not signed in.".yellow());
        return Ok(());
    }

    let profile = client.auth().me()?;
    println!("{}", "Current user:".bold());
    println!("  Name: {}", profile.name.as_deref().unwrap_or("-"));
    println!("  Email: {}", profile.email.as_deref().unwrap_or("-"));
    let role = profile.role.or_else(|| session.role()).unwrap_or_default();
    println!("  Role: {}", role);
    for (key, value) in &profile.extra {
        println!("  {}: {}", key, value);
    }
    Ok(())
}

// =============================================================================
// Requirements
// =============================================================================

fn handle_req_command(client: &ApiClient, cmd: &ReqCommand) -> Result<()> {
    let api = client.requirements();
    match cmd {
        ReqCommand::List { project } => {
            let requirements = match project {
                Some(p) => api.list_by_project(p)?,
                None => api.list()?,
            };
            print_requirements(&requirements);
        }
        ReqCommand::Show { id } => {
            let req = api.get(id)?;
            println!("{}: {}", req.req_id.bold(), req.content);
            if let Some(server_id) = &req.id {
                println!("  Server ID: {}", server_id);
            }
            println!("  Classification: {}", req.classification);
            println!("  Module: {}", req.module);
            if let Some(priority) = &req.priority {
                println!("  Priority: {}", priority);
            }
            if let Some(status) = &req.status {
                println!("  Status: {}", status);
            }
            if let Some(description) = &req.description {
                println!("\n{}", description);
            }
        }
        ReqCommand::Add {
            id,
            content,
            classification,
            module,
        } => {
            let requirement = match (id, content) {
                (Some(id), Some(content)) => {
                    let mut req = Requirement::new(id.as_str(), content.as_str());
                    req.classification = classification.clone().unwrap_or_default();
                    req.module = module.clone().unwrap_or_default();
                    req
                }
                _ => prompts::prompt_new_requirement()?,
            };
            let created = api.create(&requirement)?;
            println!("{}", "Requirement added successfully!".green());
            println!("ID: {}", created.req_id.green());
        }
        ReqCommand::Del { id, yes } => {
            if !prompts::confirm_delete(&format!("requirement {}", id), *yes)? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }
            api.delete(id)?;
            println!("{}", "Requirement deleted.".green());
        }
    }
    Ok(())
}

fn print_requirements(requirements: &[Requirement]) {
    if requirements.is_empty() {
        println!("{}", "No requirements found.".yellow());
        return;
    }

    println!(
        "{:<12} | {:<50} | {:<15} | {:<15}",
        "ID", "Content", "Classification", "Module"
    );
    println!("{}", "-".repeat(100));
    for req in requirements {
        println!(
            "{:<12} | {:<50} | {:<15} | {:<15}",
            req.req_id,
            truncate(&req.content, 50),
            req.classification,
            req.module
        );
    }
}

// =============================================================================
// Test cases
// =============================================================================

fn handle_test_command(client: &ApiClient, cmd: &TestCommand) -> Result<()> {
    let api = client.test_cases();
    match cmd {
        TestCommand::List { project } => {
            let test_cases = api.list_by_project(project)?;
            if test_cases.is_empty() {
                println!("{}", "No test cases found.".yellow());
                return Ok(());
            }
            println!("{:<14} | {:<60} | {:<10}", "ID", "Description", "Status");
            println!("{}", "-".repeat(90));
            for tc in &test_cases {
                println!(
                    "{:<14} | {:<60} | {}",
                    tc.test_id,
                    truncate(&tc.description, 60),
                    status_label(tc.status)
                );
            }
        }
        TestCommand::Show { id } => print_test_case(&api.get(id)?),
        TestCommand::Add {
            description,
            interactive,
        } => {
            let test_case = match description {
                Some(d) if !*interactive => TestCase::new(prompts::provisional_test_id(), d.as_str()),
                _ => prompts::prompt_new_test_case(description.as_deref())?,
            };
            let created = api.create(&test_case)?;
            println!("{}", "Test case added successfully!".green());
            println!("ID: {}", created.test_id.green());
        }
        TestCommand::Del { id, yes } => {
            if !prompts::confirm_delete(&format!("test case {}", id), *yes)? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }
            api.delete(id)?;
            println!("{}", "Test case deleted.".green());
        }
    }
    Ok(())
}

fn print_test_case(tc: &TestCase) {
    println!("{}: {}", tc.test_id.bold(), tc.description);
    println!("  Status: {}", status_label(tc.status));
    if !tc.classification.is_empty() {
        println!("  Classification: {}", tc.classification);
    }
    if !tc.module.is_empty() {
        println!("  Module: {}", tc.module);
    }
    if !tc.preconditions.is_empty() {
        println!("\n{}\n  {}", "Preconditions".bold(), tc.preconditions);
    }
    if !tc.steps.is_empty() {
        println!("\n{}", "Steps".bold());
        for (i, step) in tc.steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }
    if !tc.expected_outcome.is_empty() {
        println!("\n{}", "Expected outcome".bold());
        for outcome in &tc.expected_outcome {
            println!("  - {}", outcome);
        }
    }
}

fn status_label(status: Option<TestCaseStatus>) -> ColoredString {
    match status {
        Some(TestCaseStatus::Passed) => "Passed".green(),
        Some(TestCaseStatus::Failed) => "Failed".red(),
        Some(TestCaseStatus::Blocked) => "Blocked".yellow(),
        Some(TestCaseStatus::NotRun) | None => "Not Run".normal(),
    }
}

// =============================================================================
// Traceability mappings
// =============================================================================

fn handle_trace_command(client: &ApiClient, cmd: &TraceCommand) -> Result<()> {
    match cmd {
        TraceCommand::List {
            requirement,
            test_case,
        } => {
            let api = client.traceability();
            let mappings = match (requirement, test_case) {
                (Some(r), _) => api.by_requirement(r)?,
                (None, Some(t)) => api.by_test_case(t)?,
                (None, None) => api.list()?,
            };
            print_mappings(&mappings);
        }
        TraceCommand::Add {
            requirement,
            test_case,
            description,
        } => {
            // Mapping changes go through the matrix store so the same
            // validation and bookkeeping apply as in the matrix view
            let mut store = MatrixStore::new(client);
            let created = store.create_mapping(&TraceabilityMapping::new(
                requirement.as_str(),
                test_case.as_str(),
                description.as_str(),
            ))?;
            println!(
                "{} {} → {}",
                "Linked".green(),
                created.requirement_id,
                created.testcase_id
            );
            if let Some(id) = created.id {
                println!("Mapping ID: {}", id);
            }
        }
        TraceCommand::Del { id, yes } => {
            if !prompts::confirm_delete(&format!("mapping {}", id), *yes)? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }
            MatrixStore::new(client).delete_mapping(id)?;
            println!("{}", "Mapping deleted.".green());
        }
    }
    Ok(())
}

fn print_mappings(mappings: &[TraceabilityMapping]) {
    if mappings.is_empty() {
        println!("{}", "No mappings found.".yellow());
        return;
    }
    println!(
        "{:<36} | {:<14} | {:<14} | {}",
        "ID", "Requirement", "Test case", "Description"
    );
    println!("{}", "-".repeat(100));
    for m in mappings {
        println!(
            "{:<36} | {:<14} | {:<14} | {}",
            m.id.as_deref().unwrap_or("-"),
            m.requirement_id,
            m.testcase_id,
            m.description
        );
    }
}

// =============================================================================
// Organizations
// =============================================================================

fn handle_org_command(client: &ApiClient, cmd: &OrgCommand) -> Result<()> {
    let api = client.organizations();
    match cmd {
        OrgCommand::List => {
            let orgs = api.list()?;
            if orgs.is_empty() {
                println!("{}", "No organizations found.".yellow());
                return Ok(());
            }
            println!("{:<36} | {:<30} | {}", "ID", "Name", "Description");
            println!("{}", "-".repeat(100));
            for org in &orgs {
                println!(
                    "{:<36} | {:<30} | {}",
                    org.id.as_deref().unwrap_or("-"),
                    org.name,
                    truncate(&org.description, 40)
                );
            }
        }
        OrgCommand::Show { id } => print_organization(&api.get(id)?),
        OrgCommand::Add {
            name,
            description,
            admin_email,
        } => {
            let mut org = Organization::new(name.as_str(), description.as_str());
            org.admin_email = admin_email.clone();
            let created = api.create(&org)?;
            println!("{}", "Organization added successfully!".green());
            print_organization(&created);
        }
        OrgCommand::Update {
            id,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                bail!("Nothing to update: pass --name and/or --description");
            }
            let mut org = api.get(id)?;
            if let Some(name) = name {
                org.name = name.clone();
            }
            if let Some(description) = description {
                org.description = description.clone();
            }
            let updated = api.update(id, &org)?;
            println!("{}", "Organization updated.".green());
            print_organization(&updated);
        }
        OrgCommand::Del { id, yes } => {
            if !prompts::confirm_delete(&format!("organization {}", id), *yes)? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }
            api.delete(id)?;
            println!("{}", "Organization deleted.".green());
        }
    }
    Ok(())
}

fn print_organization(org: &Organization) {
    println!("{}", org.name.bold());
    if let Some(id) = &org.id {
        println!("  ID: {}", id);
    }
    if !org.description.is_empty() {
        println!("  Description: {}", org.description);
    }
    if let Some(email) = &org.admin_email {
        println!("  Admin: {}", email);
    }
}

// =============================================================================
// Matrix
// =============================================================================

/// Fetch rows and mappings. A failed mapping fetch is logged and the matrix
/// is still shown.
fn load_matrix(client: &ApiClient) -> Result<MatrixStore<&ApiClient>> {
    let mut store = MatrixStore::new(client);
    store.refresh().context("Failed to load the traceability matrix")?;
    if store.fetch_mappings().is_err() {
        eprintln!("{}", "Mappings could not be loaded.".yellow());
    }
    Ok(store)
}

fn print_matrix(store: &MatrixStore<&ApiClient>, compact: bool) {
    let rows = store.rows();
    if rows.is_empty() {
        println!("{}", "No requirements found.".yellow());
        return;
    }

    println!(
        "{:<4} | {:<12} | {:<40} | {:<5} | {}",
        "#", "Requirement", "Content", "Tests", "Linked test cases"
    );
    println!("{}", "-".repeat(110));
    for (index, row) in rows.iter().enumerate() {
        let (id, content) = match &row.requirement {
            Some(req) => (req.req_id.as_str(), req.content.as_str()),
            None => ("-", ""),
        };
        let linked = linked_test_ids(store, row);
        println!(
            "{:<4} | {:<12} | {:<40} | {:<5} | {}{}",
            index,
            id,
            truncate(content, 40),
            linked.len(),
            format_test_ids(&linked, compact),
            remediation_badge(row)
        );
    }

    let stats = CoverageStats::compute(rows, store.mappings());
    let band = match stats.band() {
        CoverageBand::Low => format!("{:.0}%", stats.percentage).red(),
        CoverageBand::Medium => format!("{:.0}%", stats.percentage).yellow(),
        CoverageBand::High => format!("{:.0}%", stats.percentage).green(),
    };
    println!();
    println!(
        "Coverage: {} ({} of {} requirements, {} mappings)",
        band,
        stats.covered,
        stats.requirements,
        store.mappings().len()
    );
}

/// Test case ids on the row followed by those linked through mappings
fn linked_test_ids<'a>(store: &'a MatrixStore<&ApiClient>, row: &'a TraceabilityItem) -> Vec<&'a str> {
    let mut ids: Vec<&str> = row.test_cases.iter().map(|tc| tc.test_id.as_str()).collect();
    if let Some(req_id) = row.requirement_id() {
        for mapping in store.mappings_for_requirement(req_id) {
            if !ids.contains(&mapping.testcase_id.as_str()) {
                ids.push(mapping.testcase_id.as_str());
            }
        }
    }
    ids
}

fn format_test_ids(ids: &[&str], compact: bool) -> String {
    if compact && ids.len() > COMPACT_TEST_LIMIT {
        format!(
            "{} and {} more...",
            ids[..COMPACT_TEST_LIMIT].join(", "),
            ids.len() - COMPACT_TEST_LIMIT
        )
    } else {
        ids.join(", ")
    }
}

fn remediation_badge(row: &TraceabilityItem) -> ColoredString {
    match &row.remediation {
        None => "".normal(),
        Some(r) => {
            let badge = format!(" [{}]", r.severity.badge());
            match r.severity {
                RemediationSeverity::Low => badge.green(),
                RemediationSeverity::Medium => badge.yellow(),
                RemediationSeverity::High | RemediationSeverity::Critical => badge.red(),
            }
        }
    }
}

// =============================================================================
// Critique
// =============================================================================

fn critique(client: &ApiClient, config: &ClientConfig, clicks: &[String], all: bool) -> Result<()> {
    let store = load_matrix(client)?;
    let rows = store.rows();

    let mut selection = RowSelection::new();
    if all {
        selection.toggle_select_all(rows);
    } else {
        for click in clicks {
            let (index, extend_range) = parse_click(click)?;
            selection.select_row(rows, index, extend_range);
        }
    }

    if selection.is_empty() {
        println!("{}", "No rows selected; nothing to critique.".yellow());
        return Ok(());
    }
    println!(
        "Critiquing {} rows: {}",
        selection.len(),
        selection.ids().collect::<Vec<_>>().join(", ")
    );

    let critic = WebhookCritic::new(client.gateway(), config.critique_url());
    let mut panel = CritiquePanel::new();
    match panel.run(&critic, &selection, rows) {
        Ok(()) => {
            println!("{}", "Critique completed successfully".green());
            println!();
            if panel.text().is_empty() {
                println!("No findings.");
            }
            for line in panel.text().lines() {
                println!("{}", colorize_finding(line));
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", panel.text().red());
            Err(e).context("Error during critique")
        }
    }
}

/// `3` is a plain click on row 3, `+3` a shift-click
fn parse_click(click: &str) -> Result<(usize, bool)> {
    let (digits, extend_range) = match click.strip_prefix('+') {
        Some(rest) => (rest, true),
        None => (click, false),
    };
    let index = digits
        .trim()
        .parse::<usize>()
        .with_context(|| format!("Invalid row '{}': expected N or +N", click))?;
    Ok((index, extend_range))
}

fn colorize_finding(line: &str) -> ColoredString {
    match line.split_once(':').map(|(severity, _)| severity) {
        Some("CRITICAL") | Some("HIGH") => line.red(),
        Some("MEDIUM") => line.yellow(),
        Some("LOW") => line.green(),
        _ => line.normal(),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn theme_label(theme: Theme) -> ColoredString {
    if theme.is_dark() {
        theme.to_string().bold()
    } else {
        theme.to_string().normal()
    }
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
