use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Requirements traceability client")]
pub struct Cli {
    /// Server base URL (overrides TRACEDESK_SERVER_URL)
    #[clap(long, global = true)]
    pub server: Option<String>,

    /// Log every request (same as RUST_LOG=debug)
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session token
    Login {
        /// Account email (prompted when omitted)
        #[clap(long)]
        email: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Create a new account
    Register {
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        email: Option<String>,
    },

    /// Show the signed-in user
    Whoami,

    /// Manage requirements
    #[clap(subcommand)]
    Req(ReqCommand),

    /// Manage test cases
    #[clap(subcommand)]
    Tests(TestCommand),

    /// Manage requirement ↔ test case mappings
    #[clap(subcommand)]
    Trace(TraceCommand),

    /// Manage organizations
    #[clap(subcommand)]
    Org(OrgCommand),

    /// Show the traceability matrix
    Matrix {
        /// Show at most 20 test case ids per row
        #[clap(long, short = 'c')]
        compact: bool,

        /// Write the matrix to a file instead of printing it
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,

        /// Export format used with --output
        #[clap(long, value_enum, default_value = "json")]
        format: ExportFormat,
    },

    /// Ask the analysis service to critique selected matrix rows
    Critique {
        /// Row clicks in order: `3` toggles row 3, `+5` shift-clicks row 5
        clicks: Vec<String>,

        /// Select every row instead of clicking
        #[clap(long, short = 'a', conflicts_with = "clicks")]
        all: bool,
    },

    /// Show, set or toggle the display theme
    Theme {
        /// `light` or `dark`; toggles when omitted
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReqCommand {
    /// List requirements
    List {
        /// Only requirements of this project
        #[clap(long, short = 'p')]
        project: Option<String>,
    },

    /// Show one requirement
    Show { id: String },

    /// Add a requirement
    Add {
        /// Requirement id, e.g. REQ-001
        #[clap(long)]
        id: Option<String>,

        #[clap(long)]
        content: Option<String>,

        #[clap(long)]
        classification: Option<String>,

        #[clap(long)]
        module: Option<String>,
    },

    /// Delete a requirement
    Del {
        id: String,

        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TestCommand {
    /// List the test cases of a project
    List {
        #[clap(long, short = 'p')]
        project: String,
    },

    /// Show one test case
    Show { id: String },

    /// Add a test case
    Add {
        #[clap(long)]
        description: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Delete a test case
    Del {
        id: String,

        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TraceCommand {
    /// List mappings, optionally for one requirement or test case
    List {
        #[clap(long, conflicts_with = "test_case")]
        requirement: Option<String>,

        #[clap(long)]
        test_case: Option<String>,
    },

    /// Link a test case to a requirement
    Add {
        #[clap(long)]
        requirement: String,

        #[clap(long)]
        test_case: String,

        #[clap(long, default_value = "")]
        description: String,
    },

    /// Remove a mapping
    Del {
        id: String,

        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum OrgCommand {
    /// List organizations
    List,

    /// Show one organization
    Show { id: String },

    /// Add an organization
    Add {
        #[clap(long)]
        name: String,

        #[clap(long, default_value = "")]
        description: String,

        #[clap(long)]
        admin_email: Option<String>,
    },

    /// Update an organization's name or description
    Update {
        id: String,

        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        description: Option<String>,
    },

    /// Delete an organization
    Del {
        id: String,

        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}
