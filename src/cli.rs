//! CLI routing, command dispatch and output rendering.

use crate::config::Config;
use crate::db::{BackendKind, Outcome, Secret, SecretName, UserListing};
use crate::error::VaultError;
use crate::service::{CredentialStore, SeedPlan, SeedReport};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use serde_json::json;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "credvault", version, about = "Per-user secret store backed by SQLite or PostgreSQL")]
pub struct Cli {
    /// Storage engine (overrides config and environment)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Connection string or SQLite file (overrides config and environment)
    #[arg(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a user
    #[command(name = "users:create")]
    UsersCreate(CredentialsArgs),
    /// List every user
    #[command(name = "users:list")]
    UsersList,
    /// Check a user's password
    #[command(name = "users:verify")]
    UsersVerify(CredentialsArgs),
    /// Store a new secret for a user
    #[command(name = "secrets:create")]
    SecretsCreate(SecretValueArgs),
    /// List a user's secret names
    #[command(name = "secrets:list")]
    SecretsList(OwnerArgs),
    /// Show one secret
    #[command(name = "secrets:get")]
    SecretsGet(SecretArgs),
    /// Replace a secret's value
    #[command(name = "secrets:update")]
    SecretsUpdate(SecretValueArgs),
    /// Remove a secret
    #[command(name = "secrets:delete")]
    SecretsDelete(SecretArgs),
    /// Bulk-insert synthetic users and secrets
    Seed(SeedArgs),
}

#[derive(Args, Debug)]
pub struct CredentialsArgs {
    #[arg(long)]
    pub user: String,
    /// Prompted without echo when omitted
    #[arg(long)]
    pub pass: Option<String>,
}

#[derive(Args, Debug)]
pub struct OwnerArgs {
    #[arg(long)]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct SecretArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SecretValueArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub name: String,
    #[arg(long, allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Number of users to create
    #[arg(long, default_value_t = 10)]
    pub users: usize,
    /// Secrets per user
    #[arg(long, default_value_t = 10)]
    pub secrets: usize,
    #[arg(long, default_value = "seed")]
    pub prefix: String,
    /// Password shared by every seeded user
    #[arg(long, default_value = "pass123")]
    pub pass: String,
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,
}

/// What a command produced, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Done(String),
    Users(UserListing),
    Secrets { user: String, names: Vec<SecretName> },
    Secret(Secret),
    NotFound { user: String, name: String },
    Verified { user: String, ok: bool },
    Seeded(SeedReport),
}

impl Cli {
    /// File/env configuration with this invocation's flags on top.
    pub fn config(&self) -> Result<Config, VaultError> {
        let mut cfg = Config::load()?;
        if let Some(kind) = self.backend {
            cfg.backend = Some(kind);
        }
        if let Some(url) = &self.database_url {
            cfg.database_url = url.clone();
        }
        Ok(cfg)
    }

    pub async fn run(self, cfg: Config) -> ExitCode {
        let json = self.json;
        let command = match self.command.with_prompted_password() {
            Ok(command) => command,
            Err(e) => return fail(&e),
        };

        let store = match CredentialStore::open(&cfg).await {
            Ok(store) => store,
            Err(e) => return fail(&e),
        };
        let result = command.execute(&store).await;
        store.close().await;

        match result {
            Ok(report) => {
                println!("{}", report.render(json));
                ExitCode::from(report.exit_code())
            }
            Err(e) => fail(&e),
        }
    }
}

fn fail(e: &VaultError) -> ExitCode {
    eprintln!("error: {e}");
    ExitCode::from(e.exit_code())
}

impl Commands {
    /// Fill in a missing `--pass` from the terminal.
    fn with_prompted_password(mut self) -> Result<Self, VaultError> {
        if let Commands::UsersCreate(args) | Commands::UsersVerify(args) = &mut self {
            if args.pass.is_none() {
                let pass = rpassword::prompt_password(format!("Password for {}: ", args.user))
                    .map_err(|e| VaultError::InvalidInput(format!("cannot read password: {e}")))?;
                args.pass = Some(pass);
            }
        }
        Ok(self)
    }

    pub async fn execute(self, store: &CredentialStore) -> Result<Report, VaultError> {
        match self {
            Commands::UsersCreate(args) => {
                store
                    .create_user(&args.user, args.pass.as_deref().unwrap_or_default())
                    .await?;
                Ok(Report::Done(format!("user '{}' created", args.user)))
            }
            Commands::UsersList => Ok(Report::Users(store.list_users().await?)),
            Commands::UsersVerify(args) => {
                let ok = store
                    .verify_user(&args.user, args.pass.as_deref().unwrap_or_default())
                    .await?;
                Ok(Report::Verified { user: args.user, ok })
            }
            Commands::SecretsCreate(args) => {
                store
                    .create_secret(&args.user, &args.name, &args.value)
                    .await?;
                Ok(Report::Done(format!(
                    "secret '{}' created for '{}'",
                    args.name, args.user
                )))
            }
            Commands::SecretsList(args) => {
                let names = store.list_secrets(&args.user).await?;
                Ok(Report::Secrets {
                    user: args.user,
                    names,
                })
            }
            Commands::SecretsGet(args) => match store.get_secret(&args.user, &args.name).await? {
                Some(secret) => Ok(Report::Secret(secret)),
                None => Ok(Report::NotFound {
                    user: args.user,
                    name: args.name,
                }),
            },
            Commands::SecretsUpdate(args) => {
                let outcome = store
                    .update_secret(&args.user, &args.name, &args.value)
                    .await?;
                Ok(outcome_report(outcome, args.user, args.name))
            }
            Commands::SecretsDelete(args) => {
                let outcome = store.delete_secret(&args.user, &args.name).await?;
                Ok(outcome_report(outcome, args.user, args.name))
            }
            Commands::Seed(args) => {
                let plan = SeedPlan {
                    users: args.users,
                    secrets_per_user: args.secrets,
                    prefix: args.prefix,
                    password: args.pass,
                    concurrency: args.concurrency,
                };
                Ok(Report::Seeded(crate::service::seed::seed(store, &plan).await?))
            }
        }
    }
}

fn outcome_report(outcome: Outcome, user: String, name: String) -> Report {
    match outcome {
        Outcome::Updated => Report::Done(format!("secret '{name}' updated for '{user}'")),
        Outcome::Deleted => Report::Done(format!("secret '{name}' deleted for '{user}'")),
        Outcome::NotFound => Report::NotFound { user, name },
    }
}

impl Report {
    /// Not found is informational and exits zero; a failed verification does not.
    pub fn exit_code(&self) -> u8 {
        match self {
            Report::Verified { ok: false, .. } => 1,
            _ => 0,
        }
    }

    pub fn render(&self, json: bool) -> String {
        if json {
            return self.to_json().to_string();
        }
        match self {
            Report::Done(msg) => msg.clone(),
            Report::Users(listing) => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL).set_header(vec!["Username"]);
                for user in &listing.users {
                    table.add_row(vec![user.username.as_str()]);
                }
                format!("{table}\nTotal: {}", listing.count)
            }
            Report::Secrets { user, names } => {
                if names.is_empty() {
                    return format!("no secrets for '{user}'");
                }
                let mut table = Table::new();
                table.load_preset(UTF8_FULL).set_header(vec!["Secret"]);
                for secret in names {
                    table.add_row(vec![secret.name.as_str()]);
                }
                format!("{table}\nTotal: {}", names.len())
            }
            Report::Secret(secret) => format!("{}: {}", secret.name, secret.value),
            Report::NotFound { user, name } => {
                format!("secret '{name}' not found for '{user}'")
            }
            Report::Verified { user, ok: true } => format!("password for '{user}' is valid"),
            Report::Verified { user, ok: false } => {
                format!("password for '{user}' does not match")
            }
            Report::Seeded(report) => format!(
                "seeded {} users ({} already present), {} secrets",
                report.users_created, report.users_skipped, report.secrets_created
            ),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Report::Done(msg) => json!({ "status": "ok", "message": msg }),
            Report::Users(listing) => json!(listing),
            Report::Secrets { user, names } => {
                json!({ "user": user, "count": names.len(), "secrets": names })
            }
            Report::Secret(secret) => json!(secret),
            Report::NotFound { user, name } => {
                json!({ "status": "not_found", "user": user, "name": name })
            }
            Report::Verified { user, ok } => json!({ "user": user, "valid": ok }),
            Report::Seeded(report) => json!(report),
        }
    }
}
