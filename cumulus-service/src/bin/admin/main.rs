use std::fs;
use std::sync::Arc;

use anyhow::anyhow;
use auth::Authenticator;
use clap::Arg;
use clap::ArgMatches;
use clap::Command;
use cumulus_service::config::Config;
use cumulus_service::domain::account::models::AccountName;
use cumulus_service::domain::account::models::EmailAddress;
use cumulus_service::domain::account::models::NewApiKey;
use cumulus_service::domain::account::models::RegisterAccountCommand;
use cumulus_service::domain::account::models::Role;
use cumulus_service::domain::account::service::AccountService;
use cumulus_service::domain::instance::service::InstanceService;
use cumulus_service::outbound::exoscale::ExoscaleProvider;
use cumulus_service::outbound::repositories::PostgresAccountRepository;
use cumulus_service::outbound::repositories::PostgresEventRecorder;
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;

type AdminAccountService = AccountService<PostgresAccountRepository, PostgresEventRecorder>;
type AdminInstanceService =
    InstanceService<PostgresAccountRepository, ExoscaleProvider, PostgresEventRecorder>;

/// Length of generated initial passwords. Recoverable through the
/// regular reset flow, so the value is never printed.
const GENERATED_PASSWORD_LENGTH: usize = 32;

fn cli() -> Command {
    Command::new("cumulus-admin")
        .about("Operator tooling for the cumulus backend")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("register-user")
                .about("Create a single account")
                .arg(
                    Arg::new("username")
                        .long("username")
                        .help("The unique name of the account")
                        .required(true),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("The email address of the account")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Initial password (random if left blank)"),
                )
                .arg(
                    Arg::new("role")
                        .long("role")
                        .help("Account role: 'student' or 'teacher'")
                        .default_value("student"),
                )
                .arg(
                    Arg::new("tenant")
                        .long("tenant")
                        .help("Cloud-provider tenant (organization name)")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("register-group")
                .about("Create accounts in bulk from a JSON group file")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .help("A group file in JSON format")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Initial password for every account (random if left blank)"),
                )
                .arg(
                    Arg::new("role")
                        .long("role")
                        .help("Account role: 'student' or 'teacher'")
                        .default_value("student"),
                )
                .arg(
                    Arg::new("tenant")
                        .long("tenant")
                        .help("Cloud-provider tenant (organization name)")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("add-api-key")
                .about("Store cloud-provider credentials for a tenant")
                .arg(
                    Arg::new("username")
                        .long("username")
                        .help("An account belonging to the tenant")
                        .required(true),
                )
                .arg(
                    Arg::new("zone")
                        .long("zone")
                        .help("The zone the key is used for")
                        .required(true),
                )
                .arg(Arg::new("key").long("key").help("API key").required(true))
                .arg(
                    Arg::new("secret")
                        .long("secret")
                        .help("API secret")
                        .required(true),
                )
                .arg(
                    Arg::new("tenant")
                        .long("tenant")
                        .help("Cloud-provider tenant (organization name)")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("update-password")
                .about("Set an account's password directly")
                .arg(
                    Arg::new("username")
                        .long("username")
                        .help("The name of the account")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("The password to set")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("shutdown-instances")
                .about("Stop running instances visible to a tenant, optionally filtered by label")
                .arg(
                    Arg::new("user")
                        .long("user")
                        .help("The account held accountable for the shutdown (determines the tenant)")
                        .required(true),
                )
                .arg(
                    Arg::new("label")
                        .long("label")
                        .help("The label to select instances (all if empty)"),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .help("The label value to select instances (all if empty)"),
                ),
        )
}

#[derive(Debug, Deserialize)]
struct Group {
    users: Vec<GroupMember>,
}

#[derive(Debug, Deserialize)]
struct GroupMember {
    name: String,
    email: String,
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing --{name}"))
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cumulus_service=info,cumulus_admin=info".into()),
        )
        .init();

    let matches = cli().get_matches();

    let config = Config::load()?;
    let pg_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pg_pool).await?;

    let authenticator = Arc::new(Authenticator::new(config.jwt.secret.as_bytes()));
    let accounts = Arc::new(PostgresAccountRepository::new(pg_pool.clone()));
    let events = Arc::new(PostgresEventRecorder::new(pg_pool));
    let provider = Arc::new(ExoscaleProvider::new()?);

    let account_service = AccountService::new(
        Arc::clone(&accounts),
        Arc::clone(&events),
        Arc::clone(&authenticator),
    );
    let instance_service = InstanceService::new(accounts, provider, events);

    match matches.subcommand() {
        Some(("register-user", matches)) => register_user(&account_service, matches).await,
        Some(("register-group", matches)) => register_group(&account_service, matches).await,
        Some(("add-api-key", matches)) => add_api_key(&account_service, matches).await,
        Some(("update-password", matches)) => update_password(&account_service, matches).await,
        Some(("shutdown-instances", matches)) => {
            shutdown_instances(&instance_service, matches).await
        }
        _ => unreachable!("subcommand is required"),
    }
}

async fn register_user(
    service: &AdminAccountService,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    let name = AccountName::new(required(matches, "username")?.to_string())?;
    let email = EmailAddress::new(required(matches, "email")?.to_string())?;
    let role: Role = required(matches, "role")?.parse()?;
    let tenant = required(matches, "tenant")?.to_string();

    let password = match matches.get_one::<String>("password") {
        Some(password) => password.clone(),
        None => auth::alphanumeric_token(GENERATED_PASSWORD_LENGTH),
    };

    let account = service
        .register(RegisterAccountCommand {
            name,
            role,
            email,
            tenant,
            password,
        })
        .await?;
    tracing::info!(name = %account.name, id = %account.id, "Account created");

    Ok(())
}

/// Bulk registration: per-account failures are reported and the batch
/// continues with the next member.
async fn register_group(
    service: &AdminAccountService,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    let file = required(matches, "file")?;
    let role: Role = required(matches, "role")?.parse()?;
    let tenant = required(matches, "tenant")?;
    let shared_password = matches.get_one::<String>("password");

    let group: Group = serde_json::from_str(&fs::read_to_string(file)?)?;

    for member in group.users {
        let name = match AccountName::new(member.name.clone()) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(name = %member.name, error = %e, "Skipping member with invalid name");
                continue;
            }
        };
        let email = match EmailAddress::new(member.email.clone()) {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(name = %member.name, error = %e, "Skipping member with invalid email");
                continue;
            }
        };
        let password = match shared_password {
            Some(password) => password.clone(),
            None => auth::alphanumeric_token(GENERATED_PASSWORD_LENGTH),
        };

        match service
            .register(RegisterAccountCommand {
                name,
                role,
                email,
                tenant: tenant.to_string(),
                password,
            })
            .await
        {
            Ok(account) => tracing::info!(name = %account.name, id = %account.id, "Account created"),
            Err(e) => tracing::warn!(name = %member.name, error = %e, "Skipping member"),
        }
    }

    Ok(())
}

async fn add_api_key(service: &AdminAccountService, matches: &ArgMatches) -> anyhow::Result<()> {
    let name = AccountName::new(required(matches, "username")?.to_string())?;
    let key = NewApiKey {
        zone: required(matches, "zone")?.to_string(),
        key: required(matches, "key")?.to_string(),
        secret: required(matches, "secret")?.to_string(),
        tenant: required(matches, "tenant")?.to_string(),
    };

    service.add_api_key(&name, key).await?;
    tracing::info!(name = %name, "API key stored");

    Ok(())
}

async fn update_password(
    service: &AdminAccountService,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    let name = AccountName::new(required(matches, "username")?.to_string())?;
    let password = required(matches, "password")?;

    service.change_password(&name, password).await?;
    tracing::info!(name = %name, "Password updated");

    Ok(())
}

async fn shutdown_instances(
    service: &AdminInstanceService,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    let user = required(matches, "user")?;
    let label = matches.get_one::<String>("label");
    let value = matches.get_one::<String>("value");

    if label.is_some() != value.is_some() {
        return Err(anyhow!("define both --label and --value or neither"));
    }
    let filter = label
        .zip(value)
        .map(|(key, value)| (key.as_str(), value.as_str()));

    let stopped = service.stop_matching(user, filter).await?;
    tracing::info!(count = stopped.len(), "Instances stopped");
    for id in stopped {
        println!("{id}");
    }

    Ok(())
}
