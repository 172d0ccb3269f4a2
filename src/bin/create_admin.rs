//! Provision an administrator account against the configured backend.
use anyhow::Context;
use clap::Parser;
use secrecy::{ExposeSecret, Secret};
use std::io::{self, BufRead, Write};

use rental_portal::configuration::get_configuration;
use rental_portal::domain::UserRole;
use rental_portal::services::{validate_password, Services};
use rental_portal::telemetry::{get_line_subscriber, init_subscriber};

#[derive(Parser)]
#[command(name = "create_admin")]
#[command(about = "Create an administrator, or promote an existing user")]
struct Cli {
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
    /// Turn an already registered user into an administrator.
    #[arg(long, default_value_t = false)]
    promote: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber(get_line_subscriber("warn".into(), io::stderr));
    let cli = Cli::parse();

    let email = cli.email.trim();
    let full_name = cli.full_name.trim();
    if email.is_empty() || full_name.is_empty() {
        anyhow::bail!("Both --email and --full-name are required");
    }

    let configuration = get_configuration().context("Failed to read configuration")?;
    let services = Services::build(&configuration)?;

    if let Some(existing) = services.auth.get_user_by_email(email).await? {
        if !cli.promote {
            anyhow::bail!(
                "{} is already registered as {}, pass --promote to make it an admin",
                existing.email,
                existing.role.as_str()
            );
        }
        let user = services.auth.promote_to_admin(email, full_name).await?;
        println!("{} is now an administrator", user.email);
        return Ok(());
    }

    let password = read_password()?;
    let user = services
        .auth
        .register(email, password, Some(full_name), UserRole::Admin)
        .await?;
    println!("Administrator {} created ({})", user.email, user.id);
    Ok(())
}

fn read_password() -> anyhow::Result<Secret<String>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut prompt = |label: &str| -> anyhow::Result<Secret<String>> {
        print!("{}: ", label);
        io::stdout().flush()?;
        let line = lines
            .next()
            .context("No password was provided on stdin")??;
        Ok(Secret::new(line.trim_end_matches(['\r', '\n']).to_string()))
    };

    let password = prompt("Password")?;
    let confirmation = prompt("Confirm password")?;
    if password.expose_secret() != confirmation.expose_secret() {
        anyhow::bail!("The passwords do not match");
    }
    validate_password(&password).map_err(anyhow::Error::msg)?;
    Ok(password)
}
