use clap::{Parser, Subcommand};
use cutis_core::{ClassifyRequest, CoreConfig, ImageUpload, Services, ShardableUuid};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cutis")]
#[command(about = "Cutis skin-condition diagnosis CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an image with the configured classifier and print the result
    Classify {
        /// Path to a JPEG, PNG or WebP photo
        image: PathBuf,
        /// Location used to find nearby specialists and clinics
        #[arg(long)]
        location: Option<String>,
        /// Record the result in this user's medical history
        #[arg(long)]
        user: Option<String>,
    },
    /// List the condition catalog
    Conditions,
    /// List a user's medical history, newest first
    History {
        /// User UUID (32 lowercase hex characters)
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cutis_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Nothing to do. Run `cutis --help` for commands.");
        return Ok(());
    };

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    let services = Services::from_config(&cfg)?;

    match command {
        Commands::Classify {
            image,
            location,
            user,
        } => {
            let user_id = user.as_deref().map(ShardableUuid::parse).transpose()?;
            let bytes = tokio::fs::read(&image).await?;
            let filename = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image")
                .to_string();

            let request = ClassifyRequest {
                image: Some(ImageUpload {
                    filename,
                    content_type: None,
                    bytes,
                }),
                location,
                user_id,
            };
            match services.classification.classify(request).await {
                Ok(success) => {
                    println!("{}", serde_json::to_string_pretty(&success.into_body())?)
                }
                Err(failure) => {
                    eprintln!("Classification failed: {}", failure);
                    std::process::exit(1);
                }
            }
        }
        Commands::Conditions => {
            let catalog = services.classification.catalog();
            if catalog.is_empty() {
                println!("No conditions found in {}.", cfg.conditions_file().display());
            }
            for condition in catalog.all() {
                println!("{} ({})", condition.name, condition.severity);
                if !condition.description.is_empty() {
                    println!("  {}", condition.description);
                }
            }
        }
        Commands::History { user } => {
            let user_id = ShardableUuid::parse(&user)?;
            let rows = services.history.list(&user_id).await?;
            if rows.is_empty() {
                println!("No medical history found.");
            }
            for row in rows {
                let name = row
                    .condition
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or("Unknown");
                println!(
                    "ID: {}, Condition: {}, Severity: {}, Diagnosed: {}",
                    row.entry.id,
                    name,
                    row.entry.severity,
                    row.entry.diagnosis_date.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}
