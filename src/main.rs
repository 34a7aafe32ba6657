use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gp_api::PlayClient;
use gp_auth::profile_store::DEFAULT_PROFILE;
use gp_auth::session::parse_device_id;
use gp_auth::{
    CredentialStore, DeviceContext, FileCredentialStore, GpAuthClient, LoginRequest,
    ProfileStore, ProtocolConfig, StoredSession, TomlProfileStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Google Play store session tool
///
/// Negotiates a session for a virtual device and issues store lookups with it.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct DeviceArgs {
    /// Device profile to impersonate
    #[arg(long, global = true, default_value = DEFAULT_PROFILE)]
    profile: String,

    /// TOML file with device profiles, instead of the bundled set
    #[arg(long, global = true, env = "GPLAY_PROFILES")]
    profiles: Option<PathBuf>,

    #[arg(long, global = true, default_value = "en_US")]
    locale: String,

    /// Defaults to the profile's timezone
    #[arg(long, global = true)]
    timezone: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full login handshake and print the session credentials
    Login {
        #[arg(long, env = "GPLAY_EMAIL")]
        email: String,

        #[arg(long, env = "GPLAY_PASSWORD", hide_env_values = true)]
        password: String,

        /// Keep the session in the local credential store
        #[arg(long)]
        save: bool,
    },
    /// Look up an app with a stored or explicit session
    Details {
        package: String,

        /// Hex device id from an earlier login
        #[arg(long, requires = "token")]
        device_id: Option<String>,

        /// Auth sub-token from an earlier login
        #[arg(long, env = "GPLAY_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Account whose saved session should be used
        #[arg(long, conflicts_with = "device_id")]
        account: Option<String>,

        #[arg(long)]
        version_code: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let device = device_context(&cli.device).await?;
    let mut auth = GpAuthClient::new(Arc::new(ProtocolConfig::new()?), device)?;

    match cli.command {
        Command::Login {
            email,
            password,
            save,
        } => {
            let request = LoginRequest::from_parts(Some(email.clone()), Some(password), None, None)?;
            let credentials = auth.authenticate(request).await?;
            println!("device id: {}", credentials.device_id_hex());
            println!("auth sub-token: {}", credentials.auth_sub_token);

            if save {
                let store = credential_store().await?;
                let profile = auth.device().profile().name.clone();
                let locale = auth.device().locale().to_string();
                store
                    .save(&email, &StoredSession::new(credentials, &profile, &locale))
                    .await?;
                info!("Saved session for {}", email);
            }
        }
        Command::Details {
            package,
            device_id,
            token,
            account,
            version_code,
        } => {
            let request = match account {
                Some(account) => {
                    let stored = credential_store()
                        .await?
                        .load(&account)
                        .await
                        .with_context(|| format!("no saved session for {}", account))?;
                    LoginRequest::Restore(stored.credentials)
                }
                None => {
                    let device_id = device_id
                        .map(|hex| {
                            parse_device_id(&hex)
                                .with_context(|| format!("invalid device id {:?}", hex))
                        })
                        .transpose()?;
                    LoginRequest::from_parts(None, None, device_id, token)?
                }
            };
            auth.authenticate(request).await?;

            let client = PlayClient::new(auth);
            match client.details(&package, version_code).await? {
                Some(doc) => {
                    println!("{}", doc.docid.as_deref().unwrap_or(&package));
                    if let Some(title) = &doc.title {
                        println!("  title:   {}", title);
                    }
                    if let Some(creator) = &doc.creator {
                        println!("  creator: {}", creator);
                    }
                }
                None => println!("{}: no details returned", package),
            }
        }
    }

    Ok(())
}

async fn device_context(args: &DeviceArgs) -> anyhow::Result<DeviceContext> {
    let profiles = match &args.profiles {
        Some(path) => TomlProfileStore::load(path)
            .await
            .with_context(|| format!("failed to read device profiles from {}", path.display()))?,
        None => TomlProfileStore::bundled()?,
    };
    let profile = profiles.resolve(&args.profile)?;
    Ok(DeviceContext::new(
        profile,
        &args.locale,
        args.timezone.as_deref(),
    )?)
}

async fn credential_store() -> anyhow::Result<FileCredentialStore> {
    Ok(FileCredentialStore::new(FileCredentialStore::default_storage_dir()?).await?)
}
