mod session_file;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use nestegg::auth::forms::{self, FormError, SignUpForm};
use nestegg::auth::store::AuthPhase;
use nestegg::backend::hosted::HostedBackend;
use nestegg::config::{BackendConfig, ConfigError};
use nestegg::{AuthState, AuthStore, BackendError};

use crate::session_file::SessionFile;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("backend request failed: {0}")]
    Backend(#[from] BackendError),
    #[error("{}", .0.user_message())]
    Form(#[from] FormError),
    #[error("not signed in")]
    NotSignedIn,
    #[error("could not resolve profile: {0}")]
    Profile(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "nestegg", about = "nestegg account and session CLI")]
struct Cli {
    /// Where the signed-in session is kept between commands.
    #[arg(long, env = "NESTEGG_SESSION_FILE", default_value = ".nestegg-session.json")]
    session_file: PathBuf,

    /// Origin used for email redirects when `NESTEGG_REDIRECT_URL` is unset.
    #[arg(long, env = "NESTEGG_APP_ORIGIN")]
    app_origin: Option<String>,

    /// -v info, -vv debug, -vvv trace. `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in profile, provisioning it if missing.
    Whoami,
    SignUp {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "NESTEGG_PASSWORD")]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "NESTEGG_PASSWORD")]
        password: String,
    },
    SignOut,
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Exchange the refresh token for a new session.
    Refresh,
    /// Print every auth state change until Ctrl-C.
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = BackendConfig::from_env()?;
    let redirect_to = config.redirect.resolve(cli.app_origin.as_deref());
    let persistence = SessionFile::new(&cli.session_file);
    tracing::debug!(path = %persistence.path().display(), "using session file");
    let backend = Arc::new(HostedBackend::with_persistence(&config, Box::new(persistence))?);
    let store = AuthStore::new(backend.clone()).with_redirect(redirect_to);

    match cli.command {
        Command::Whoami => {
            store.mount().await;
            print_user(&store.snapshot())
        }
        Command::SignUp { full_name, email, password, confirm_password } => {
            let form = SignUpForm { full_name, email, password, confirm_password };
            forms::submit_sign_up(&store, &form).await?;
            println!("account created; check your email if confirmation is required");
            Ok(())
        }
        Command::SignIn { email, password } => {
            forms::submit_sign_in(&store, &email, &password).await?;
            store.mount().await;
            print_user(&store.snapshot())
        }
        Command::SignOut => {
            store.sign_out().await?;
            println!("signed out");
            Ok(())
        }
        Command::ResetPassword { email } => {
            let notice = forms::submit_password_reset(&store, &email).await?;
            println!("{notice}");
            Ok(())
        }
        Command::Refresh => {
            let session = backend.refresh_session().await?;
            println!("session refreshed for {}", session.user.id);
            Ok(())
        }
        Command::Watch => watch(&store).await,
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

fn print_user(state: &AuthState) -> Result<(), CliError> {
    match state.phase() {
        AuthPhase::Authenticated(user) => {
            println!("{}", serde_json::to_string_pretty(user)?);
            Ok(())
        }
        AuthPhase::Failed(cause) => Err(CliError::Profile(cause.to_owned())),
        AuthPhase::Anonymous | AuthPhase::Loading => Err(CliError::NotSignedIn),
    }
}

async fn watch(store: &AuthStore<HostedBackend>) -> Result<(), CliError> {
    let mut rx = store.subscribe();
    let printer = async {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            println!("{}", describe(&state));
        }
    };

    tokio::select! {
        () = store.run() => {}
        () = printer => {}
        _ = tokio::signal::ctrl_c() => {
            store.teardown();
        }
    }
    Ok(())
}

fn describe(state: &AuthState) -> String {
    match state.phase() {
        AuthPhase::Loading => "loading".to_owned(),
        AuthPhase::Authenticated(user) => format!("signed in as {} <{}>", user.full_name, user.email),
        AuthPhase::Anonymous => "signed out".to_owned(),
        AuthPhase::Failed(cause) => format!("signed out (resolution failed: {cause})"),
    }
}
