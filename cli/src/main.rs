use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use session::{
    ApiClient, ClientConfig, ClientError, FileGuestCart, GuardDecision, GuestCartStore, Hydrator, MemoryGuestCart,
    MemoryNavigator, Navigator, PendingRequest, PeriodicRefresher, RouteGuard, User, post_login_location,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing credentials; pass --email/--password or set SHOP_EMAIL/SHOP_PASSWORD")]
    MissingCredentials,
    #[error("login rejected; check email and password")]
    LoginRejected,
    #[error("refresh interval must be at least one second")]
    ZeroInterval,
    #[error("invalid cookie `{0}`; expected name=value")]
    InvalidCookie(String),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "shop-cli", about = "Storefront session client")]
struct Cli {
    /// API base URL. Overrides `API_BASE_URL`.
    #[arg(long, env = "SHOP_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "SHOP_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "SHOP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Page (path and query) the session is "on". Decides whether an expired
    /// session redirects, and where `login` lands via its `redirect` param.
    #[arg(long, default_value = "/")]
    page: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the user.
    Login,
    /// Resolve user, cart and wishlist the way a page mount does.
    Hydrate(HydrateArgs),
    /// Keep a logged-in session alive with periodic refreshes.
    Keepalive(KeepaliveArgs),
    /// Issue a GET through the interceptor and print the JSON body.
    Get { path: String },
    /// Evaluate the page guard for a path offline.
    Guard(GuardArgs),
}

#[derive(Args, Debug)]
struct HydrateArgs {
    /// Guest cart file used when no session exists.
    #[arg(long, env = "SHOP_GUEST_CART")]
    guest_cart: Option<PathBuf>,

    /// Hydrate as a guest even if credentials are configured.
    #[arg(long, default_value_t = false)]
    guest: bool,
}

#[derive(Args, Debug)]
struct KeepaliveArgs {
    /// Defaults to `SESSION_REFRESH_INTERVAL_SECS` (600).
    #[arg(long)]
    interval_secs: Option<u64>,

    #[arg(long, default_value_t = 1800)]
    duration_secs: u64,
}

#[derive(Args, Debug)]
struct GuardArgs {
    path: String,

    /// Cookie visible to the guard, as name=value. Repeatable.
    #[arg(long = "cookie")]
    cookies: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Command::Guard(args) = &cli.command {
        return run_guard(args);
    }

    let navigator = Arc::new(MemoryNavigator::new(cli.page.clone()));
    let config = client_config(cli.base_url.as_deref())?;
    let client = ApiClient::new(config)?.with_navigator(navigator.clone());

    let result = match cli.command {
        Command::Login => {
            let user = login(&client, &cli).await?;
            // Land where the guard originally sent the user from.
            navigator.redirect(&post_login_location(&cli.page));
            print_json(&serde_json::to_value(user)?)
        }
        Command::Hydrate(ref args) => {
            if !args.guest {
                login(&client, &cli).await?;
            }
            run_hydrate(client, args).await
        }
        Command::Keepalive(ref args) => {
            let period = keepalive_period(args, client.config())?;
            login(&client, &cli).await?;
            run_keepalive(client, period, args.duration_secs).await;
            Ok(())
        }
        Command::Get { ref path } => {
            if cli.email.is_some() {
                login(&client, &cli).await?;
            }
            let json: Value = client.get(path).await?;
            print_json(&json)
        }
        Command::Guard(_) => Ok(()),
    };

    for location in navigator.redirects() {
        eprintln!("redirected to {location}");
    }
    result
}

async fn login(client: &ApiClient, cli: &Cli) -> Result<User, CliError> {
    let (Some(email), Some(password)) = (&cli.email, &cli.password) else {
        return Err(CliError::MissingCredentials);
    };
    let body = serde_json::json!({ "email": email, "password": password });
    // Bad credentials answer 401, which the interceptor treats as an expired
    // session once the refresh also fails.
    let request = PendingRequest::post("/auth/login").with_json(&body)?.quiet();
    let response = match client.send(request).await {
        Ok(response) => response,
        Err(ClientError::SessionExpired { .. }) => return Err(CliError::LoginRejected),
        Err(e) => return Err(e.into()),
    };
    let user: User = response.json().await.map_err(ClientError::from)?;
    tracing::info!(user_id = %user.id, "logged in");
    Ok(user)
}

async fn run_hydrate(client: ApiClient, args: &HydrateArgs) -> Result<(), CliError> {
    let guest_cart: Arc<dyn GuestCartStore> = match &args.guest_cart {
        Some(path) => Arc::new(FileGuestCart::new(path.clone())),
        None => Arc::new(MemoryGuestCart::default()),
    };
    let hydrator = Hydrator::new(client, session::ClientState::new(), guest_cart);
    let status = hydrator.run().await;

    let state = hydrator.state();
    let cart = state.cart().await;
    let summary = serde_json::json!({
        "user": status.user(),
        "cart": {
            "items": cart.item_count(),
            "subtotal_cents": cart.subtotal_cents(),
        },
        "wishlist": state.wishlist().await.items.len(),
    });
    print_json(&summary)
}

/// Environment config with the `--base-url` override applied.
fn client_config(base_url: Option<&str>) -> Result<ClientConfig, CliError> {
    let config = ClientConfig::from_env()?;
    match base_url {
        Some(url) => Ok(config.with_base_url(url)?),
        None => Ok(config),
    }
}

fn keepalive_period(args: &KeepaliveArgs, config: &ClientConfig) -> Result<Duration, CliError> {
    let period = args.interval_secs.map_or(config.refresh_interval, Duration::from_secs);
    if period.is_zero() {
        return Err(CliError::ZeroInterval);
    }
    Ok(period)
}

async fn run_keepalive(client: ApiClient, period: Duration, duration_secs: u64) {
    let handle = PeriodicRefresher::spawn(Arc::new(client), period);
    tracing::info!(interval_secs = period.as_secs(), duration_secs, "keepalive running");
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;
    handle.stop();
    tracing::info!("keepalive stopped");
}

fn run_guard(args: &GuardArgs) -> Result<(), CliError> {
    let cookies = args.cookies.iter().map(|raw| parse_cookie(raw)).collect::<Result<Vec<_>, _>>()?;
    let decision = RouteGuard::default().check(&args.path, |name| {
        cookies.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
    });
    println!("{}", describe_decision(&decision));
    Ok(())
}

fn parse_cookie(raw: &str) -> Result<(String, String), CliError> {
    let (name, value) = raw.split_once('=').ok_or_else(|| CliError::InvalidCookie(raw.to_owned()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidCookie(raw.to_owned()));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

fn describe_decision(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Allow => "allow".to_owned(),
        GuardDecision::Redirect { location } => format!("redirect {location}"),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cookie_splits_on_first_equals() {
        let (name, value) = parse_cookie("refreshToken=a=b").unwrap();
        assert_eq!(name, "refreshToken");
        assert_eq!(value, "a=b");
    }

    #[test]
    fn parse_cookie_rejects_missing_name() {
        assert!(matches!(parse_cookie("=x"), Err(CliError::InvalidCookie(_))));
        assert!(matches!(parse_cookie("novalue"), Err(CliError::InvalidCookie(_))));
    }

    #[test]
    fn describe_redirect_decision() {
        let decision = RouteGuard::default().check("/dashboard", |_| None);
        assert_eq!(describe_decision(&decision), "redirect /auth/login?redirect=%2Fdashboard");
    }

    #[test]
    fn describe_allow_decision() {
        let decision = RouteGuard::default().check("/dashboard", |_| Some("token".to_owned()));
        assert_eq!(describe_decision(&decision), "allow");
    }

    fn keepalive(interval_secs: Option<u64>) -> KeepaliveArgs {
        KeepaliveArgs { interval_secs, duration_secs: 1 }
    }

    #[test]
    fn keepalive_period_defaults_to_configured_interval() {
        let config = ClientConfig::new("http://localhost:5000/api")
            .unwrap()
            .with_refresh_interval(Duration::from_secs(90));
        assert_eq!(keepalive_period(&keepalive(None), &config).unwrap(), Duration::from_secs(90));
        assert_eq!(keepalive_period(&keepalive(Some(5)), &config).unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn keepalive_period_rejects_zero() {
        let config = ClientConfig::new("http://localhost:5000/api").unwrap();
        assert!(matches!(keepalive_period(&keepalive(Some(0)), &config), Err(CliError::ZeroInterval)));
    }

    #[test]
    fn base_url_flag_overrides_environment_config() {
        let config = client_config(Some("https://shop.example.com/api/")).unwrap();
        assert_eq!(config.base_url, "https://shop.example.com/api");
    }

    #[test]
    fn invalid_base_url_flag_is_rejected() {
        assert!(matches!(client_config(Some("nope")), Err(CliError::Client(ClientError::InvalidBaseUrl(_)))));
    }

    #[test]
    fn cli_parses_guard_cookies() {
        let cli = Cli::try_parse_from(["shop-cli", "guard", "/orders", "--cookie", "refreshToken=x"]).unwrap();
        let Command::Guard(args) = cli.command else {
            panic!("expected guard command");
        };
        assert_eq!(args.path, "/orders");
        assert_eq!(args.cookies, vec!["refreshToken=x".to_owned()]);
    }
}
