mod cli;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use cli::{Cli, Command};
use orderdash::config::{AppSettings, ConfigCatalog, GameConfig};
use orderdash::orders::{Order, OrderPools, StoreLayout};
use orderdash::runner::{Autoplayer, SessionRunner};
use orderdash::session::GameSession;
use orderdash::store::{HttpStore, OfflineStore, RemoteStore};
use orderdash::ui::{self, SessionProgress};

/// Options of the `play` subcommand.
struct PlayArgs {
    user: Option<String>,
    company: Option<String>,
    password: Option<String>,
    autoplay: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = AppSettings::load().context("failed to load orderdash.toml")?;
    if let Some(dir) = cli.config_dir {
        settings.config_dir = dir;
    }
    let catalog = ConfigCatalog::new(&settings.config_dir);

    match cli.command {
        Command::Configs => {
            ui::print_configs(&catalog.options());
        }
        Command::Queue { company, n } => {
            let config = load_game_config(&settings)?;
            queue(&config, &catalog, company.as_deref(), n)?;
        }
        Command::Play {
            user,
            company,
            password,
            autoplay,
        } => {
            let config = load_game_config(&settings)?;
            let args = PlayArgs {
                user,
                company,
                password,
                autoplay,
            };
            match settings.store_url.as_deref() {
                Some(url) if !cli.offline => {
                    let token = Some(settings.store_token.clone());
                    let store = HttpStore::new(url, token)
                        .with_context(|| format!("invalid store_url {url}"))?;
                    play(store, catalog, &settings, config, args).await?;
                }
                _ => {
                    info!("running offline");
                    play(OfflineStore, catalog, &settings, config, args).await?;
                }
            }
        }
    }
    Ok(())
}

fn load_game_config(settings: &AppSettings) -> Result<GameConfig> {
    GameConfig::from_path(&settings.game_config)
        .with_context(|| format!("invalid game config {}", settings.game_config.display()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn play<S: RemoteStore>(
    store: S,
    catalog: ConfigCatalog,
    settings: &AppSettings,
    config: GameConfig,
    args: PlayArgs,
) -> Result<()> {
    let runner = SessionRunner::new(store, catalog)
        .with_tick_interval(Duration::from_millis(settings.tick_interval_ms));
    let user_id = args.user.unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Some(password) = args.password.as_deref()
        && !runner.authenticate(&user_id, password).await?
    {
        bail!("authentication failed for {user_id}");
    }

    let think_time = config.think_time;
    let time_limit = config.time_limit;
    let mut session = GameSession::new(config, Utc::now());
    let condition = runner
        .create_new_user(&mut session, &user_id, args.company.as_deref())
        .await?;
    info!(user = %user_id, condition, "player registered");

    let progress = SessionProgress::start(&user_id, time_limit);
    session.subscribe(progress.observer());
    if let Some(company) = args.company.as_deref() {
        session.switch_company(company)?;
    }
    session.reset_timer(Utc::now());

    if args.autoplay {
        let mut bot = Autoplayer::new(think_time);
        runner.run_with(&mut session, |s| bot.step(s)).await?;
    } else {
        runner.run(&mut session).await?;
    }
    progress.finish(&session);
    Ok(())
}

fn queue(config: &GameConfig, catalog: &ConfigCatalog, company: Option<&str>, n: usize) -> Result<()> {
    let Some(condition) = config.conditions.first() else {
        bail!("no conditions configured");
    };
    let orders: Vec<Order> = catalog
        .load_by_name(&condition.order_file)
        .with_context(|| format!("order file {} not found", condition.order_file))?;
    let layout: StoreLayout = catalog.load_by_name(&condition.store_file).unwrap_or_default();

    let mut pools = OrderPools::new();
    pools.switch_job(orders, layout, &config.companies);
    ui::print_orders(&pools.queue_n_fixed_orders(n, company));
    Ok(())
}
