use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use clap::ValueEnum;
use common::types::Settings;
use identity::cache::Cache;
use identity::identities::Identities;
use identity::identities::Provider;
use ingester::destination::Destination;
use ingester::destinations::debug::DebugSink;
use ingester::event::Identify;
use ingester::event::Track;
use ingester::executor::Dispatcher;
use ingester::executor::Executor;
use ingester::executor::UnhandledPolicy;
use ingester::sources::http::Service;
use ingester::transformer::Transformer;
use ingester::transformers::brand;
use ingester::transformers::brand::BrandPolicy;
use ingester::transformers::provision;
use ingester::transformers::provision::Scope;
use ingester::transformers::timeshift;
use ingester::transformers::timeshift::Resolver;
use ingester::transformers::traits::identify::Normalize;
use ingester::transformers::traits::Nesting;
use tracing::info;
use tracing::metadata::LevelFilter;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::error::Result;

mod error;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
        .into()
    }
}

/// Where in the pipeline this deployment sits. The source stage creates
/// identities, the destination stage substitutes and enriches.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StageArg {
    Source,
    Destination,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    Brand,
    Canonical,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum NestingArg {
    None,
    SettingsBrand,
    TraitBrand,
}

impl NestingArg {
    fn nesting(self) -> Option<Nesting> {
        match self {
            NestingArg::None => None,
            NestingArg::SettingsBrand => Some(Nesting::SettingsBrand),
            NestingArg::TraitBrand => Some(Nesting::TraitBrand),
        }
    }
}

#[derive(Parser)]
#[command(propagate_version = true)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(value_enum, long, default_value = "info")]
    log_level: LogLevel,
    #[arg(long, default_value = "0.0.0.0:8080")]
    host: SocketAddr,
    #[arg(long)]
    api_host: String,
    #[arg(long)]
    brand: String,
    #[arg(long, env = "TIMESHIFT_API_BEARER_TOKEN")]
    token: String,
    #[arg(value_enum, long, default_value = "destination")]
    stage: StageArg,
    #[arg(value_enum, long, default_value = "brand")]
    scope: ScopeArg,
    #[arg(value_enum, long, default_value = "settings-brand")]
    nesting: NestingArg,
    /// Backfill this brand on track events that arrive without one
    #[arg(long)]
    default_brand: Option<String>,
    /// Only validate track events (userId and brand present) instead of
    /// resolving their identity
    #[arg(long)]
    require_brand: bool,
    /// Forward group/page/screen/alias/delete unchanged instead of rejecting
    /// them
    #[arg(long)]
    forward_unhandled: bool,
}

fn build_dispatcher(cli: &Cli, provider: Arc<dyn Provider>) -> Dispatcher {
    let mut track: Vec<Arc<dyn Transformer<Track>>> = Vec::new();
    let mut identify: Vec<Arc<dyn Transformer<Identify>>> = Vec::new();

    match cli.stage {
        StageArg::Source => {
            if let Some(default_brand) = &cli.default_brand {
                track.push(Arc::new(brand::track::Brand::new(BrandPolicy::Default(
                    default_brand.clone(),
                ))));
            }
            let scope = match cli.scope {
                ScopeArg::Brand => Scope::Brand,
                ScopeArg::Canonical => Scope::Canonical,
            };
            identify.push(Arc::new(provision::identify::Provision::new(
                provider, scope,
            )));
            if let Some(nesting) = cli.nesting.nesting() {
                identify.push(Arc::new(Normalize::new(nesting)));
            }
        }
        StageArg::Destination => {
            let resolver = Arc::new(Resolver::new(provider, Arc::new(Cache::new())));
            if cli.require_brand {
                track.push(Arc::new(brand::track::Brand::new(BrandPolicy::Require)));
            } else {
                track.push(Arc::new(timeshift::track::Timeshift::new(
                    resolver.clone(),
                )));
            }
            identify.push(Arc::new(timeshift::identify::Timeshift::new(resolver)));
            if let Some(nesting) = cli.nesting.nesting() {
                identify.push(Arc::new(Normalize::new(nesting)));
            }
        }
    }

    let track_destinations: Vec<Arc<dyn Destination<Track>>> = vec![Arc::new(DebugSink::new())];
    let identify_destinations: Vec<Arc<dyn Destination<Identify>>> =
        vec![Arc::new(DebugSink::new())];

    let unhandled = if cli.forward_unhandled {
        UnhandledPolicy::Forward
    } else {
        UnhandledPolicy::Reject
    };

    Dispatcher::new(
        Executor::new(track, track_destinations),
        Executor::new(identify, identify_destinations),
        unhandled,
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let settings = Settings {
        api_host: cli.api_host.clone(),
        brand: cli.brand.clone(),
        timeshift_api_bearer_token: cli.token.clone(),
    };
    let provider: Arc<dyn Provider> = Arc::new(Identities::new(reqwest::Client::new()));
    let dispatcher = build_dispatcher(&cli, provider);

    info!("starting http instance...");
    Service::new(dispatcher, settings, cli.host).serve().await?;

    Ok(())
}
