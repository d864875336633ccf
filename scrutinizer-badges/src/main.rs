//! Command-line interface for the scrutinizer-badges binary.
//!
//! The CLI resolves badge routes against the Scrutinizer API and prints the
//! resulting shields.io endpoint documents, one per route.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use scrutinizer_badges::{
    BadgeData, EndpointBadge, Error, HttpReportSource, ROUTE_CATALOG, ReportSource, Route,
    ServiceConfig, artifact_stem, load_config, output_error, write_endpoint_badge,
};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Label used for routes that cannot be attributed to a metric.
const FALLBACK_LABEL: &str = "scrutinizer";

/// Command line interface for rendering Scrutinizer metric badges.
#[derive(Debug, Parser,)]
#[command(name = "scrutinizer-badges", version, about = "Render Scrutinizer quality and coverage badges")]
struct Cli
{
    /// YAML file with service settings.
    #[arg(long = "config", value_name = "PATH", env = "SCRUTINIZER_BADGES_CONFIG", global = true)]
    config: Option<PathBuf,>,

    /// Override for the repository API root.
    #[arg(long = "base-url", value_name = "URL", env = "SCRUTINIZER_BASE_URL", global = true)]
    base_url: Option<String,>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Resolve badge routes and print endpoint documents.
    Render(RenderArgs,),
    /// List the supported badge routes.
    Routes(RoutesArgs,),
}

#[derive(Debug, Args,)]
struct RenderArgs
{
    /// Badge routes such as /quality/g/filp/whoops/master.
    #[arg(value_name = "ROUTE", required = true)]
    routes: Vec<String,>,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,

    /// Directory that additionally receives one JSON file per route.
    #[arg(long = "output", value_name = "DIR")]
    output: Option<PathBuf,>,
}

#[derive(Debug, Args,)]
struct RoutesArgs
{
    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,
}

/// Badge produced for a single route, with the error that replaced the
/// metric badge if any.
#[derive(Debug,)]
struct RenderedRoute
{
    endpoint: EndpointBadge,
    error:    Option<Error,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();

    match run().await {
        Ok(0,) => {}
        Ok(failures,) => {
            warn!("{} badge route(s) could not be rendered", failures);
            process::exit(1,);
        }
        Err(error,) => {
            eprintln!("{}", error.to_display_string());
            process::exit(1,);
        }
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_writer(io::stderr,).init();
}

/// Executes the CLI and returns the number of routes that failed.
///
/// # Errors
///
/// Propagates configuration, client construction and output errors.
async fn run() -> Result<usize, Error,>
{
    let cli = Cli::parse();

    match cli.command {
        Command::Render(args,) => {
            let config = resolve_config(cli.config, cli.base_url,)?;
            run_render(&config, args,).await
        }
        Command::Routes(args,) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_document(&mut handle, &ROUTE_CATALOG, args.pretty,)?;
            Ok(0,)
        }
    }
}

fn resolve_config(path: Option<PathBuf,>, base_url: Option<String,>,) -> Result<ServiceConfig, Error,>
{
    let config = match path {
        Some(path,) => load_config(&path,)?,
        None => ServiceConfig::default(),
    }
    .with_base_url(base_url,);

    config.validate()?;
    Ok(config,)
}

async fn run_render(config: &ServiceConfig, args: RenderArgs,) -> Result<usize, Error,>
{
    let source = Arc::new(HttpReportSource::new(config,)?,);
    info!("Rendering {} badge route(s) against {}", args.routes.len(), config.base_url);

    let rendered = render_routes(source, &args.routes,).await;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    emit_routes(&mut handle, &args.routes, rendered, args.pretty, args.output.as_deref(),)
}

/// Prints every rendered route and writes its artifact when `output` is set.
///
/// Returns the number of routes that failed to render or to produce an
/// artifact; such routes never stop the remaining ones.
fn emit_routes<W,>(
    writer: &mut W,
    routes: &[String],
    rendered: Vec<RenderedRoute,>,
    pretty: bool,
    output: Option<&Path,>,
) -> Result<usize, Error,>
where
    W: Write,
{
    let mut failures = 0;

    for (path, outcome,) in routes.iter().zip(rendered,) {
        let mut failed = false;
        if let Some(error,) = &outcome.error {
            failed = true;
            warn!("{}: {}", path, error);
        }

        write_document(&mut *writer, &outcome.endpoint, pretty,)?;

        if let Some(directory,) = output {
            match artifact_stem(path,) {
                Some(stem,) => {
                    write_endpoint_badge(directory, &stem, &outcome.endpoint,)?;
                }
                None => {
                    failed = true;
                    warn!("{}: route has no usable file name, artifact skipped", path);
                }
            }
        }

        if failed {
            failures += 1;
        }
    }

    Ok(failures,)
}

/// Resolves every route concurrently and returns the results in input order.
async fn render_routes<S,>(source: Arc<S,>, routes: &[String],) -> Vec<RenderedRoute,>
where
    S: ReportSource + Send + Sync + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, path,) in routes.iter().cloned().enumerate() {
        let source = Arc::clone(&source,);
        tasks.spawn(async move { (index, render_route(source.as_ref(), &path,).await,) },);
    }

    let mut rendered: Vec<Option<RenderedRoute,>,> = routes.iter().map(|_| None,).collect();
    while let Some(joined,) = tasks.join_next().await {
        let (index, outcome,) = match joined {
            Ok(result,) => result,
            Err(error,) => std::panic::resume_unwind(error.into_panic(),),
        };
        rendered[index] = Some(outcome,);
    }

    rendered.into_iter().flatten().collect()
}

async fn render_route<S,>(source: &S, path: &str,) -> RenderedRoute
where
    S: ReportSource + Sync,
{
    let route = match Route::parse(path,) {
        Ok(route,) => route,
        Err(error,) => return failed(FALLBACK_LABEL, error,),
    };

    let pipeline = route.metric.pipeline();
    match route.resolve(source,).await {
        Ok(badge,) => RenderedRoute {
            endpoint: pipeline.endpoint(badge,),
            error:    None,
        },
        Err(error,) => failed(pipeline.label, error,),
    }
}

fn failed(label: &str, error: Error,) -> RenderedRoute
{
    RenderedRoute {
        endpoint: EndpointBadge::new(label, BadgeData::from_error(&error,),),
        error:    Some(error,),
    }
}

fn write_document<W, T,>(writer: &mut W, document: &T, pretty: bool,) -> Result<(), Error,>
where
    W: Write,
    T: Serialize + ?Sized,
{
    let written = if pretty {
        serde_json::to_writer_pretty(&mut *writer, document,)
    } else {
        serde_json::to_writer(&mut *writer, document,)
    };
    written.map_err(|error| if error.is_io() { output_error(error,) } else { Error::from(error,) },)?;
    writer.write_all(b"\n",).map_err(output_error,)?;

    Ok((),)
}
