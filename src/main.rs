use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gsat_advisor::catalog::cache::get_or_load;
use gsat_advisor::catalog::loader::LoadedCatalog;
use gsat_advisor::config::{Config, ConfigOverrides};
use gsat_advisor::criteria::Subject;
use gsat_advisor::eligibility::classifier::evaluate_program;
use gsat_advisor::output::csv::{catalog_to_csv, session_to_csv};
use gsat_advisor::output::json::render_json;
use gsat_advisor::output::table::{
    render_catalog_table, render_explanation, render_removals, render_session_table,
};
use gsat_advisor::profile::{Allocation, SchoolFilter, StudentProfile};
use gsat_advisor::reason::explain;
use gsat_advisor::server::run_server;
use gsat_advisor::session::{AllocationSession, RemovalOutcome, SessionView};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "gsat-advisor",
    about = "Tiered GSAT program recommendations"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Program dataset CSV; overrides the config file.
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct ProfileArgs {
    /// SUBJECT=LEVEL, e.g. 國=14 or english=12. Repeatable.
    #[arg(short, long = "score", value_parser = parse_score_arg)]
    scores: Vec<(Subject, i64)>,
    #[arg(short, long = "interest")]
    interests: Vec<String>,
    #[arg(long)]
    school: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Recommend {
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(long)]
        conservative: Option<u32>,
        #[arg(long)]
        realistic: Option<u32>,
        #[arg(long)]
        ambitious: Option<u32>,
        #[arg(long)]
        total: Option<u32>,
        /// Program name to discard from the shown list. Repeatable, applied in order.
        #[arg(long = "discard")]
        discards: Vec<String>,
    },
    Explain {
        #[arg(long)]
        program: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    Catalog,
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Serialize)]
struct RecommendReport<'a> {
    session: &'a SessionView,
    removals: &'a [RemovalOutcome],
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        catalog_path: cli.catalog.clone(),
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        let host = host.clone().unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let loaded = get_or_load(config.resolved_catalog_path().as_deref())?;

    match &cli.command {
        Commands::Recommend {
            profile,
            conservative,
            realistic,
            ambitious,
            total,
            discards,
        } => {
            let defaults = config.default_allocation();
            let allocation = Allocation::new(
                conservative.unwrap_or(defaults.conservative),
                realistic.unwrap_or(defaults.realistic),
                ambitious.unwrap_or(defaults.ambitious),
            );
            let student = build_profile(profile, &loaded)?.with_allocation(allocation);
            let total = total.unwrap_or(config.allocation.total);

            let mut session = AllocationSession::build(&loaded.catalog, student, total);
            let mut removals = Vec::new();
            for name in discards {
                let Some(item) = session.find_shown_by_name(name) else {
                    warn!("{name} is not among the shown recommendations, skipping discard");
                    continue;
                };
                let (tier, item_id) = (item.tier, item.id.clone());
                removals.push(session.remove_and_replenish(tier, &item_id)?);
            }
            print_recommendations(&session.view("cli"), &removals, cli.output)?;
        }
        Commands::Explain { program, profile } => {
            let target = loaded
                .catalog
                .find(program)
                .ok_or_else(|| anyhow!("program {program} not found in catalog"))?;
            let student = build_profile(profile, &loaded)?;
            let evaluation = evaluate_program(target, &student.scores);
            let reason = explain(&evaluation, target.group());
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_explanation(target, &evaluation, &reason));
                    if !reason.details.is_empty() {
                        println!("{}", reason.details);
                    }
                }
                OutputFormat::Json | OutputFormat::Csv => {
                    if matches!(cli.output, OutputFormat::Csv) {
                        warn!("CSV output for explain not implemented, using JSON");
                    }
                    let payload = serde_json::json!({
                        "program": target,
                        "evaluation": evaluation,
                        "reason": reason,
                    });
                    println!("{}", render_json(&payload)?);
                }
            }
        }
        Commands::Catalog => print_catalog(&loaded, cli.output)?,
        Commands::Serve { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &Path) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn parse_score_arg(raw: &str) -> std::result::Result<(Subject, i64), String> {
    let (subject, level) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SUBJECT=LEVEL, got {raw}"))?;
    let subject = Subject::from_str(subject).map_err(|e| e.to_string())?;
    let level = level
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid level for {subject}: {e}"))?;
    Ok((subject, level))
}

fn build_profile(args: &ProfileArgs, loaded: &LoadedCatalog) -> Result<StudentProfile> {
    let mut profile = StudentProfile::new().with_school(SchoolFilter::from(args.school.clone()));
    for (subject, level) in &args.scores {
        if profile.score(*subject).is_some() {
            return Err(anyhow!("subject {subject} given more than once"));
        }
        profile = profile.with_score(*subject, *level);
    }
    for interest in &args.interests {
        if !loaded.catalog.groups.contains(interest) {
            warn!("interest {interest} matches no group in the catalog");
        }
        profile = profile.with_interest(interest);
    }
    if let SchoolFilter::Only(school) = &profile.school {
        if !loaded.catalog.schools.contains(school) {
            warn!("school {school} matches no program in the catalog");
        }
    }
    Ok(profile)
}

fn print_recommendations(
    view: &SessionView,
    removals: &[RemovalOutcome],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if !removals.is_empty() {
                println!("{}", render_removals(removals));
                for removal in removals {
                    println!("{}", removal.message);
                }
            }
            println!("{}", render_session_table(view));
        }
        OutputFormat::Json => println!(
            "{}",
            render_json(&RecommendReport {
                session: view,
                removals,
            })?
        ),
        OutputFormat::Csv => print!("{}", session_to_csv(view)?),
    }
    Ok(())
}

fn print_catalog(loaded: &LoadedCatalog, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_catalog_table(loaded)),
        OutputFormat::Json => println!(
            "{}",
            render_json(&serde_json::json!({
                "catalog": loaded.catalog,
                "report": loaded.report,
            }))?
        ),
        OutputFormat::Csv => print!("{}", catalog_to_csv(&loaded.catalog)?),
    }
    Ok(())
}
