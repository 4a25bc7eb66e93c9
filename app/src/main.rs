use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use common::{
    config::Config,
    plot::{Plot, PlotGroup},
    scan::scan_file,
};
use eyre::{Context, Result};
use plot_common::PngRenderer;
use tracing::debug;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod run;

#[derive(Parser)]
#[command(about = "Charts for the BST and OS-Tree experiment logs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// YAML file with settings and the plots to run
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Extra tracing directive, e.g. `bst_log=debug`
    #[arg(short, long, global = true)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every chart (default)
    All,
    /// Charts from the plain CSV tables
    Csv,
    /// Charts from the mixed BST section log
    Log {
        /// Log to read instead of the configured one
        path: Option<PathBuf>,
    },
    /// Charts from the OS-Tree experiment log
    Os {
        /// Log to read instead of the configured one
        path: Option<PathBuf>,
    },
    /// Print the parsed BST section log as JSON
    Dump { path: Option<PathBuf> },
    /// List configured plots
    Ls,
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("bst_plots={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in default_plots::PLOT_CRATES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_plots::init_plots();

    let config = load_config(args.config.as_deref())?;
    let plots = config
        .plots
        .clone()
        .unwrap_or_else(default_plots::default_plots);
    debug!("{} plots configured", plots.len());

    let renderer = PngRenderer::new(&config.settings);
    let (group, input) = match args.command.unwrap_or(Commands::All) {
        Commands::All => (None, None),
        Commands::Csv => (Some(PlotGroup::Csv), None),
        Commands::Log { path } => (Some(PlotGroup::Log), path),
        Commands::Os { path } => (Some(PlotGroup::Os), path),
        Commands::Dump { path } => {
            let path = path.unwrap_or_else(|| config.settings.bst_log.clone());
            let matrix = scan_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&matrix)?);
            return Ok(());
        }
        Commands::Ls => {
            list_plots(&plots);
            return Ok(());
        }
    };

    let selected = plots
        .into_iter()
        .filter(|p| group.is_none_or(|g| p.group() == g))
        .collect::<Vec<_>>();
    run::run_plots(&selected, &config.settings, input, &renderer)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = read_to_string(path).with_context(|| format!("Read {}", path.display()))?;
    serde_yml::from_str(&text).with_context(|| format!("Parse {}", path.display()))
}

fn list_plots(plots: &[Box<dyn Plot>]) {
    for plot in plots {
        println!(
            "{} -> {} ({})",
            plot.name(),
            plot.group(),
            plot.part().title()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const CONFIG: &str = "\
settings:
  graphs_dir: out
  width: 800
plots:
  - type: BstLog
  - type: OsOperations
";

    #[test]
    fn config_from_yaml() {
        default_plots::init_plots();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, CONFIG).unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.settings.graphs_dir, PathBuf::from("out"));
        assert_eq!(config.settings.width, 800);
        let plots = config.plots.unwrap();
        assert_eq!(plots.len(), 2);
        assert_eq!(plots[0].group(), PlotGroup::Log);
        assert_eq!(plots[1].name(), "OS operations");
    }

    #[test]
    fn no_config_is_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.settings, common::config::Settings::default());
        assert!(config.plots.is_none());
    }

    #[test]
    fn bad_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "settings:\n  colour: red\n").unwrap();
        assert!(load_config(Some(path.as_path())).is_err());
        let absent = dir.path().join("absent.yaml");
        assert!(load_config(Some(absent.as_path())).is_err());
    }

    #[test]
    fn cli_defaults_to_everything() {
        let cli = Cli::try_parse_from(["bst-plots"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["bst-plots", "log", "other.log", "--log", "bst_log=debug"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Log { path: Some(ref p) }) if p == Path::new("other.log")
        ));
        assert_eq!(cli.log, vec!["bst_log=debug".to_owned()]);
    }
}
