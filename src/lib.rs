pub mod config;
pub mod index;
pub mod model;
pub mod render;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};

use config::{ColorChoice, SearchConfig};
use index::{ALL_SECTION, MatchMode, SearchIndexSet, SearchIndexTable, SharedIndex};
use render::{LookupReport, render_summary, render_text};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "dxs",
    version,
    about = "Search Doxygen search-index tables from the terminal"
)]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Colorize output
    #[arg(long, value_enum, global = true)]
    pub color: Option<ColorChoice>,

    /// Log debug output to stderr
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find entries whose term matches QUERY
    Lookup {
        /// Search script (e.g. search/all_a.js), JSON export, or search/ directory
        index: PathBuf,
        query: String,
        #[command(flatten)]
        opts: QueryOpts,
    },
    /// Print every entry of a section
    List {
        index: PathBuf,
        #[arg(long, default_value = ALL_SECTION)]
        section: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate an index and report entry counts
    Check { index: PathBuf },
    /// Dump a section as JSON
    Export {
        index: PathBuf,
        #[arg(long, default_value = ALL_SECTION)]
        section: String,
    },
    /// Answer queries read line by line from stdin
    Repl {
        index: PathBuf,
        /// Reload the index when it changes on disk
        #[arg(long, default_value_t = false)]
        watch: bool,
        #[command(flatten)]
        opts: QueryOpts,
    },
    /// Print version and build information
    Version {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

#[derive(clap::Args, Debug, Clone)]
pub struct QueryOpts {
    /// Matching policy (overrides config)
    #[arg(long, value_enum)]
    pub mode: Option<MatchMode>,
    /// Maximum hits to print (overrides config)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Index section to search (all, classes, functions, ...)
    #[arg(long, default_value = ALL_SECTION)]
    pub section: String,
    /// Emit one JSON document per lookup
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// What a successful command produced; drives the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    NoHits,
}

/// Settings a command runs with after config, env and flags are merged.
#[derive(Debug, Clone)]
struct Effective {
    mode: MatchMode,
    limit: Option<usize>,
    color: bool,
}

pub fn run(cli: Cli) -> Result<Outcome> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    run_with(cli, &mut out, &mut input)
}

pub fn run_with(cli: Cli, out: &mut impl Write, input: &mut impl BufRead) -> Result<Outcome> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let mut cfg = SearchConfig::from_file(path)?;
            cfg.apply_env();
            cfg
        }
        None => SearchConfig::load()?,
    };
    if let Some(color) = cli.color {
        cfg.color = color;
    }
    let color = color_enabled(cfg.color);

    match cli.command {
        Commands::Lookup { index, query, opts } => {
            let set = open_index(&index)?;
            let eff = effective(&cfg, &opts, color);
            let table = section(&set, &opts.section)?;
            let found = write_lookup(out, table, &query, &opts, &eff)?;
            Ok(if found == 0 { Outcome::NoHits } else { Outcome::Done })
        }
        Commands::List { index, section: name, json } => {
            let set = open_index(&index)?;
            let table = section(&set, &name)?;
            let opts = QueryOpts {
                mode: Some(MatchMode::Prefix),
                limit: None,
                section: name,
                json,
            };
            let eff = Effective {
                mode: MatchMode::Prefix,
                limit: None,
                color,
            };
            write_lookup(out, table, "", &opts, &eff)?;
            Ok(Outcome::Done)
        }
        Commands::Check { index } => {
            let set = open_index(&index)?;
            let sections: Vec<(&str, usize)> = set
                .section_names()
                .filter_map(|name| set.section(name).map(|t| (name, t.len())))
                .collect();
            let (entries, references) = set
                .section_names()
                .filter_map(|name| set.section(name))
                .fold((0, 0), |(e, r), t| (e + t.len(), r + t.reference_count()));
            writeln!(out, "{}", render_summary(entries, references, &sections))?;
            Ok(Outcome::Done)
        }
        Commands::Export { index, section: name } => {
            let set = open_index(&index)?;
            let table = section(&set, &name)?;
            writeln!(out, "{}", table.to_json()?)?;
            Ok(Outcome::Done)
        }
        Commands::Repl { index, watch, opts } => {
            let shared = SharedIndex::open(&index)
                .with_context(|| format!("loading search index {}", index.display()))?;
            let _watcher = if watch {
                Some(
                    shared
                        .watch(&index)
                        .with_context(|| format!("watching {}", index.display()))?,
                )
            } else {
                None
            };
            let eff = effective(&cfg, &opts, color);
            run_repl(&shared, input, out, &opts, &eff)?;
            Ok(Outcome::Done)
        }
        Commands::Version { json } => {
            write_version(out, json)?;
            Ok(Outcome::Done)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dxs", out);
            Ok(Outcome::Done)
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            man.render(out)?;
            Ok(Outcome::Done)
        }
    }
}

fn effective(cfg: &SearchConfig, opts: &QueryOpts, color: bool) -> Effective {
    Effective {
        mode: opts.mode.unwrap_or(cfg.match_mode),
        limit: opts.limit.or(cfg.limit),
        color,
    }
}

fn color_enabled(choice: ColorChoice) -> bool {
    use std::io::IsTerminal;
    let enabled = match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && dotenvy::var("NO_COLOR").is_err(),
    };
    colored::control::set_override(enabled);
    enabled
}

fn open_index(path: &Path) -> Result<SearchIndexSet> {
    SearchIndexSet::load_path(path).with_context(|| format!("loading search index {}", path.display()))
}

fn section<'a>(set: &'a SearchIndexSet, name: &str) -> Result<&'a SearchIndexTable> {
    set.section(name).ok_or_else(|| {
        let available: Vec<&str> = set.section_names().collect();
        anyhow!(
            "unknown section {name:?} (available: {})",
            available.join(", ")
        )
    })
}

/// Write one lookup's hits; returns the number of matches before limiting.
fn write_lookup(
    out: &mut impl Write,
    table: &SearchIndexTable,
    query: &str,
    opts: &QueryOpts,
    eff: &Effective,
) -> Result<usize> {
    let lookup = table.lookup_with(query, eff.mode);
    let needle = lookup.query().to_string();
    let total = lookup.clone().count();
    let hits: Vec<_> = lookup.take(eff.limit.unwrap_or(usize::MAX)).collect();
    tracing::debug!(query, mode = %eff.mode, total, shown = hits.len(), "lookup");

    if opts.json {
        let report = LookupReport::new(query, eff.mode, &opts.section, total, &hits);
        writeln!(out, "{}", report.to_json()?)?;
    } else {
        write!(out, "{}", render_text(&hits, &needle, eff.color))?;
        if hits.len() < total {
            writeln!(out, "... {} more", total - hits.len())?;
        }
    }
    Ok(total)
}

fn run_repl(
    shared: &SharedIndex,
    input: &mut impl BufRead,
    out: &mut impl Write,
    opts: &QueryOpts,
    eff: &Effective,
) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == ":quit" || query == ":q" {
            return Ok(());
        }

        // Fresh snapshot per query so a reload is picked up between lines.
        let snapshot = shared.snapshot();
        match snapshot.section(&opts.section) {
            Some(table) => {
                let found = write_lookup(out, table, query, opts, eff)?;
                if found == 0 && !opts.json {
                    writeln!(out, "no results")?;
                }
            }
            None => writeln!(out, "unknown section {:?}", opts.section)?,
        }
        if !opts.json {
            writeln!(out)?;
        }
        out.flush()?;
    }
}

fn write_version(out: &mut impl Write, json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let target = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");
    let built = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown");
    if json {
        let doc = serde_json::json!({
            "version": version,
            "target": target,
            "build_timestamp": built,
        });
        writeln!(out, "{doc}")?;
    } else {
        writeln!(out, "dxs {version} ({target}, built {built})")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const TABLE: &str = "var searchData=[
        ['point2d_2',['point2d',['../classPoint2D.html',1,'Point2D']]],
        ['point3d_3',['point3d',['../classPoint3D.html',1,'Point3D']]],
        ['present_4',['present',['../classRenderer.html#a7d85',1,'Renderer']]]
    ];";

    fn fixture() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_a.js");
        std::fs::write(&path, TABLE).unwrap();
        (dir, path)
    }

    fn run_args(args: &[&str], stdin: &str) -> (Outcome, String) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let mut input = Cursor::new(stdin.as_bytes().to_vec());
        let outcome = run_with(cli, &mut out, &mut input).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn lookup_limit_reports_remaining() {
        let (_dir, path) = fixture();
        let p = path.to_str().unwrap();
        let (outcome, out) = run_args(&["dxs", "--color", "never", "lookup", p, "p", "--limit", "1"], "");
        assert_eq!(outcome, Outcome::Done);
        assert!(out.starts_with("point2d (Point2D)\n"), "{out}");
        assert!(out.ends_with("... 2 more\n"), "{out}");
    }

    #[test]
    fn lookup_without_hits_is_reported() {
        let (_dir, path) = fixture();
        let p = path.to_str().unwrap();
        let (outcome, out) = run_args(&["dxs", "--color", "never", "lookup", p, "zzz"], "");
        assert_eq!(outcome, Outcome::NoHits);
        assert!(out.is_empty());
    }

    #[test]
    fn repl_answers_each_line() {
        let (_dir, path) = fixture();
        let p = path.to_str().unwrap();
        let (_, out) = run_args(
            &["dxs", "--color", "never", "repl", p],
            "point3\n\nnothing\n:quit\npresent\n",
        );
        assert!(out.contains("point3d (Point3D)"), "{out}");
        assert!(out.contains("no results"), "{out}");
        assert!(!out.contains("Renderer"), "repl should stop at :quit: {out}");
    }

    #[test]
    fn unknown_section_is_an_error() {
        let (_dir, path) = fixture();
        let cli = Cli::try_parse_from(["dxs", "lookup", path.to_str().unwrap(), "p", "--section", "classes"]).unwrap();
        let err = run_with(cli, &mut Vec::new(), &mut Cursor::new(Vec::new())).unwrap_err();
        assert!(err.to_string().contains("unknown section"), "{err}");
    }
}
