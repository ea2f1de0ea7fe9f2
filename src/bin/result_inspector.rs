use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use trajview::api::{
    DocumentSource, FsDocumentSource, ViewParams, ViewStatus, ViewerConfig, derive_view,
};
use trajview::core::{
    ExperimentDocument, HiddenSet, SolutionControlTable, SolutionMatrix, SolutionRow, SortState,
    Uid, rank_solutions, solution_matrices,
};

const USAGE: &str = "usage: result_inspector <rank|flatten|relative|table|manifest> --root <dir> [--config <path>] [--file <name>] [--group <name>] [--show <uid,...>|all] [--output <path>]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Rank,
    Flatten,
    Relative,
    Table,
    Manifest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShowFilter {
    All,
    Only(Vec<String>),
}

#[derive(Debug)]
struct CliArgs {
    command: CommandKind,
    root: PathBuf,
    config: Option<PathBuf>,
    file: Option<String>,
    group: Option<String>,
    show: ShowFilter,
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TableReport<'a> {
    visible: usize,
    total: usize,
    rows: Vec<&'a SolutionRow>,
    matrices: Vec<SolutionMatrix>,
}

fn main() {
    let _ = trajview::telemetry::init_default_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path).map_err(|err| err.to_string())?,
        None => ViewerConfig::default(),
    };
    config.results_root = args.root.clone();
    if let Some(group) = &args.group {
        config = config.with_default_group(group.as_str());
    }
    let source = FsDocumentSource::from_config(&config);

    match args.command {
        CommandKind::Manifest => {
            let manifest = source.fetch_manifest().map_err(|err| err.to_string())?;
            emit(args.output.as_ref(), &manifest.sections())
        }
        CommandKind::Rank => {
            let (document, _) = load_document(&source, &args, &config)?;
            let ranking = rank_solutions(document.data.values());
            let entries: Vec<_> = ranking.iter().collect();
            emit(args.output.as_ref(), &entries)
        }
        CommandKind::Flatten => {
            let (document, params) = load_document(&source, &args, &config)?;
            let snapshot = derive_view(&document, &params, &config);
            if let ViewStatus::Error { message } = &snapshot.status {
                return Err(message.clone());
            }
            emit(
                args.output.as_ref(),
                &serde_json::json!({
                    "records": snapshot.records,
                    "lines": snapshot.lines,
                }),
            )
        }
        CommandKind::Relative => {
            let (document, params) = load_document(&source, &args, &config)?;
            let snapshot = derive_view(&document, &params.with_relative(true), &config);
            if let ViewStatus::Error { message } = &snapshot.status {
                return Err(message.clone());
            }
            emit(args.output.as_ref(), &snapshot.relative)
        }
        CommandKind::Table => {
            let (document, params) = load_document(&source, &args, &config)?;
            let ranking = rank_solutions(document.data.values());
            let table = SolutionControlTable::build(&document, &ranking, &params.hidden);
            let report = TableReport {
                visible: table.visible_count(),
                total: table.len(),
                rows: table.sorted(SortState::default()),
                matrices: solution_matrices(&document, &ranking, true),
            };
            emit(args.output.as_ref(), &report)
        }
    }
}

fn load_document(
    source: &FsDocumentSource,
    args: &CliArgs,
    config: &ViewerConfig,
) -> Result<(ExperimentDocument, ViewParams), String> {
    let file = args
        .file
        .as_deref()
        .ok_or_else(|| format!("missing --file\n{USAGE}"))?;
    let document = source.fetch_document(file).map_err(|err| err.to_string())?;
    let params = ViewParams::new(config.default_group.as_str())
        .with_file(file)
        .with_hidden(hidden_set(&document, &args.show));
    Ok((document, params))
}

fn hidden_set(document: &ExperimentDocument, show: &ShowFilter) -> HiddenSet {
    match show {
        ShowFilter::All => HiddenSet::new(),
        ShowFilter::Only(uids) => {
            let shown: Vec<Uid> = uids.iter().map(|raw| Uid::from_name(raw)).collect();
            HiddenSet::all_candidates(document)
                .iter()
                .filter(|id| !shown.contains(&id.uid))
                .cloned()
                .collect()
        }
    }
}

fn emit<T: Serialize>(output: Option<&PathBuf>, value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| format!("failed to serialize json: {err}"))?;
    match output {
        Some(path) => fs::write(path, payload)
            .map_err(|err| format!("failed to write `{}`: {err}", path.display())),
        None => {
            println!("{payload}");
            Ok(())
        }
    }
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let command = match args.next().as_deref() {
        Some("rank") => CommandKind::Rank,
        Some("flatten") => CommandKind::Flatten,
        Some("relative") => CommandKind::Relative,
        Some("table") => CommandKind::Table,
        Some("manifest") => CommandKind::Manifest,
        _ => return Err(USAGE.to_owned()),
    };

    let mut root = None::<PathBuf>;
    let mut config = None::<PathBuf>;
    let mut file = None::<String>;
    let mut group = None::<String>;
    let mut show = ShowFilter::All;
    let mut output = None::<PathBuf>;

    while let Some(flag) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| format!("missing value for {name}"))
        };
        match flag.as_str() {
            "--root" => root = Some(PathBuf::from(value("--root")?)),
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--file" => file = Some(value("--file")?),
            "--group" => group = Some(value("--group")?),
            "--show" => {
                let raw = value("--show")?;
                show = if raw == "all" {
                    ShowFilter::All
                } else {
                    ShowFilter::Only(
                        raw.split(',')
                            .map(str::trim)
                            .filter(|uid| !uid.is_empty())
                            .map(str::to_owned)
                            .collect(),
                    )
                };
            }
            "--output" => output = Some(PathBuf::from(value("--output")?)),
            "--help" | "-h" => return Err(USAGE.to_owned()),
            _ => return Err(format!("unknown argument `{flag}`")),
        }
    }

    let root = root.ok_or_else(|| "missing --root".to_owned())?;
    Ok(CliArgs {
        command,
        root,
        config,
        file,
        group,
        show,
        output,
    })
}
