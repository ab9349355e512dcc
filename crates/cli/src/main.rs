mod error_presentation;

use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use drift_core::{
    Applier, Cancellation, Change, Dialect, DiffOptions, Differ, InspectOptions, Inspector,
    Realm, Registry,
};
use error_presentation::{CliError, CliResult, exit_code, render_runtime_error};

#[derive(Parser)]
#[command(name = "drift", version, about = "Declarative database schema management")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect, diff, plan, lint, and apply database schemas.
    #[command(subcommand)]
    Schema(SchemaCommand),
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// Print the schema of a live database as a declarative document.
    Inspect {
        #[arg(long)]
        url: String,
        /// Restrict inspection to these schemas.
        #[arg(long = "schema")]
        schemas: Vec<String>,
        /// Exclusion patterns, e.g. `*.audit_*` or `s*.t[12].c?[type=column]`.
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// Print the SQL plan that migrates `--from` to `--to`.
    Diff {
        /// Current state: a database URL or a declarative file.
        #[arg(long)]
        from: String,
        /// Desired state: a database URL or a declarative file.
        #[arg(long)]
        to: String,
        /// Dialect for file-based states (inferred from URLs otherwise).
        #[arg(long)]
        dialect: Option<String>,
        #[arg(long)]
        exclude: Vec<String>,
        /// Collapse structurally identical drop/add pairs into renames.
        #[arg(long)]
        detect_renames: bool,
    },
    /// Plan and execute the migration against a live database.
    Apply {
        #[arg(long)]
        url: String,
        /// Desired state: a declarative file.
        #[arg(long)]
        to: String,
        #[arg(long)]
        exclude: Vec<String>,
        /// Print the plan without executing it.
        #[arg(long)]
        dry_run: bool,
        /// Execute without the explicit approval flag.
        #[arg(long)]
        auto_approve: bool,
    },
    /// Lint the planned migration for dangerous or data-dependent changes.
    Lint {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        dialect: Option<String>,
        /// Declarative linter configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            let code = exit_code(&error);
            eprintln!("{}", render_runtime_error(error));
            ExitCode::from(code as u8)
        }
    }
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let registry = build_registry();
    let Command::Schema(command) = cli.command;
    match command {
        SchemaCommand::Inspect {
            url,
            schemas,
            exclude,
        } => cmd_inspect(&registry, &url, schemas, exclude),
        SchemaCommand::Diff {
            from,
            to,
            dialect,
            exclude,
            detect_renames,
        } => cmd_diff(&registry, &from, &to, dialect.as_deref(), exclude, detect_renames),
        SchemaCommand::Apply {
            url,
            to,
            exclude,
            dry_run,
            auto_approve,
        } => cmd_apply(&registry, &url, &to, exclude, dry_run, auto_approve),
        SchemaCommand::Lint {
            from,
            to,
            dialect,
            config,
            json,
        } => cmd_lint(&registry, &from, &to, dialect.as_deref(), config, json),
    }
}

fn build_registry() -> Registry {
    let mut registry = Registry::new();
    #[cfg(feature = "postgres")]
    registry.register(drift_dialect_postgres::dialect());
    #[cfg(feature = "mysql")]
    {
        registry.register(drift_dialect_mysql::dialect());
        registry.register(drift_dialect_mysql::mariadb_dialect());
    }
    #[cfg(feature = "sqlite")]
    registry.register(drift_dialect_sqlite::dialect());
    registry
}

/// A live connection usable for both introspection and apply.
trait Driver: Inspector + Applier {}

impl<T: Inspector + Applier> Driver for T {}

/// Where a schema state comes from: a live database or a declarative file.
enum Source {
    Url { driver: String, url: String },
    File(PathBuf),
}

fn parse_source(raw: &str) -> Source {
    let Some((scheme, _)) = raw.split_once("://") else {
        return Source::File(PathBuf::from(raw));
    };
    let driver = match scheme {
        "postgres" | "postgresql" => "postgres",
        "mysql" => "mysql",
        "mariadb" => "mariadb",
        "sqlite" => "sqlite",
        other => other,
    };
    Source::Url {
        driver: driver.to_string(),
        url: raw.to_string(),
    }
}

fn driver_name<'a>(sources: &'a [&Source], dialect: Option<&'a str>) -> CliResult<&'a str> {
    for source in sources {
        if let Source::Url { driver, .. } = source {
            return Ok(driver);
        }
    }
    dialect.ok_or_else(|| {
        CliError::Usage("pass --dialect when both states are declarative files".to_string())
    })
}

#[allow(unused_variables)]
fn connect_driver(driver: &str, url: &str) -> CliResult<Box<dyn Driver>> {
    match driver {
        #[cfg(feature = "postgres")]
        "postgres" => Ok(Box::new(drift_dialect_postgres::connect(url)?)),
        #[cfg(feature = "mysql")]
        "mysql" => Ok(Box::new(drift_dialect_mysql::connect(
            url,
            drift_dialect_mysql::Flavor::Mysql,
        )?)),
        #[cfg(feature = "mysql")]
        "mariadb" => Ok(Box::new(drift_dialect_mysql::connect(
            url,
            drift_dialect_mysql::Flavor::Mariadb,
        )?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = url.strip_prefix("sqlite://").unwrap_or(url);
            Ok(Box::new(drift_dialect_sqlite::connect(path)?))
        }
        other => Err(drift_core::Error::NotRegistered(other.to_string()).into()),
    }
}

fn load_realm_from(
    source: &Source,
    dialect: &Dialect,
    ctx: &Cancellation,
    opts: &InspectOptions,
) -> CliResult<Realm> {
    match source {
        Source::Url { driver, url } => {
            let mut driver = connect_driver(driver, url)?;
            Ok(driver.inspect_realm(ctx, opts)?)
        }
        Source::File(path) => {
            let document = fs::read_to_string(path).map_err(|source| CliError::ReadFile {
                path: path.clone(),
                source,
            })?;
            let file = path.to_string_lossy().into_owned();
            let mut realm = drift_dsl::load_realm(&document, &file, dialect)?;
            let patterns = opts
                .exclude
                .iter()
                .map(|pattern| drift_core::parse_pattern(pattern))
                .collect::<Result<Vec<_>, _>>()
                .map_err(drift_core::Error::from)?;
            drift_core::exclude(&mut realm, &patterns);
            Ok(realm)
        }
    }
}

fn diff_realms(
    dialect: &Dialect,
    from: &Realm,
    to: &Realm,
    detect_renames: bool,
) -> CliResult<Vec<Change>> {
    let mut options = DiffOptions::default();
    options.detect_renames = detect_renames;
    options.policy = dialect.policy.clone();
    Ok(Differ::new(options).realm_diff(from, to)?)
}

fn plan_for(dialect: &Dialect, desired: &Realm, changes: &[Change]) -> CliResult<drift_core::Plan> {
    let formatter = dialect
        .plan
        .bind_desired(desired)
        .unwrap_or_else(|| dialect.plan.clone());
    Ok(formatter.plan_changes("migration", changes)?)
}

fn cmd_inspect(
    registry: &Registry,
    url: &str,
    schemas: Vec<String>,
    exclude: Vec<String>,
) -> CliResult<ExitCode> {
    let source = parse_source(url);
    let Source::Url { ref driver, .. } = source else {
        return Err(CliError::Usage("inspect needs a database URL".to_string()));
    };
    let dialect = registry.get(driver)?;
    let opts = InspectOptions { schemas, exclude };
    let realm = load_realm_from(&source, &dialect, &Cancellation::new(), &opts)?;
    print!("{}", drift_dsl::encode_realm(&realm));
    Ok(ExitCode::SUCCESS)
}

fn cmd_diff(
    registry: &Registry,
    from: &str,
    to: &str,
    dialect: Option<&str>,
    exclude: Vec<String>,
    detect_renames: bool,
) -> CliResult<ExitCode> {
    let from_source = parse_source(from);
    let to_source = parse_source(to);
    let driver = driver_name(&[&from_source, &to_source], dialect)?.to_string();
    let dialect = registry.get(&driver)?;

    let ctx = Cancellation::new();
    let opts = InspectOptions {
        schemas: Vec::new(),
        exclude,
    };
    let from_realm = load_realm_from(&from_source, &dialect, &ctx, &opts)?;
    let to_realm = load_realm_from(&to_source, &dialect, &ctx, &opts)?;

    let changes = diff_realms(&dialect, &from_realm, &to_realm, detect_renames)?;
    if changes.is_empty() {
        println!("Schemas are synced, no changes to be made.");
        return Ok(ExitCode::SUCCESS);
    }
    let plan = plan_for(&dialect, &to_realm, &changes)?;
    print!("{}", plan.render());
    Ok(ExitCode::SUCCESS)
}

fn cmd_apply(
    registry: &Registry,
    url: &str,
    to: &str,
    exclude: Vec<String>,
    dry_run: bool,
    auto_approve: bool,
) -> CliResult<ExitCode> {
    let source = parse_source(url);
    let Source::Url { ref driver, url: ref driver_url } = source else {
        return Err(CliError::Usage("apply needs a database URL".to_string()));
    };
    let dialect = registry.get(driver)?;

    let ctx = Cancellation::new();
    let opts = InspectOptions {
        schemas: Vec::new(),
        exclude,
    };
    let from_realm = load_realm_from(&source, &dialect, &ctx, &opts)?;
    let to_realm = load_realm_from(&parse_source(to), &dialect, &ctx, &opts)?;

    let changes = diff_realms(&dialect, &from_realm, &to_realm, false)?;
    if changes.is_empty() {
        println!("Schemas are synced, no changes to be made.");
        return Ok(ExitCode::SUCCESS);
    }
    let plan = plan_for(&dialect, &to_realm, &changes)?;
    print!("{}", plan.render());

    if dry_run {
        return Ok(ExitCode::SUCCESS);
    }
    if !auto_approve {
        println!("-- Re-run with --auto-approve to execute this plan.");
        return Ok(ExitCode::SUCCESS);
    }

    let mut driver = connect_driver(driver, driver_url)?;
    driver.execute_plan(&ctx, &plan)?;
    println!("-- Applied {} statement(s).", plan.statements.len());
    Ok(ExitCode::SUCCESS)
}

fn cmd_lint(
    registry: &Registry,
    from: &str,
    to: &str,
    dialect: Option<&str>,
    config: Option<PathBuf>,
    json: bool,
) -> CliResult<ExitCode> {
    let from_source = parse_source(from);
    let to_source = parse_source(to);
    let driver = driver_name(&[&from_source, &to_source], dialect)?.to_string();
    let dialect = registry.get(&driver)?;

    let ctx = Cancellation::new();
    let opts = InspectOptions::default();
    let from_realm = load_realm_from(&from_source, &dialect, &ctx, &opts)?;
    let to_realm = load_realm_from(&to_source, &dialect, &ctx, &opts)?;

    let changes = diff_realms(&dialect, &from_realm, &to_realm, false)?;
    let formatter = dialect
        .plan
        .bind_desired(&to_realm)
        .unwrap_or_else(|| dialect.plan.clone());
    let (file, groups) =
        drift_lint::pass_parts_for_changes(formatter.as_ref(), "migration.sql", &changes)?;

    let config_resource = match config {
        Some(path) => {
            let document = fs::read_to_string(&path)
                .map_err(|source| CliError::ReadFile { path, source })?;
            Some(drift_dsl::parse_document(&document, "lint.dft").map_err(drift_core::Error::from)?)
        }
        None => None,
    };

    let pass = drift_lint::Pass::new(&file, &groups, None);
    let pipeline = drift_lint::Pipeline::for_driver(&driver, config_resource.as_ref());
    let (report, fatal) = pipeline.run(&pass);

    if json {
        println!("{}", report.to_json());
    } else {
        for diagnostic in &report.diagnostics {
            println!(
                "{}:{} {} {}",
                report.file, diagnostic.pos, diagnostic.code, diagnostic.text
            );
        }
        println!(
            "-- {} diagnostic(s) reported for {}",
            report.diagnostics.len(),
            report.file
        );
    }

    match fatal {
        Some(fatal) => Err(drift_core::Error::Lint(fatal).into()),
        None => Ok(ExitCode::SUCCESS),
    }
}
