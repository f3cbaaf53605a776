use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use privacy_manager::config::Config;
use privacy_manager::settings::catalog::SettingsCatalog;
use privacy_manager::state::library::Library;
use privacy_manager::state::loader::{AppListLoader, RowPolicy};
use privacy_manager::state::query::{AppQuery, AppType};
use privacy_manager::Error;

/// List installed applications and their privacy settings
#[derive(Parser, Debug)]
#[command(name = "privacy-manager", version, about)]
struct Cli {
    /// Only show this package
    package: Option<String>,

    /// Only show applications holding this permission
    #[arg(long, conflicts_with_all = ["package", "group"])]
    permission: Option<String>,

    /// Only show applications affected by this setting group
    #[arg(long, conflicts_with = "package")]
    group: Option<String>,

    #[arg(long = "type", value_enum, default_value = "all")]
    app_type: TypeArg,

    /// Database to read instead of the configured one
    #[arg(long)]
    db: Option<PathBuf>,

    /// Skip rows that fail to decode instead of aborting
    #[arg(long)]
    skip_corrupt: bool,

    /// Also print each application's setting selections
    #[arg(long)]
    settings: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TypeArg {
    All,
    User,
    System,
}

impl From<TypeArg> for AppType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::All => AppType::All,
            TypeArg::User => AppType::User,
            TypeArg::System => AppType::System,
        }
    }
}

impl Cli {
    fn query(&self) -> AppQuery {
        let query = if let Some(package) = &self.package {
            AppQuery::package(package.clone())
        } else if let Some(permission) = &self.permission {
            AppQuery::permission(permission.clone())
        } else if let Some(group) = &self.group {
            AppQuery::setting_group(group.clone())
        } else {
            AppQuery::all()
        };
        query.with_app_type(self.app_type.into())
    }
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,privacy_manager=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> privacy_manager::Result<()> {
    let mut config = Config::load()?;
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    if cli.skip_corrupt {
        config.corrupt_rows = RowPolicy::Skip;
    }

    let library = Library::open(&config.database_path)?;
    info!(applications = library.application_count()?, "store ready");

    let catalog = match (&config.settings_catalog, cli.settings) {
        (Some(path), true) => Some(SettingsCatalog::load(path)?),
        (None, true) => {
            error!("no settings catalog configured; ignoring --settings");
            None
        }
        _ => None,
    };

    let loader = AppListLoader::new(cli.query()).with_policy(config.corrupt_rows);
    let applications = loader.load_matching(library.connection())?;

    for application in &applications {
        println!(
            "{:<40} {:<30} v{:<8} uid {:<6} {}{}",
            application.package_name,
            application.label,
            application.version_code,
            application.uid,
            if application.is_system_app() { "system" } else { "user" },
            if application.is_untrusted() { " untrusted" } else { "" },
        );

        if let Some(catalog) = &catalog {
            for setting in library.load_app_settings(&application.package_name, catalog)? {
                let outcome = setting
                    .selected_core_outcome()
                    .map_or_else(|| "-".to_string(), |outcome| format!("{outcome:?}"));
                println!(
                    "    {:<32} {:<16} {}",
                    setting.setting().title,
                    setting.selected_option_label().unwrap_or("unset"),
                    outcome,
                );
            }
        }
    }

    library.close()
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::NoResults) => {
            eprintln!("No applications match. Has the store been populated yet?");
            ExitCode::from(2)
        }
        Err(err) => {
            error!(error = %err, "privacy-manager failed");
            ExitCode::FAILURE
        }
    }
}
