//! Command dispatch: each subcommand opens a session, acts, and reports.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use serde_json::json;
use tracing::{debug, instrument};

use crate::application::services::WeightService;
use crate::application::{ApplicationError, WeightSession};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::tree_view::TreeNodeConvert;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{BalanceStatus, NodeId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::InvalidArgs(
            "no command given, see --help".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(cli, command, &RealFileSystem),
        command => {
            let settings = Settings::load(cli.data_dir.as_deref())?;
            let container = ServiceContainer::new(settings);
            run(cli, command, &container)
        }
    }
}

fn run(cli: &Cli, command: &Commands, container: &ServiceContainer) -> CliResult<()> {
    let tree_path = container.tree_path(cli.tree.as_ref());
    let weights_path = container.weights_path(cli.weights.as_ref());
    debug!(
        "tree: {}, weights: {}",
        tree_path.display(),
        weights_path.display()
    );
    let mut session = container.weights.open(&tree_path, &weights_path)?;

    match command {
        Commands::Show { json } => cmd_show(&session, *json),
        Commands::Set { node, percent } => {
            cmd_set(&container.weights, &mut session, &weights_path, node, *percent)
        }
        Commands::Equalize { parent, siblings } => cmd_equalize(
            &container.weights,
            &mut session,
            &weights_path,
            parent.as_deref(),
            siblings,
        ),
        Commands::Reset => {
            session.reset_defaults();
            container.weights.save(&session, &weights_path)?;
            output::action("Reset", &weights_path.display());
            Ok(())
        }
        Commands::Stats => cmd_stats(&session),
        Commands::Check => cmd_check(&session),
        Commands::Export => {
            let json = WeightService::to_json(&session.flush())?;
            print!("{json}");
            Ok(())
        }
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(level = "debug", skip(session))]
fn cmd_show(session: &WeightSession, as_json: bool) -> CliResult<()> {
    if as_json {
        let nodes: Vec<_> = session
            .views()
            .into_iter()
            .map(|(id, view)| {
                json!({
                    "id": id,
                    "local_percentage": view.local_percentage,
                    "effective_weight": view.effective_weight,
                })
            })
            .collect();
        let text = serde_json::to_string_pretty(&nodes).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialize node views".to_string(),
                source: Box::new(e),
            }
        })?;
        output::info(&text);
    } else {
        output::info(&session.to_tree_string());
    }
    Ok(())
}

#[instrument(level = "debug", skip(service, session))]
fn cmd_set(
    service: &WeightService,
    session: &mut WeightSession,
    weights_path: &Path,
    node: &str,
    percent: f64,
) -> CliResult<()> {
    let id = NodeId::from(node);
    let view = session
        .set_local_percentage(&id, percent)
        .map_err(ApplicationError::from)?;
    service.save(session, weights_path)?;
    output::action(
        "Set",
        &format!(
            "{id}: {} of parent, {} overall",
            output::percent(view.local_percentage),
            output::percent(view.effective_weight * 100.0)
        ),
    );
    if percent < 0.0 {
        output::warning(&format!("negative percentage {percent} stored as 0"));
    }
    Ok(())
}

#[instrument(level = "debug", skip(service, session))]
fn cmd_equalize(
    service: &WeightService,
    session: &mut WeightSession,
    weights_path: &Path,
    parent: Option<&str>,
    siblings: &[String],
) -> CliResult<()> {
    let parent = parent.map(NodeId::from);
    if siblings.is_empty() {
        session
            .equidistribute_children(parent.as_ref())
            .map_err(ApplicationError::from)?;
    } else {
        let ids: Vec<NodeId> = siblings.iter().map(|s| NodeId::from(s.as_str())).collect();
        session
            .equidistribute(parent.as_ref(), &ids)
            .map_err(ApplicationError::from)?;
    }
    service.save(session, weights_path)?;
    let scope = parent
        .map(|p| p.to_string())
        .unwrap_or_else(|| "root level".to_string());
    output::action("Equalized", &scope);
    Ok(())
}

fn cmd_stats(session: &WeightSession) -> CliResult<()> {
    let stats = session.stats();
    output::header("Requirement weights");
    output::detail(&format!("count:   {}", stats.count));
    output::detail(&format!("total:   {}", output::percent(stats.total)));
    output::detail(&format!("average: {}", output::percent(stats.average)));
    if let Some(max) = &stats.max {
        output::detail(&format!(
            "max:     {} ({} {})",
            output::percent(max.percent),
            max.code,
            max.id
        ));
    }
    if let Some(min) = &stats.min {
        output::detail(&format!(
            "min:     {} ({} {})",
            output::percent(min.percent),
            min.code,
            min.id
        ));
    }
    Ok(())
}

fn cmd_check(session: &WeightSession) -> CliResult<()> {
    let totals = session.sibling_totals();
    let mut unbalanced = 0;
    output::header("Sibling totals");
    for total in &totals {
        let scope = total
            .parent
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "(root)".to_string());
        let line = format!(
            "{scope}: {} over {} sibling(s)",
            output::percent(total.total_pct),
            total.siblings
        );
        match total.status {
            BalanceStatus::Balanced => output::success_detail(&line),
            BalanceStatus::Empty => output::detail(&format!("{line} (empty)")),
            BalanceStatus::Unbalanced => {
                unbalanced += 1;
                output::failure(&line);
            }
        }
    }
    if unbalanced > 0 {
        return Err(CliError::Unbalanced(unbalanced));
    }
    output::success("all sibling groups balanced");
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands, fs: &dyn FileSystem) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.data_dir.as_deref())?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| ApplicationError::Config {
                    message: "cannot determine global config directory".to_string(),
                })?
            } else {
                let dir = cli.data_dir.clone().unwrap_or_else(|| ".".into());
                local_config_path(&dir)
            };
            if fs.exists(&path) {
                return Err(ApplicationError::Config {
                    message: format!("config already exists: {}", path.display()),
                }
                .into());
            }
            fs.ensure_parent(&path)
                .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
            fs.write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::info(&format!("global: {}", p.display())),
                None => output::info("global: (unavailable)"),
            }
            let dir = cli.data_dir.clone().unwrap_or_else(|| ".".into());
            output::info(&format!("local:  {}", local_config_path(&dir).display()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory filesystem recording every write.
    #[derive(Default)]
    struct MemoryFileSystem {
        existing: Vec<PathBuf>,
        written: Mutex<Vec<PathBuf>>,
    }

    impl FileSystem for MemoryFileSystem {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
        }

        fn write(&self, path: &Path, _content: &str) -> io::Result<()> {
            self.written
                .lock()
                .map_err(|_| io::Error::other("poisoned"))?
                .push(path.to_path_buf());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.existing.iter().any(|p| p == path)
        }

        fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
            Ok(())
        }
    }

    fn init_in(dir: &str) -> (Cli, ConfigCommands) {
        let cli = Cli::try_parse_from(["rfpweights", "-C", dir, "config", "init"]).unwrap();
        (cli, ConfigCommands::Init { global: false })
    }

    #[test]
    fn given_no_local_config_when_init_then_written_through_filesystem() {
        let fs = MemoryFileSystem::default();
        let (cli, command) = init_in("/data");

        cmd_config(&cli, &command, &fs).unwrap();

        let written = fs.written.lock().unwrap();
        assert_eq!(*written, vec![local_config_path(Path::new("/data"))]);
    }

    #[test]
    fn given_existing_local_config_when_init_then_config_error_and_no_write() {
        let fs = MemoryFileSystem {
            existing: vec![local_config_path(Path::new("/data"))],
            ..Default::default()
        };
        let (cli, command) = init_in("/data");

        let err = cmd_config(&cli, &command, &fs).unwrap_err();

        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
        assert!(fs.written.lock().unwrap().is_empty());
    }
}
