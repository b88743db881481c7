//! Command dispatch: every invocation loads its inputs into a fresh store.

use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{AttrFilter, AttrValue, GroupKey, HierarchyStore, MatchType, SearchQuery};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let container = ServiceContainer::new(Settings::load(Some(&cwd))?);

    if let Commands::Config { command } = command {
        return _config(&container, command, &cwd);
    }

    let inputs = resolve_inputs(cli, &container.settings)?;
    let mut store = container.load_store(&inputs)?;
    debug!("store holds {} groups", store.len());

    match command {
        Commands::Tree => _tree(&store),
        Commands::Subtree { kind, name } => _subtree(&store, &GroupKey::new(kind, name)),
        Commands::Info { kind, name } => _info(&store, &GroupKey::new(kind, name)),
        Commands::Search {
            superset,
            query,
            match_type,
            filters,
            long,
        } => {
            let search = build_query(
                superset.as_deref(),
                query.as_deref(),
                match_type.as_deref(),
                filters,
                container.settings.default_match,
            )?;
            _search(&store, &search, *long)
        }
        Commands::Delete { kind, name } => _delete(&mut store, kind, name),
        Commands::Edit {
            kind,
            name,
            attribute,
            value,
        } => _edit(&mut store, &GroupKey::new(kind, name), attribute, value),
        Commands::Describe {
            kind,
            name,
            description,
        } => _describe(&mut store, &GroupKey::new(kind, name), description.clone()),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

fn resolve_inputs(cli: &Cli, settings: &Settings) -> CliResult<Vec<PathBuf>> {
    if !cli.files.is_empty() {
        return Ok(cli.files.clone());
    }
    settings
        .data_file
        .clone()
        .map(|f| vec![f])
        .ok_or_else(|| CliError::Usage("no input: pass --file or set data_file in config".into()))
}

/// Parse `KIND:NAME`.
pub fn parse_key(raw: &str) -> CliResult<GroupKey> {
    raw.split_once(':')
        .map(|(kind, name)| GroupKey::new(kind.trim(), name.trim()))
        .ok_or_else(|| CliError::InvalidArgs(format!("expected KIND:NAME, got '{raw}'")))
}

/// Parse `ATTR:OP:VALUE`.
pub fn parse_filter(raw: &str) -> CliResult<(String, AttrFilter)> {
    let parts: Vec<&str> = raw.splitn(3, ':').collect();
    match parts.as_slice() {
        [attr, op, value] => Ok((attr.to_string(), AttrFilter::parse(op, value)?)),
        _ => Err(CliError::InvalidArgs(format!(
            "expected ATTR:OP:VALUE, got '{raw}'"
        ))),
    }
}

/// Assemble a search from command line pieces.
pub fn build_query(
    superset: Option<&str>,
    query: Option<&str>,
    match_type: Option<&str>,
    filters: &[String],
    default_match: MatchType,
) -> CliResult<SearchQuery> {
    let mut search = SearchQuery::new();
    if let Some(superset) = superset {
        search = search.within(parse_key(superset)?);
    }
    // Match type is only validated for a non-empty query
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let match_type = match match_type {
            Some(m) => m.parse::<MatchType>()?,
            None => default_match,
        };
        search = search.matching(query, match_type);
    }
    for raw in filters {
        let (attr, filter) = parse_filter(raw)?;
        search = search.filter(attr, filter);
    }
    Ok(search)
}

#[instrument(skip(store))]
fn _tree(store: &HierarchyStore) -> CliResult<()> {
    output::info(store.render_tree());
    Ok(())
}

#[instrument(skip(store))]
fn _subtree(store: &HierarchyStore, key: &GroupKey) -> CliResult<()> {
    output::info(&store.subtree_view(key)?);
    Ok(())
}

#[instrument(skip(store))]
fn _info(store: &HierarchyStore, key: &GroupKey) -> CliResult<()> {
    output::info(&store.info(key)?);
    let lineage = store
        .ancestors(key)
        .iter()
        .map(|g| g.key.tree_label())
        .join(" -> ");
    output::detail(&lineage);
    Ok(())
}

#[instrument(skip(store))]
fn _search(store: &HierarchyStore, search: &SearchQuery, long: bool) -> CliResult<()> {
    let results = store.search(search);
    output::header(&format!("Found {} groups", results.len()));
    for (key, group) in results {
        if long {
            output::info(&group.info());
        } else {
            output::detail(&key.tree_label());
        }
    }
    Ok(())
}

#[instrument(skip(store))]
fn _delete(store: &mut HierarchyStore, kind: &str, name: &str) -> CliResult<()> {
    let before = store.len();
    store.delete(kind, name)?;
    output::action(
        "Deleted",
        &format!("{} ({} groups)", GroupKey::new(kind, name), before - store.len()),
    );
    output::info(store.render_tree());
    Ok(())
}

#[instrument(skip(store))]
fn _edit(store: &mut HierarchyStore, key: &GroupKey, attribute: &str, value: &str) -> CliResult<()> {
    store.edit_attribute(key, attribute, AttrValue::parse_loose(value))?;
    output::info(&store.info(key)?);
    Ok(())
}

#[instrument(skip(store))]
fn _describe(
    store: &mut HierarchyStore,
    key: &GroupKey,
    description: Option<String>,
) -> CliResult<()> {
    store.set_description(key, description)?;
    output::info(&store.info(key)?);
    Ok(())
}

#[instrument(skip(container))]
fn _config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    cwd: &std::path::Path,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::action("global", &p.display()),
                None => output::action("global", &"<unavailable>"),
            }
            output::action("local", &local_config_path(cwd).display());
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
            if container.fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "{} exists, use --force to overwrite",
                    path.display()
                )));
            }
            if let Some(dir) = path.parent() {
                container
                    .fs
                    .create_dir_all(dir)
                    .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
            }
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
    }
    Ok(())
}
