//! Atrium CLI
//!
//! Runs admin data operations through the tenant-scoped composite provider.

mod config;

use std::fs;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use atrium_data::backends::memory::MemoryRelationalBackend;
use atrium_data::backends::postgrest::{PostgrestBackend, PostgrestConfig};
use atrium_data::backends::typesense::{TypesenseBackend, TypesenseConfig};
use atrium_data::core::ImportAction;
use atrium_data::tenant::{FileKeyValueStore, PersistentScope, ScopeStore, TenantId};
use atrium_data::types::{
    CreateParams, DeleteParams, GetOneParams, ListParams, Record, SortDirective, UpdateParams,
};
use atrium_data::{
    CompositeDataProvider, DynRelational, DynSearch, RetryConfig, RoutingConfig, RoutingSettings,
};

use config::{CliConfig, Command, DocumentsCommand, ScopeCommand};

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("atrium={level},atrium_data={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn into_record(value: Value) -> anyhow::Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("expected a JSON object"),
    }
}

/// Opens the persisted tenant scope.
fn open_scope(config: &CliConfig) -> anyhow::Result<Arc<PersistentScope<FileKeyValueStore>>> {
    let store = FileKeyValueStore::open(&config.scope_file)
        .with_context(|| format!("opening scope file {}", config.scope_file.display()))?;
    Ok(Arc::new(PersistentScope::new(Arc::new(store))))
}

/// Loads routing and retry settings, or the stock admin resources when no
/// routing file is given.
fn load_routing(config: &CliConfig) -> anyhow::Result<(RoutingConfig, RetryConfig)> {
    let Some(path) = &config.routing_file else {
        debug!("No routing file; registering stock search admin resources only");
        let routing = RoutingConfig::builder().with_default_search_admin().build()?;
        return Ok((routing, RetryConfig::default()));
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading routing file {}", path.display()))?;
    let (routing, retry) = RoutingSettings::from_json(&raw)?.into_config()?;
    for warning in routing.warnings() {
        tracing::warn!(%warning, "Routing configuration");
    }
    Ok((routing, retry))
}

fn create_relational(config: &CliConfig) -> anyhow::Result<DynRelational> {
    match config.relational_connection() {
        Some((url, key)) => {
            info!(url = %url, "Initializing PostgREST backend");
            let backend = PostgrestBackend::new(
                PostgrestConfig::new(url, key).with_timeout(config.http_timeout),
            )?;
            Ok(Arc::new(backend))
        }
        None => {
            info!("SUPABASE_URL not set; using in-memory relational store");
            Ok(Arc::new(MemoryRelationalBackend::new()))
        }
    }
}

fn create_search(config: &CliConfig) -> anyhow::Result<Option<DynSearch>> {
    let Some((url, key)) = config.search_connection() else {
        info!("Search engine not configured");
        return Ok(None);
    };
    info!(url = %url, "Initializing Typesense backend");
    let backend =
        TypesenseBackend::new(TypesenseConfig::new(url, key).with_timeout(config.http_timeout))?;
    Ok(Some(Arc::new(backend)))
}

fn create_provider(
    config: &CliConfig,
    scope: Arc<PersistentScope<FileKeyValueStore>>,
) -> anyhow::Result<CompositeDataProvider> {
    let (routing, retry) = load_routing(config)?;
    let mut provider = CompositeDataProvider::new(create_relational(config)?, scope, Arc::new(routing))
        .with_retry(retry);
    if let Some(search) = create_search(config)? {
        provider = provider.with_search(search);
    }
    Ok(provider)
}

fn run_scope(scope: &dyn ScopeStore, command: ScopeCommand) -> anyhow::Result<()> {
    match command {
        ScopeCommand::Show => {}
        ScopeCommand::SetTenant { tenant_id } => {
            let tenant_id = TenantId::parse(&tenant_id).context("tenant id cannot be blank")?;
            scope.set_active_tenant(tenant_id);
        }
        ScopeCommand::ClearTenant => scope.clear_active_tenant(),
        ScopeCommand::ViewAll { enabled } => scope.set_view_all_mode(enabled),
    }
    let snapshot = scope.scope();
    print_json(&json!({
        "tenant_id": snapshot.tenant_id.as_ref().map(TenantId::as_str),
        "view_all": snapshot.view_all,
        "effective_tenant": snapshot.effective_tenant().map(TenantId::as_str),
    }))
}

async fn run_documents(
    provider: &CompositeDataProvider,
    command: DocumentsCommand,
) -> anyhow::Result<()> {
    match command {
        DocumentsCommand::Import { collection, file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let documents = raw
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(n, line)| {
                    serde_json::from_str::<Value>(line)
                        .map_err(anyhow::Error::from)
                        .and_then(into_record)
                        .with_context(|| format!("{}:{}", file.display(), n + 1))
                })
                .collect::<anyhow::Result<Vec<Record>>>()?;
            let outcomes = provider
                .import_documents(&collection, documents, ImportAction::Upsert)
                .await?;
            let failed = outcomes.iter().filter(|o| !o.success).count();
            info!(collection = %collection, imported = outcomes.len() - failed, failed, "Import finished");
            print_json(&outcomes)
        }
        DocumentsCommand::Export { collection } => {
            for document in provider.export_documents(&collection).await? {
                println!("{}", serde_json::to_string(&document)?);
            }
            Ok(())
        }
    }
}

async fn run(config: CliConfig) -> anyhow::Result<()> {
    let scope = open_scope(&config)?;
    let provider = || create_provider(&config, scope.clone());

    match config.command.clone() {
        Command::Scope(command) => run_scope(&*scope, command),
        Command::Classify { resource } => print_json(&json!({
            "resource": resource,
            "class": provider()?.classify(&resource).to_string(),
        })),
        Command::List {
            resource,
            q,
            filters,
            sort,
            page,
            per_page,
        } => {
            let mut params = ListParams::new().with_pagination(page, per_page);
            for (field, value) in filters {
                params = params.with_filter(field, value);
            }
            if let Some(q) = q {
                params = params.with_query(q);
            }
            if let Some(sort) = sort {
                let sort = SortDirective::parse(&sort)
                    .with_context(|| format!("invalid sort `{}`", sort))?;
                params = params.with_sort(sort);
            }
            print_json(&provider()?.get_list(&resource, params).await?)
        }
        Command::Get { resource, id } => {
            print_json(&provider()?.get_one(&resource, GetOneParams::new(id)).await?)
        }
        Command::Create { resource, data } => {
            let params = CreateParams::new(into_record(data)?);
            print_json(&provider()?.create(&resource, params).await?)
        }
        Command::Update { resource, id, data } => {
            let params = UpdateParams::new(id, into_record(data)?);
            print_json(&provider()?.update(&resource, params).await?)
        }
        Command::Delete { resource, id } => {
            print_json(&provider()?.delete(&resource, DeleteParams::new(id)).await?)
        }
        Command::Documents(command) => run_documents(&provider()?, command).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    debug!(
        scope_file = %config.scope_file.display(),
        search = config.search_connection().is_some(),
        "Starting Atrium CLI"
    );

    run(config).await
}
