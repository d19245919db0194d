//! Command line configuration for the Atrium CLI.
//!
//! Connection settings come from flags or environment variables; the
//! subcommand selects the data operation.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ATRIUM_LOG_LEVEL` | warn | Log level |
//! | `ATRIUM_SCOPE_FILE` | .atrium/scope.json | Persisted tenant selection |
//! | `ATRIUM_ROUTING_FILE` | (none) | Routing settings (JSON) |
//! | `SUPABASE_URL` | (none) | Project URL of the relational store |
//! | `SUPABASE_KEY` | (none) | API key of the relational store |
//! | `TYPESENSE_URL` | (none) | Search engine URL |
//! | `TYPESENSE_API_KEY` | (none) | Search engine admin key |
//! | `ATRIUM_HTTP_TIMEOUT` | 30s | HTTP request timeout |
//!
//! Without `SUPABASE_URL` the CLI runs against an in-memory relational store.
//! The search engine is used only when both `TYPESENSE_URL` and
//! `TYPESENSE_API_KEY` are set.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

/// Operator CLI for tenant-scoped admin data.
#[derive(Debug, Clone, Parser)]
#[command(name = "atrium")]
#[command(about = "Tenant-scoped admin data access over Supabase and Typesense")]
#[command(version)]
pub struct CliConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ATRIUM_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// File holding the tenant selection.
    #[arg(
        long,
        env = "ATRIUM_SCOPE_FILE",
        default_value = ".atrium/scope.json",
        global = true
    )]
    pub scope_file: PathBuf,

    /// Routing settings (tenant-scoped, native and hybrid resources).
    #[arg(long, env = "ATRIUM_ROUTING_FILE", global = true)]
    pub routing_file: Option<PathBuf>,

    /// Relational store project URL.
    #[arg(long, env = "SUPABASE_URL", global = true)]
    pub supabase_url: Option<String>,

    /// Relational store API key.
    #[arg(long, env = "SUPABASE_KEY", global = true, hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Search engine URL.
    #[arg(long, env = "TYPESENSE_URL", global = true)]
    pub typesense_url: Option<String>,

    /// Search engine admin API key.
    #[arg(long, env = "TYPESENSE_API_KEY", global = true, hide_env_values = true)]
    pub typesense_api_key: Option<String>,

    /// HTTP request timeout (e.g. `30s`, `1500ms`).
    #[arg(
        long,
        env = "ATRIUM_HTTP_TIMEOUT",
        default_value = "30s",
        value_parser = humantime::parse_duration,
        global = true
    )]
    pub http_timeout: Duration,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show or change the tenant scope.
    #[command(subcommand)]
    Scope(ScopeCommand),

    /// Print how a resource is routed.
    Classify {
        /// Resource name.
        resource: String,
    },

    /// List records.
    List {
        /// Resource name.
        resource: String,

        /// Free-text query.
        #[arg(long)]
        q: Option<String>,

        /// Filter as `field=value`; values that parse as JSON are used as JSON.
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, Value)>,

        /// Sort as `field` or `field:asc|desc`.
        #[arg(long)]
        sort: Option<String>,

        /// 1-based page.
        #[arg(long, default_value = "1")]
        page: u32,

        /// Records per page.
        #[arg(long, default_value = "25")]
        per_page: u32,
    },

    /// Read one record.
    Get {
        /// Resource name.
        resource: String,
        /// Record id.
        id: String,
    },

    /// Create a record from a JSON object.
    Create {
        /// Resource name.
        resource: String,
        /// Record as a JSON object.
        #[arg(value_parser = parse_object)]
        data: Value,
    },

    /// Update a record with a JSON object of changed fields.
    Update {
        /// Resource name.
        resource: String,
        /// Record id.
        id: String,
        /// Changed fields as a JSON object.
        #[arg(value_parser = parse_object)]
        data: Value,
    },

    /// Delete a record.
    Delete {
        /// Resource name.
        resource: String,
        /// Record id.
        id: String,
    },

    /// Bulk document transfer with the search engine.
    #[command(subcommand)]
    Documents(DocumentsCommand),
}

/// Tenant scope subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ScopeCommand {
    /// Print the current selection.
    Show,
    /// Select a tenant.
    SetTenant {
        /// Tenant id.
        tenant_id: String,
    },
    /// Clear the tenant selection.
    ClearTenant,
    /// Turn view-all mode on or off.
    ViewAll {
        /// `true` or `false`.
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

/// Document transfer subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum DocumentsCommand {
    /// Import a JSONL file into a collection (upsert).
    Import {
        /// Collection name.
        collection: String,
        /// JSONL file, one document per line.
        file: PathBuf,
    },
    /// Export a collection as JSONL on stdout.
    Export {
        /// Collection name.
        collection: String,
    },
}

impl CliConfig {
    /// Returns the search engine connection when both URL and key are set.
    pub fn search_connection(&self) -> Option<(&str, &str)> {
        match (self.typesense_url.as_deref(), self.typesense_api_key.as_deref()) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                Some((url, key))
            }
            _ => None,
        }
    }

    /// Returns the relational store connection when a URL is set.
    pub fn relational_connection(&self) -> Option<(&str, &str)> {
        let url = self.supabase_url.as_deref().filter(|u| !u.trim().is_empty())?;
        Some((url, self.supabase_key.as_deref().unwrap_or_default()))
    }

    /// Validates the configuration.
    ///
    /// Returns a list of validation errors, or `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.relational_connection().is_some()
            && self
                .supabase_key
                .as_deref()
                .is_none_or(|k| k.trim().is_empty())
        {
            errors.push("SUPABASE_KEY is required when SUPABASE_URL is set".to_string());
        }

        if self.http_timeout.is_zero() {
            errors.push("HTTP timeout cannot be 0".to_string());
        }

        match &self.command {
            Command::List { per_page: 0, .. } => {
                errors.push("Records per page cannot be 0".to_string());
            }
            Command::Scope(ScopeCommand::SetTenant { tenant_id }) if tenant_id.trim().is_empty() => {
                errors.push("Tenant id cannot be blank".to_string());
            }
            Command::Documents(_) if self.search_connection().is_none() => {
                errors.push(
                    "Document transfer requires TYPESENSE_URL and TYPESENSE_API_KEY".to_string(),
                );
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Parses `field=value`; the value is JSON when it parses as JSON.
fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{}`", raw))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{}`", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

fn parse_object(raw: &str) -> Result<Value, String> {
    match serde_json::from_str(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["atrium"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_list_arguments() {
        let config = parse(&[
            "list",
            "invoices",
            "--q",
            "march",
            "--filter",
            "status=paid",
            "--filter",
            "amount={\"gte\":10}",
            "--sort",
            "created_at:desc",
            "--per-page",
            "5",
        ]);
        match config.command {
            Command::List {
                resource,
                q,
                filters,
                sort,
                page,
                per_page,
            } => {
                assert_eq!(resource, "invoices");
                assert_eq!(q.as_deref(), Some("march"));
                assert_eq!(
                    filters,
                    vec![
                        ("status".to_string(), json!("paid")),
                        ("amount".to_string(), json!({"gte": 10})),
                    ]
                );
                assert_eq!(sort.as_deref(), Some("created_at:desc"));
                assert_eq!(page, 1);
                assert_eq!(per_page, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!(parse_filter("n=7").unwrap(), ("n".to_string(), json!(7)));
        assert_eq!(
            parse_filter("title=a=b").unwrap(),
            ("title".to_string(), json!("a=b"))
        );
        assert!(parse_filter("novalue").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn test_create_requires_object() {
        assert!(CliConfig::try_parse_from(["atrium", "create", "tags", "[1]"]).is_err());
        assert!(CliConfig::try_parse_from(["atrium", "create", "tags", "{nope"]).is_err());
        let config = parse(&["create", "tags", "{\"name\":\"urgent\"}"]);
        assert!(matches!(config.command, Command::Create { ref data, .. } if data["name"] == "urgent"));
    }

    #[test]
    fn test_scope_subcommands() {
        let config = parse(&["scope", "view-all", "true"]);
        assert!(matches!(
            config.command,
            Command::Scope(ScopeCommand::ViewAll { enabled: true })
        ));
        let config = parse(&["scope", "set-tenant", "tenant-2"]);
        assert!(matches!(
            config.command,
            Command::Scope(ScopeCommand::SetTenant { ref tenant_id }) if tenant_id == "tenant-2"
        ));
    }

    #[test]
    fn test_search_requires_url_and_key() {
        let mut config = parse(&["classify", "documents"]);
        config.typesense_url = Some("http://localhost:8108".to_string());
        config.typesense_api_key = None;
        assert!(config.search_connection().is_none());

        config.typesense_api_key = Some("xyz".to_string());
        assert_eq!(
            config.search_connection(),
            Some(("http://localhost:8108", "xyz"))
        );
    }

    #[test]
    fn test_validate() {
        let mut config = parse(&["--http-timeout", "1500ms", "list", "tags"]);
        config.supabase_url = None;
        config.typesense_url = None;
        assert_eq!(config.http_timeout, Duration::from_millis(1500));
        assert!(config.validate().is_ok());

        config.supabase_url = Some("https://project.supabase.co".to_string());
        config.supabase_key = None;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("SUPABASE_KEY")));

        let mut config = parse(&["documents", "export", "products"]);
        config.typesense_url = None;
        config.supabase_url = None;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("TYPESENSE_URL")));
    }
}
