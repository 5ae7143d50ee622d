//! Vocab Client - schema-driven CLI for a spaced-repetition backend

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use vocab_client::{
    capability::Capability,
    catalog::group_by_tag,
    cli::{Cli, Command},
    client::{ApiClient, BulkOptions, OperationCall, RequestDefaults, export_file_name},
    config::Config,
    document::{DocumentLoader, load_document_file},
    schema::example_request,
    session::{DocumentSource, Session},
    setup_tracing,
    transport::{HttpTransport, Query, Transport, normalize_base_url},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.validate()?;
    }

    let base_url = normalize_base_url(&config.base_url).to_string();
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config.request)?);

    let source = match &cli.spec_file {
        Some(path) => DocumentSource::Fixed(
            load_document_file(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => DocumentSource::Remote(DocumentLoader::from_config(
            &base_url,
            Arc::clone(&transport),
            &config.discovery,
        )),
    };

    info!(version = env!("CARGO_PKG_VERSION"), base_url = %base_url, "Connecting");

    let session = Session::new(
        base_url,
        source,
        transport,
        RequestDefaults::from_config(&config.request),
    );
    let client = session
        .connect(cli.refresh)
        .await
        .context("Failed to discover backend")?;

    run_command(&client, cli.command).await
}

async fn run_command(client: &ApiClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Capabilities => {
            for capability in Capability::ALL {
                let target = client
                    .capabilities()
                    .get(capability)
                    .map_or_else(|| "-".to_string(), |op| op.sort_key());
                println!("  {:<14} {target}", capability.as_str());
            }
            println!(
                "\n{} of {} capabilities discovered",
                client.capabilities().len(),
                Capability::ALL.len()
            );
        }

        Command::Operations { tag } => {
            for (group, operations) in group_by_tag(client.operations()) {
                if tag.as_deref().is_some_and(|wanted| wanted != group) {
                    continue;
                }
                println!("[{group}]");
                for op in operations {
                    println!("  {:<7} {:<32} {}", op.method.as_str(), op.path, op.id);
                    if !op.summary.is_empty() {
                        println!("          {}", op.summary);
                    }
                }
                println!();
            }
        }

        Command::Example { operation } => {
            let op = client.operation(&operation)?;
            let example = example_request(client.document(), op);
            print_json(&serde_json::to_value(&example)?)?;
        }

        Command::Call {
            operation,
            path_params,
            query,
            body,
            body_file,
        } => {
            let op = client.operation(&operation)?.clone();
            let body = match (body, body_file) {
                (Some(text), _) => Some(serde_json::from_str(&text).context("Invalid JSON body")?),
                (None, Some(path)) => Some(read_json(&path)?),
                (None, None) => None,
            };

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("Interrupt received; cancelling request");
                    on_interrupt.cancel();
                }
            });

            let call = OperationCall {
                path_params: parse_pairs(&path_params)?.into_iter().collect::<BTreeMap<_, _>>(),
                query: parse_pairs(&query)?
                    .into_iter()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect::<Query>(),
                body,
                cancel: Some(cancel),
            };
            print_json(&client.call_operation(&op, call).await?)?;
        }

        Command::Health => {
            let data = client.health().await?;
            println!("✅ Backend is up");
            print_json(&data)?;
        }

        Command::Today { limit } => print_json(&client.session_today(limit).await?)?,

        Command::List {
            search,
            tag,
            page,
            limit,
        } => {
            let mut query = Query::new();
            if let Some(search) = search {
                query.insert("search".to_string(), Value::String(search.trim().to_string()));
            }
            if let Some(tag) = tag {
                query.insert("tag".to_string(), Value::String(tag.trim().to_string()));
            }
            if let Some(page) = page {
                query.insert("page".to_string(), page.into());
            }
            if let Some(limit) = limit {
                query.insert("limit".to_string(), limit.into());
            }
            print_json(&client.list_vocab(query).await?)?;
        }

        Command::Get { id } => print_json(&client.get_vocab(&id).await?)?,

        Command::Delete { id } => {
            client.delete_vocab(&id).await?;
            println!("✅ Deleted {id}");
        }

        Command::Export { out } => {
            let data = client.sync_export().await?;
            let path = out.unwrap_or_else(|| export_file_name(chrono::Utc::now()).into());
            let text = serde_json::to_string_pretty(&data)?;
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Exported to {}", path.display());
        }

        Command::Import { file } => {
            let backup = read_json(&file)?;
            let report = client.sync_import(&backup).await?;
            println!("✅ Import complete");
            print_json(&report)?;
        }

        Command::Bulk {
            file,
            overwrite,
            use_ai,
        } => {
            let Value::Array(rows) = read_json(&file)? else {
                bail!("{} must contain a JSON array", file.display());
            };
            let options = BulkOptions {
                overwrite_existing: overwrite,
                use_ai,
            };
            let report = client.bulk_save(&rows, options).await?;

            println!("Success {}/{}", report.success, report.total);
            for failure in &report.failures {
                eprintln!("  ❌ row {} ({}): {}", failure.row_no, failure.term, failure.message);
            }
            print_json(&serde_json::to_value(&report)?)?;
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => Ok((name.to_string(), value.to_string())),
            None => bail!("Expected NAME=VALUE, got '{pair}'"),
        })
        .collect()
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
