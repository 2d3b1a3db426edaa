use anyhow::{Context, Result};

use stepwise::model::{CollectionId, Filter, RemoteConfig, Snapshot, StepId};
use stepwise::remote::RemoteClient;
use stepwise::service::CollectionService;
use stepwise::session::{BatchOp, execute, project};
use stepwise::workspace::Workspace;

use crate::Commands;

pub(crate) fn handle_command(command: Commands) -> Result<()> {
    let ws = Workspace::open()?;

    match command {
        Commands::Login { url } => {
            let base_url = url.trim_end_matches('/').to_string();
            ws.set_remote(RemoteConfig { base_url })?;
            let remote = ws.require_remote()?;
            println!("remote set to {}", remote.base_url);
            Ok(())
        }

        Commands::Remote { json } => {
            let cfg = ws.read_config()?;
            match cfg.remote {
                Some(remote) if json => {
                    println!("{}", serde_json::to_string_pretty(&remote)?);
                    Ok(())
                }
                Some(remote) => {
                    println!("{}", remote.base_url);
                    Ok(())
                }
                None => anyhow::bail!("no remote configured (run `stepwise login --url ...`)"),
            }
        }

        command => {
            let remote = ws.require_remote()?;
            let client = RemoteClient::new(remote)?;
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("build tokio runtime")?;
            rt.block_on(run_remote_command(&client, command))
        }
    }
}

async fn run_remote_command(client: &RemoteClient, command: Commands) -> Result<()> {
    match command {
        Commands::Login { .. } | Commands::Remote { .. } => unreachable!("handled by caller"),

        Commands::Collections { json } => {
            let snapshot = client.fetch_all().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot.collections)?);
            } else if snapshot.collections.is_empty() {
                println!("(no collections)");
            } else {
                for c in &snapshot.collections {
                    let open = c.steps.iter().filter(|s| !s.is_completed).count();
                    println!(
                        "{}  {} ({} open / {} steps)",
                        c.id.as_str(),
                        c.name,
                        open,
                        c.steps.len()
                    );
                }
            }
            Ok(())
        }

        Commands::Create { name } => {
            let collection = client.create_collection(&name).await?;
            println!("created collection {}", collection.id.as_str());
            // The mutation response alone is not trusted for the list view.
            let snapshot = client.fetch_all().await?;
            for c in &snapshot.collections {
                println!("{}  {}", c.id.as_str(), c.name);
            }
            Ok(())
        }

        Commands::Steps {
            collection,
            completed,
            json,
        } => {
            let snapshot = client.fetch_all().await?;
            let id = CollectionId(collection);
            anyhow::ensure!(
                snapshot.collection(&id).is_some(),
                "collection not found: {}",
                id.as_str()
            );
            let filter = if completed {
                Filter::Completed
            } else {
                Filter::Open
            };
            print_steps(&snapshot, &id, filter, json)
        }

        Commands::Add {
            collection,
            description,
        } => {
            let id = CollectionId(collection);
            let step = client.create_step(&id, &description).await?;
            println!("added step {} (#{})", step.id.as_str(), step.step_number);
            let snapshot = client.fetch_all().await?;
            print_steps(&snapshot, &id, Filter::Open, false)
        }

        Commands::Edit {
            step_id,
            description,
        } => {
            let id = StepId(step_id);
            let step = client.update_step(&id, &description).await?;
            println!("updated step {}: {}", step.id.as_str(), step.description);
            client.fetch_all().await.context("refresh after update")?;
            Ok(())
        }

        Commands::Complete { step_ids } => run_batch(client, BatchOp::Complete, step_ids).await,
        Commands::Revert { step_ids } => run_batch(client, BatchOp::Revert, step_ids).await,
        Commands::Delete { step_ids } => run_batch(client, BatchOp::Delete, step_ids).await,
    }
}

fn print_steps(snapshot: &Snapshot, id: &CollectionId, filter: Filter, json: bool) -> Result<()> {
    let steps = project(snapshot, Some(id), filter);
    if json {
        let steps: Vec<_> = steps.iter().map(|v| &v.step).collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    if steps.is_empty() {
        println!("(no {} steps)", filter.label());
        return Ok(());
    }
    for v in &steps {
        println!("{}  step {}: {}", v.id().as_str(), v.step.step_number, v.step.description);
    }
    Ok(())
}

/// One independent call per step id; failures are reported per item and do
/// not abort the others. Ends with a fresh authoritative read.
async fn run_batch(client: &RemoteClient, op: BatchOp, step_ids: Vec<String>) -> Result<()> {
    let targets: Vec<StepId> = step_ids.into_iter().map(StepId).collect();
    let outcomes = execute(client, op, &targets).await;
    if outcomes.is_empty() {
        println!("nothing to {}", op.label());
        return Ok(());
    }

    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => match &outcome.detail {
                Some(ack) => println!("{} {}: {}", op.label(), outcome.step_id.as_str(), ack),
                None => println!("{} {}: ok", op.label(), outcome.step_id.as_str()),
            },
            Err(err) => {
                failed += 1;
                eprintln!("{} {}: {:#}", op.label(), outcome.step_id.as_str(), err);
            }
        }
    }

    let snapshot = client.fetch_all().await.context("refresh after batch")?;
    for c in &snapshot.collections {
        let open = c.steps.iter().filter(|s| !s.is_completed).count();
        println!(
            "{}  {}: {} open / {} completed",
            c.id.as_str(),
            c.name,
            open,
            c.steps.len() - open
        );
    }

    anyhow::ensure!(
        failed == 0,
        "{} of {} {} calls failed",
        failed,
        outcomes.len(),
        op.label()
    );
    Ok(())
}
