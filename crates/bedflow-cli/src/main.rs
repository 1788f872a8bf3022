//! Headless driver for the bedflow workflow
//!
//! Runs a full upload → enhancement → clustering → export pass against the
//! configured backend services, or probes their health. Stands in for the
//! browser presentation layer during development and deployments.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bedflow_client::{ServiceClients, ServiceEndpoints};
use bedflow_core::WorkflowOrchestrator;
use bedflow_interfaces::{ExportType, ManualClusterAssignment, UploadFile};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage:
  bedflow check
  bedflow methods <image>
  bedflow run <image> <method> <assignment.json> [summary|detailed] [output.dxf]

Environment:
  BEDFLOW_GATEWAY_URL      gateway base URL (namespaces /api/v1/{service})
  BEDFLOW_PROCESSING_URL   image-processing base URL
  BEDFLOW_CLUSTERING_URL   clustering base URL
  BEDFLOW_EXPORT_URL       dxf-export base URL";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoints = ServiceEndpoints::from_env();
    let clients = ServiceClients::from_endpoints(&endpoints);
    let orchestrator = WorkflowOrchestrator::new(
        clients.processing,
        clients.clustering,
        clients.export,
    );

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("check") => check(&orchestrator).await,
        Some("methods") if args.len() == 2 => methods(&orchestrator, &args[1]).await,
        Some("run") if (4..=6).contains(&args.len()) => run(&orchestrator, &args[1..]).await,
        _ => bail!("{}", USAGE),
    }
}

async fn check(orchestrator: &WorkflowOrchestrator) -> Result<()> {
    let report = orchestrator.check_services().await;
    for (name, availability) in [
        ("image-processing", &report.processing),
        ("clustering", &report.clustering),
        ("dxf-export", &report.export),
    ] {
        match (&availability.health, &availability.error) {
            (Some(health), _) => println!(
                "{:<18} up   ({})",
                name,
                health.version.as_deref().unwrap_or("unknown version")
            ),
            (None, Some(error)) => println!("{:<18} DOWN ({})", name, error),
            (None, None) => println!("{:<18} DOWN", name),
        }
    }
    if !report.all_available() {
        bail!("one or more services are unavailable");
    }
    Ok(())
}

async fn methods(orchestrator: &WorkflowOrchestrator, image_path: &str) -> Result<()> {
    upload(orchestrator, image_path).await?;
    let methods = orchestrator.enhancement_methods().await?;
    for method in methods {
        println!("{}", method);
    }
    Ok(())
}

async fn run(orchestrator: &WorkflowOrchestrator, args: &[String]) -> Result<()> {
    let image_path = &args[0];
    let method = &args[1];
    let assignment_path = &args[2];
    let export_type: ExportType = args
        .get(3)
        .map(String::as_str)
        .unwrap_or("detailed")
        .parse()?;

    let assignment: ManualClusterAssignment = serde_json::from_str(
        &fs::read_to_string(assignment_path)
            .with_context(|| format!("failed to read {}", assignment_path))?,
    )
    .with_context(|| format!("{} is not a cluster assignment", assignment_path))?;

    let snapshot = upload(orchestrator, image_path).await?;
    info!(
        session_id = snapshot.session_id().unwrap_or(""),
        beds = snapshot.bed_count(),
        "Image processed"
    );

    orchestrator.select_method(method).await?;
    let snapshot = orchestrator.submit_assignment(&assignment).await?;
    if let Some(clustering) = snapshot.clustering.as_deref() {
        println!(
            "{} clusters, {:.1}% coverage",
            clustering.statistics.cluster_count, clustering.statistics.coverage_percent
        );
    }

    let artifact = orchestrator.export(export_type).await?;
    let output_path = args
        .get(4)
        .cloned()
        .unwrap_or_else(|| artifact.file_name.clone());
    fs::write(&output_path, &artifact.bytes)
        .with_context(|| format!("failed to write {}", output_path))?;
    println!("wrote {} ({} bytes)", output_path, artifact.bytes.len());

    Ok(())
}

async fn upload(
    orchestrator: &WorkflowOrchestrator,
    image_path: &str,
) -> Result<bedflow_core::WorkflowSnapshot> {
    let path = Path::new(image_path);
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", image_path))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let media_type = media_type_for(path)?;

    let file = UploadFile::new(file_name, media_type, bytes);
    Ok(orchestrator.submit_image(file).await?)
}

fn media_type_for(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "tif" | "tiff" => Ok("image/tiff"),
        "bmp" => Ok("image/bmp"),
        other => bail!("unsupported image extension: .{}", other),
    }
}
