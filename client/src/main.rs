mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use common::{
    ErrorResponse, HealthResponse, JobCreateRequest, JobCreateResponse, JobResponse, JobStats,
    JobsListResponse,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::{env, time::Duration};
use tokio::task::JoinSet;

use crate::cli::{Cli, Commands, SMOKE_JOBS};

/// - Con la variable MANAGER_URL si está definida
/// - Local: default http://localhost:3000
fn manager_base_url() -> String {
    env::var("MANAGER_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli.url.unwrap_or_else(manager_base_url);

    match cli.command {
        Commands::Submit { name, args } => {
            let created = submit_job(&client, &base_url, name, args).await?;
            println!("Job creado:");
            println!("  id: {}", created.job_id);
            println!("  nombre: {}", created.job_name);
            println!("  argumentos: {:?}", created.arguments);
        }
        Commands::Jobs => {
            let list: JobsListResponse = get_json(&client, &format!("{}/jobs", base_url)).await?;
            println!("{} jobs", list.total_jobs);
            for job in &list.jobs {
                print_job(job);
            }
        }
        Commands::Job { id } => {
            let job: JobResponse = get_json(&client, &format!("{}/jobs/{}", base_url, id)).await?;
            print_job(&job);
        }
        Commands::Stats => {
            let stats: JobStats = get_json(&client, &format!("{}/stats", base_url)).await?;
            print_stats(&stats);
        }
        Commands::Health => {
            let health: HealthResponse = get_json(&client, &format!("{}/health", base_url)).await?;
            println!(
                "{} (uptime {:.1}s, {})",
                health.status, health.uptime, health.timestamp
            );
        }
        Commands::Smoke { wait_secs } => smoke(&client, &base_url, wait_secs).await?,
    }

    Ok(())
}

/* ---------------- llamadas HTTP ---------------- */

async fn submit_job(
    client: &Client,
    base_url: &str,
    name: String,
    args: Vec<String>,
) -> Result<JobCreateResponse> {
    let req = JobCreateRequest {
        job_name: Some(name),
        arguments: Some(args),
    };
    let resp = client
        .post(format!("{}/jobs", base_url))
        .json(&req)
        .send()
        .await
        .context("no se pudo contactar al job manager")?;
    parse(resp).await
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {} falló", url))?;
    parse(resp).await
}

/// Convierte la respuesta en T, o en error con el cuerpo de error del servicio.
async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    match resp.json::<ErrorResponse>().await {
        Ok(err) => match err.details {
            Some(details) => bail!("{}: {} ({})", status, err.error, details),
            None => bail!("{}: {}", status, err.error),
        },
        Err(_) => bail!("el servicio respondió {}", status),
    }
}

/* ---------------- smoke test ---------------- */

async fn smoke(client: &Client, base_url: &str, wait_secs: u64) -> Result<()> {
    println!("Lanzando {} jobs en paralelo...", SMOKE_JOBS.len());

    let mut set = JoinSet::new();
    for (index, (name, args)) in SMOKE_JOBS.iter().enumerate() {
        let client = client.clone();
        let base_url = base_url.to_string();
        let name = name.to_string();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        set.spawn(async move { (index, submit_job(&client, &base_url, name, args).await) });
    }

    while let Some(joined) = set.join_next().await {
        match joined? {
            (index, Ok(created)) => println!("Job {} iniciado: {}", index + 1, created.job_id),
            (index, Err(e)) => eprintln!("No se pudo iniciar el job {}: {:#}", index + 1, e),
        }
    }

    println!("\nEsperando {}s a que terminen...\n", wait_secs);
    tokio::time::sleep(Duration::from_secs(wait_secs)).await;

    let list: JobsListResponse = get_json(client, &format!("{}/jobs", base_url)).await?;
    println!("Jobs actuales:");
    println!("{}", serde_json::to_string_pretty(&list)?);

    let stats: JobStats = get_json(client, &format!("{}/stats", base_url)).await?;
    println!("\nEstadísticas:");
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/* ---------------- salida ---------------- */

fn print_job(job: &JobResponse) {
    let duration = job
        .duration
        .map(|ms| format!("{}ms", ms))
        .unwrap_or_else(|| "-".to_string());
    print!(
        "  {}  {:<10} {:<30} {:>8}  retries={}",
        job.id,
        job.status.to_string(),
        job.name,
        duration,
        job.retry_count
    );
    if let Some(original) = &job.original_job_id {
        print!("  (reintento de {})", original);
    }
    println!();
}

fn print_stats(stats: &JobStats) {
    println!("total de jobs: {}", stats.total_jobs);
    println!("tasa de éxito global: {:.2}", stats.overall_success_rate);
    if stats.patterns.is_empty() {
        println!("sin patrones");
        return;
    }
    for p in &stats.patterns {
        println!(
            "  {:<30} matches={:<4} éxito={:.2} ({})",
            p.pattern, p.match_count, p.success_rate, p.difference_from_average
        );
    }
}
