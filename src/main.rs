use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leitor::batch::{self, FileOutcome, Status};
use leitor::classify::{self, BarcodeKind};
use leitor::cli::{Cli, Commands};
use leitor::config::Settings;
use leitor::extract::{self, patterns, Source};
use leitor::soap::{SoapClient, SubmitRequest};
use leitor::suppliers::SupplierMap;

// JSON response utilities
#[derive(Serialize)]
struct JsonResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn json_success<T: Serialize>(data: T) -> String {
    serde_json::to_string_pretty(&JsonResponse {
        success: true,
        data: Some(data),
        error: None,
    })
    .unwrap_or_else(|e| {
        format!(
            r#"{{"success": false, "error": "JSON serialization error: {}"}}"#,
            e
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Disable color when requested or when stdout is not a TTY (piped)
    let stdout_is_tty = std::io::stdout().is_terminal();
    let disable_color = cli.no_color || !stdout_is_tty || cli.json;

    // Logging always goes to stderr to keep stdout clean
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_ansi(!disable_color)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    if disable_color {
        colored::control::set_override(false);
    }

    let settings = Settings::from_env();

    match cli.command {
        Commands::Process {
            files,
            send,
            suppliers,
            workers,
        } => handle_process(files, send, suppliers, workers, settings, cli.json).await,

        Commands::Send {
            id_fluxus,
            barcode,
            idpgto,
            cnpj,
            source,
            suppliers,
        } => handle_send(id_fluxus, barcode, idpgto, cnpj, &source, suppliers, settings).await,

        Commands::Validate { code } => handle_validate(&code, cli.json),

        Commands::Capabilities => handle_capabilities(&settings),
    }
}

/// Handle batch extraction, optionally submitting each result via SOAP
async fn handle_process(
    files: Vec<String>,
    send: bool,
    suppliers_path: Option<String>,
    workers: Option<usize>,
    mut settings: Settings,
    json_output: bool,
) -> Result<()> {
    use tabled::{settings::Style, Table, Tabled};

    if let Some(workers) = workers {
        settings.max_workers = workers.max(1);
    }
    settings
        .create_directories()
        .context("failed to create working directories")?;

    let suppliers = match &suppliers_path {
        Some(path) => Some(Arc::new(SupplierMap::load(path)?)),
        None => None,
    };

    let capabilities = extract::probe(&settings);
    if !capabilities.rendering {
        eprintln!(
            "{} pdfium not available: scanned documents will rely on embedded text only",
            "⚠".yellow().bold()
        );
    } else if !capabilities.ocr {
        eprintln!(
            "{} tesseract not available: the OCR fallback stage is disabled",
            "⚠".yellow().bold()
        );
    }

    info!("processing {} file(s)", files.len());
    let results = batch::process_files(&files, &settings, suppliers.clone()).await;

    if json_output {
        println!("{}", json_success(&results));
    } else {
        #[derive(Tabled)]
        struct OutcomeRow {
            #[tabled(rename = "File")]
            file: String,
            #[tabled(rename = "Status")]
            status: String,
            #[tabled(rename = "Code")]
            code: String,
            #[tabled(rename = "Source")]
            source: String,
            #[tabled(rename = "ID.Fluxus")]
            fluxus: String,
            #[tabled(rename = "CNPJ")]
            cnpj: String,
        }

        let rows: Vec<OutcomeRow> = results
            .iter()
            .map(|r| OutcomeRow {
                file: r.filename.clone(),
                status: r.status.as_str().to_string(),
                code: r.barcode.clone().unwrap_or_else(|| "-".to_string()),
                source: r
                    .barcode_source
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                fluxus: r.fields.id_fluxus.clone().unwrap_or_else(|| "-".to_string()),
                cnpj: r.fields.cnpj.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("\n{table}");

        let processed = results.iter().filter(|r| r.status == Status::Processed).count();
        let not_found = results.iter().filter(|r| r.status == Status::NotFound).count();
        let errors = results.iter().filter(|r| r.status == Status::Error).count();
        println!("\n{} Extracted: {}", "✓".green().bold(), processed.to_string().green());
        if not_found > 0 {
            println!("  Not found: {}", not_found.to_string().yellow());
        }
        if errors > 0 {
            println!("  Errors: {}", errors.to_string().red());
        }
        for result in results.iter().filter(|r| r.status != Status::Processed) {
            if let Some(error) = &result.error {
                println!("  {} {}: {}", "✗".red(), result.filename, error.dimmed());
            }
        }
    }

    if send {
        submit_results(&results, suppliers.as_deref(), &settings, json_output).await?;
    }
    Ok(())
}

/// Submit every successfully extracted code from a batch
async fn submit_results(
    results: &[FileOutcome],
    suppliers: Option<&SupplierMap>,
    settings: &Settings,
    json_output: bool,
) -> Result<()> {
    let client = SoapClient::from_settings(settings);
    let mut sent = 0;
    let mut failed = 0;

    for result in results.iter().filter(|r| r.status == Status::Processed) {
        let (Some(barcode), Some(source)) = (&result.barcode, result.barcode_source) else {
            continue;
        };
        let Some(id_fluxus) = &result.fields.id_fluxus else {
            if !json_output {
                println!(
                    "{} {}: no ID.Fluxus found, skipping submission",
                    "⚠".yellow().bold(),
                    result.filename
                );
            }
            failed += 1;
            continue;
        };

        let request = SubmitRequest {
            id_fluxus: id_fluxus.clone(),
            barcode: barcode.clone(),
            idpgto: result.idpgto.map(|v| v.to_string()),
            cnpj: result.fields.cnpj.clone(),
            source,
        };
        let outcome = client.submit(&request, suppliers).await;
        if outcome.success {
            sent += 1;
            if !json_output {
                println!("{} {}: {}", "✓".green(), result.filename, outcome.message);
            }
        } else {
            failed += 1;
            if !json_output {
                println!("{} {}: {}", "✗".red(), result.filename, outcome.message.red());
                for line in &outcome.logs {
                    println!("    {}", line.dimmed());
                }
            }
        }
    }

    if !json_output {
        println!("\n{} Submitted: {}", "✓".green().bold(), sent.to_string().green());
        if failed > 0 {
            println!("  Failed: {}", failed.to_string().red());
        }
    }
    if failed > 0 {
        return Err(anyhow!("{failed} submission(s) failed"));
    }
    Ok(())
}

/// Handle a single manual submission
async fn handle_send(
    id_fluxus: String,
    barcode: String,
    idpgto: Option<String>,
    cnpj: Option<String>,
    source: &str,
    suppliers_path: Option<String>,
    settings: Settings,
) -> Result<()> {
    let source: Source = source
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let suppliers = match &suppliers_path {
        Some(path) => Some(SupplierMap::load(path)?),
        None => None,
    };

    let request = SubmitRequest {
        id_fluxus,
        barcode: patterns::normalize(&barcode),
        idpgto,
        cnpj,
        source,
    };
    let client = SoapClient::from_settings(&settings);
    let outcome = client.submit(&request, suppliers.as_ref()).await;

    for line in &outcome.logs {
        println!("  {}", line.dimmed());
    }
    if outcome.success {
        println!("\n{} {}", "✓".green().bold(), outcome.message);
        Ok(())
    } else {
        println!("\n{} {}", "✗".red().bold(), outcome.message.red());
        Err(anyhow!(outcome.message))
    }
}

/// Handle offline validation of a pasted code
fn handle_validate(code: &str, json_output: bool) -> Result<()> {
    let digits = patterns::normalize(code);
    let (valid, kind) = classify::validate(&digits);
    // the 44-digit boleto barcode is accepted by shape without a checksum
    let admitted =
        kind == BarcodeKind::Boleto && digits.len() == 44 && classify::looks_like_payment_slip(&digits);
    let accepted = (valid && kind != BarcodeKind::Nfe) || admitted;

    if json_output {
        #[derive(Serialize)]
        struct Validation {
            digits: String,
            kind: &'static str,
            length: usize,
            accepted: bool,
            checksum_valid: bool,
        }
        println!(
            "{}",
            json_success(Validation {
                digits: digits.clone(),
                kind: kind.as_str(),
                length: digits.len(),
                accepted,
                checksum_valid: valid,
            })
        );
    } else {
        println!("\n  Digits: {}", digits.cyan());
        println!("  Length: {}", digits.len());
        println!("  Kind:   {}", kind.as_str().bold());
        match kind {
            BarcodeKind::Nfe => println!(
                "  {} NF-e access key: not a payment code",
                "✗".red().bold()
            ),
            _ if valid => {
                println!("  {} check digits verified", "✓".green().bold());
                if kind == BarcodeKind::Boleto && digits.len() == 47 {
                    println!(
                        "  Barcode form: {}",
                        classify::barcode_from_linha(&digits).dimmed()
                    );
                }
            }
            _ if admitted => println!(
                "  {} 44-digit barcode form accepted by shape (no standalone checksum)",
                "✓".green().bold()
            ),
            _ => println!("  {} check digits failed", "✗".red().bold()),
        }
        println!();
    }

    if accepted {
        Ok(())
    } else {
        Err(anyhow!("code failed validation"))
    }
}

/// Handle the backend capability report
fn handle_capabilities(settings: &Settings) -> Result<()> {
    let capabilities = extract::probe(settings);
    let mark = |ok: bool| {
        if ok {
            "✓".green().bold()
        } else {
            "✗".red().bold()
        }
    };
    println!(
        "\n  {} pdfium rendering (optical + OCR stages)",
        mark(capabilities.rendering)
    );
    println!(
        "  {} tesseract OCR (lang=por{})",
        mark(capabilities.ocr),
        settings
            .tessdata_dir
            .as_deref()
            .map(|d| format!(", tessdata={d}"))
            .unwrap_or_default()
    );
    println!();
    Ok(())
}
