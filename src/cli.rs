use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "leitor")]
#[command(version, about = "Boleto and arrecadação payment-code extraction from PDFs")]
#[command(
    long_about = "Extract Brazilian payment codes (linha digitável or código de barras) from PDF \
documents using native text, optical barcode decoding and OCR, validate them against the FEBRABAN \
check-digit rules, and optionally submit them to the TOTVS DataServer."
)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract payment codes and metadata from one or more PDF files
    Process {
        /// Paths to the PDF files
        #[arg(required = true)]
        files: Vec<String>,

        /// Submit each successfully extracted code via SOAP
        #[arg(long)]
        send: bool,

        /// Supplier list CSV (IDPGTO;...;CNPJ/CPF) for payer-id resolution
        #[arg(long)]
        suppliers: Option<String>,

        /// Override the worker-pool size (default from MAX_WORKERS)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Submit a single record to the TOTVS DataServer
    Send {
        /// Internal flow identifier (IDLAN)
        #[arg(long)]
        id_fluxus: String,

        /// Payment code (linha digitável or barcode payload)
        #[arg(long)]
        barcode: String,

        /// Direct payer id; wins over the CNPJ lookup
        #[arg(long)]
        idpgto: Option<String>,

        /// Supplier CNPJ used to resolve the payer id
        #[arg(long)]
        cnpj: Option<String>,

        /// How the code was detected: texto, pyzbar or ocr
        #[arg(long, default_value = "texto")]
        source: String,

        /// Supplier list CSV for the CNPJ lookup
        #[arg(long)]
        suppliers: Option<String>,
    },

    /// Classify and checksum-check a payment code
    Validate {
        /// The code, with or without separators
        code: String,
    },

    /// Report whether the rendering and OCR backends are usable
    Capabilities,
}
