//! formpdf CLI
//!
//! Fill schema-driven forms into PDF documents from the command line.
//!
//! # Usage
//!
//! ```bash
//! formpdf list
//! formpdf --lang ar fields --form vollmacht
//! formpdf fill --form vollmacht --set vg_name=Muster --set vg_vorname=Max \
//!     --set b_name=Beispiel --set b_vorname=Erika --datum 01.02.2024 \
//!     --signature sig.png --signature-source upload --width-cm 4
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "formpdf")]
#[command(version)]
#[command(about = "Fill schema-driven forms into PDF documents", long_about = None)]
struct Cli {
    /// Directory with one subdirectory per form
    #[arg(long, env = "FORMPDF_FORMS_ROOT", default_value = "forms", global = true)]
    forms_root: PathBuf,

    /// Setup configuration with base PDF options
    #[arg(long, env = "FORMPDF_CONFIG", default_value = forms::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// UI language
    #[arg(long, value_enum, default_value_t = LangArg::De, global = true)]
    lang: LangArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available forms
    List,
    /// Show the fields of a form
    Fields {
        /// Form key (directory name)
        #[arg(long)]
        form: String,
    },
    /// Fill a form and write the PDF
    Fill(FillArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct FillArgs {
    /// Form key (directory name)
    #[arg(long)]
    pub form: String,

    /// Field value as composite key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = commands::parse_key_value)]
    pub set: Vec<(String, String)>,

    /// JSON object of composite key -> value
    #[arg(long, value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Place (defaults to the form's city)
    #[arg(long)]
    pub stadt: Option<String>,

    /// Date
    #[arg(long, default_value = "")]
    pub datum: String,

    /// Signature image (PNG or JPEG)
    #[arg(long, value_name = "FILE")]
    pub signature: Option<PathBuf>,

    /// How the signature was captured
    #[arg(long, value_enum, default_value_t = SourceArg::Upload)]
    pub signature_source: SourceArg,

    /// Signature box width in centimeters
    #[arg(long, default_value_t = 2.0)]
    pub width_cm: f64,

    /// Signature box height in centimeters (used without ratio lock)
    #[arg(long, default_value_t = 3.0)]
    pub height_cm: f64,

    /// Do not derive the height from the image ratio
    #[arg(long)]
    pub no_keep_ratio: bool,

    /// Scaling inside the signature box
    #[arg(long, value_enum, default_value_t = ScaleArg::Fit)]
    pub scale_mode: ScaleArg,

    /// Alignment inside the signature box
    #[arg(long, value_enum, default_value_t = AlignArg::Left)]
    pub align: AlignArg,

    /// Keep whitespace around the signature
    #[arg(long)]
    pub no_trim: bool,

    /// Output path (defaults to <form>.pdf)
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum LangArg {
    #[default]
    De,
    Ar,
    En,
}

impl From<LangArg> for forms::Lang {
    fn from(lang: LangArg) -> Self {
        match lang {
            LangArg::De => forms::Lang::De,
            LangArg::Ar => forms::Lang::Ar,
            LangArg::En => forms::Lang::En,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum SourceArg {
    Draw,
    #[default]
    Upload,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ScaleArg {
    #[default]
    Fit,
    Stretch,
}

impl From<ScaleArg> for forms::ScaleMode {
    fn from(mode: ScaleArg) -> Self {
        match mode {
            ScaleArg::Fit => forms::ScaleMode::Fit,
            ScaleArg::Stretch => forms::ScaleMode::Stretch,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum AlignArg {
    #[default]
    Left,
    Center,
    Right,
}

impl From<AlignArg> for forms::SignatureAlign {
    fn from(align: AlignArg) -> Self {
        match align {
            AlignArg::Left => forms::SignatureAlign::Left,
            AlignArg::Center => forms::SignatureAlign::Center,
            AlignArg::Right => forms::SignatureAlign::Right,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context {
        forms_root: cli.forms_root,
        config: cli.config,
        lang: cli.lang.into(),
    };

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::List => commands::list(&ctx, &mut stdout),
        Commands::Fields { form } => commands::fields(&ctx, &form, &mut stdout),
        Commands::Fill(args) => commands::fill(&ctx, &args, &mut stdout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fill() {
        let cli = Cli::try_parse_from([
            "formpdf",
            "--lang",
            "ar",
            "fill",
            "--form",
            "vollmacht",
            "--set",
            "vg_name=Muster",
            "--no-keep-ratio",
            "--align",
            "right",
        ])
        .unwrap();

        assert!(matches!(cli.lang, LangArg::Ar));
        let Commands::Fill(args) = cli.command else {
            panic!("Expected fill");
        };
        assert_eq!(args.form, "vollmacht");
        assert_eq!(args.set, vec![("vg_name".to_string(), "Muster".to_string())]);
        assert!(args.no_keep_ratio);
        assert!(matches!(args.align, AlignArg::Right));
        assert!(matches!(args.signature_source, SourceArg::Upload));
    }
}
