//! Extension packager CLI

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use extpack::analyzer::{analyze_languages, compare_with_template, LanguageAnalysis};
use extpack::config::AppConfig;
use extpack::models::{Diagnostics, Installation, PipelineFailure};
use extpack::packager::{list_archive_entries, PackagePipeline};
use extpack::parser::manifest::{check_requirements, parse_manifest};
use extpack::report;
use extpack::storage::{ConnectionSettings, LocalBackend, RemoteBackend, StorageBackend};
use extpack::PackageOptions;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "extpack")]
#[command(about = "Package and analyze CMS extensions from local or FTP installations", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the installation lives; overrides the configuration file
#[derive(Args)]
struct TargetArgs {
    /// Web root of the installation
    #[arg(long, global = true)]
    web_root: Option<String>,

    /// FTP host; selects remote mode
    #[arg(long, global = true)]
    ftp_host: Option<String>,

    #[arg(long, global = true)]
    ftp_user: Option<String>,

    #[arg(long, global = true)]
    ftp_password: Option<String>,

    #[arg(long, global = true)]
    ftp_port: Option<u16>,

    /// Use explicit FTPS
    #[arg(long, global = true)]
    ftp_tls: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an installable archive of an extension
    Package {
        /// Element name (com_x, mod_x, pkg_x)
        element: Option<String>,

        /// Manifest path on the installation, instead of an element name
        #[arg(short, long)]
        manifest: Option<String>,

        /// Folder the archive is saved to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Regenerate install SQL from the database
        #[arg(long)]
        export_database: bool,

        /// Keep an existing archive as a numbered backup
        #[arg(long)]
        rename_existing: bool,

        /// Write a markdown report next to the archive
        #[arg(short, long)]
        report: bool,
    },

    /// Check a local manifest file
    Manifest {
        file: PathBuf,
    },

    /// List declared language constants no code file uses
    UnusedConstants {
        element: String,

        #[arg(long)]
        json: bool,
    },

    /// List constants used in code but never declared
    OrphanedConstants {
        element: String,

        #[arg(long)]
        json: bool,
    },

    /// Compare a component directory with a reference template
    CompareTemplate {
        component: String,
        template: String,

        /// Placeholder value, as name=value
        #[arg(long = "set", value_name = "NAME=VALUE")]
        placeholders: Vec<String>,
    },

    /// List the entries of an archive
    Inspect {
        archive: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{}", "❌ Failed!".red().bold());
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Some(
            AppConfig::load(path).with_context(|| format!("loading configuration {}", path.display()))?,
        ),
        None => None,
    };

    match cli.command {
        Commands::Package {
            element,
            manifest,
            output,
            export_database,
            rename_existing,
            report,
        } => {
            let installation = installation(config.as_ref(), &cli.target, element.as_deref())?;
            let backend = backend(config.as_ref(), &cli.target)?;
            let mut options = config
                .as_ref()
                .map(AppConfig::package_options)
                .unwrap_or_default();
            options.export_database |= export_database;
            options.rename_existing |= rename_existing;
            let dest_dir = output
                .or_else(|| config.as_ref().map(AppConfig::output_dir))
                .unwrap_or_else(|| PathBuf::from("."));
            package(backend.as_ref(), &installation, element, manifest, &dest_dir, options, report)
        }

        Commands::Manifest { file } => check_manifest(&file),

        Commands::UnusedConstants { element, json } => {
            let analysis = analyze(config.as_ref(), &cli.target, &element)?;
            print_unused(&analysis, json)
        }

        Commands::OrphanedConstants { element, json } => {
            let analysis = analyze(config.as_ref(), &cli.target, &element)?;
            print_orphaned(&analysis, json)
        }

        Commands::CompareTemplate {
            component,
            template,
            placeholders,
        } => {
            let backend = backend(config.as_ref(), &cli.target)?;
            let values = parse_placeholders(&placeholders)?;
            let comparison = compare_with_template(backend.as_ref(), &component, &template, &values)
                .context("comparing with the template")?;
            if comparison.is_clean() {
                println!("{}", "✅ Component matches the template".green());
            } else {
                print!("{}", report::generate_template_report(&comparison)?);
            }
            Ok(())
        }

        Commands::Inspect { archive } => {
            let entries = list_archive_entries(&archive)
                .with_context(|| format!("reading {}", archive.display()))?;
            println!("{}", format!("📦 {} ({} entries)", archive.display(), entries.len()).bold());
            for entry in entries {
                println!("  {}", entry);
            }
            Ok(())
        }
    }
}

fn installation(config: Option<&AppConfig>, target: &TargetArgs, element: Option<&str>) -> Result<Installation> {
    let mut installation = match (config, &target.web_root) {
        (_, Some(web_root)) => Installation::new("command line", web_root.clone()),
        (Some(config), None) => config.installation.clone(),
        (None, None) => bail!("no installation given; use --config or --web-root"),
    };
    if let Some(element) = element {
        installation = installation.with_element(element);
    }
    Ok(installation)
}

fn backend(config: Option<&AppConfig>, target: &TargetArgs) -> Result<Box<dyn StorageBackend>> {
    let settings = match (&target.ftp_host, config.and_then(|c| c.remote.clone())) {
        (Some(host), _) => {
            let mut settings = ConnectionSettings::new(
                host.clone(),
                target.ftp_user.clone().unwrap_or_else(|| "anonymous".to_string()),
                target.ftp_password.clone().unwrap_or_default(),
            );
            settings.use_tls = target.ftp_tls;
            if let Some(port) = target.ftp_port {
                settings.port = port;
            }
            Some(settings)
        }
        (None, remote) => remote,
    };

    match settings {
        Some(settings) => {
            let host = settings.host.clone();
            let remote = RemoteBackend::connect(settings).with_context(|| format!("connecting to {}", host))?;
            Ok(Box::new(remote))
        }
        None => Ok(Box::new(LocalBackend::new())),
    }
}

fn package(
    backend: &dyn StorageBackend,
    installation: &Installation,
    element: Option<String>,
    manifest: Option<String>,
    dest_dir: &Path,
    options: PackageOptions,
    write_report: bool,
) -> Result<()> {
    println!("{}", "Extension Packager".bold().blue());
    println!("{}", "=".repeat(50).blue());
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.blue} {pos} files {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));

    let pipeline = PackagePipeline::new(backend, installation, options).with_observer(|entry| {
        spinner.set_message(entry.archive_entry_name.clone());
        spinner.inc(1);
    });
    let manifest_path = match (manifest, element) {
        (Some(path), _) => path,
        (None, Some(element)) => pipeline.locate(&element)?,
        (None, None) => bail!("give an element name or --manifest"),
    };
    spinner.set_message(format!("reading {}", manifest_path));

    let result = pipeline.run(&manifest_path, dest_dir);
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("{}", "✅ Package created successfully!".green().bold());
            println!();
            println!("📊 Summary:");
            println!("  - Extension: {} v{}", outcome.extension_name, outcome.version);
            println!("  - Entries: {}", outcome.entries.len());
            if !outcome.children.is_empty() {
                println!("  - Bundled: {}", outcome.children.join(", "));
            }
            println!("  - Output: {}", outcome.archive_path.display());

            if write_report {
                let report_path = outcome.archive_path.with_extension("md");
                let content = report::generate_report(&outcome)?;
                std::fs::write(&report_path, content)
                    .with_context(|| format!("writing {}", report_path.display()))?;
                println!("  - Report: {}", report_path.display());
            }
            print_diagnostics(&outcome.diagnostics);
            Ok(())
        }
        Err(failure) => {
            print_failure(&failure);
            bail!("packaging failed")
        }
    }
}

fn check_manifest(file: &Path) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let path = file.to_string_lossy().replace('\\', "/");
    let manifest = parse_manifest(&bytes, &path)?;

    println!("{}", "📄 Manifest".bold().blue());
    println!("{}", "=".repeat(50).blue());
    println!("Type: {}", manifest.extension_type);
    println!("Name: {} v{}", manifest.name(), manifest.version());
    if let Ok(element) = manifest.element_name() {
        println!("Element: {}", element);
    }
    let sections: Vec<&str> = manifest.section_order().iter().map(|kind| kind.name()).collect();
    println!("Sections: {}", sections.join(", "));
    if let Some(servers) = manifest.update_servers() {
        for server in servers {
            println!("Update server: {} ({})", server.name, server.url);
        }
    }
    println!();

    match check_requirements(&manifest) {
        Ok(()) => {
            println!("{}", "✅ All required elements present".green());
            Ok(())
        }
        Err(e) => {
            println!("{}", format!("❌ {}", e).red());
            bail!("manifest is incomplete")
        }
    }
}

fn analyze(config: Option<&AppConfig>, target: &TargetArgs, element: &str) -> Result<LanguageAnalysis> {
    let installation = installation(config, target, Some(element))?;
    let backend = backend(config, target)?;
    let file_types = config
        .map(AppConfig::package_options)
        .unwrap_or_default()
        .code_file_types;
    analyze_languages(backend.as_ref(), &installation, element, file_types)
        .with_context(|| format!("analyzing language constants of {}", element))
}

fn print_unused(analysis: &LanguageAnalysis, json: bool) -> Result<()> {
    if json {
        println!("{}", report::to_json(&analysis.unused)?);
        return Ok(());
    }
    println!("{}", format!("🔍 Unused constants of {}", analysis.extension_name).bold().blue());
    println!();
    for file in &analysis.unused {
        if file.constants.is_empty() {
            println!("{} {}", "✅".green(), file.file);
            continue;
        }
        println!("{} {} ({})", "⚠️ ".yellow(), file.file, file.constants.len());
        for constant in &file.constants {
            println!("  - {}", constant);
        }
    }
    print_diagnostics(&analysis.diagnostics);
    Ok(())
}

fn print_orphaned(analysis: &LanguageAnalysis, json: bool) -> Result<()> {
    if json {
        println!("{}", report::to_json(&analysis.orphaned)?);
        return Ok(());
    }
    println!("{}", format!("🔍 Orphaned constants of {}", analysis.extension_name).bold().blue());
    println!();
    if analysis.orphaned.is_empty() {
        println!("{}", "✅ No orphaned constants found!".green());
    }
    for orphan in &analysis.orphaned {
        println!(
            "{} {}:{} {}",
            orphan.scope.as_str().dimmed(),
            orphan.file,
            orphan.line,
            orphan.constant.yellow()
        );
    }
    print_diagnostics(&analysis.diagnostics);
    Ok(())
}

fn print_failure(failure: &PipelineFailure) {
    eprintln!("{}", "❌ Packaging failed!".red().bold());
    if let Some(name) = &failure.extension_name {
        eprintln!("  Extension: {}", name);
    }
    eprintln!("  Reached: {}", failure.reached);
    for error in &failure.errors {
        eprintln!("{}", format!("  - {}", error).red());
    }
    let missing = failure.missing_extensions();
    if !missing.is_empty() {
        eprintln!();
        eprintln!("{}", "📝 Install the missing extensions, then package again.".yellow());
    }
    print_diagnostics(&failure.diagnostics);
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if !diagnostics.warnings.is_empty() {
        println!();
        println!("{}", "⚠️  Warnings:".yellow().bold());
        for warning in &diagnostics.warnings {
            println!("  - {}", warning);
        }
    }
    if !diagnostics.messages.is_empty() {
        println!();
        println!("{}", "ℹ️  Messages:".blue().bold());
        for message in &diagnostics.messages {
            println!("  - {}", message);
        }
    }
}

fn parse_placeholders(values: &[String]) -> Result<HashMap<String, String>> {
    values
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => Ok((name.trim().to_string(), value.to_string())),
            None => bail!("placeholder '{}' is not NAME=VALUE", pair),
        })
        .collect()
}
