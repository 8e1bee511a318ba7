//! hwpmerge CLI - exam-question assembly tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use hwpmerge::{
    audit, list_questions, merge, read_package_file, to_json, ExtractOptions, JsonFormat,
    MergeOptions, Selector, StylePolicy,
};

#[derive(Parser)]
#[command(name = "hwpmerge")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Assemble exam-question fragments into HML and HWPX documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge source packages into a template
    Merge {
        /// Source packages, merged in the given order
        #[arg(value_name = "SOURCE", required = true)]
        sources: Vec<PathBuf>,

        /// Template package
        #[arg(short, long, value_name = "FILE", env = "HWPMERGE_TEMPLATE")]
        template: PathBuf,

        /// Output file (defaults to merged.<ext> next to the template)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Value for {{TITLE}}
        #[arg(long)]
        title: Option<String>,

        /// Value for {{DATE}} (today if not specified)
        #[arg(long)]
        date: Option<String>,

        /// Format for the default date
        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,

        /// Extra placeholder as NAME=VALUE (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_key_val)]
        placeholders: Vec<(String, String)>,

        /// Fail unless the template contains {{NAME}} (repeatable)
        #[arg(long = "require", value_name = "NAME")]
        required: Vec<String>,

        /// Part of each source to merge: all, q<N>, or <A>..<B>
        #[arg(long, default_value = "all")]
        select: Selector,

        /// Keep column and page breaks from the sources
        #[arg(long)]
        keep_breaks: bool,

        /// How source styles are carried over
        #[arg(long, value_enum, default_value = "import")]
        styles: StyleMode,

        /// Write the merge report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Skip the structural audit of the output
        #[arg(long)]
        no_audit: bool,
    },

    /// List the questions of a source package
    #[command(alias = "q")]
    Questions {
        /// Source package
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check a package for structural problems
    Inspect {
        /// Package to check
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StyleMode {
    /// Import referenced style entries from each source
    Import,
    /// Use the template's base style entries
    Template,
}

impl From<StyleMode> for StylePolicy {
    fn from(mode: StyleMode) -> Self {
        match mode {
            StyleMode::Import => StylePolicy::Import,
            StyleMode::Template => StylePolicy::TemplateDefaults,
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty placeholder name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge {
            sources,
            template,
            output,
            title,
            date,
            date_format,
            placeholders,
            required,
            select,
            keep_breaks,
            styles,
            report,
            no_audit,
        } => {
            let mut extract = ExtractOptions::new().with_selector(select);
            if keep_breaks {
                extract = extract.keep_breaks();
            }
            let mut options = MergeOptions::new()
                .with_date_format(date_format)
                .with_style_policy(styles.into())
                .with_extract(extract);
            if let Some(title) = title {
                options = options.with_title(title);
            }
            if let Some(date) = date {
                options = options.with_date(date);
            }
            for (name, value) in placeholders {
                options = options.with_placeholder(name, value);
            }
            for name in required {
                options = options.require(name);
            }
            if no_audit {
                options = options.without_audit();
            }
            cmd_merge(&template, &sources, output.as_deref(), report.as_deref(), &options)
        }
        Commands::Questions { input, json } => cmd_questions(&input, json),
        Commands::Inspect { input, json } => cmd_inspect(&input, json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_merge(
    template: &Path,
    sources: &[PathBuf],
    output: Option<&Path>,
    report_path: Option<&Path>,
    options: &MergeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(sources.len() as u64 + 2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Reading template...");
    let template_bytes = fs::read(template)?;
    pb.inc(1);

    let mut source_bytes = Vec::with_capacity(sources.len());
    for source in sources {
        pb.set_message(format!("Reading {}...", source.display()));
        source_bytes.push(fs::read(source)?);
        pb.inc(1);
    }

    pb.set_message("Merging...");
    let merged = merge(&template_bytes, &source_bytes, options)?;
    pb.inc(1);

    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let ext = merged.report.format.map_or("hml", |f| f.extension());
        template.with_file_name(format!("merged.{}", ext))
    });
    fs::write(&output_path, &merged.bytes)?;
    pb.finish_with_message("Done!");

    let report = &merged.report;
    println!("\n{} {}", "Saved to".green(), output_path.display());
    println!("{}: {}", "Fragments".bold(), report.stats.fragment_count);
    println!("{}: {}", "Elements".bold(), report.stats.element_count);
    println!("{}: {}", "Assets".bold(), report.stats.asset_count);
    println!("{}: {}", "Style entries".bold(), report.stats.style_count);
    println!("{}: {}", "Counts rewritten".bold(), report.count_adjustments.len());

    for note in &report.notes {
        println!("  {} {}", "note".dimmed(), note);
    }
    for finding in &report.findings {
        println!("  {} {}", "audit".yellow(), finding);
    }

    if let Some(path) = report_path {
        fs::write(path, to_json(report, JsonFormat::Pretty)?)?;
        println!("{} {}", "Report saved to".green(), path.display());
    }

    Ok(())
}

fn cmd_questions(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let package = read_package_file(input)?;
    let questions = list_questions(&package, ExtractOptions::default())?;

    if json {
        println!("{}", to_json(&questions, JsonFormat::Pretty)?);
        return Ok(());
    }

    println!("{} ({})", "Questions".cyan().bold(), package.format);
    println!("{}", "─".repeat(40).dimmed());
    for q in &questions {
        let preview: String = q.plain_text.chars().take(60).collect();
        println!(
            "{:>3}  {:>3} elements  {:>2} images  {}",
            q.number.to_string().bold(),
            q.element_count,
            q.asset_refs.len(),
            preview
        );
    }
    println!("\n{} questions", questions.len());

    Ok(())
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let package = read_package_file(input)?;
    let findings = audit(&package);

    if json {
        println!("{}", to_json(&findings, JsonFormat::Pretty)?);
        return Ok(());
    }

    println!("{}", "Structure Check".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), package.format);
    println!("{}: {}", "Parts".bold(), package.parts.len());

    if findings.is_empty() {
        println!("\n{}", "No structural problems found".green());
    } else {
        println!();
        for finding in &findings {
            println!("  {} {}", "✗".red(), finding);
        }
        println!("\n{} {} problems", "Found".yellow().bold(), findings.len());
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "hwpmerge".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Exam-question assembly for HML and HWPX documents");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/hwpmerge".dimmed());
    println!("License: MIT");
}
