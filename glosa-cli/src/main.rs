//! Glosa CLI - explore coupled XML/JSON documents and drive corrections

mod render;

use clap::{Parser, Subcommand};
use glosa_client::CorrectionClient;
use glosa_core::correction::ChangeEntry;
use glosa_core::normalize::ValidationFault;
use glosa_core::path::{json as json_path, xml as xml_path};
use glosa_core::search::{expansion_closure, json_expansion_closure, search, search_json};
use glosa_core::{parse_tree, Config, GlosaError};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "glosa")]
#[command(about = "Explore and correct coupled XML/JSON document sets", long_about = None)]
struct Cli {
    /// Config file (TOML); defaults are used when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Correction service base URL
    #[arg(long, global = true, env = "GLOSA_SERVICE_URL")]
    service_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a document as an addressable tree
    Tree {
        /// XML or JSON file (format detected by extension)
        file: PathBuf,

        /// Descend into documents embedded in CDATA blocks
        #[arg(long)]
        embedded: bool,
    },

    /// Search a document and show matches plus the expansion closure
    Search {
        file: PathBuf,

        /// Case-insensitive substring query
        query: String,
    },

    /// Resolve a path expression to a value
    Resolve {
        file: PathBuf,

        /// XML path (Tag/Tag) or JSON path (key[0].key)
        path: String,
    },

    /// Send validator faults to the analysis service and show proposals
    Analyze {
        /// XML envelope file
        xml: PathBuf,
        /// RIPS JSON file
        rips: PathBuf,
        /// JSON file with validator faults (array of fault objects)
        faults: PathBuf,
    },

    /// Apply an assembled change set through the patch service
    Apply {
        xml: PathBuf,
        rips: PathBuf,
        /// JSON file with the change set (array of change entries)
        changes: PathBuf,
        /// Where to write the corrected XML (default: <xml>.corrected)
        #[arg(long)]
        out_xml: Option<PathBuf>,
        /// Where to write the corrected RIPS JSON (default: <rips>.corrected)
        #[arg(long)]
        out_rips: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Tree { file, embedded } => cmd_tree(&file, embedded, cli.json, &config),
        Commands::Search { file, query } => cmd_search(&file, &query, cli.json, &config),
        Commands::Resolve { file, path } => cmd_resolve(&file, &path, cli.json, &config),
        Commands::Analyze { xml, rips, faults } => cmd_analyze(
            &xml,
            &rips,
            &faults,
            cli.json,
            cli.service_url.as_deref(),
            &config,
        ),
        Commands::Apply {
            xml,
            rips,
            changes,
            out_xml,
            out_rips,
        } => cmd_apply(
            &xml,
            &rips,
            &changes,
            out_xml,
            out_rips,
            cli.json,
            cli.service_url.as_deref(),
            &config,
        ),
    };

    if let Err(e) = result {
        if cli.json {
            let error_json = match &e {
                GlosaError::ServiceError {
                    code,
                    message,
                    hint,
                } => serde_json::json!({ "code": code, "message": message, "hint": hint }),
                _ => serde_json::json!({ "code": "error", "message": e.to_string(), "hint": "" }),
            };
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error_json).unwrap_or_default()
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> glosa_core::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn make_client(
    service_url: Option<&str>,
    config: &Config,
) -> glosa_core::Result<CorrectionClient> {
    let base_url = service_url.unwrap_or(&config.service.base_url);
    CorrectionClient::new(base_url, config.timeout_duration())
}

/// XML unless the file extension says JSON.
fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn cmd_tree(file: &Path, embedded: bool, json_out: bool, config: &Config) -> glosa_core::Result<()> {
    let content = std::fs::read_to_string(file)?;

    if is_json_file(file) {
        let value: serde_json::Value = serde_json::from_str(&content)?;
        if json_out {
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            render::print_json_tree(&value, "", 0, config.explorer.value_preview_chars);
        }
        return Ok(());
    }

    let tree = parse_tree(&content)?;
    if json_out {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        render::print_xml_tree(&tree, 0, embedded, config.explorer.value_preview_chars);
    }
    Ok(())
}

fn cmd_search(file: &Path, query: &str, json_out: bool, config: &Config) -> glosa_core::Result<()> {
    use colored::Colorize;

    let content = std::fs::read_to_string(file)?;
    let (matches, closure) = if is_json_file(file) {
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let matches = search_json(&value, query);
        let closure = json_expansion_closure(&matches);
        (matches, closure)
    } else {
        let tree = parse_tree(&content)?;
        let matches = search(&tree, query);
        let closure = expansion_closure(&matches);
        (matches, closure)
    };

    if json_out {
        let out = serde_json::json!({
            "query": query,
            "matches": matches,
            "expansion_closure": closure,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} match(es) for {:?}, {} container(s) to expand",
        matches.len().to_string().bold(),
        query,
        closure.len()
    );
    for path in matches.iter().take(config.explorer.max_results) {
        println!("  {}", path.green());
    }
    if matches.len() > config.explorer.max_results {
        println!(
            "  {} ({} more not shown)",
            "…".dimmed(),
            matches.len() - config.explorer.max_results
        );
    }
    Ok(())
}

fn cmd_resolve(file: &Path, path: &str, json_out: bool, config: &Config) -> glosa_core::Result<()> {
    use colored::Colorize;

    let content = std::fs::read_to_string(file)?;

    if is_json_file(file) {
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let resolved = json_path::resolve(&value, path)?;
        if json_out {
            println!("{}", serde_json::to_string_pretty(resolved)?);
        } else {
            println!("{} = {}", path.green(), resolved);
        }
        return Ok(());
    }

    let tree = parse_tree(&content)?;
    let node = xml_path::resolve(&tree, path)?;
    if json_out {
        println!("{}", serde_json::to_string_pretty(&node)?);
        return Ok(());
    }
    println!(
        "{} = {:?}",
        path.green(),
        render::preview(&node.direct_text, config.explorer.value_preview_chars)
    );
    // First-match resolution is kept, but the operator should know.
    if let Err(e) = xml_path::check_unique(&tree, path) {
        println!("{} {}", "warning:".yellow().bold(), e);
    }
    Ok(())
}

fn cmd_analyze(
    xml: &Path,
    rips: &Path,
    faults: &Path,
    json_out: bool,
    service_url: Option<&str>,
    config: &Config,
) -> glosa_core::Result<()> {
    use colored::Colorize;

    let xml_text = std::fs::read_to_string(xml)?;
    let rips_json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(rips)?)?;
    let faults: Vec<ValidationFault> = serde_json::from_str(&std::fs::read_to_string(faults)?)?;

    let client = make_client(service_url, config)?;
    let outcome = client.analyze(&faults, &xml_text, &rips_json)?;

    if json_out {
        let out = serde_json::json!({
            "proposals": outcome.proposals,
            "manual_review": outcome.manual_review,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} proposal(s), {} item(s) need manual review",
        outcome.proposals.len().to_string().bold(),
        outcome.manual_review.len()
    );
    for (index, proposal) in outcome.proposals.iter().enumerate() {
        let location = proposal
            .json_path
            .as_deref()
            .or(proposal.xml_path.as_deref())
            .unwrap_or("-");
        println!(
            "  [{}] {} {}: {} -> {}  ({})",
            index,
            proposal.error_code.red(),
            proposal.field_label.bold(),
            proposal.current_value,
            proposal.proposed_value,
            location.dimmed()
        );
        if !proposal.justification.is_empty() {
            println!("      {}", proposal.justification.dimmed());
        }
    }
    for item in &outcome.manual_review {
        println!(
            "  {} {}: {} ({})",
            "manual".yellow(),
            item.error_code,
            item.error_description,
            item.reason.dimmed()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_apply(
    xml: &Path,
    rips: &Path,
    changes: &Path,
    out_xml: Option<PathBuf>,
    out_rips: Option<PathBuf>,
    json_out: bool,
    service_url: Option<&str>,
    config: &Config,
) -> glosa_core::Result<()> {
    use colored::Colorize;

    let xml_text = std::fs::read_to_string(xml)?;
    let rips_json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(rips)?)?;
    let changes: Vec<ChangeEntry> = serde_json::from_str(&std::fs::read_to_string(changes)?)?;
    if changes.is_empty() {
        return Err(GlosaError::EmptyChangeSet);
    }

    let client = make_client(service_url, config)?;
    let corrected = client.apply(&changes, &xml_text, &rips_json)?;

    let out_xml = out_xml.unwrap_or_else(|| corrected_path(xml));
    let out_rips = out_rips.unwrap_or_else(|| corrected_path(rips));
    std::fs::write(&out_xml, &corrected.xml_text)?;
    std::fs::write(&out_rips, serde_json::to_string_pretty(&corrected.rips_json)?)?;

    if json_out {
        let out = serde_json::json!({
            "changes_applied": corrected.changes_applied,
            "xml": out_xml,
            "rips": out_rips,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} change(s) applied",
            corrected.changes_applied.to_string().bold().green()
        );
        println!("  corrected XML:  {}", out_xml.display());
        println!("  corrected RIPS: {}", out_rips.display());
    }
    Ok(())
}

/// `invoice.xml` -> `invoice.corrected.xml`
fn corrected_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => path.with_extension(format!("corrected.{}", ext)),
        None => path.with_extension("corrected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json_file() {
        assert!(is_json_file(Path::new("rips.json")));
        assert!(is_json_file(Path::new("RIPS.JSON")));
        assert!(!is_json_file(Path::new("envelope.xml")));
        assert!(!is_json_file(Path::new("noext")));
    }

    #[test]
    fn test_corrected_path() {
        assert_eq!(
            corrected_path(Path::new("dir/invoice.xml")),
            PathBuf::from("dir/invoice.corrected.xml")
        );
        assert_eq!(
            corrected_path(Path::new("rips")),
            PathBuf::from("rips.corrected")
        );
    }
}
