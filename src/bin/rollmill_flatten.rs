//! rollmill-flatten: flatten JSON records into a spreadsheet from a
//! dotted field selection.
//!
//! Usage:
//!   # Pick fields straight from the command line
//!   rollmill-flatten data.json --fields id,user.name,products.name -o report.xlsx
//!
//!   # Read from stdin, write CSV instead
//!   cat data.json | rollmill-flatten --fields id,total -o report.csv
//!
//!   # Save the selection as a named template, then reuse it
//!   rollmill-flatten data.json --fields id,total --save-template invoices
//!   rollmill-flatten data.json --template invoices
//!
//!   # Inspect the store
//!   rollmill-flatten --list-templates
//!   rollmill-flatten --history

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use rollmill::flatten::{partition_available, suggest, FieldCatalog};
use rollmill::flatten_and_record;
use rollmill::sink::{column_plan, output_filename, write_csv, write_xlsx};
use rollmill::store::{FileStore, MemStore, SelectionStore, Template};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "rollmill-flatten")]
#[command(about = "Flatten JSON records into a spreadsheet from a field selection", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Comma-separated field selection, e.g. "id,user.name,products.name"
    #[arg(long, short = 'f')]
    fields: Option<String>,

    /// Apply a stored template by name or id instead of --fields
    #[arg(long, conflicts_with = "fields")]
    template: Option<String>,

    /// Save the field selection as a template with this name
    #[arg(long, requires = "fields")]
    save_template: Option<String>,

    /// Template description, stored alongside --save-template
    #[arg(long, requires = "save_template")]
    description: Option<String>,

    /// Output file; a .csv extension selects CSV output (default: XLSX)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Custom base name for the generated file and the history entry
    #[arg(long)]
    name: Option<String>,

    /// Worksheet name for XLSX output
    #[arg(long, default_value = "JSON Data")]
    sheet_name: String,

    /// Store file for history and templates
    #[arg(long, default_value = "rollmill-store.json")]
    store: String,

    /// Keep history and templates in memory only (nothing written to disk)
    #[arg(long)]
    no_store: bool,

    /// List stored templates and exit
    #[arg(long)]
    list_templates: bool,

    /// List recent selection history and exit
    #[arg(long)]
    history: bool,

    /// Match the most recent selection against this input's fields
    #[arg(long)]
    suggest: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store: Box<dyn SelectionStore> = if args.no_store {
        Box::new(MemStore::new())
    } else {
        Box::new(FileStore::new(&args.store))
    };

    if args.list_templates {
        return list_templates(store.as_ref());
    }
    if args.history {
        return list_history(store.as_ref());
    }

    let records = read_batch(args.input.as_deref())?;

    if args.suggest {
        return suggest_fields(&records, store.as_ref());
    }

    let selectors = resolve_selection(&args, &records, store.as_ref())?;

    let rows = flatten_and_record(&records, &selectors, args.name.as_deref(), store.as_ref())?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => output_filename(args.name.as_deref(), Utc::now()),
    };
    let path = Path::new(&output);

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {output}"))?;
        write_csv(&rows, file)?;
    } else {
        write_xlsx(&rows, path, &args.sheet_name)?;
    }

    let columns = column_plan(&rows);
    println!(
        "Wrote {} rows x {} columns from {} records -> {}",
        rows.len(),
        columns.len(),
        records.len(),
        output
    );

    if let Some(template_name) = &args.save_template {
        let description = args.description.as_deref().unwrap_or("");
        let template = store.add_template(template_name, description, &selectors)?;
        println!("Saved template '{}' (id {})", template.name, template.id);
    }

    Ok(())
}

/// Read the whole input and parse it into a record batch. A JSON array
/// is the batch; a single object is a batch of one.
fn read_batch(input: Option<&str>) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    match input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open: {path}"))?;
            BufReader::new(file).read_to_end(&mut content)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut content)?;
        }
    }

    // Try SIMD parsing first (faster); simd-json mutates its buffer, so
    // the fallback parses the untouched original.
    let mut simd_buffer = content.clone();
    let value: Value = match simd_json::to_owned_value(&mut simd_buffer) {
        Ok(owned) => {
            let json = simd_json::to_string(&owned)?;
            serde_json::from_str(&json)?
        }
        Err(_) => serde_json::from_slice(&content).context("Failed to parse JSON input")?,
    };

    match value {
        Value::Array(records) => Ok(records),
        value @ Value::Object(_) => Ok(vec![value]),
        _ => bail!("Input must be a JSON array of records or a single object"),
    }
}

/// The field selection for this run: either --fields, or a stored
/// template filtered down to what the current batch can use.
fn resolve_selection(
    args: &Args,
    records: &[Value],
    store: &dyn SelectionStore,
) -> Result<Vec<String>> {
    if let Some(fields) = &args.fields {
        return Ok(fields
            .split(',')
            .map(|field| field.trim().to_string())
            .filter(|field| !field.is_empty())
            .collect());
    }

    let Some(wanted) = &args.template else {
        bail!("Select fields with --fields or apply a stored --template");
    };

    let template = find_template(store, wanted)?;
    store.increment_usage(template.id)?;

    let catalog = FieldCatalog::from_batch(records);
    let (applied, unavailable) = partition_available(&template.fields, &catalog);
    if !unavailable.is_empty() {
        log::warn!(
            "template '{}': {} field(s) not present in this input: {}",
            template.name,
            unavailable.len(),
            unavailable.join(", ")
        );
    }
    if applied.is_empty() {
        bail!(
            "Template '{}' has no fields usable with this input",
            template.name
        );
    }

    println!(
        "Applied template '{}': {} of {} fields",
        template.name,
        applied.len(),
        template.fields.len()
    );
    Ok(applied)
}

fn find_template(store: &dyn SelectionStore, wanted: &str) -> Result<Template> {
    if let Ok(id) = wanted.parse::<u64>() {
        if let Some(template) = store.get_template(id)? {
            return Ok(template);
        }
    }

    let found = store
        .list_templates()?
        .into_iter()
        .find(|template| template.name.eq_ignore_ascii_case(wanted));
    match found {
        Some(template) => Ok(template),
        None => bail!("No template named '{wanted}'"),
    }
}

fn list_templates(store: &dyn SelectionStore) -> Result<()> {
    let templates = store.list_templates()?;
    if templates.is_empty() {
        println!("No templates saved yet");
        return Ok(());
    }
    for template in templates {
        println!(
            "{:>4}  {} (used {}x): {}",
            template.id,
            template.name,
            template.usage_count,
            template.fields.join(", ")
        );
        if !template.description.is_empty() {
            println!("      {}", template.description);
        }
    }
    Ok(())
}

fn list_history(store: &dyn SelectionStore) -> Result<()> {
    let history = store.list_history()?;
    if history.is_empty() {
        println!("No selection history yet");
        return Ok(());
    }
    for entry in history {
        println!(
            "{:>4}  {} [{}]: {}",
            entry.id,
            entry.name,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.fields.join(", ")
        );
    }
    Ok(())
}

/// Match the most recent selection's fields against the current batch
/// and print direct matches plus near-miss suggestions.
fn suggest_fields(records: &[Value], store: &dyn SelectionStore) -> Result<()> {
    let history = store.list_history()?;
    let Some(last) = history.first() else {
        bail!("No selection history to suggest from");
    };

    let catalog = FieldCatalog::from_batch(records);
    let result = suggest(&last.fields, &catalog);

    println!("Reference selection: {}", last.fields.join(", "));
    if result.matched.is_empty() {
        println!("No direct matches");
    } else {
        println!("Matched: {}", result.matched.join(", "));
    }
    for group in &result.suggestions {
        println!(
            "  {} -> maybe {}",
            group.reference,
            group.suggestions.join(", ")
        );
    }
    Ok(())
}
