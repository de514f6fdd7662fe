use std::cell::Cell;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use cxi_decode::{ExportPackage, ImportConfig, ImportListener};
use cxi_range::IdRangeList;
use cxi_store::{Cleanup, ExportIndex, FsPropertyStore, PropertyStore, Teardown};
use cxi_types::EntityId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Import(args) => cmd_import(args),
        Command::Spaces(args) => cmd_spaces(args, format),
        Command::Show(args) => cmd_show(args),
        Command::Ids(args) => cmd_ids(args, format),
        Command::Ranges(args) => cmd_ranges(args, format),
    }
}

/// Prints progress in ten-percent steps.
struct ProgressPrinter {
    last: Cell<u32>,
}

impl ImportListener for ProgressPrinter {
    fn progress(&self, fraction: f64) {
        let step = (fraction * 10.0) as u32;
        if step > self.last.get() {
            self.last.set(step);
            eprintln!("  {} {:>3}%", "decoding".dimmed(), step * 10);
        }
    }
}

fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ImportConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ImportConfig::default(),
    };
    if args.id_ranges.is_some() {
        config.id_ranges = args.id_ranges;
    }
    if args.work_dir.is_some() {
        config.work_dir = args.work_dir;
    }
    config.excluded_spaces.extend(args.exclude);
    config.keep_work_dir = true;
    config.validate()?;

    let listener = ProgressPrinter { last: Cell::new(0) };
    let package = ExportPackage::open(&args.export, &config, &listener)
        .with_context(|| format!("importing {}", args.export.display()))?;

    let index = package.index();
    let stats = index.stats();
    println!("{} Imported {}", "✓".green().bold(), args.export.display().to_string().bold());
    if let Some(descriptor) = package.descriptor() {
        println!(
            "  Export: {} (build {})",
            descriptor.export_type().unwrap_or("unknown").cyan(),
            descriptor
                .build_number()
                .map_or_else(|| "?".to_string(), |b| b.to_string())
        );
    }
    println!("  Objects: {}", stats.objects().to_string().bold());
    println!("  Records: {}", stats.records_written);
    println!("  Spaces: {}", index.space_ids().count());
    if stats.rejected_by_range > 0 {
        println!("  Outside id ranges: {}", stats.rejected_by_range.to_string().yellow());
    }
    if stats.dropped > 0 {
        println!("  Dropped: {}", stats.dropped.to_string().yellow());
    }
    if index.was_cancelled() {
        println!("  {}", "cancel was requested during the pass".yellow());
    }

    let store_root = package.store().root().to_path_buf();
    if let Cleanup::Kept(_) = package.close(Teardown::Keep)? {
        println!("  Store: {}", store_root.display().to_string().cyan());
    }
    Ok(())
}

fn open_store(path: &Path) -> anyhow::Result<(FsPropertyStore, ExportIndex)> {
    let store = FsPropertyStore::open(path)
        .with_context(|| format!("opening store {}", path.display()))?;
    let index = ExportIndex::load(path)?;
    Ok((store, index))
}

fn cmd_spaces(args: SpacesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (_, index) = open_store(&args.store)?;
    match format {
        OutputFormat::Json => {
            let spaces: Vec<_> = index
                .spaces_by_key()
                .map(|(key, id)| {
                    serde_json::json!({
                        "key": key,
                        "id": id,
                        "pages": index.pages(id).len(),
                        "blog_posts": index.blog_posts(id).len(),
                        "excluded": index.is_excluded(id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&spaces)?);
        }
        OutputFormat::Text => {
            for (key, id) in index.spaces_by_key() {
                let marker = if index.is_excluded(id) { " (excluded)".dimmed().to_string() } else { String::new() };
                println!(
                    "{:<16} {:>12}  {} pages, {} blog posts{}",
                    key.yellow().bold(),
                    id,
                    index.pages(id).len(),
                    index.blog_posts(id).len(),
                    marker
                );
            }
        }
    }
    Ok(())
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let (store, _) = open_store(&args.store)?;
    let set = args.kind.record_set(args.parent)?;
    for text in &args.ids {
        let id = EntityId::parse(set.shape(), text)?;
        let key = set
            .key(&id)
            .with_context(|| format!("{id} is not a valid id for {:?}", args.kind))?;
        match store.get(&key)? {
            Some(record) => {
                println!("{}", key.to_string().yellow().bold());
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            None => println!("{} {}", key.to_string().yellow().bold(), "not found".red()),
        }
    }
    Ok(())
}

fn cmd_ids(args: IdsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (store, _) = open_store(&args.store)?;
    let ids = store.list_ids(&args.kind.record_set(args.parent)?)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&ids)?),
        OutputFormat::Text => {
            for id in &ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn cmd_ranges(args: RangesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut ranges = args
        .expr
        .parse::<IdRangeList<String>>()
        .with_context(|| format!("parsing {:?}", args.expr))?;
    let verdicts: Vec<(String, bool)> = args
        .ids
        .into_iter()
        .map(|id| {
            let admitted = ranges.push_id(&id);
            (id, admitted)
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out: Vec<_> = verdicts
                .iter()
                .map(|(id, admitted)| serde_json::json!({ "id": id, "admitted": admitted }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{}", ranges.to_string().bold());
            for (id, admitted) in &verdicts {
                let verdict = if *admitted { "admitted".green() } else { "rejected".red() };
                println!("  {id:>12}  {verdict}");
            }
            match ranges.next_id() {
                Some(next) => println!("  next id: {}", next.as_str().cyan()),
                None if ranges.is_exhausted() => println!("  {}", "all ranges closed".dimmed()),
                None => {}
            }
        }
    }
    Ok(())
}
