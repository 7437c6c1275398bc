//! CLI command implementations

use anyhow::Context;
use puncover_collector::{Analysis, Collector, CollectorConfig};
use puncover_core::{StackPath, Symbol};

use crate::Inputs;

/// Parse every given input and run the enhancement passes.
pub fn collect(inputs: &Inputs) -> anyhow::Result<Analysis> {
    if inputs.sizes.is_none() && inputs.disassembly.is_none() {
        anyhow::bail!("need at least --sizes or --disassembly");
    }

    let config = match &inputs.config {
        Some(path) => CollectorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CollectorConfig::default(),
    };
    let mut collector = Collector::new(config);

    if let Some(path) = &inputs.sizes {
        collector.parse_size_file(path)?;
    }
    if let Some(path) = &inputs.demangled_sizes {
        collector.parse_display_name_file(path)?;
    }
    if let Some(path) = &inputs.disassembly {
        collector.parse_assembly_file(path)?;
    }
    let mut attached = 0;
    for path in &inputs.stack_usage {
        attached += collector.parse_stack_usage_file(path)?;
    }
    if !inputs.stack_usage.is_empty() {
        tracing::info!("stack usage attached to {} symbols", attached);
    }

    collector.finish().context("Failed to enhance collected symbols")
}

pub fn dump_json(analysis: &Analysis) -> anyhow::Result<()> {
    let symbols: Vec<&Symbol> = analysis.symbols().iter().collect();
    println!("{}", serde_json::to_string_pretty(&symbols)?);
    Ok(())
}

pub fn report(analysis: &Analysis, top: usize) {
    let functions = analysis.functions().count();
    let variables = analysis.variables().count();
    println!(
        "Symbols: {} ({} functions, {} variables)",
        functions + variables,
        functions,
        variables
    );
    println!(
        "Files: {} in {} folders",
        analysis.tree().files().count(),
        analysis.tree().folders().count()
    );

    let mut by_size: Vec<&Symbol> = analysis.functions().filter(|s| s.size.is_some()).collect();
    by_size.sort_by_key(|s| std::cmp::Reverse(s.size));
    println!();
    println!("Largest functions:");
    for symbol in by_size.into_iter().take(top) {
        println!(
            "{:>8}  {}  ({})",
            symbol.size.unwrap_or_default(),
            symbol.name,
            location(symbol)
        );
    }

    let mut by_stack: Vec<StackPath> = analysis
        .functions()
        .filter(|s| s.stack_size.is_some())
        .filter_map(|s| analysis.deepest_callee_tree(s.address).ok())
        .collect();
    by_stack.sort_by_key(|path| std::cmp::Reverse(path.total_stack));
    if !by_stack.is_empty() {
        println!();
        println!("Deepest stack:");
        for path in by_stack.into_iter().take(top) {
            println!(
                "{:>8}  {}{}",
                path.total_stack,
                chain(analysis, &path),
                if path.recursive { "  (recursive)" } else { "" }
            );
        }
    }

    println!();
    println!("Folders:");
    print!("{}", analysis.tree().render_collapsed());
}

pub fn stack(analysis: &Analysis, query: &str, callers: bool) -> anyhow::Result<()> {
    let symbol = match analysis.symbol_by_name(query) {
        Some(symbol) => symbol,
        None => analysis
            .symbol_by_addr(query)
            .ok()
            .flatten()
            .with_context(|| format!("No symbol named or at {}", query))?,
    };

    let path = if callers {
        analysis.deepest_caller_tree(symbol.address)?
    } else {
        analysis.deepest_callee_tree(symbol.address)?
    };

    println!("{}: {} bytes worst case", symbol.name, path.total_stack);
    for address in &path.path {
        if let Some(frame) = analysis.symbol(*address) {
            println!(
                "{:>8}  {}",
                frame.stack_size.map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()),
                frame.name
            );
        }
    }
    if path.recursive {
        println!("(recursive, real worst case is unbounded)");
    }
    Ok(())
}

fn location(symbol: &Symbol) -> String {
    match (symbol.base_file.as_deref(), symbol.line) {
        (Some(file), Some(line)) => format!("{}:{}", file, line),
        (Some(file), None) => file.to_string(),
        _ => "?".to_string(),
    }
}

fn chain(analysis: &Analysis, path: &StackPath) -> String {
    path.path
        .iter()
        .filter_map(|address| analysis.symbol(*address))
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
