//! rstlex command-line entry point

mod cli;

use std::io::{Read, Write};

use anyhow::{Context, Result};
use clap::Parser;

use cli::{CliArgs, OutputMode, RunOptions};
use rstlex::theme::PropertyFile;
use rstlex::{LexerConfig, RopeSource, RstLexer, Span, StyleRecorder, StyleTable};

fn main() -> Result<()> {
    rstlex::tracing::init();

    let options = CliArgs::parse()
        .into_options()
        .map_err(anyhow::Error::msg)?;
    run(options)
}

fn run(options: RunOptions) -> Result<()> {
    let mut config = match &options.config {
        Some(path) => LexerConfig::load_from(path),
        None => LexerConfig::load(),
    };
    if let Some(directives) = &options.directives {
        config.directives = directives.clone();
    }

    let mut lexer = RstLexer::from_config(&config).map_err(anyhow::Error::msg)?;
    if let Some(theme) = &options.theme {
        let file = PropertyFile::from_file(theme).map_err(anyhow::Error::msg)?;
        lexer.reload_styles(&file);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if options.styles {
        print_styles(&mut out, lexer.styles(), options.json)?;
    }

    let Some(mode) = options.mode else {
        return Ok(());
    };

    let text = read_input(&options)?;
    let source = RopeSource::new(&text);
    let mut sink = StyleRecorder::new();
    let report = lexer.relex_all(&source, &mut sink);
    if !report.complete {
        tracing::warn!("Lexing stopped early at {}", lexer.cache().covered_end());
    }

    let spans = match mode {
        OutputMode::Spans => lexer.cache().spans(),
        OutputMode::Runs => lexer.styled_runs(0..text.len()),
    };
    print_spans(&mut out, &text, &spans, options.json)?;
    Ok(())
}

fn read_input(options: &RunOptions) -> Result<String> {
    match &options.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn print_spans(out: &mut impl Write, text: &str, spans: &[Span], json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = spans
            .iter()
            .map(|span| {
                serde_json::json!({
                    "start": span.start,
                    "len": span.len,
                    "kind": span.kind,
                    "style": span.kind.style_id().0,
                    "text": text.get(span.range()).unwrap_or_default(),
                })
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    for span in spans {
        let snippet = text.get(span.range()).unwrap_or_default();
        writeln!(
            out,
            "{:>6} {:>5} {:<15} {:?}",
            span.start, span.len, span.kind, snippet
        )?;
    }
    Ok(())
}

fn print_styles(out: &mut impl Write, styles: &StyleTable, json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = styles
            .iter()
            .map(|(id, props)| {
                serde_json::json!({
                    "id": id.0,
                    "key": styles.key(id),
                    "name": id.description().unwrap_or_default(),
                    "value": props.to_string(),
                })
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    for (id, props) in styles.iter() {
        writeln!(
            out,
            "{:<14} {:<16} {}",
            styles.key(id),
            id.description().unwrap_or_default(),
            props
        )?;
    }
    Ok(())
}
