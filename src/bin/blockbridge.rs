//! Command-line interface for blockbridge
//!
//! Converts source files into the node-tree interchange documents the visual
//! editor loads, and inspects how the engine sees a file.
//!
//! Usage:
//!   blockbridge parse `<path>`... [--dialect `<tag>`] [--format `<format>`]
//!   blockbridge detect `<path>`       - Print the detected dialects
//!   blockbridge refs `<path>`...      - List cross-file references in a batch

use clap::{Arg, Command};
use std::path::Path;

use blockbridge::batch::{parse_batch, SourceFile};
use blockbridge::detect::detect_dialects;
use blockbridge::interchange::write_document;
use blockbridge::parse_source;

fn main() {
    let matches = Command::new("blockbridge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Source-to-node-tree converter for the blockbridge editor")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("parse")
                .about("Parse source files into interchange documents")
                .arg(
                    Arg::new("paths")
                        .help("Source files to parse")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("dialect")
                        .long("dialect")
                        .short('d')
                        .help("Dialect tag (auto, general, shader, ecs, sim); single file only")
                        .default_value("auto"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format (xml or json)")
                        .default_value("xml"),
                ),
        )
        .subcommand(
            Command::new("detect")
                .about("Print the dialects fingerprinted in a file")
                .arg(Arg::new("path").help("Source file").required(true).index(1)),
        )
        .subcommand(
            Command::new("refs")
                .about("Batch-parse files and list cross-file references")
                .arg(
                    Arg::new("paths")
                        .help("Source files forming the batch")
                        .required(true)
                        .num_args(1..),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("parse", sub)) => {
            let paths: Vec<&String> = sub.get_many::<String>("paths").unwrap().collect();
            let dialect = sub.get_one::<String>("dialect").unwrap();
            let format = sub.get_one::<String>("format").unwrap();
            handle_parse(&paths, dialect, format);
        }
        Some(("detect", sub)) => {
            let path = sub.get_one::<String>("path").unwrap();
            handle_detect(path);
        }
        Some(("refs", sub)) => {
            let paths: Vec<&String> = sub.get_many::<String>("paths").unwrap().collect();
            handle_refs(&paths);
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn read_file(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read {}: {}", path, e);
        std::process::exit(1);
    })
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn handle_parse(paths: &[&String], dialect: &str, format: &str) {
    if paths.len() == 1 {
        let text = read_file(paths[0]);
        let outcome = parse_source(&text, dialect);
        for diag in &outcome.diagnostics {
            eprintln!("{}: {}", paths[0], diag);
        }
        match format {
            "xml" => print!("{}", write_document(&file_name(paths[0]), &outcome.nodes)),
            "json" => print_json(&outcome),
            other => unknown_format(other),
        }
        return;
    }

    if dialect != "auto" {
        eprintln!("--dialect applies to single files; batches infer dialects per filename");
        std::process::exit(1);
    }
    let files: Vec<SourceFile> = paths
        .iter()
        .map(|p| SourceFile::new(file_name(p), read_file(p)))
        .collect();
    let outcome = parse_batch(&files);
    for diag in &outcome.diagnostics {
        eprintln!("{}", diag);
    }
    match format {
        "xml" => {
            for file in &outcome.files {
                print!("{}", write_document(&file.file_name, &file.nodes));
            }
        }
        "json" => print_json(&outcome),
        other => unknown_format(other),
    }
}

fn handle_detect(path: &str) {
    let text = read_file(path);
    let tags: Vec<&str> = detect_dialects(&text).iter().map(|d| d.tag()).collect();
    println!("{}", tags.join(" "));
}

fn handle_refs(paths: &[&String]) {
    let files: Vec<SourceFile> = paths
        .iter()
        .map(|p| SourceFile::new(file_name(p), read_file(p)))
        .collect();
    let outcome = parse_batch(&files);
    for reference in &outcome.references {
        println!(
            "{} -> {} ({:?})",
            reference.source_file, reference.target_path, reference.kind
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error formatting output: {}", e);
            std::process::exit(1);
        }
    }
}

fn unknown_format(format: &str) {
    eprintln!("Format '{}' not supported; use xml or json", format);
    std::process::exit(1);
}
