//! Shared helpers for the command-line integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use accelerator::commands::{Command, Context};
use accelerator::error::{CommandError, Result};
use accelerator::resources::{Clients, ClusterConnector};
use accelerator::ui::Streams;
use async_trait::async_trait;
use clap::Parser;
use flate2::read::GzDecoder;
use wiremock::Request;
use zip::write::SimpleFileOptions;

/// Parses a command line the same way the binary does.
#[derive(Parser)]
#[command(name = "accelerator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// A cluster that is never reachable; server-backed commands must not need it.
struct NoCluster;

#[async_trait]
impl ClusterConnector for NoCluster {
    async fn connect(&self) -> Result<Clients> {
        Err(CommandError::Configuration(
            "no cluster available in this test".to_string(),
        ))
    }
}

/// Captured result of one invocation.
pub struct Outcome {
    pub result: Result<()>,
    pub out: String,
    pub err: String,
}

/// Parse `args` (without the binary name) and run the command.
pub async fn run(args: &[&str]) -> Outcome {
    let cli = Cli::try_parse_from(std::iter::once("accelerator").chain(args.iter().copied()))
        .expect("command line should parse");
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = {
        let mut ctx = Context::new(Streams::new(&mut out, &mut err), &NoCluster);
        cli.command.execute(&mut ctx).await
    };
    Outcome {
        result,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

/// Absolute path of a directory under `tests/testdata`.
pub fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(name)
}

/// A zip archive holding `entries`; entries ending in `/` are directories.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// One field of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

impl Field {
    pub fn text(&self) -> String {
        String::from_utf8(self.content.clone()).unwrap()
    }

    /// Paths and contents of the regular files in a gzip tar field.
    pub fn tar_entries(&self) -> BTreeMap<String, String> {
        let mut archive = tar::Archive::new(GzDecoder::new(self.content.as_slice()));
        let mut entries = BTreeMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            entries.insert(path, content);
        }
        entries
    }
}

/// Split a captured multipart request into its fields, in body order.
pub fn multipart_fields(request: &Request) -> Vec<Field> {
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let boundary = content_type
        .split(';')
        .find_map(|param| param.trim().strip_prefix("boundary="))
        .expect("multipart boundary")
        .trim_matches('"')
        .to_string();

    let delimiter = format!("--{boundary}").into_bytes();
    let mut fields = Vec::new();
    for chunk in split(&request.body, &delimiter).into_iter().skip(1) {
        if chunk.starts_with(b"--") {
            break;
        }
        let chunk = chunk.strip_prefix(b"\r\n").unwrap_or(chunk);
        let Some(header_end) = find(chunk, b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&chunk[..header_end]).into_owned();
        let mut content = chunk[header_end + 4..].to_vec();
        if content.ends_with(b"\r\n") {
            content.truncate(content.len() - 2);
        }
        fields.push(Field {
            name: disposition_param(&headers, "name").unwrap_or_default(),
            file_name: disposition_param(&headers, "filename"),
            content,
        });
    }
    fields
}

fn disposition_param(headers: &str, key: &str) -> Option<String> {
    let line = headers
        .lines()
        .find(|line| line.to_ascii_lowercase().starts_with("content-disposition"))?;
    line.split(';').find_map(|param| {
        param
            .trim()
            .strip_prefix(&format!("{key}="))
            .map(|value| value.trim_matches('"').to_string())
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split<'a>(mut body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    while let Some(index) = find(body, delimiter) {
        chunks.push(&body[..index]);
        body = &body[index + delimiter.len()..];
    }
    chunks.push(body);
    chunks
}
