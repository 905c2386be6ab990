//! Integration tests for the processor module
//!
//! Tests the complete conversion pipeline using synthetic CAT files.


use crate::schema::SchemaRegistry;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Full-width line of record type `tag` with `(1-based offset, text)` pieces
pub fn record_line(tag: &str, pieces: &[(usize, &str)]) -> String {
    let schema = SchemaRegistry::global().unwrap().get(tag).unwrap();
    let mut chars: Vec<char> = vec![' '; schema.max_line_length()];
    chars.splice(0..2, tag.chars());
    for (start, text) in pieces {
        for (i, c) in text.chars().enumerate() {
            chars[start - 1 + i] = c;
        }
    }
    chars.into_iter().collect()
}

pub fn header_line() -> String {
    record_line("01", &[(3, "L"), (13, "DIRECCION GENERAL CATASTRO")])
}

pub fn parcel_line(parcela: &str) -> String {
    record_line("11", &[(24, "28"), (26, "079"), (31, parcela)])
}

pub fn real_estate_line(parcela: &str, cargo: &str) -> String {
    record_line("15", &[(24, "28"), (26, "079"), (31, parcela), (45, cargo)])
}

/// Urban-style export: header, two parcels, three assets
pub fn sample_lines() -> Vec<String> {
    vec![
        header_line(),
        parcel_line("1234567VK4713S"),
        real_estate_line("1234567VK4713S", "0001"),
        real_estate_line("1234567VK4713S", "0002"),
        parcel_line("7654321VK4773N"),
        real_estate_line("7654321VK4773N", "0001"),
    ]
}

pub fn write_cat_file(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, lines.join("\r\n")).unwrap();
    path
}

pub fn write_gz_cat_file(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    encoder.write_all(lines.join("\n").as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}
