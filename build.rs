use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LOCALE: &str = "en";

fn main() {
    let locales_dir = Path::new("locales");
    println!("cargo:rerun-if-changed={}", locales_dir.display());

    let mut catalog = BTreeMap::<String, BTreeMap<String, String>>::new();
    let mut files = fs::read_dir(locales_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
                .collect::<Vec<PathBuf>>()
        })
        .unwrap_or_default();
    files.sort();

    for path in files {
        println!("cargo:rerun-if-changed={}", path.display());
        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|error| panic!("failed to read {}: {error}", path.display()));
        let table = text
            .parse::<toml::Table>()
            .unwrap_or_else(|error| panic!("failed to parse {}: {error}", path.display()));

        let mut entries = BTreeMap::new();
        flatten_table("", &table, &mut entries);
        catalog.insert(locale.to_string(), entries);
    }

    let mut generated = String::new();
    generated.push_str(&format!(
        "pub const DEFAULT_LOCALE: &str = {DEFAULT_LOCALE:?};\n"
    ));
    generated.push_str("pub static LOCALES: &[(&str, &[(&str, &str)])] = &[\n");
    for (locale, entries) in &catalog {
        generated.push_str(&format!("    ({locale:?}, &[\n"));
        for (key, value) in entries {
            generated.push_str(&format!("        ({key:?}, {value:?}),\n"));
        }
        generated.push_str("    ]),\n");
    }
    generated.push_str("];\n");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo sets OUT_DIR"));
    fs::write(out_dir.join("calmform_i18n_generated.rs"), generated)
        .expect("failed to write generated i18n catalog");
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(text) => {
                out.insert(full_key, text.clone());
            }
            toml::Value::Table(nested) => flatten_table(&full_key, nested, out),
            other => {
                out.insert(full_key, other.to_string());
            }
        }
    }
}
