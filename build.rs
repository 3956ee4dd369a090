// build.rs

use std::env;
use std::fs;
use std::path::Path;

const OPS_SOURCE: &str = "data/alu_ops.def";

fn main() {
    println!("cargo:rerun-if-changed={OPS_SOURCE}");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let source = fs::read_to_string(OPS_SOURCE)
        .unwrap_or_else(|e| panic!("Failed to read {OPS_SOURCE}: {e}"));

    let entries = parse_ops(&source);
    generate_ops_table(&entries, &out_dir);
}

fn parse_ops(source: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();

    for (line_no, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let name = fields.next().unwrap_or_default();
        let args = match fields.next() {
            Some("-") | None => "",
            Some(args) => args,
        };

        if let Some(extra) = fields.next() {
            panic!("{OPS_SOURCE}:{}: unexpected field '{extra}'", line_no + 1);
        }
        if args.len() > 4 {
            panic!("{OPS_SOURCE}:{}: '{name}' takes more than 4 arguments", line_no + 1);
        }
        if let Some(bad) = args.chars().find(|c| !matches!(c, 'w' | 'b' | 'k')) {
            panic!("{OPS_SOURCE}:{}: unknown argument code '{bad}'", line_no + 1);
        }

        entries.push((name.to_string(), args.to_string()));
    }

    entries
}

fn generate_ops_table(entries: &[(String, String)], out_dir: &str) {
    let mut code = String::new();
    code.push_str("// Generated by build.rs from data/alu_ops.def.\n\n");
    code.push_str("/// Standard ALU operation signatures as `(name, argument codes)`.\n");
    code.push_str("pub const STANDARD_OPS: &[(&str, &str)] = &[\n");
    for (name, args) in entries {
        code.push_str(&format!("    ({name:?}, {args:?}),\n"));
    }
    code.push_str("];\n");

    let dest = Path::new(out_dir).join("alu_ops.rs");
    fs::write(&dest, code).unwrap_or_else(|e| panic!("Failed to write {}: {e}", dest.display()));
}
