// crates/transpile_module/tests/integration.rs

use std::fs;
use serde_json::{json, Map, Value};
use tempfile::tempdir;
use transpile_module::{transpile_module, TranspileError, TranspileOptions};

fn options(value: Value) -> TranspileOptions {
    let raw: Map<String, Value> = value.as_object().cloned().unwrap_or_default();
    TranspileOptions::from_json(&raw).unwrap()
}

const COMMAND: &str = r#"import { SlashCommandBuilder } from "discord.js";
import type { ChatInputCommandInteraction } from "discord.js";

interface Reply {
    content: string;
    ephemeral?: boolean;
}

export const data = new SlashCommandBuilder()
    .setName("ping")
    .setDescription("Replies with Pong!");

export async function execute(interaction: ChatInputCommandInteraction): Promise<void> {
    const reply: Reply = { content: "Pong!" };
    await interaction.reply(reply as Reply);
}
"#;

#[test]
fn test_command_module_to_commonjs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("ping.ts");
    fs::write(&path, COMMAND)?;

    let source = fs::read_to_string(&path)?;
    let output = transpile_module(&source, &options(json!({ "target": "ES2020", "module": "commonjs" })))?;

    let expected = r#""use strict";
Object.defineProperty(exports, "__esModule", { value: true });
exports.execute = execute;
const { SlashCommandBuilder } = require("discord.js");


const data = new SlashCommandBuilder()
    .setName("ping")
    .setDescription("Replies with Pong!");
exports.data = data;

async function execute(interaction) {
    const reply = { content: "Pong!" };
    await interaction.reply(reply);
}
"#;
    assert_eq!(output.output_text, expected);
    Ok(())
}

#[test]
fn test_command_module_to_esm_keeps_module_syntax() -> Result<(), Box<dyn std::error::Error>> {
    let output = transpile_module(COMMAND, &options(json!({ "target": "ESNext", "module": "ESNext" })))?;
    let text = output.output_text;

    assert!(text.starts_with("import { SlashCommandBuilder } from \"discord.js\";\n\n"));
    assert!(text.contains("export const data = new SlashCommandBuilder()"));
    assert!(text.contains("export async function execute(interaction) {"));
    assert!(!text.contains("interface"));
    assert!(!text.contains("ChatInputCommandInteraction"));
    assert!(!text.contains("as Reply"));
    Ok(())
}

#[test]
fn test_exported_annotation_is_erased() -> Result<(), Box<dyn std::error::Error>> {
    let output = transpile_module("export const x: number = 1;\n", &options(json!({ "target": "ES5" })))?;
    assert!(output.output_text.contains("const x = 1;"));
    assert!(!output.output_text.contains(": number"));
    Ok(())
}

#[test]
fn test_output_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let opts = options(json!({ "target": "ES2020", "module": "commonjs", "esModuleInterop": true }));
    let first = transpile_module(COMMAND, &opts)?;
    let second = transpile_module(COMMAND, &opts)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_plain_javascript_passes_through() -> Result<(), Box<dyn std::error::Error>> {
    let src = "function greet(name) {\n    return `hi ${name}`;\n}\n";
    let output = transpile_module(src, &options(json!({ "module": "ESNext" })))?;
    assert_eq!(output.output_text, src);
    Ok(())
}

#[test]
fn test_invalid_target_is_reported() {
    let raw = json!({ "target": "ES1999" });
    let result = TranspileOptions::from_json(raw.as_object().unwrap());
    assert!(matches!(result, Err(TranspileError::InvalidOption { .. })));
}

#[test]
fn test_amd_modules_are_unsupported() {
    let result = transpile_module("export const a = 1;\n", &options(json!({ "module": "AMD" })));
    assert!(matches!(result, Err(TranspileError::Unsupported(_))));
}

#[test]
fn test_syntax_error_position_is_one_based() {
    let result = transpile_module("const ok = 1;\nconst = ;\n", &TranspileOptions::default());
    match result {
        Err(TranspileError::Syntax { line, column }) => {
            assert_eq!(line, 2);
            assert!(column >= 1);
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
}
