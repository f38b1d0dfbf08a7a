//! Output formatting
//!
//! Renders a found payload as compact JSON. The bytes go to the writer
//! verbatim with no trailing newline so the output pipes cleanly into
//! `jq` and friends.

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;

/// Serialize a payload to its printable form.
pub fn render(payload: &Value) -> Result<String> {
    serde_json::to_string(payload).context("Failed to serialize payload")
}

/// Write a payload to `writer`, no trailing separator.
pub fn write_payload<W: Write>(writer: &mut W, payload: &Value) -> Result<()> {
    let text = render(payload)?;
    writer
        .write_all(text.as_bytes())
        .context("Failed to write payload")?;
    writer.flush().context("Failed to flush output")
}
