use serde_json::Value;
use std::io::{self, Write};

/// Indented JSON with a trailing newline, so piped output ends cleanly.
pub fn write_json<W: Write>(writer: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

pub fn print_json(value: &Value) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = write_json(&mut stdout, value) {
        tracing::error!(error = %e, "failed to write JSON output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_and_field_order_preserved() {
        let value = json!({
            "result": { "monthly_payment": "8884.88", "total_interest": "6618.56" },
            "warnings": [],
        });
        let mut buf = Vec::new();
        write_json(&mut buf, &value).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"monthly_payment\": \"8884.88\""));
        assert!(text.find("monthly_payment") < text.find("total_interest"));
    }
}
