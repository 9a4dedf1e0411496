//! JSON report writing.
//!
//! Reports are written either indented by four spaces (online report) or
//! compact (age report). With `ascii` set, every non-ASCII character in
//! strings is escaped as `\uXXXX` (UTF-16 units, lowercase hex), so region
//! names such as `Москва` come out as `\u041c\u043e\u0441\u043a\u0432\u0430`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter, Serializer};

use crate::error::{Error, Result};

/// Indentation used by the online report.
pub const INDENT: &[u8] = b"    ";

/// Output layout of a report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLayout {
    /// Four-space indentation, one entry per line.
    Indented,
    /// No whitespace between tokens.
    Compact,
}

/// Serialize `value` into `writer`.
pub fn write_json<W, T>(writer: W, value: &T, layout: JsonLayout, ascii: bool) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    match (layout, ascii) {
        (JsonLayout::Indented, true) => {
            serialize(writer, AsciiEscape(PrettyFormatter::with_indent(INDENT)), value)
        }
        (JsonLayout::Indented, false) => {
            serialize(writer, PrettyFormatter::with_indent(INDENT), value)
        }
        (JsonLayout::Compact, true) => serialize(writer, AsciiEscape(CompactFormatter), value),
        (JsonLayout::Compact, false) => serialize(writer, CompactFormatter, value),
    }
}

/// Render `value` to a string.
pub fn to_json_string<T>(value: &T, layout: JsonLayout, ascii: bool) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    write_json(&mut buf, value, layout, ascii)?;
    // Both formatters only ever emit UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Create (or truncate) `path` and write `value` to it.
pub fn write_json_file<T>(path: &Path, value: &T, layout: JsonLayout, ascii: bool) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write_json(&mut writer, value, layout, ascii)?;
    writer.flush()?;
    Ok(())
}

fn serialize<W, F, T>(writer: W, formatter: F, value: &T) -> Result<()>
where
    W: Write,
    F: Formatter,
    T: Serialize + ?Sized,
{
    let mut ser = Serializer::with_formatter(writer, formatter);
    value.serialize(&mut ser).map_err(Error::Encode)
}

/// Formatter adapter that escapes non-ASCII characters in strings.
struct AsciiEscape<F>(F);

impl<F: Formatter> Formatter for AsciiEscape<F> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.0.end_object_value(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_indented_layout_uses_four_spaces() -> anyhow::Result<()> {
        let value = json!({"geo_distribution": {"NY": 1.0}, "online_stats": 0});
        let text = to_json_string(&value, JsonLayout::Indented, true)?;
        assert_eq!(
            text,
            "{\n    \"geo_distribution\": {\n        \"NY\": 1.0\n    },\n    \"online_stats\": 0\n}"
        );
        Ok(())
    }

    #[test]
    fn test_compact_layout() -> anyhow::Result<()> {
        let value = json!({"a": 1.5, "b": 0.0});
        assert_eq!(to_json_string(&value, JsonLayout::Compact, true)?, r#"{"a":1.5,"b":0.0}"#);
        Ok(())
    }

    #[test]
    fn test_empty_object_stays_inline() -> anyhow::Result<()> {
        let value = json!({"geo_distribution": {}});
        let text = to_json_string(&value, JsonLayout::Indented, true)?;
        assert_eq!(text, "{\n    \"geo_distribution\": {}\n}");
        Ok(())
    }

    #[test]
    fn test_ascii_escaping() -> anyhow::Result<()> {
        let value = json!({"Москва": 1, "a\"b": "😀"});
        let text = to_json_string(&value, JsonLayout::Compact, true)?;
        assert_eq!(
            text,
            r#"{"\u041c\u043e\u0441\u043a\u0432\u0430":1,"a\"b":"\ud83d\ude00"}"#
        );

        let raw = to_json_string(&value, JsonLayout::Compact, false)?;
        assert!(raw.contains("Москва"));
        Ok(())
    }

    #[test]
    fn test_write_json_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.json");
        write_json_file(&path, &json!({"x": 1}), JsonLayout::Compact, true)?;
        assert_eq!(std::fs::read_to_string(&path)?, r#"{"x":1}"#);
        Ok(())
    }
}
