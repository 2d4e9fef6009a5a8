//! Human-readable rendering of decoded RLP.

use std::fmt::Write;

use flowkit_protocol::encoding::RlpItem;

/// Byte strings longer than this are shown truncated.
const PREVIEW_LIMIT: usize = 64;

/// Renders `item` as an indented tree, one item per line.
pub fn render(item: &RlpItem) -> String {
    let mut out = String::new();
    render_into(&mut out, item, 0, None);
    out
}

fn render_into(out: &mut String, item: &RlpItem, depth: usize, position: Option<usize>) {
    let indent = "  ".repeat(depth);
    let label = position.map(|i| format!("[{}] ", i)).unwrap_or_default();
    match item {
        RlpItem::List(items) => {
            let _ = writeln!(out, "{}{}list ({} items)", indent, label, items.len());
            for (i, child) in items.iter().enumerate() {
                render_into(out, child, depth + 1, Some(i));
            }
        }
        RlpItem::Bytes(bytes) => {
            let _ = writeln!(
                out,
                "{}{}bytes ({}) {}",
                indent,
                label,
                bytes.len(),
                preview(bytes)
            );
        }
    }
}

/// Printable ASCII is quoted, everything else is hex.
fn preview(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "empty".to_string();
    }
    let shown = &bytes[..bytes.len().min(PREVIEW_LIMIT)];
    let ellipsis = if bytes.len() > PREVIEW_LIMIT { "..." } else { "" };
    let printable = bytes
        .iter()
        .all(|b| b.is_ascii_graphic() || *b == b' ' || *b == b'\n');
    if printable && bytes.len() > 1 {
        format!("{:?}{}", String::from_utf8_lossy(shown), ellipsis)
    } else {
        format!("0x{}{}", hex::encode(shown), ellipsis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lists_are_indented() {
        let item = RlpItem::List(vec![
            RlpItem::Bytes(b"hello".to_vec()),
            RlpItem::List(vec![RlpItem::Bytes(vec![0x01, 0xff])]),
            RlpItem::Bytes(Vec::new()),
        ]);
        let expected = "list (3 items)\n\
                        \x20 [0] bytes (5) \"hello\"\n\
                        \x20 [1] list (1 items)\n\
                        \x20   [0] bytes (2) 0x01ff\n\
                        \x20 [2] bytes (0) empty\n";
        assert_eq!(render(&item), expected);
    }

    #[test]
    fn long_byte_strings_are_truncated() {
        let rendered = render(&RlpItem::Bytes(vec![0xAA; 100]));
        assert!(rendered.ends_with("...\n"));
        assert!(rendered.starts_with("bytes (100) 0x"));
    }
}
