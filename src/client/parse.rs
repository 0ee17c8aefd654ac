//! Lenient parsers for the D+ wire formats
//!
//! The controller answers with small ad-hoc XML envelopes and a
//! line-oriented row encoding embedded in a `payload` text node. Neither
//! format is formally specified, so both parsers are deliberately
//! tolerant: anything that does not match the expected shape is skipped,
//! not treated as an error.

use crate::client::DeviceState;

/// Extract the text content of the first `<tag …>text</tag>` element.
///
/// Attributes on the opening tag are allowed; self-closing or missing
/// elements yield `None`. The five standard XML entities are unescaped.
pub(crate) fn xml_element_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut search = xml;
    loop {
        let start = search.find(&open)?;
        let after_open = &search[start + open.len()..];

        // The match must be the full tag name, not a prefix of a longer
        // one (`<payload` inside `<payloads>`).
        match after_open.chars().next()? {
            '>' | '/' => {}
            c if c.is_whitespace() => {}
            _ => {
                search = after_open;
                continue;
            }
        }

        let gt = after_open.find('>')?;
        if after_open[..gt].trim_end().ends_with('/') {
            return None;
        }

        let body = &after_open[gt + 1..];
        let end = body.find(&close)?;
        return Some(unescape_xml(body[..end].trim()));
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Parse the line-oriented row encoding of a state query payload.
///
/// Rows look like `Row1: '10790', '1', …`. The first `Row` line is a
/// column header and is discarded. Each remaining line is stripped of its
/// label, split on commas, and the first two fields (id, value) are kept
/// with whitespace and surrounding single quotes removed. Lines without a
/// label or with fewer than two fields are silently dropped; this
/// tolerance is part of the parsing contract, since the upstream format
/// is not formally specified.
pub(crate) fn parse_state_rows(payload: &str) -> Vec<DeviceState> {
    let mut rows = payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.starts_with("Row"));

    let _header = rows.next();

    rows.filter_map(|row| {
        let (_label, rest) = row.split_once(':')?;
        let mut fields = rest.split(',').map(|field| field.trim().trim_matches('\''));
        let id = fields.next()?;
        let value = fields.next()?;
        Some(DeviceState {
            id: id.to_string(),
            current_value: value.to_string(),
        })
    })
    .collect()
}
