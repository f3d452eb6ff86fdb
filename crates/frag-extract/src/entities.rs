//! Markup preparation before XML reading.
//!
//! Storage-format pages use HTML named entities (`&nbsp;`, `&laquo;` ...) that an
//! XML reader rejects, and editors occasionally leave a bare `&` in text. Both are
//! rewritten here so the reader only ever sees the five XML entities and numeric
//! character references.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// An ampersand together with whatever reference follows it, if any.
static AMPERSAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:([a-zA-Z][a-zA-Z0-9]*);|(#[0-9]+;|#[xX][0-9a-fA-F]+;))?")
        .expect("invalid ampersand regex")
});

/// Rewrite entities, stray ampersands and stray `<` into XML-safe markup.
///
/// - known HTML named entities become their Unicode characters,
/// - XML entities and numeric references are left for the reader,
/// - unknown named entities and bare `&` are escaped as `&amp;` so they
///   survive as literal text,
/// - a `<` that cannot start a tag is escaped as `&lt;`.
pub(crate) fn prepare_markup(markup: &str) -> Cow<'_, str> {
    let markup = escape_stray_angles(markup);
    if !markup.contains('&') {
        return markup;
    }
    let escaped = AMPERSAND_PATTERN.replace_all(&markup, |caps: &Captures| {
        if caps.get(2).is_some() {
            return caps[0].to_owned();
        }
        match caps.get(1).map(|m| m.as_str()) {
            Some(name) if is_xml_entity(name) => caps[0].to_owned(),
            Some(name) => named_entity(name).map_or_else(
                || format!("&amp;{name};"),
                |ch| ch.to_owned(),
            ),
            None => "&amp;".to_owned(),
        }
    });
    Cow::Owned(escaped.into_owned())
}

/// Escape every `<` not followed by a tag name, `/`, `!` or `?`.
///
/// CDATA sections are copied as they are.
fn escape_stray_angles(markup: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut last = 0;
    let mut cursor = 0;
    while let Some(offset) = markup[cursor..].find('<') {
        let index = cursor + offset;
        let rest = &markup[index + 1..];
        if rest.starts_with("![CDATA[") {
            cursor = rest.find("]]>").map_or(markup.len(), |end| index + 1 + end + 3);
            continue;
        }
        cursor = index + 1;
        let opens_tag = rest
            .starts_with(|c: char| c.is_alphabetic() || matches!(c, '_' | ':' | '/' | '!' | '?'));
        if !opens_tag {
            out.push_str(&markup[last..index]);
            out.push_str("&lt;");
            last = cursor;
        }
    }

    if last == 0 {
        return Cow::Borrowed(markup);
    }
    out.push_str(&markup[last..]);
    Cow::Owned(out)
}

/// Decode an XML entity reference body (the part between `&` and `;`).
pub(crate) fn decode_reference(reference: &str) -> String {
    match reference {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        numeric if numeric.starts_with('#') => {
            let code = match numeric.strip_prefix("#x").or_else(|| numeric.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => numeric[1..].parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{reference};"), |c| c.to_string())
        }
        other => named_entity(other).map_or_else(|| format!("&{other};"), str::to_owned),
    }
}

fn is_xml_entity(name: &str) -> bool {
    matches!(name, "lt" | "gt" | "amp" | "apos" | "quot")
}

/// Map an HTML named entity to its Unicode text.
fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "zwnj" => "\u{200c}",
        "zwj" => "\u{200d}",
        "shy" => "\u{00ad}",

        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "minus" => "\u{2212}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",

        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bdquo" => "\u{201e}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "sbquo" => "\u{201a}",
        "lsaquo" => "\u{2039}",
        "rsaquo" => "\u{203a}",

        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "harr" => "\u{2194}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",
        "rArr" => "\u{21d2}",
        "lArr" => "\u{21d0}",
        "hArr" => "\u{21d4}",

        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "asymp" => "\u{2248}",
        "plusmn" => "\u{00b1}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "infin" => "\u{221e}",
        "sum" => "\u{2211}",

        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        "deg" => "\u{00b0}",
        "numero" => "\u{2116}",

        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",

        "frac14" => "\u{00bc}",
        "frac12" => "\u{00bd}",
        "frac34" => "\u{00be}",
        "sup1" => "\u{00b9}",
        "sup2" => "\u{00b2}",
        "sup3" => "\u{00b3}",
        "micro" => "\u{00b5}",

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_entities_become_unicode() {
        assert_eq!(
            prepare_markup("Hello&nbsp;World &laquo;x&raquo;"),
            "Hello\u{00a0}World \u{00ab}x\u{00bb}"
        );
    }

    #[test]
    fn test_xml_entities_are_preserved() {
        assert_eq!(prepare_markup("&lt;id&gt; &amp; &quot;"), "&lt;id&gt; &amp; &quot;");
    }

    #[test]
    fn test_numeric_references_are_preserved() {
        assert_eq!(prepare_markup("&#171;&#x2014;"), "&#171;&#x2014;");
    }

    #[test]
    fn test_bare_ampersand_is_escaped() {
        assert_eq!(prepare_markup("R&D & QA"), "R&amp;D &amp; QA");
    }

    #[test]
    fn test_unknown_entity_is_escaped() {
        assert_eq!(prepare_markup("&bogus;"), "&amp;bogus;");
    }

    #[test]
    fn test_no_ampersand_borrows() {
        assert!(matches!(prepare_markup("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_stray_angle_brackets_are_escaped() {
        assert_eq!(prepare_markup("<p>a < b</p>"), "<p>a &lt; b</p>");
        assert_eq!(prepare_markup("x <<y> 1<2 end<"), "x &lt;<y> 1&lt;2 end&lt;");
        assert_eq!(prepare_markup("<br/><!-- c --><?pi?></p>"), "<br/><!-- c --><?pi?></p>");
        assert_eq!(prepare_markup("R&D < QA"), "R&amp;D &lt; QA");
        assert_eq!(
            prepare_markup("<![CDATA[if a < b]]>x < y"),
            "<![CDATA[if a < b]]>x &lt; y"
        );
    }

    #[test]
    fn test_decode_reference() {
        assert_eq!(decode_reference("lt"), "<");
        assert_eq!(decode_reference("#1046"), "Ж");
        assert_eq!(decode_reference("#x41"), "A");
        assert_eq!(decode_reference("#xZZ"), "&#xZZ;");
        assert_eq!(decode_reference("mdash"), "\u{2014}");
    }
}
