//! Inline script extraction for emitted HTML documents.
//!
//! The document is parsed with html5ever so script bodies come back exactly as
//! the browser would see them: raw text, whitespace untouched.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::HashSet;

lazy_static! {
    /// `type` values a browser executes as classic or module script.
    static ref JS_MIME_TYPES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("module");
        s.insert("text/javascript");
        s.insert("application/javascript");
        s.insert("application/ecmascript");
        s.insert("application/x-ecmascript");
        s.insert("application/x-javascript");
        s.insert("text/ecmascript");
        s.insert("text/javascript1.0");
        s.insert("text/javascript1.1");
        s.insert("text/javascript1.2");
        s.insert("text/javascript1.3");
        s.insert("text/javascript1.4");
        s.insert("text/javascript1.5");
        s.insert("text/jscript");
        s.insert("text/livescript");
        s.insert("text/x-ecmascript");
        s.insert("text/x-javascript");
        s
    };
}

/// Bodies of every executable inline `<script>` in document order.
pub fn extract_inline_scripts(html: &str) -> Vec<String> {
    let dom = match parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
    {
        Ok(dom) => dom,
        Err(e) => {
            tracing::warn!("failed to parse HTML document: {}", e);
            return Vec::new();
        }
    };

    let mut scripts = Vec::new();
    collect_scripts(&dom.document, &mut scripts);
    scripts
}

fn collect_scripts(handle: &Handle, scripts: &mut Vec<String>) {
    if let NodeData::Element { name, attrs, .. } = &handle.data {
        if name.local.as_ref().eq_ignore_ascii_case("script") {
            let attrs = attrs.borrow();
            let mut has_src = false;
            let mut script_type: Option<String> = None;
            for attr in attrs.iter() {
                match attr.name.local.as_ref() {
                    "src" => has_src = true,
                    "type" => script_type = Some(attr.value.to_string()),
                    _ => {}
                }
            }

            if !has_src && is_executable_type(script_type.as_deref()) {
                scripts.push(text_content(handle));
            }
            return;
        }
    }

    // <template> contents live in a separate fragment and never run, so only
    // regular children are walked.
    for child in handle.children.borrow().iter() {
        collect_scripts(child, scripts);
    }
}

fn is_executable_type(script_type: Option<&str>) -> bool {
    let Some(raw) = script_type else {
        return true;
    };
    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    essence.is_empty() || JS_MIME_TYPES.contains(essence.as_str())
}

fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    for child in handle.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_inline_scripts_in_order() {
        let html = r#"<html>
    <head>
      <title>Title</title>
    </head>
    <body>
      <h1>Hello, World!</h1>
      <script src="external.js"></script>
      <script>console.log('Inline script 1');</script>
      <script type="text/javascript">console.log('Inline script 2');</script>
      <script type="application/javascript">console.log('Inline script 3');</script>
      <script type="module">import('./chunk.js');</script>
    </body>
  </html>"#;

        let scripts = extract_inline_scripts(html);
        assert_eq!(
            scripts,
            vec![
                "console.log('Inline script 1');",
                "console.log('Inline script 2');",
                "console.log('Inline script 3');",
                "import('./chunk.js');",
            ]
        );
    }

    #[test]
    fn test_skip_external_and_json_scripts() {
        let html = r#"<html><body>
      <script type="application/json">{"foo":"bar"}</script>
      <script type="importmap">{"imports":{}}</script>
      <script src="external.js">console.log('ignored');</script>
    </body></html>"#;

        assert!(extract_inline_scripts(html).is_empty());
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let html = "<script>\n  var a = 1;\n  a < 2 && console.log('<b>');\n</script>";
        let scripts = extract_inline_scripts(html);
        assert_eq!(
            scripts,
            vec!["\n  var a = 1;\n  a < 2 && console.log('<b>');\n"]
        );
    }

    #[test]
    fn test_type_with_parameters_and_case() {
        assert!(is_executable_type(None));
        assert!(is_executable_type(Some("")));
        assert!(is_executable_type(Some("Text/JavaScript; charset=utf-8")));
        assert!(!is_executable_type(Some("application/ld+json")));
        assert!(!is_executable_type(Some("text/template")));
    }
}
