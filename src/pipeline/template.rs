//! Document templating: wrap an HTML fragment in a complete, styled document.
//!
//! The stylesheet lives here as a constant so there is one place to change
//! the look of every exported PDF, and so tests can inspect it directly.
//! The fragment is inserted verbatim. It comes from the Markdown renderer,
//! which is trusted to emit well-formed markup; nothing is escaped here.

/// Stylesheet embedded in every exported document.
pub const STYLESHEET: &str = r#"      body {
        font-family: Arial, Helvetica, sans-serif;
        line-height: 1.5;
        padding: 24px;
      }
      ul, ol {
        margin: 0 0 12px 20px;
        padding: 0;
      }
      li {
        margin: 4px 0;
      }
      code, pre {
        font-family: "Courier New", Courier, monospace;
        background: #f6f6f6;
      }
      pre {
        padding: 12px;
        overflow-x: auto;
      }
      table {
        border-collapse: collapse;
      }
      th, td {
        border: 1px solid #ddd;
        padding: 6px 10px;
      }
      blockquote {
        border-left: 4px solid #ddd;
        padding-left: 12px;
        color: #555;
      }"#;

const HEAD: &str = "<!doctype html>\n<html>\n  <head>\n    <meta charset=\"utf-8\" />\n    <style>\n";
const HEAD_END: &str = "\n    </style>\n  </head>\n  <body>\n    ";
const TAIL: &str = "\n  </body>\n</html>\n";

/// Wrap `fragment` in the fixed document template.
pub fn wrap_document(fragment: &str) -> String {
    let mut doc = String::with_capacity(
        HEAD.len() + STYLESHEET.len() + HEAD_END.len() + fragment.len() + TAIL.len(),
    );
    doc.push_str(HEAD);
    doc.push_str(STYLESHEET);
    doc.push_str(HEAD_END);
    doc.push_str(fragment);
    doc.push_str(TAIL);
    doc
}
