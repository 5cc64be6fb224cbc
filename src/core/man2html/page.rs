//! Page shell: header, footer and stylesheet around the rendered body.

use std::fmt::Write;

use mandox_glyphs::volume_title;

use super::context::{M2HOptions, PageMeta, Stylesheet};
use super::utils::html_escape;

/// Stylesheet embedded with [`Stylesheet::Embedded`]; also the content of
/// `mandox.css` written by the CLI.
pub const DEFAULT_STYLESHEET: &str = r#"body { font-family: sans-serif; max-width: 50em; margin: 1em auto; line-height: 1.4; }
.head, .foot { display: flex; justify-content: space-between; color: #555; }
.head-vol, .foot-date { text-align: center; flex: 1; }
.manual-text { margin: 1em 0; }
.section-header, .subsection-header { font-weight: bold; margin: 1em 0 0.5em; }
.section > *:not(h2) { margin-left: 3em; }
.paragraph, .spacer { height: 0.8em; }
.name, .flag, .command, .bold, .symbolic, .include, .function, .directive { font-weight: bold; }
.argument, .emphasis, .italic, .variable, .type, .path, .reference, .ref-book, .ref-journal { font-style: italic; }
.literal, .code, .example, .nofill, .display.literal, .display.unfilled { font-family: monospace; }
.display.literal, .display.unfilled, .nofill, .example { white-space: pre; }
.display.centered { text-align: center; }
.small { font-size: smaller; }
.tag-list .tag-description { display: flex; margin: 0.3em 0; }
.tag { min-width: 0; }
.description { flex: 1; }
.hang-item { margin: 0.3em 0; }
.compact > * { margin: 0; }
.list-table td, .tbl td { padding: 0 0.5em; vertical-align: top; }
.moved { display: inline-block; }
.unimplemented { background: #fdd; color: #900; font-family: monospace; }
.xref, .link-sec, .link-ext, .link-mail { color: #06c; }
"#;

/// Wrap `body` in the page header and footer, and in the HTML document
/// shell when `full_page` is set.
pub fn render_page(meta: &PageMeta, body: &str, options: &M2HOptions) -> String {
    if !options.full_page {
        return body.to_string();
    }

    let title = if meta.section.is_empty() {
        html_escape(&meta.title)
    } else {
        format!("{}({})", html_escape(&meta.title), html_escape(&meta.section))
    };
    let volume = meta
        .volume
        .clone()
        .or_else(|| volume_title(&meta.section).map(str::to_string))
        .unwrap_or_default();
    let os = meta
        .os
        .clone()
        .unwrap_or_else(|| options.default_os.clone());

    let mut out = String::with_capacity(body.len() + DEFAULT_STYLESHEET.len() + 512);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", title);
    match &options.stylesheet {
        Stylesheet::Link(href) => {
            let _ = writeln!(out, "<link rel=\"stylesheet\" href=\"{}\">", html_escape(href));
        }
        Stylesheet::Embedded => {
            let _ = writeln!(out, "<style>\n{}</style>", DEFAULT_STYLESHEET);
        }
    }
    out.push_str("</head>\n<body>\n");

    let _ = writeln!(
        out,
        "<div class=\"head\"><span class=\"head-left\">{t}</span>\
         <span class=\"head-vol\">{}</span><span class=\"head-right\">{t}</span></div>",
        html_escape(&volume),
        t = title
    );
    let _ = writeln!(out, "<div class=\"manual-text\">\n{}</div>", body);
    let _ = writeln!(
        out,
        "<div class=\"foot\"><span class=\"foot-left\">{os}</span>\
         <span class=\"foot-date\">{}</span><span class=\"foot-right\">{os}</span></div>",
        html_escape(&meta.date),
        os = html_escape(&os)
    );
    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> PageMeta {
        PageMeta {
            title: "LS".into(),
            section: "1".into(),
            date: "May 5, 2020".into(),
            os: Some("BSD".into()),
            ..PageMeta::default()
        }
    }

    #[test]
    fn test_fragment_is_body_only() {
        let out = render_page(&meta(), "<p>x</p>", &M2HOptions::fragment());
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn test_header_and_footer() {
        let out = render_page(&meta(), "", &M2HOptions::default());
        assert!(out.contains("<span class=\"head-left\">LS(1)</span>"));
        assert!(out.contains("<span class=\"head-vol\">General Commands Manual</span>"));
        assert!(out.contains("<span class=\"foot-left\">BSD</span>"));
        assert!(out.contains("<span class=\"foot-date\">May 5, 2020</span>"));
        assert!(out.contains("<link rel=\"stylesheet\" href=\"mandox.css\">"));
    }

    #[test]
    fn test_embedded_stylesheet_and_default_os() {
        let mut options = M2HOptions::standalone();
        options.default_os = "Mandox".into();
        let page = PageMeta {
            os: None,
            ..meta()
        };
        let out = render_page(&page, "", &options);
        assert!(out.contains("<style>"));
        assert!(out.contains("<span class=\"foot-right\">Mandox</span>"));
    }
}
