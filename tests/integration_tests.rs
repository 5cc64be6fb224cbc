//! Integration tests for Mandox page conversion

use mandox::{
    man_to_html, man_to_html_with_diagnostics, man_to_html_with_options, ConversionError,
    M2HOptions, ManConverter, MemoryFileResolver, NoopFileResolver, WarningKind,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fragment(input: &str) -> String {
    init_logging();
    man_to_html_with_options(input, M2HOptions::fragment())
}

fn unmarked(input: &str) -> String {
    init_logging();
    man_to_html_with_options(
        input,
        M2HOptions {
            source_markers: false,
            ..M2HOptions::fragment()
        },
    )
}

fn warnings(input: &str) -> Vec<WarningKind> {
    init_logging();
    man_to_html_with_diagnostics(input, &M2HOptions::fragment(), &NoopFileResolver)
        .map(|result| result.warnings.into_iter().map(|w| w.kind).collect())
        .unwrap_or_default()
}

const LS_MDOC: &str = "\
.Dd $Mdocdate: May 5 2020 $
.Dt LS 1
.Os OpenBSD
.Sh NAME
.Nm ls
.Nd list directory contents
.Sh SYNOPSIS
.Nm ls
.Op Fl a
.Ar
.Sh SEE ALSO
.Xr find 1
";

// ============================================================================
// mdoc pages
// ============================================================================

mod mdoc {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_shell() {
        let html = man_to_html(LS_MDOC);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<span class=\"head-left\">LS(1)</span>"));
        assert!(html.contains("<span class=\"head-vol\">General Commands Manual</span>"));
        assert!(html.contains("<span class=\"foot-left\">OpenBSD</span>"));
        assert!(html.contains("<span class=\"foot-date\">May 5, 2020</span>"));
    }

    #[test]
    fn test_sections_and_links() {
        let html = fragment(LS_MDOC);
        assert!(html.contains(
            "<h2 class=\"section-header\" id=\"NAME\" x-source=\"3\">NAME</h2>"
        ));
        assert!(html.contains("id=\"SEE_ALSO\""));
        assert!(html.contains(
            "<a class=\"xref\" href=\"man:find(1)\" x-source=\"11\">find(1)</a>"
        ));
        assert_eq!(html.matches("<section").count(), 3);
        assert_eq!(html.matches("</section>").count(), 3);
    }

    #[test]
    fn test_synopsis_line() {
        let html = fragment(LS_MDOC);
        assert!(html.contains("[<span class=\"flag\" x-source=\"8\">-a</span>]"));
        assert!(html.contains("<span class=\"argument\" x-source=\"9\">file ...</span>"));
        assert!(html.contains("<span class=\"name\" x-source=\"7\">ls</span>"));
        assert!(!html.contains("<br><span class=\"name\" x-source=\"7\">"));
    }

    #[test]
    fn test_synopsis_entries_break() {
        let html = unmarked(".Sh SYNOPSIS\n.Nm cp\n.Ar src dst\n.Nm cp\n.Ar src ... dir\n");
        assert_eq!(html.matches("<br><span class=\"name\">cp</span>").count(), 1);
    }

    #[test]
    fn test_argument_keeps_trailing_period_outside() {
        assert_eq!(
            fragment(".Ar file .\n"),
            "<span class=\"argument\" x-source=\"0\">file</span>.\n"
        );
    }

    #[test]
    fn test_no_space_between_flag_and_argument() {
        assert_eq!(
            fragment(".Fl o Ns Ar file\n"),
            "<span class=\"flag\" x-source=\"0\">-o</span>\
             <span class=\"argument\" x-source=\"0\">file</span>\n"
        );
    }

    #[test]
    fn test_tag_list() {
        let input = ".Bl -tag -width Ds\n.It Fl v\nVerbose output.\n.El\n";
        assert_eq!(
            fragment(input),
            "<div class=\"tag-list\" x-source=\"0\">\n\
             <div class=\"tag-description\" x-source=\"1\">\
             <div class=\"tag\"><span class=\"flag\" x-source=\"1\">-v</span></div>\
             <div class=\"description\" style=\"margin-left:3em\">\
             <span class=\"text\" x-source=\"2\">Verbose output.</span></div></div>\n\
             </div>\n"
        );
    }

    #[test]
    fn test_nested_lists_close_once() {
        let input = "\
.Bl -tag -width Ds
.It one
.Bl -bullet
.It
inner
.El
.It two
outer
.El
";
        let html = fragment(input);
        assert_eq!(html.matches("class=\"tag-list\"").count(), 1);
        assert_eq!(html.matches("class=\"tag-description\"").count(), 2);
        assert_eq!(html.matches("<li").count(), 1);
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
        assert!(warnings(input).is_empty());
    }

    #[test]
    fn test_bibliographic_reference() {
        let input = ".Rs\n.%A Jane Doe\n.%A John Roe\n.%T A Paper\n.%D 2020\n.Re\n";
        assert_eq!(
            fragment(input),
            "<div class=\"bibliographic\" x-source=\"0\">Jane Doe and John Roe, \
             <span class=\"ref-title\">A Paper</span>, 2020.</div>\n"
        );
    }

    #[test]
    fn test_literal_display() {
        let html = fragment(".Bd -literal -offset indent\n  two  spaces\n.Ed\n");
        assert!(html.starts_with(
            "<div class=\"display literal\" style=\"margin-left:3em\" x-source=\"0\">"
        ));
        assert!(html.contains("  two  spaces"));
    }

    #[test]
    fn test_exit_status_sentence() {
        let html = unmarked(".Sh NAME\n.Nm grep\n.Sh EXIT STATUS\n.Ex -std\n");
        assert!(html.contains(
            "The <span class=\"name\">grep</span> utility exits 0 on success, \
             and &gt;0 if an error occurs."
        ));
    }
}

// ============================================================================
// man pages
// ============================================================================

mod man {
    use super::*;
    use pretty_assertions::assert_eq;

    const LS_MAN: &str = "\
.TH LS 1 2020-05-05 \"GNU coreutils\" \"User Commands\"
.SH NAME
ls \\- list directory contents
.SH OPTIONS
.TP
.B \\-l
use a long listing format
.TP
\\fB\\-a\\fR
do not ignore entries starting with .
";

    #[test]
    fn test_header_and_footer() {
        let html = man_to_html(LS_MAN);
        assert!(html.contains("<span class=\"head-left\">LS(1)</span>"));
        assert!(html.contains("<span class=\"head-vol\">User Commands</span>"));
        assert!(html.contains("<span class=\"foot-left\">GNU coreutils</span>"));
        assert!(html.contains("<span class=\"foot-date\">May 5, 2020</span>"));
    }

    #[test]
    fn test_tagged_paragraphs() {
        let html = fragment(LS_MAN);
        assert_eq!(html.matches("class=\"tag-description\"").count(), 2);
        assert!(html.contains("<span class=\"bold\" x-source=\"5\">-l</span>"));
        assert!(html.contains("id=\"OPTIONS\""));
        assert!(warnings(LS_MAN).is_empty());
    }

    #[test]
    fn test_alternating_fonts() {
        assert_eq!(
            unmarked(".BR ls (1)\n"),
            "<span class=\"bold\">ls</span>(1)\n"
        );
    }

    #[test]
    fn test_no_fill_block() {
        let html = unmarked(".nf\nline one\nline two\n.fi\nafter\n");
        assert!(html.starts_with("<div class=\"nofill\">"));
        assert!(html.contains("<span class=\"text\">after</span>"));
    }
}

// ============================================================================
// Block nesting
// ============================================================================

mod nesting {
    use super::*;
    use pretty_assertions::assert_eq;

    fn position(html: &str, needle: &str) -> usize {
        html.find(needle)
            .unwrap_or_else(|| panic!("{:?} not found in {}", needle, html))
    }

    #[test]
    fn test_display_end_closes_inner_inset() {
        let input = ".Sh A\n.Bd -literal\n.RS\nx\n.Ed\nafter\n";
        let html = unmarked(input);
        assert!(html.contains(
            "<div class=\"display literal\"><div class=\"indent\" style=\"margin-left:3.5em\">\
             <span class=\"text\">x</span></div></div>\n<span class=\"text\">after</span>"
        ));
        assert_eq!(warnings(input), vec![WarningKind::UnterminatedBlock]);
    }

    #[test]
    fn test_paragraphs_stay_inside_inset() {
        let html = unmarked(".SH A\n.RS\n.PP\ninside\n.RE\noutside\n");
        assert!(html.contains(
            "<div class=\"paragraph\"></div>\n<span class=\"text\">inside</span></div>\n\
             <span class=\"text\">outside</span>"
        ));
    }

    #[test]
    fn test_section_closes_open_list() {
        let input = ".Sh A\n.Bl -enum\n.It\none\n.Sh B\ntwo\n";
        let html = unmarked(input);
        assert_eq!(html.matches("<section").count(), 2);
        assert!(position(&html, "</ol>") < position(&html, "id=\"B\""));
        assert!(position(&html, "id=\"B\"") < position(&html, "two"));
        assert_eq!(warnings(input), vec![WarningKind::UnterminatedBlock]);
    }

    #[test]
    fn test_section_closes_list_at_top_level() {
        let html = unmarked(".Bl -enum\n.It\none\n.Sh NEXT\nbody\n");
        assert!(position(&html, "</ol>") < position(&html, "<section"));
        assert!(position(&html, "<section") < position(&html, "body"));
    }

    #[test]
    fn test_font_block_closed_by_display_end() {
        let html = unmarked(".Bd -ragged\n.Bf -symbolic\nbold\n.Ed\nafter\n");
        assert!(position(&html, "bold") < position(&html, "</div></div>"));
        assert!(position(&html, "</div></div>") < position(&html, "after"));
    }
}

// ============================================================================
// Preprocessor
// ============================================================================

mod preprocess {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defined_string() {
        let html = unmarked(".ds Os NetBSD\nRun \\*(Os now.\n");
        assert_eq!(html, "<span class=\"text\">Run NetBSD now.</span>\n");
    }

    #[test]
    fn test_conditionals() {
        let html = unmarked(".if n .B terminal\n.if t .B typeset\n");
        assert!(html.contains("typeset"));
        assert!(!html.contains("terminal"));
    }

    #[test]
    fn test_self_referential_macro_terminates() {
        let kinds = warnings(".de xx\n.xx\n..\n.xx\nend\n");
        assert!(kinds.contains(&WarningKind::MacroLoop));
    }

    #[test]
    fn test_many_calls_of_plain_macro() {
        let mut input = String::from(".de Xx\n\\\\$1\n..\n");
        for i in 0..1005 {
            input.push_str(&format!(".Xx w{}\n", i));
        }
        let html = unmarked(&input);
        assert!(html.contains(">w999<"));
        assert!(html.contains(">w1004<"));
        assert!(warnings(&input).is_empty());
    }

    #[test]
    fn test_include() {
        let resolver = MemoryFileResolver::new().with_file("man1/other.1", "Included text.\n");
        let result = man_to_html_with_diagnostics(
            ".so man1/other.1\n",
            &M2HOptions::fragment(),
            &resolver,
        )
        .unwrap();
        assert!(result.output.contains("Included text."));
    }

    #[test]
    fn test_redirect_self_loop_is_an_error() {
        let resolver = MemoryFileResolver::new().with_file("loop.1", ".so loop.1\n");
        for inline_includes in [true, false] {
            let options = M2HOptions {
                inline_includes,
                ..M2HOptions::fragment()
            };
            let result = man_to_html_with_diagnostics(".so loop.1\n", &options, &resolver);
            assert!(
                matches!(result, Err(ConversionError::Redirect { .. })),
                "inline_includes = {}",
                inline_includes
            );
        }
    }

    #[test]
    fn test_redirect_chain_is_bounded() {
        let resolver = MemoryFileResolver::new()
            .with_file("a.1", ".so b.1\n")
            .with_file("b.1", ".so a.1\n");
        let result = man_to_html_with_diagnostics(".so a.1\n", &M2HOptions::fragment(), &resolver);
        assert!(matches!(result, Err(ConversionError::Redirect { .. })));
    }
}

// ============================================================================
// Tokenizer and escapes
// ============================================================================

mod escapes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_escape_resolves() {
        for (key, value) in mandox_glyphs::ESCAPES.entries() {
            let html = unmarked(&format!("x\\{}y\n", key));
            assert_eq!(
                html,
                format!("<span class=\"text\">x{}y</span>\n", value),
                "escape \\{}",
                key
            );
        }
    }

    #[test]
    fn test_font_spans_are_closed() {
        let html = fragment("\\fBbold\nstill bold \\fRplain\n.Pp\n\\fIitalic\n");
        assert_eq!(html.matches("<span").count(), html.matches("</span>").count());
    }

    #[test]
    fn test_unknown_escape_is_marked() {
        let result =
            man_to_html_with_diagnostics("a\\Zb\n", &M2HOptions::fragment(), &NoopFileResolver)
                .unwrap();
        assert!(result.output.contains("class=\"unimplemented\""));
        assert_eq!(result.warnings[0].kind, WarningKind::UnsupportedEscape);
    }
}

// ============================================================================
// tbl
// ============================================================================

mod tbl {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_by_two_table() {
        let html = unmarked(".TS\nl r.\nname\tsize\nfoo\t12\n.TE\n");
        assert_eq!(
            html,
            "<table class=\"tbl\">\n\
             <tr><td style=\"text-align:left\">name</td><td style=\"text-align:right\">size</td></tr>\n\
             <tr><td style=\"text-align:left\">foo</td><td style=\"text-align:right\">12</td></tr>\n\
             </table>\n"
        );
    }

    #[test]
    fn test_last_layout_line_repeats() {
        let html = unmarked(".TS\nc.\na\nb\nc\n.TE\n");
        assert_eq!(html.matches("<tr>").count(), 3);
        assert_eq!(html.matches("<td style=\"text-align:center\">").count(), 3);
    }

    #[test]
    fn test_column_width() {
        let html = unmarked(".TS\nlw(1i) l.\na\tb\n.TE\n");
        assert!(html.contains("<td style=\"text-align:left;width:6em\">a</td>"));
    }
}

// ============================================================================
// Degradation and state
// ============================================================================

mod degrade {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_macro() {
        let result =
            man_to_html_with_diagnostics(".Zz foo\n", &M2HOptions::fragment(), &NoopFileResolver)
                .unwrap();
        assert_eq!(
            result.output,
            "<span class=\"unimplemented\" x-source=\"0\">.Zz foo</span>\n"
        );
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::UnsupportedMacro);
        assert_eq!(result.warnings[0].line, Some(0));
    }

    #[test]
    fn test_unknown_list_type() {
        let input = ".Bl -fancy\n.It\nx\n.El\n";
        assert!(fragment(input).contains("item-list"));
        assert_eq!(warnings(input), vec![WarningKind::UnsupportedListType]);
    }

    #[test]
    fn test_unterminated_display() {
        assert_eq!(
            warnings(".Bd -literal\ntext\n"),
            vec![WarningKind::UnterminatedBlock]
        );
    }

    #[test]
    fn test_conversion_is_repeatable() {
        let mut converter = ManConverter::with_options(M2HOptions::default());
        let first = converter.convert(LS_MDOC).unwrap();
        let second = converter.convert(LS_MDOC).unwrap();
        assert_eq!(first.output, second.output);

        let other = converter.convert(".TH OTHER 8\n").unwrap();
        assert!(!other.output.contains("LS(1)"));
        assert!(!other.output.contains("OpenBSD"));
    }

    #[test]
    fn test_markers_can_be_disabled() {
        let html = man_to_html_with_options(LS_MDOC, M2HOptions::plain());
        assert!(!html.contains("x-source"));
    }
}
