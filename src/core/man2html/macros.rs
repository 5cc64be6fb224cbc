//! Macro table and dispatch
//!
//! Every macro the interpreter knows is a [`MacroKind`]. Names map to kinds
//! through a compile-time table, and [`ManConverter::dispatch`] matches on
//! the kind exhaustively, so a new variant without a handler does not build.

use phf::phf_map;

use super::context::{Enders, ManConverter};
use super::engine::primitives::parse_request;
use super::engine::{LineCursor, Step, Token};

/// `%X` fields of a bibliographic reference block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefField {
    Author,
    Book,
    City,
    Date,
    Issuer,
    Journal,
    Issue,
    Optional,
    Page,
    Institution,
    Report,
    Title,
    Uri,
    Volume,
}

impl RefField {
    /// Rendering order inside a reference.
    pub const ORDER: [RefField; 14] = [
        RefField::Author,
        RefField::Institution,
        RefField::Book,
        RefField::Title,
        RefField::Journal,
        RefField::Report,
        RefField::Issuer,
        RefField::City,
        RefField::Volume,
        RefField::Issue,
        RefField::Page,
        RefField::Uri,
        RefField::Date,
        RefField::Optional,
    ];
}

/// Closed set of mdoc, man and roff macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroKind {
    // mdoc prologue and sections
    Dd,
    Dt,
    Os,
    Nm,
    Nd,
    Sh,
    Ss,
    Pp,
    // mdoc inline
    Ad,
    An,
    Ap,
    Ar,
    At,
    Bsx,
    Bt,
    Bx,
    Cd,
    Cm,
    Db,
    Dv,
    Dx,
    Em,
    Er,
    Ev,
    Ex,
    Fa,
    Fd,
    Fl,
    Fn,
    Ft,
    Fx,
    Ic,
    In,
    Lb,
    Li,
    Lk,
    Ms,
    Mt,
    No,
    Ns,
    Nx,
    Ox,
    Pa,
    Pf,
    Ql,
    Rv,
    Sm,
    St,
    Sx,
    Sy,
    Tg,
    Tn,
    Ud,
    Ux,
    Va,
    Vt,
    Xr,
    // mdoc enclosures
    Aq,
    Bq,
    Brq,
    Dq,
    Op,
    Pq,
    Qq,
    Sq,
    Eo,
    Ec,
    Ao,
    Ac,
    Bo,
    Bc,
    Bro,
    Brc,
    Do,
    Dc,
    Oo,
    Oc,
    Po,
    Pc,
    Qo,
    Qc,
    So,
    Sc,
    Xo,
    Xc,
    // mdoc blocks
    Bd,
    Ed,
    D1,
    Dl,
    Bf,
    Ef,
    Bk,
    Ek,
    Bl,
    El,
    It,
    Ta,
    Fo,
    Fc,
    Rs,
    Re,
    Ref(RefField),
    // man
    ManTh,
    ManSh,
    ManSs,
    ManPp,
    ManTp,
    ManTq,
    ManIp,
    ManHp,
    ManRs,
    ManRe,
    ManB,
    ManI,
    ManSm,
    ManSb,
    ManBi,
    ManBr,
    ManIb,
    ManIr,
    ManRb,
    ManRi,
    ManEx,
    ManEe,
    ManUr,
    ManUe,
    ManMt,
    ManMe,
    ManOp,
    // roff requests
    Br,
    Sp,
    FontRequest,
    NoFill,
    Fill,
    Source,
    TableStart,
    TableEnd,
    Ignored,
}

static MACROS: phf::Map<&'static str, MacroKind> = phf_map! {
    "Dd" => MacroKind::Dd,
    "Dt" => MacroKind::Dt,
    "Os" => MacroKind::Os,
    "Nm" => MacroKind::Nm,
    "Nd" => MacroKind::Nd,
    "Sh" => MacroKind::Sh,
    "Ss" => MacroKind::Ss,
    "Pp" => MacroKind::Pp,
    "Lp" => MacroKind::Pp,
    "Ad" => MacroKind::Ad,
    "An" => MacroKind::An,
    "Ap" => MacroKind::Ap,
    "Ar" => MacroKind::Ar,
    "At" => MacroKind::At,
    "Bsx" => MacroKind::Bsx,
    "Bt" => MacroKind::Bt,
    "Bx" => MacroKind::Bx,
    "Cd" => MacroKind::Cd,
    "Cm" => MacroKind::Cm,
    "Db" => MacroKind::Db,
    "Dv" => MacroKind::Dv,
    "Dx" => MacroKind::Dx,
    "Em" => MacroKind::Em,
    "Er" => MacroKind::Er,
    "Ev" => MacroKind::Ev,
    "Ex" => MacroKind::Ex,
    "Fa" => MacroKind::Fa,
    "Fd" => MacroKind::Fd,
    "Fl" => MacroKind::Fl,
    "Fn" => MacroKind::Fn,
    "Ft" => MacroKind::Ft,
    "Ot" => MacroKind::Ft,
    "Fx" => MacroKind::Fx,
    "Ic" => MacroKind::Ic,
    "In" => MacroKind::In,
    "Lb" => MacroKind::Lb,
    "Li" => MacroKind::Li,
    "Lk" => MacroKind::Lk,
    "Ms" => MacroKind::Ms,
    "Mt" => MacroKind::Mt,
    "No" => MacroKind::No,
    "Ns" => MacroKind::Ns,
    "Nx" => MacroKind::Nx,
    "Ox" => MacroKind::Ox,
    "Pa" => MacroKind::Pa,
    "Pf" => MacroKind::Pf,
    "Ql" => MacroKind::Ql,
    "Rv" => MacroKind::Rv,
    "Sm" => MacroKind::Sm,
    "St" => MacroKind::St,
    "Sx" => MacroKind::Sx,
    "Sy" => MacroKind::Sy,
    "Tg" => MacroKind::Tg,
    "Tn" => MacroKind::Tn,
    "Ud" => MacroKind::Ud,
    "Ux" => MacroKind::Ux,
    "Va" => MacroKind::Va,
    "Vt" => MacroKind::Vt,
    "Xr" => MacroKind::Xr,
    "Aq" => MacroKind::Aq,
    "Bq" => MacroKind::Bq,
    "Brq" => MacroKind::Brq,
    "Dq" => MacroKind::Dq,
    "Op" => MacroKind::Op,
    "Pq" => MacroKind::Pq,
    "Qq" => MacroKind::Qq,
    "Sq" => MacroKind::Sq,
    "Eo" => MacroKind::Eo,
    "Ec" => MacroKind::Ec,
    "Ao" => MacroKind::Ao,
    "Ac" => MacroKind::Ac,
    "Bo" => MacroKind::Bo,
    "Bc" => MacroKind::Bc,
    "Bro" => MacroKind::Bro,
    "Brc" => MacroKind::Brc,
    "Do" => MacroKind::Do,
    "Dc" => MacroKind::Dc,
    "Oo" => MacroKind::Oo,
    "Oc" => MacroKind::Oc,
    "Po" => MacroKind::Po,
    "Pc" => MacroKind::Pc,
    "Qo" => MacroKind::Qo,
    "Qc" => MacroKind::Qc,
    "So" => MacroKind::So,
    "Sc" => MacroKind::Sc,
    "Xo" => MacroKind::Xo,
    "Xc" => MacroKind::Xc,
    "Bd" => MacroKind::Bd,
    "Ed" => MacroKind::Ed,
    "D1" => MacroKind::D1,
    "Dl" => MacroKind::Dl,
    "Bf" => MacroKind::Bf,
    "Ef" => MacroKind::Ef,
    "Bk" => MacroKind::Bk,
    "Ek" => MacroKind::Ek,
    "Bl" => MacroKind::Bl,
    "El" => MacroKind::El,
    "It" => MacroKind::It,
    "Ta" => MacroKind::Ta,
    "Fo" => MacroKind::Fo,
    "Fc" => MacroKind::Fc,
    "Rs" => MacroKind::Rs,
    "Re" => MacroKind::Re,
    "%A" => MacroKind::Ref(RefField::Author),
    "%B" => MacroKind::Ref(RefField::Book),
    "%C" => MacroKind::Ref(RefField::City),
    "%D" => MacroKind::Ref(RefField::Date),
    "%I" => MacroKind::Ref(RefField::Issuer),
    "%J" => MacroKind::Ref(RefField::Journal),
    "%N" => MacroKind::Ref(RefField::Issue),
    "%O" => MacroKind::Ref(RefField::Optional),
    "%P" => MacroKind::Ref(RefField::Page),
    "%Q" => MacroKind::Ref(RefField::Institution),
    "%R" => MacroKind::Ref(RefField::Report),
    "%T" => MacroKind::Ref(RefField::Title),
    "%U" => MacroKind::Ref(RefField::Uri),
    "%V" => MacroKind::Ref(RefField::Volume),
    "TH" => MacroKind::ManTh,
    "SH" => MacroKind::ManSh,
    "SS" => MacroKind::ManSs,
    "PP" => MacroKind::ManPp,
    "LP" => MacroKind::ManPp,
    "P" => MacroKind::ManPp,
    "TP" => MacroKind::ManTp,
    "TQ" => MacroKind::ManTq,
    "IP" => MacroKind::ManIp,
    "HP" => MacroKind::ManHp,
    "RS" => MacroKind::ManRs,
    "RE" => MacroKind::ManRe,
    "B" => MacroKind::ManB,
    "I" => MacroKind::ManI,
    "SM" => MacroKind::ManSm,
    "SB" => MacroKind::ManSb,
    "BI" => MacroKind::ManBi,
    "BR" => MacroKind::ManBr,
    "IB" => MacroKind::ManIb,
    "IR" => MacroKind::ManIr,
    "RB" => MacroKind::ManRb,
    "RI" => MacroKind::ManRi,
    "EX" => MacroKind::ManEx,
    "EE" => MacroKind::ManEe,
    "UR" => MacroKind::ManUr,
    "UE" => MacroKind::ManUe,
    "MT" => MacroKind::ManMt,
    "ME" => MacroKind::ManMe,
    "OP" => MacroKind::ManOp,
    "br" => MacroKind::Br,
    "sp" => MacroKind::Sp,
    "ft" => MacroKind::FontRequest,
    "nf" => MacroKind::NoFill,
    "fi" => MacroKind::Fill,
    "so" => MacroKind::Source,
    "TS" => MacroKind::TableStart,
    "TE" => MacroKind::TableEnd,
    "ad" => MacroKind::Ignored,
    "na" => MacroKind::Ignored,
    "in" => MacroKind::Ignored,
    "ti" => MacroKind::Ignored,
    "ce" => MacroKind::Ignored,
    "ne" => MacroKind::Ignored,
    "ll" => MacroKind::Ignored,
    "ta" => MacroKind::Ignored,
    "hw" => MacroKind::Ignored,
    "ns" => MacroKind::Ignored,
    "rs" => MacroKind::Ignored,
    "bp" => MacroKind::Ignored,
    "ps" => MacroKind::Ignored,
    "vs" => MacroKind::Ignored,
    "ss" => MacroKind::Ignored,
    "cs" => MacroKind::Ignored,
    "ul" => MacroKind::Ignored,
    "cu" => MacroKind::Ignored,
    "lg" => MacroKind::Ignored,
    "pl" => MacroKind::Ignored,
    "po" => MacroKind::Ignored,
    "mk" => MacroKind::Ignored,
    "rt" => MacroKind::Ignored,
    "fam" => MacroKind::Ignored,
    "PD" => MacroKind::Ignored,
    "UC" => MacroKind::Ignored,
    "AT" => MacroKind::Ignored,
    "DT" => MacroKind::Ignored,
};

/// Look up a macro by name.
pub fn lookup(name: &str) -> Option<MacroKind> {
    MACROS.get(name).copied()
}

/// Look up a macro that may be called from another macro's arguments.
pub fn callable(name: &str) -> Option<MacroKind> {
    lookup(name).filter(|kind| kind.is_callable())
}

/// Macro named on a control line, if known.
pub fn line_macro(text: &str) -> Option<MacroKind> {
    parse_request(text).and_then(|request| lookup(request.name))
}

impl MacroKind {
    /// Callable macros may appear among another mdoc macro's arguments.
    pub fn is_callable(self) -> bool {
        use MacroKind::*;
        matches!(
            self,
            Ad | An
                | Ap
                | Ar
                | At
                | Bsx
                | Bx
                | Cd
                | Cm
                | Dv
                | Dx
                | Em
                | Er
                | Ev
                | Fa
                | Fc
                | Fl
                | Fn
                | Ft
                | Fx
                | Ic
                | In
                | Li
                | Lk
                | Ms
                | Mt
                | Nm
                | No
                | Ns
                | Nx
                | Ox
                | Pa
                | Pf
                | Ql
                | St
                | Sx
                | Sy
                | Tn
                | Ux
                | Va
                | Vt
                | Xr
                | Aq
                | Bq
                | Brq
                | Dq
                | Op
                | Pq
                | Qq
                | Sq
                | Eo
                | Ec
                | Ao
                | Ac
                | Bo
                | Bc
                | Bro
                | Brc
                | Do
                | Dc
                | Oo
                | Oc
                | Po
                | Pc
                | Qo
                | Qc
                | So
                | Sc
                | Xo
                | Xc
                | Ta
        )
    }

    /// Parsed macros look for callable macro names in their arguments, and
    /// whatever the handler leaves on the line is interpreted after it.
    pub fn is_parsed(self) -> bool {
        use MacroKind::*;
        if self.is_man() || self.is_request() {
            return false;
        }
        !matches!(
            self,
            Dd | Dt | Os | Bd | Ed | Bl | El | Bf | Ef | Bk | Ek | Db | Lb | Fo | Fd | Tg | Ex
                | Rv | Bt | Ud | Sm | Rs | Re | Ref(_)
        )
    }

    pub fn is_man(self) -> bool {
        use MacroKind::*;
        matches!(
            self,
            ManTh
                | ManSh
                | ManSs
                | ManPp
                | ManTp
                | ManTq
                | ManIp
                | ManHp
                | ManRs
                | ManRe
                | ManB
                | ManI
                | ManSm
                | ManSb
                | ManBi
                | ManBr
                | ManIb
                | ManIr
                | ManRb
                | ManRi
                | ManEx
                | ManEe
                | ManUr
                | ManUe
                | ManMt
                | ManMe
                | ManOp
        )
    }

    pub fn is_request(self) -> bool {
        use MacroKind::*;
        matches!(
            self,
            Br | Sp | FontRequest | NoFill | Fill | Source | TableStart | TableEnd | Ignored
        )
    }

    /// Opening and closing text of an enclosure macro.
    pub fn brackets(self) -> Option<(&'static str, &'static str)> {
        use MacroKind::*;
        match self {
            Aq | Ao => Some(("\u{27E8}", "\u{27E9}")),
            Bq | Bo | Op | Oo => Some(("[", "]")),
            Brq | Bro => Some(("{", "}")),
            Dq | Do => Some(("\u{201C}", "\u{201D}")),
            Pq | Po => Some(("(", ")")),
            Qq | Qo => Some(("&quot;", "&quot;")),
            Sq | So | Ql => Some(("\u{2018}", "\u{2019}")),
            Xo | Eo => Some(("", "")),
            _ => None,
        }
    }

    /// Closing macro of a multi-line enclosure.
    pub fn closer(self) -> Option<MacroKind> {
        use MacroKind::*;
        match self {
            Ao => Some(Ac),
            Bo => Some(Bc),
            Bro => Some(Brc),
            Do => Some(Dc),
            Eo => Some(Ec),
            Oo => Some(Oc),
            Po => Some(Pc),
            Qo => Some(Qc),
            So => Some(Sc),
            Xo => Some(Xc),
            _ => None,
        }
    }

    /// Closing text printed by a stray closing macro.
    pub fn closing_text(self) -> &'static str {
        use MacroKind::*;
        match self {
            Ac => "\u{27E9}",
            Bc | Oc => "]",
            Brc => "}",
            Dc => "\u{201D}",
            Pc => ")",
            Qc => "&quot;",
            Sc => "\u{2019}",
            _ => "",
        }
    }
}

impl ManConverter<'_> {
    /// Run the handler for `kind` on the arguments in `args`.
    pub(crate) fn dispatch(
        &mut self,
        kind: MacroKind,
        args: &mut LineCursor,
        enders: &Enders,
    ) -> Step<Token> {
        use MacroKind::*;
        log::trace!("line {}: {:?}", args.line(), kind);
        match kind {
            Dd => Ok(self.document_date(args)),
            Dt => Ok(self.document_title(args)),
            Os => Ok(self.operating_system(args)),
            Nm => self.name(args),
            Nd => Ok(Token::html("\u{2014}").with_closing(" ")),
            Sh => self.section(args, enders, false),
            Ss => self.section(args, enders, true),
            Pp => Ok(self.paragraph(args)),

            Ad => Ok(self.styled(args, "address")),
            An => Ok(self.author(args)),
            Ap => Ok(Token::html("'")),
            Ar => Ok(self.styled_or(args, "argument", "file ...")),
            Cd => Ok(self.styled(args, "config")),
            Cm => Ok(self.styled(args, "command-modifier")),
            Dv => Ok(self.styled(args, "define")),
            Em => Ok(self.styled(args, "emphasis")),
            Er => Ok(self.styled(args, "error")),
            Ev => Ok(self.styled(args, "environment")),
            Ic => Ok(self.styled(args, "command")),
            Li => Ok(self.styled(args, "literal")),
            Ms => Ok(self.styled(args, "math-symbol")),
            Pa => Ok(self.styled_or(args, "path", "~")),
            Sy => Ok(self.styled(args, "symbolic")),
            Tn => Ok(self.styled(args, "tradename")),
            Va => Ok(self.styled(args, "variable")),
            Vt => Ok(self.styled(args, "variable-type")),
            No => Ok(self.plain(args)),
            Fl => Ok(self.flag(args)),
            Fa => Ok(self.function_argument(args)),
            Fn => Ok(self.function(args)),
            Ft => Ok(self.function_type(args)),
            Fd => Ok(self.directive(args)),
            In => Ok(self.include(args)),
            Lb => Ok(self.library(args)),
            Lk => Ok(self.link(args)),
            Mt => Ok(self.mail_link(args)),
            Xr => Ok(self.cross_reference(args)),
            Sx => Ok(self.section_reference(args)),
            Ns => Ok(Token::empty()),
            Pf => Ok(self.prefix(args)),
            Sm => Ok(self.spacing_mode(args)),
            Ql => self.partial_enclosure(kind, args, enders),
            Bt => Ok(self.fixed_sentence(args, "is currently in beta test.")),
            Ud => Ok(self.fixed_sentence(args, "currently under development.")),
            Ex => Ok(self.exit_status(args)),
            Rv => Ok(self.return_values(args)),
            St => Ok(self.standard(args)),
            At => Ok(self.att_version(args)),
            Bx => Ok(self.bsd_version(args)),
            Bsx => Ok(self.os_version(args, "BSD/OS")),
            Fx => Ok(self.os_version(args, "FreeBSD")),
            Nx => Ok(self.os_version(args, "NetBSD")),
            Ox => Ok(self.os_version(args, "OpenBSD")),
            Dx => Ok(self.os_version(args, "DragonFly")),
            Ux => Ok(self.fixed_word(args, "UNIX")),
            Db | Tg => {
                args.take_rest();
                Ok(Token::empty())
            }

            Aq | Bq | Brq | Dq | Op | Pq | Qq | Sq => self.partial_enclosure(kind, args, enders),
            Ao | Bo | Bro | Do | Eo | Oo | Po | Qo | So | Xo => {
                self.explicit_enclosure(kind, args, enders)
            }
            Ac | Bc | Brc | Dc | Ec | Oc | Pc | Qc | Sc | Xc => {
                Ok(Token::html(kind.closing_text()).with_closing(self.tokenizer.fold_closing(args)))
            }

            Bd => self.display(args, enders),
            D1 | Dl => self.one_line_display(kind, args, enders),
            Bf => self.font_block(args, enders),
            Bk => self.keep_block(args, enders),
            Bl => self.list(args, enders),
            It => Ok(Token::empty()),
            Ta => Ok(Token::empty().with_closing(" ")),
            Fo => self.function_block(args, enders),
            Rs => self.reference_block(args, enders),
            Ref(field) => Ok(self.reference_field(field, args)),
            Ed | Ef | Ek | El | Fc | Re => {
                args.take_rest();
                Ok(Token::empty())
            }

            ManTh => Ok(self.man_title(args)),
            ManSh => self.man_section(args, enders, false),
            ManSs => self.man_section(args, enders, true),
            ManPp => Ok(self.paragraph(args)),
            ManTp => self.man_tagged_paragraph(args, enders),
            ManIp => self.man_indented_paragraph(args, enders),
            ManHp => self.man_hanging_paragraph(args, enders),
            ManRs => self.man_relative_inset(args, enders),
            ManB => Ok(self.man_font(args, "bold")),
            ManI => Ok(self.man_font(args, "italic")),
            ManSm => Ok(self.man_font(args, "small")),
            ManSb => Ok(self.man_font(args, "small bold")),
            ManBi => Ok(self.man_alternating(args, Some("bold"), Some("italic"))),
            ManBr => Ok(self.man_alternating(args, Some("bold"), None)),
            ManIb => Ok(self.man_alternating(args, Some("italic"), Some("bold"))),
            ManIr => Ok(self.man_alternating(args, Some("italic"), None)),
            ManRb => Ok(self.man_alternating(args, None, Some("bold"))),
            ManRi => Ok(self.man_alternating(args, None, Some("italic"))),
            ManEx => self.no_fill_block(args, enders, "example", ManEe),
            ManUr => self.man_link(args, enders, false),
            ManMt => self.man_link(args, enders, true),
            ManOp => Ok(self.man_option(args)),
            ManTq | ManRe | ManEe | ManUe | ManMe => {
                args.take_rest();
                Ok(Token::empty())
            }

            Br => {
                args.take_rest();
                Ok(Token::html("<br>"))
            }
            Sp => Ok(self.vertical_space(args)),
            FontRequest => {
                let name = args.take_rest();
                self.tokenizer.select_font(name.trim());
                Ok(Token::empty())
            }
            NoFill => self.no_fill_block(args, enders, "nofill", Fill),
            Fill => {
                args.take_rest();
                Ok(Token::empty())
            }
            Source => self.redirect(args),
            TableStart => self.table(args),
            TableEnd | Ignored => {
                args.take_rest();
                Ok(Token::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("Ar"), Some(MacroKind::Ar));
        assert_eq!(lookup("Lp"), Some(MacroKind::Pp));
        assert_eq!(lookup("%T"), Some(MacroKind::Ref(RefField::Title)));
        assert_eq!(lookup("SH"), Some(MacroKind::ManSh));
        assert_eq!(lookup("So"), Some(MacroKind::So));
        assert_eq!(lookup("so"), Some(MacroKind::Source));
        assert_eq!(lookup("Zz"), None);
    }

    #[test]
    fn test_callable() {
        assert!(callable("Fl").is_some());
        assert!(callable("Oc").is_some());
        assert!(callable("Sh").is_none());
        assert!(callable("Bl").is_none());
        assert!(callable("B").is_none());
    }

    #[test]
    fn test_parsed() {
        assert!(MacroKind::It.is_parsed());
        assert!(MacroKind::Sh.is_parsed());
        assert!(!MacroKind::Bl.is_parsed());
        assert!(!MacroKind::Ref(RefField::Author).is_parsed());
        assert!(!MacroKind::ManB.is_parsed());
        assert!(!MacroKind::Br.is_parsed());
    }

    #[test]
    fn test_line_macro() {
        assert_eq!(line_macro(".El"), Some(MacroKind::El));
        assert_eq!(line_macro(".  It Fl v"), Some(MacroKind::It));
        assert_eq!(line_macro("text"), None);
        assert_eq!(line_macro(".unknown"), None);
    }

    #[test]
    fn test_enclosure_pairs() {
        assert_eq!(MacroKind::Oo.closer(), Some(MacroKind::Oc));
        assert_eq!(MacroKind::Op.brackets(), Some(("[", "]")));
        assert_eq!(MacroKind::Pc.closing_text(), ")");
        assert_eq!(MacroKind::Op.closer(), None);
    }
}
