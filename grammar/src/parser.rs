//! Parsers for the three kinds of specification line: lexical declarations,
//! grammar rules and semantic-section headers.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, space1},
    combinator::{all_consuming, map, rest},
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::SyntaxError;
use crate::lexical::TerminalKind;
use crate::names;
use crate::symbol::{ClassAnnot, ItemSyntax, Nonterminal, RuleLine, RuleOp};

/// A line of the lexical section.
#[derive(PartialEq, Eq, Debug)]
pub enum LexicalLine {
    Blank,
    /// A `!` configuration directive, without the `!`.
    Flag(String),
    Decl(LexicalDecl),
}

#[derive(PartialEq, Eq, Debug)]
pub struct LexicalDecl {
    pub kind: TerminalKind,
    pub name: String,
    pub pattern: Option<String>,
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

/// Removes a `#` comment that follows whitespace, then trailing blanks.
fn strip_trailing_comment(line: &str) -> &str {
    let cut = line
        .char_indices()
        .find(|&(idx, c)| c == '#' && line[..idx].ends_with(char::is_whitespace))
        .map(|(idx, _)| idx);
    match cut {
        Some(idx) => line[..idx].trim_end(),
        None => line.trim_end(),
    }
}

/// Blank or a `#` comment that starts after whitespace.
fn is_line_end(tail: &str) -> bool {
    let trimmed = tail.trim_start();
    trimmed.is_empty() || (trimmed.len() < tail.len() && trimmed.starts_with('#'))
}

/// Splits `'...'` off the front of `input`. The closing quote is the first
/// one that leaves only blanks or a comment behind it.
fn quoted(input: &str) -> Option<(&str, &str)> {
    let quote = input.chars().next().filter(|c| is_quote(*c))?;
    let body = &input[quote.len_utf8()..];
    body.char_indices()
        .filter(|&(_, c)| c == quote)
        .map(|(idx, _)| (&body[..idx], &body[idx + quote.len_utf8()..]))
        .find(|(_, tail)| is_line_end(tail))
}

/// Parses one line of the lexical section.
///
/// With `with_patterns` unset no pattern is extracted, and quote characters
/// are ordinary word characters.
pub fn lexical_line(line: &str, with_patterns: bool) -> Result<LexicalLine, SyntaxError> {
    let body = line.trim();
    if body.is_empty() || body.starts_with('#') {
        return Ok(LexicalLine::Blank);
    }
    if let Some(flag) = body.strip_prefix('!') {
        return Ok(LexicalLine::Flag(strip_trailing_comment(flag).to_owned()));
    }

    let mut words = Vec::new();
    let mut pattern = None;
    let mut input = body;
    loop {
        input = input.trim_start();
        match input.chars().next() {
            None => break,
            Some('#') => break,
            Some(c) if with_patterns && is_quote(c) => {
                let (pat, _) = quoted(input).ok_or(SyntaxError::NoPattern)?;
                if pat.is_empty() {
                    return Err(SyntaxError::NoPattern);
                }
                pattern = Some(pat.to_owned());
                break;
            }
            Some(_) => {
                let (remaining, w) = word(input).map_err(|_| SyntaxError::IllegalLexical)?;
                if with_patterns && w.contains(is_quote) {
                    return Err(SyntaxError::PuzzlingPattern);
                }
                words.push(w);
                input = remaining;
            }
        }
    }

    if with_patterns && pattern.is_none() {
        return Err(SyntaxError::NoPattern);
    }
    let (kind, name) = match words.as_slice() {
        [] => return Err(SyntaxError::NoSymbol),
        [name] => (TerminalKind::Token, *name),
        [kind, name] => match *kind {
            "token" => (TerminalKind::Token, *name),
            "skip" => (TerminalKind::Skip, *name),
            _ => return Err(SyntaxError::NoLexicalKind),
        },
        _ => return Err(SyntaxError::IllegalLexical),
    };
    if !names::is_lexical_name(name) {
        return Err(SyntaxError::IllegalTerminalName(name.to_owned()));
    }
    Ok(LexicalLine::Decl(LexicalDecl {
        kind,
        name: name.to_owned(),
        pattern,
    }))
}

/// Removes a `#` comment and everything after it.
pub fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn angle_name(input: &str) -> IResult<&str, &str> {
    delimited(
        char('<'),
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        char('>'),
    )(input)
}

fn item(input: &str) -> IResult<&str, ItemSyntax> {
    let angle = map(pair(angle_name, rest), |(name, field): (&str, &str)| {
        ItemSyntax::Angle {
            name: name.to_owned(),
            field: if field.is_empty() {
                None
            } else {
                Some(field.to_owned())
            },
        }
    });
    let bare = map(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        |name: &str| ItemSyntax::Bare(name.to_owned()),
    );
    alt((angle, bare))(input)
}

/// Parses one right-hand-side item: `NAME`, `<name>` or `<name>field`.
pub fn rhs_item(input: &str) -> Result<ItemSyntax, SyntaxError> {
    all_consuming(item)(input)
        .map(|(_, item)| item)
        .map_err(|_| SyntaxError::MalformedItem(input.to_owned()))
}

/// Parses a left-hand side: `<nt>`, `<nt>:Cls` or `<nt>:void`.
pub fn lhs(input: &str) -> Result<(Nonterminal, ClassAnnot), SyntaxError> {
    let (nt, cls) = match input.find(':') {
        Some(idx) => (&input[..idx], Some(&input[idx + 1..])),
        None => (input, None),
    };
    if cls == Some("") {
        return Err(SyntaxError::IllegalLhs(input.to_owned()));
    }
    if nt.is_empty() {
        return Err(SyntaxError::MissingNonterminal);
    }
    let inner = match all_consuming(angle_name)(nt) {
        Ok((_, inner)) => inner,
        Err(_) => nt,
    };
    if inner == names::VOID {
        return Err(SyntaxError::VoidNonterminal(input.to_owned()));
    }
    if inner == nt || !names::is_nonterminal(inner) {
        return Err(SyntaxError::IllegalNonterminal {
            nonterminal: nt.to_owned(),
            lhs: input.to_owned(),
        });
    }
    let class = match cls {
        None => ClassAnnot::Default,
        Some(names::VOID) => ClassAnnot::Void,
        Some(cls) if names::is_class(cls) => ClassAnnot::Named(cls.to_owned()),
        Some(cls) => {
            return Err(SyntaxError::IllegalClass {
                class: cls.to_owned(),
                lhs: input.to_owned(),
            })
        }
    };
    Ok((Nonterminal::new(inner), class))
}

/// Parses a grammar rule line whose comment has already been removed.
pub fn rule_line(line: &str) -> Result<RuleLine, SyntaxError> {
    let mut words = line.split_whitespace();
    let (lhs_word, op_word) = match (words.next(), words.next()) {
        (Some(lhs_word), Some(op_word)) => (lhs_word, op_word),
        _ => return Err(SyntaxError::IllegalRule),
    };
    let (nonterminal, class) = lhs(lhs_word)?;
    let op = match op_word {
        "::=" => RuleOp::Plain,
        "**=" => RuleOp::Repeat,
        _ => return Err(SyntaxError::IllegalRuleSyntax),
    };

    let mut raw: Vec<&str> = words.collect();
    let mut separator = None;
    if op == RuleOp::Repeat {
        if let Some(sep) = raw.last().and_then(|w| w.strip_prefix('+')) {
            if !names::is_terminal(sep) {
                return Err(SyntaxError::SeparatorNotTerminal(sep.to_owned()));
            }
            separator = Some(sep.to_owned());
            raw.pop();
        }
    }
    let items = raw
        .into_iter()
        .map(rhs_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RuleLine {
        nonterminal,
        class,
        op,
        items,
        separator,
    })
}

/// A line of the semantic section outside a code block.
#[derive(PartialEq, Eq, Debug)]
pub enum SemanticLine {
    Blank,
    Include(Vec<String>),
    Header {
        class: String,
        modifier: Option<String>,
    },
}

fn include(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = tag("include")(input)?;
    if input.is_empty() {
        return Ok((input, Vec::new()));
    }
    let (input, names) = preceded(space1, rest)(input)?;
    Ok((
        input,
        names.split_whitespace().map(str::to_owned).collect(),
    ))
}

/// Parses a semantic-section line: blank, comment, `include ...` or a
/// `Class[:modifier]` header.
pub fn semantic_line(line: &str) -> Result<SemanticLine, SyntaxError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(SemanticLine::Blank);
    }
    if let Ok((_, names)) = include(line) {
        return Ok(SemanticLine::Include(names));
    }
    let (class, modifier) = match line.find(':') {
        Some(idx) => (line[..idx].trim(), Some(line[idx + 1..].trim())),
        None => (line, None),
    };
    if class == names::VOID || !names::is_class(class) {
        return Err(SyntaxError::IllDefinedClass(class.to_owned()));
    }
    Ok(SemanticLine::Header {
        class: class.to_owned(),
        modifier: modifier.filter(|m| !m.is_empty()).map(str::to_owned),
    })
}

/// How a code block is delimited.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Fence {
    /// `%%{` ... `%%}`
    Brace,
    /// `%%%` ... `%%%`
    Percent,
}

fn fence(input: &str) -> IResult<&str, Fence> {
    preceded(
        take_while(char::is_whitespace),
        alt((
            map(tag("%%{"), |_| Fence::Brace),
            map(tag("%%%"), |_| Fence::Percent),
        )),
    )(input)
}

impl Fence {
    /// Recognizes a line opening a code block.
    pub fn open(line: &str) -> Option<Fence> {
        fence(line).ok().map(|(_, fence)| fence)
    }

    /// True if `line` ends a block opened with this fence.
    pub fn closes(self, line: &str) -> bool {
        let closer = match self {
            Fence::Brace => "%%}",
            Fence::Percent => "%%%",
        };
        line.trim_start().starts_with(closer)
    }
}

/// Blank and `#` lines between a semantic header and its code block.
pub fn is_filler(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// True if the line separates two sections. Only a bare `%` counts;
/// leading whitespace makes it an ordinary line.
pub fn is_section_end(line: &str) -> bool {
    line == "%"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    struct TestCase<T> {
        input: &'static str,
        // Some indicates success, None indicates error.
        out: Option<T>,
    }

    fn assert_test_cases<T, F>(f: F, tests: Vec<TestCase<T>>)
    where
        T: Debug + Eq,
        F: Fn(&'static str) -> Result<T, SyntaxError>,
    {
        for t in tests {
            let res = f(t.input);
            match t.out {
                Some(out) => assert_eq!(res, Ok(out), "input: {}", t.input),
                None => assert!(res.is_err(), "expected error for {}: {:?}", t.input, res),
            }
        }
    }

    fn decl(kind: TerminalKind, name: &str, pattern: Option<&str>) -> LexicalLine {
        LexicalLine::Decl(LexicalDecl {
            kind,
            name: name.to_owned(),
            pattern: pattern.map(str::to_owned),
        })
    }

    #[test]
    fn parse_lexical_line() {
        let tests = vec![
            TestCase {
                input: "token NUM '[0-9]+'",
                out: Some(decl(TerminalKind::Token, "NUM", Some("[0-9]+"))),
            },
            TestCase {
                input: "skip WHITESPACE '\\s+'   # blanks",
                out: Some(decl(TerminalKind::Skip, "WHITESPACE", Some("\\s+"))),
            },
            TestCase {
                input: "PLUS \"\\+\"",
                out: Some(decl(TerminalKind::Token, "PLUS", Some("\\+"))),
            },
            TestCase {
                input: "token QUOTE \"'\"",
                out: Some(decl(TerminalKind::Token, "QUOTE", Some("'"))),
            },
            TestCase {
                input: "token APOS 'it's'",
                out: Some(decl(TerminalKind::Token, "APOS", Some("it's"))),
            },
            TestCase {
                input: "token HASH '#'",
                out: Some(decl(TerminalKind::Token, "HASH", Some("#"))),
            },
            TestCase {
                input: "   # just a comment",
                out: Some(LexicalLine::Blank),
            },
            TestCase {
                input: "",
                out: Some(LexicalLine::Blank),
            },
            TestCase {
                input: "!debug=2   # trace more",
                out: Some(LexicalLine::Flag("debug=2".to_owned())),
            },
            TestCase {
                input: "token FOO",
                out: None,
            },
            TestCase {
                input: "token FOO ''",
                out: None,
            },
            TestCase {
                input: "token FOO 'abc",
                out: None,
            },
            TestCase {
                input: "tok'en FOO 'abc'",
                out: None,
            },
            TestCase {
                input: "token FOO BAR 'x'",
                out: None,
            },
            TestCase {
                input: "keep FOO 'x'",
                out: None,
            },
            TestCase {
                input: "token foo 'x'",
                out: None,
            },
        ];

        assert_test_cases(|s| lexical_line(s, true), tests);
    }

    #[test]
    fn lexical_line_errors_are_specific() {
        assert_eq!(lexical_line("token FOO", true), Err(SyntaxError::NoPattern));
        assert_eq!(
            lexical_line("to'ken FOO 'x'", true),
            Err(SyntaxError::PuzzlingPattern)
        );
        assert_eq!(
            lexical_line("a b c 'x'", true),
            Err(SyntaxError::IllegalLexical)
        );
        assert_eq!(
            lexical_line("keep FOO 'x'", true),
            Err(SyntaxError::NoLexicalKind)
        );
        assert_eq!(
            lexical_line("token Self 'x'", true),
            Err(SyntaxError::IllegalTerminalName("Self".to_owned()))
        );
    }

    #[test]
    fn lexical_line_without_patterns() {
        assert_eq!(
            lexical_line("token FOO", false),
            Ok(decl(TerminalKind::Token, "FOO", None))
        );
        assert_eq!(
            lexical_line("token FOO 'x'", false),
            Err(SyntaxError::IllegalLexical)
        );
    }

    #[test]
    fn parse_rhs_item() {
        let tests = vec![
            TestCase {
                input: "PLUS",
                out: Some(ItemSyntax::Bare("PLUS".to_owned())),
            },
            TestCase {
                input: "<exp>",
                out: Some(ItemSyntax::Angle {
                    name: "exp".to_owned(),
                    field: None,
                }),
            },
            TestCase {
                input: "<NUM>n",
                out: Some(ItemSyntax::Angle {
                    name: "NUM".to_owned(),
                    field: Some("n".to_owned()),
                }),
            },
            TestCase {
                input: "<exp>Bad",
                out: Some(ItemSyntax::Angle {
                    name: "exp".to_owned(),
                    field: Some("Bad".to_owned()),
                }),
            },
            TestCase {
                input: "<>",
                out: None,
            },
            TestCase {
                input: "+COMMA",
                out: None,
            },
            TestCase {
                input: "exp>",
                out: None,
            },
        ];

        assert_test_cases(rhs_item, tests);
    }

    #[test]
    fn parse_lhs() {
        let tests = vec![
            TestCase {
                input: "<exp>",
                out: Some((Nonterminal::new("exp"), ClassAnnot::Default)),
            },
            TestCase {
                input: "<exp>:AddExp",
                out: Some((Nonterminal::new("exp"), ClassAnnot::Named("AddExp".to_owned()))),
            },
            TestCase {
                input: "<exp>:void",
                out: Some((Nonterminal::new("exp"), ClassAnnot::Void)),
            },
            TestCase {
                input: "<exp>:",
                out: None,
            },
            TestCase {
                input: ":Foo",
                out: None,
            },
            TestCase {
                input: "<void>",
                out: None,
            },
            TestCase {
                input: "exp",
                out: None,
            },
            TestCase {
                input: "<Exp>",
                out: None,
            },
            TestCase {
                input: "<exp>:addExp",
                out: None,
            },
        ];

        assert_test_cases(lhs, tests);
    }

    #[test]
    fn lhs_errors_are_specific() {
        assert_eq!(lhs(":Foo"), Err(SyntaxError::MissingNonterminal));
        assert_eq!(
            lhs("<void>"),
            Err(SyntaxError::VoidNonterminal("<void>".to_owned()))
        );
        assert_eq!(
            lhs("<exp>:"),
            Err(SyntaxError::IllegalLhs("<exp>:".to_owned()))
        );
    }

    #[test]
    fn parse_rule_line() {
        let tests = vec![
            TestCase {
                input: "<exp> ::= <NUM>n",
                out: Some(RuleLine::plain(
                    "exp".into(),
                    ClassAnnot::Default,
                    vec![ItemSyntax::Angle {
                        name: "NUM".to_owned(),
                        field: Some("n".to_owned()),
                    }],
                )),
            },
            TestCase {
                input: "<exps>   **= <exp> +COMMA",
                out: Some(RuleLine {
                    nonterminal: "exps".into(),
                    class: ClassAnnot::Default,
                    op: RuleOp::Repeat,
                    items: vec![ItemSyntax::Angle {
                        name: "exp".to_owned(),
                        field: None,
                    }],
                    separator: Some("COMMA".to_owned()),
                }),
            },
            TestCase {
                input: "<empty>:void ::=",
                out: Some(RuleLine::plain("empty".into(), ClassAnnot::Void, vec![])),
            },
            TestCase {
                input: "<exp>",
                out: None,
            },
            TestCase {
                input: "<exp> := A",
                out: None,
            },
            TestCase {
                input: "<exps> **= <exp> +comma",
                out: None,
            },
            TestCase {
                input: "<exps> ::= <exp> +COMMA",
                out: None,
            },
        ];

        assert_test_cases(rule_line, tests);
    }

    #[test]
    fn parse_semantic_line() {
        let tests = vec![
            TestCase {
                input: "  # note",
                out: Some(SemanticLine::Blank),
            },
            TestCase {
                input: "include a.txt  b.txt",
                out: Some(SemanticLine::Include(vec![
                    "a.txt".to_owned(),
                    "b.txt".to_owned(),
                ])),
            },
            TestCase {
                input: "Prog",
                out: Some(SemanticLine::Header {
                    class: "Prog".to_owned(),
                    modifier: None,
                }),
            },
            TestCase {
                input: "Prog : import",
                out: Some(SemanticLine::Header {
                    class: "Prog".to_owned(),
                    modifier: Some("import".to_owned()),
                }),
            },
            TestCase {
                input: "Prog:",
                out: Some(SemanticLine::Header {
                    class: "Prog".to_owned(),
                    modifier: None,
                }),
            },
            TestCase {
                input: "prog",
                out: None,
            },
            TestCase {
                input: "void",
                out: None,
            },
        ];

        assert_test_cases(semantic_line, tests);
    }

    #[test]
    fn fences() {
        assert_eq!(Fence::open("  %%{"), Some(Fence::Brace));
        assert_eq!(Fence::open("%%%"), Some(Fence::Percent));
        assert_eq!(Fence::open("%%"), None);
        assert!(Fence::Brace.closes("   %%}"));
        assert!(!Fence::Brace.closes("%%%"));
        assert!(Fence::Percent.closes("%%% trailing"));
        assert!(is_filler("   "));
        assert!(is_filler(" # comment"));
        assert!(!is_filler("fn x() {}"));
    }
}
