//! Identifier classes used throughout a specification.
//!
//! | kind        | shape          | example  |
//! |-------------|----------------|----------|
//! | terminal    | `[A-Z][A-Z0-9]*` | `LPAREN` |
//! | nonterminal | `[a-z]\w*` (not `void`) | `expList` |
//! | class       | `[A-Z][$\w]*`  | `AddExp` |
//! | field       | `[a-z]\w*`     | `rand1`  |

use nom::{
    bytes::complete::take_while,
    character::complete::satisfy,
    combinator::{all_consuming, recognize},
    sequence::pair,
    IResult,
};

/// Class names the generated code or its runtime already uses, including
/// the prelude names it spells unqualified.
pub const RESERVED_CLASSES: &[&str] = &[
    "Scan", "Trace", "Token", "ParseError", "Start", "Val", "Self", "Result", "Box", "Vec",
    "Option", "From",
];

/// The class name marking a rule with no associated object.
pub const VOID: &str = "void";

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn terminal(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_uppercase()),
        take_while(|c: char| c.is_ascii_uppercase() || c.is_ascii_digit()),
    ))(input)
}

pub fn lower_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(|c| c.is_ascii_lowercase()), take_while(is_word)))(input)
}

pub fn class(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_uppercase()),
        take_while(|c: char| is_word(c) || c == '$'),
    ))(input)
}

/// Lexical declarations accept any uppercase-leading identifier.
pub fn lexical_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(|c| c.is_ascii_uppercase()), take_while(is_word)))(input)
}

pub fn is_terminal(s: &str) -> bool {
    all_consuming(terminal)(s).is_ok()
}

pub fn is_nonterminal(s: &str) -> bool {
    s != VOID && all_consuming(lower_identifier)(s).is_ok()
}

pub fn is_field(s: &str) -> bool {
    all_consuming(lower_identifier)(s).is_ok()
}

/// True for `void` and for well-formed class identifiers.
pub fn is_class(s: &str) -> bool {
    s == VOID || all_consuming(class)(s).is_ok()
}

/// `Self` has the right shape but cannot name a `Val` variant.
pub fn is_lexical_name(s: &str) -> bool {
    s != "Self" && all_consuming(lexical_name)(s).is_ok()
}

pub fn is_reserved_class(s: &str) -> bool {
    RESERVED_CLASSES.contains(&s)
}

/// The default class of a nonterminal: first character uppercased, the rest
/// unchanged. `expList` becomes `ExpList`.
pub fn class_name_of(nonterminal: &str) -> String {
    let mut chars = nonterminal.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
