//! FIRST/FOLLOW analysis and the LL(1) disjointness check.
//!
//! Sets are computed by iterating over the rules until nothing grows. The
//! empty string is tracked with an explicit `nullable` marker instead of a
//! pseudo-terminal, so no terminal name can ever collide with it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use crate::error::{Error, Result};
use crate::rules::{Grammar, Rule};
use crate::symbol::{Nonterminal, RuleItem, Symbol};

pub type TerminalSet = BTreeSet<String>;

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct FirstSet {
    pub terminals: TerminalSet,
    /// The sequence can derive the empty string.
    pub nullable: bool,
}

impl FirstSet {
    /// Merges `other` into `self`, returning true if anything was added.
    fn merge(&mut self, other: &FirstSet) -> bool {
        let before = (self.terminals.len(), self.nullable);
        self.terminals.extend(other.terminals.iter().cloned());
        self.nullable |= other.nullable;
        before != (self.terminals.len(), self.nullable)
    }
}

impl Display for FirstSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        let mut sep = "";
        for t in &self.terminals {
            write!(f, "{}{}", sep, t)?;
            sep = " ";
        }
        if self.nullable {
            write!(f, "{}Null", sep)?;
        }
        write!(f, "}}")
    }
}

/// Everything the synthesizer needs to know about lookahead.
#[derive(Debug, Default)]
pub struct Analysis {
    pub first: BTreeMap<Nonterminal, FirstSet>,
    pub follow: BTreeMap<Nonterminal, TerminalSet>,
    /// Selector set of each rule, indexed like `Grammar::rules`.
    pub rule_selectors: Vec<TerminalSet>,
    /// Union of the selector sets of a nonterminal's rules.
    pub selectors: BTreeMap<Nonterminal, TerminalSet>,
    /// Selector set of the rule that declares each concrete class.
    pub class_selectors: BTreeMap<String, TerminalSet>,
}

/// FIRST of an item sequence given the current FIRST table.
fn sequence_first(first: &BTreeMap<Nonterminal, FirstSet>, items: &[RuleItem]) -> FirstSet {
    let mut set = FirstSet::default();
    for item in items {
        match &item.symbol {
            Symbol::Terminal(t) => {
                set.terminals.insert(t.clone());
                return set;
            }
            Symbol::Nonterminal(nt) => {
                let nt_first = match first.get(nt) {
                    Some(nt_first) => nt_first,
                    None => return set,
                };
                set.terminals.extend(nt_first.terminals.iter().cloned());
                if !nt_first.nullable {
                    return set;
                }
            }
        }
    }
    set.nullable = true;
    set
}

fn first_sets(grammar: &Grammar) -> BTreeMap<Nonterminal, FirstSet> {
    let mut first: BTreeMap<_, _> = grammar
        .nonterminals
        .iter()
        .map(|nt| (nt.clone(), FirstSet::default()))
        .collect();
    let mut changed = true;
    while changed {
        changed = false;
        for rule in &grammar.rules {
            let rhs = sequence_first(&first, &rule.items);
            if let Some(lhs) = first.get_mut(&rule.nonterminal) {
                changed |= lhs.merge(&rhs);
            }
        }
    }
    first
}

fn follow_sets(
    grammar: &Grammar,
    first: &BTreeMap<Nonterminal, FirstSet>,
) -> BTreeMap<Nonterminal, TerminalSet> {
    let mut follow: BTreeMap<_, _> = grammar
        .nonterminals
        .iter()
        .map(|nt| (nt.clone(), TerminalSet::new()))
        .collect();
    let mut changed = true;
    while changed {
        changed = false;
        for rule in &grammar.rules {
            for (idx, item) in rule.items.iter().enumerate() {
                let nt = match &item.symbol {
                    Symbol::Nonterminal(nt) => nt,
                    Symbol::Terminal(_) => continue,
                };
                let rest = sequence_first(first, &rule.items[idx + 1..]);
                let mut add = rest.terminals;
                if rest.nullable {
                    if let Some(lhs) = follow.get(&rule.nonterminal) {
                        add.extend(lhs.iter().cloned());
                    }
                }
                let entry = follow.entry(nt.clone()).or_default();
                let before = entry.len();
                entry.extend(add);
                changed |= entry.len() != before;
            }
        }
    }
    follow
}

fn rule_selector(
    rule: &Rule,
    first: &BTreeMap<Nonterminal, FirstSet>,
    follow: &BTreeMap<Nonterminal, TerminalSet>,
) -> TerminalSet {
    let rhs = sequence_first(first, &rule.items);
    let mut selector = rhs.terminals;
    if rhs.nullable {
        if let Some(lhs) = follow.get(&rule.nonterminal) {
            selector.extend(lhs.iter().cloned());
        }
    }
    selector
}

/// Computes FIRST, FOLLOW and selector sets. Only class bookkeeping can fail
/// here; disjointness is left to [`Analysis::check`].
pub fn analyze(grammar: &Grammar) -> Result<Analysis> {
    let first = first_sets(grammar);
    let follow = follow_sets(grammar, &first);

    let rule_selectors: Vec<TerminalSet> = grammar
        .rules
        .iter()
        .map(|rule| rule_selector(rule, &first, &follow))
        .collect();

    let mut selectors: BTreeMap<Nonterminal, TerminalSet> = BTreeMap::new();
    let mut class_selectors = BTreeMap::new();
    for (rule, selector) in grammar.rules.iter().zip(&rule_selectors) {
        selectors
            .entry(rule.nonterminal.clone())
            .or_default()
            .extend(selector.iter().cloned());
        if let Some(class) = &rule.class {
            if class_selectors.contains_key(class) {
                return Err(Error::global(format!(
                    "cases for class {} already accounted for",
                    class
                )));
            }
            if grammar.classes.is_abstract(class) {
                return Err(Error::global(format!("{} is an abstract class", class)));
            }
            class_selectors.insert(class.clone(), selector.clone());
        }
    }

    Ok(Analysis {
        first,
        follow,
        rule_selectors,
        selectors,
        class_selectors,
    })
}

impl Analysis {
    /// Verifies that the rules of every nonterminal have pairwise disjoint
    /// selector sets and that no nonterminal is left without any selector.
    pub fn check(&self, grammar: &Grammar) -> Result<()> {
        for nt in &grammar.nonterminals {
            let mut seen = TerminalSet::new();
            for (rule, selector) in grammar.rules.iter().zip(&self.rule_selectors) {
                if &rule.nonterminal != nt {
                    continue;
                }
                let overlap: Vec<&str> = selector
                    .intersection(&seen)
                    .map(String::as_str)
                    .collect();
                if !overlap.is_empty() {
                    return Err(Error::global(format!(
                        "not LL(1): terms {} appear in first sets for more than one rule starting with nonterm {}",
                        overlap.join(" "),
                        nt
                    )));
                }
                seen.extend(selector.iter().cloned());
            }
            if seen.is_empty() {
                return Err(Error::global(format!(
                    "possibly useless or left-recursive grammar rule for nonterm {}",
                    nt
                )));
            }
        }
        Ok(())
    }

    pub fn class_selector(&self, class: &str) -> Option<&TerminalSet> {
        self.class_selectors.get(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::lexical::LexicalRegistry;
    use crate::parser::{lexical_line, LexicalLine};
    use crate::rules::GrammarBuilder;
    use crate::symbol::Role;

    fn compile(tokens: &[&str], lines: &[&str]) -> Grammar {
        let mut registry = LexicalRegistry::new();
        for token in tokens {
            let line = format!("token {} 'x'", token);
            if let LexicalLine::Decl(decl) = lexical_line(&line, true).unwrap() {
                registry.declare(decl, &Location::new("lex", 1, line.as_str())).unwrap();
            }
        }
        let mut builder = GrammarBuilder::new(&registry);
        for (idx, line) in lines.iter().enumerate() {
            builder
                .compile_line(line, &Location::new("grammar", idx + 1, *line))
                .unwrap();
        }
        builder.finish().unwrap()
    }

    fn set(terms: &[&str]) -> TerminalSet {
        terms.iter().map(|t| t.to_string()).collect()
    }

    /// A predictive recognizer driven only by the rule selector sets.
    fn accepts(grammar: &Grammar, analysis: &Analysis, input: &[&str]) -> bool {
        let mut stack = vec![Symbol::Nonterminal(grammar.start.clone())];
        let mut pos = 0;
        while let Some(symbol) = stack.pop() {
            match symbol {
                Symbol::Terminal(t) => {
                    if input.get(pos) != Some(&t.as_str()) {
                        return false;
                    }
                    pos += 1;
                }
                Symbol::Nonterminal(nt) => {
                    let next = match input.get(pos) {
                        Some(next) => *next,
                        None => return false,
                    };
                    let rule = grammar
                        .rules
                        .iter()
                        .zip(&analysis.rule_selectors)
                        .find(|(rule, sel)| rule.nonterminal == nt && sel.contains(next));
                    match rule {
                        Some((rule, _)) => {
                            stack.extend(rule.items.iter().rev().map(|i| i.symbol.clone()))
                        }
                        None => return false,
                    }
                }
            }
        }
        pos == input.len()
    }

    #[test]
    fn first_and_follow_with_nullable_nonterminals() {
        let g = compile(
            &["A", "B", "C"],
            &[
                "<s> ::= <x> <y> C",
                "<x>:XA ::= A",
                "<x>:void ::=",
                "<y>:YB ::= B",
                "<y>:void ::=",
            ],
        );
        let analysis = analyze(&g).unwrap();
        let x = Nonterminal::new("x");
        let y = Nonterminal::new("y");
        let s = Nonterminal::new("s");
        assert_eq!(
            analysis.first[&x],
            FirstSet { terminals: set(&["A"]), nullable: true }
        );
        assert_eq!(analysis.first[&s].terminals, set(&["A", "B", "C"]));
        assert!(!analysis.first[&s].nullable);
        assert_eq!(analysis.follow[&x], set(&["B", "C"]));
        assert_eq!(analysis.follow[&y], set(&["C"]));
        assert!(analysis.follow[&s].is_empty());
        assert_eq!(analysis.rule_selectors[2], set(&["B", "C"]));
        assert_eq!(analysis.class_selector("XA"), Some(&set(&["A"])));
        assert_eq!(analysis.class_selector("S"), Some(&set(&["A", "B", "C"])));
        assert_eq!(analysis.selectors[&x], set(&["A", "B", "C"]));
        assert_eq!(analysis.first[&x].to_string(), "{A Null}");
        analysis.check(&g).unwrap();
    }

    #[test]
    fn rule_order_does_not_change_the_sets() {
        let lines = [
            "<prog> ::= LP <args> RP",
            "<args> **= <exp> +COMMA",
            "<exp>:Num ::= <NUM>",
            "<exp>:Call ::= NAME LP <args> RP",
            "<exp>:Neg ::= MINUS <exp>",
        ];
        let mut g = compile(&["LP", "RP", "COMMA", "NUM", "NAME", "MINUS"], &lines);
        let forward = analyze(&g).unwrap();
        forward.check(&g).unwrap();
        g.rules.reverse();
        let backward = analyze(&g).unwrap();
        assert_eq!(forward.first, backward.first);
        assert_eq!(forward.follow, backward.follow);
        assert_eq!(forward.selectors, backward.selectors);
        assert_eq!(forward.class_selectors, backward.class_selectors);
        backward.check(&g).unwrap();
    }

    #[test]
    fn repetition_matches_hand_written_rules() {
        let tokens = ["LP", "RP", "A", "B", "SEP"];
        let sugared = compile(&tokens, &["<prog> ::= LP <xs> RP", "<xs> **= <A> B +SEP"]);
        let manual = compile(
            &tokens,
            &[
                "<prog> ::= LP <xs> RP",
                "<xs> ::= <A> B <tail>",
                "<xs>:void ::=",
                "<more>:void ::= <A> B <tail>",
                "<tail>:void ::= SEP <more>",
                "<tail>:void ::=",
            ],
        );
        let sugared_sets = analyze(&sugared).unwrap();
        let manual_sets = analyze(&manual).unwrap();
        sugared_sets.check(&sugared).unwrap();
        manual_sets.check(&manual).unwrap();

        assert_eq!(sugared_sets.rule_selectors, manual_sets.rule_selectors);
        let xs = Nonterminal::new("xs");
        assert_eq!(sugared_sets.selectors[&xs], manual_sets.selectors[&xs]);
        let sep = Nonterminal::synthetic(&xs, Role::Sep);
        assert_eq!(
            sugared_sets.selectors[&sep],
            manual_sets.selectors[&Nonterminal::new("tail")]
        );
        assert_eq!(sugared_sets.class_selector("Xs"), Some(&set(&["A"])));

        let inputs: &[&[&str]] = &[
            &["LP", "RP"],
            &["LP", "A", "B", "RP"],
            &["LP", "A", "B", "SEP", "A", "B", "SEP", "A", "B", "RP"],
            &["LP", "A", "B", "SEP", "RP"],
            &["LP", "SEP", "RP"],
            &["LP", "A", "RP"],
            &["LP", "A", "B", "A", "B", "RP"],
        ];
        for input in inputs {
            assert_eq!(
                accepts(&sugared, &sugared_sets, input),
                accepts(&manual, &manual_sets, input),
                "input: {:?}",
                input
            );
        }
        assert!(accepts(&sugared, &sugared_sets, &["LP", "A", "B", "SEP", "A", "B", "RP"]));
        assert!(!accepts(&sugared, &sugared_sets, &["LP", "A", "B", "SEP", "RP"]));
    }

    #[test]
    fn repetition_without_separator_accepts_any_count() {
        let g = compile(&["NUM", "PLUS"], &["<expr> ::= <NUM>n <rest>", "<rest> **= PLUS <NUM>n"]);
        assert_eq!(g.rules.len(), 4);
        assert_eq!(g.rules.iter().filter(|r| r.class.is_none()).count(), 2);
        let analysis = analyze(&g).unwrap();
        analysis.check(&g).unwrap();
        assert_eq!(analysis.class_selector("Rest"), Some(&set(&["PLUS"])));
        assert!(g.classes.is_concrete("Expr"));
        assert_eq!(g.classes.fields("Expr")[0].name, "n");
        assert_eq!(g.classes.fields("Rest")[0].name, "nList");
    }

    #[test]
    fn overlapping_selectors_are_rejected() {
        let g = compile(&["A"], &["<s>:X ::= <A>", "<s>:Y ::= <A>"]);
        let err = analyze(&g).unwrap().check(&g).unwrap_err();
        assert_eq!(
            err.message(),
            "not LL(1): terms A appear in first sets for more than one rule starting with nonterm s"
        );
    }

    #[test]
    fn left_recursion_is_rejected() {
        let g = compile(
            &["NUM", "PLUS"],
            &["<e>:One ::= <NUM>", "<e>:Add ::= <e>l PLUS <NUM>r"],
        );
        let err = analyze(&g).unwrap().check(&g).unwrap_err();
        assert_eq!(
            err.message(),
            "not LL(1): terms NUM appear in first sets for more than one rule starting with nonterm e"
        );
    }

    #[test]
    fn nonterminal_without_selectors_is_rejected() {
        let g = compile(&["NUM"], &["<prog> ::= <loop>", "<loop> ::= <loop>"]);
        let err = analyze(&g).unwrap().check(&g).unwrap_err();
        assert_eq!(
            err.message(),
            "possibly useless or left-recursive grammar rule for nonterm prog"
        );
    }
}
