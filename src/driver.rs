//! The section driver. One `Compiler` owns the flags and the input queue for
//! a whole run and walks the lexical, grammar and semantic sections in turn.

use std::fmt::{self, Display};

use grammar::parser::{self, LexicalLine};
use grammar::{analyze, Analysis, Error, Grammar, GrammarBuilder, LexicalRegistry, Location, Result, TerminalSet};
use stubs::{Target, Unit};

use crate::flags::{self, Flags};
use crate::source::{Source, SourceQueue};

/// What a successful run produced. Nothing has been written yet.
#[derive(Debug)]
pub struct Output {
    /// Present once a grammar has been compiled.
    pub summary: Option<Summary>,
    pub units: Vec<Unit>,
    /// Reason the run stopped early without failing.
    pub note: Option<String>,
}

/// Human-readable report of the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// User nonterminals, sorted.
    pub nonterminals: Vec<String>,
    pub start: String,
    /// Abstract classes, sorted.
    pub abstract_classes: Vec<String>,
}

impl Summary {
    fn new(grammar: &Grammar) -> Summary {
        let mut nonterminals: Vec<_> = grammar
            .nonterminals
            .iter()
            .filter(|nt| !nt.is_synthetic())
            .map(ToString::to_string)
            .collect();
        nonterminals.sort();
        let mut abstract_classes: Vec<_> =
            grammar.classes.abstract_classes().map(str::to_owned).collect();
        abstract_classes.sort();
        Summary {
            nonterminals,
            start: grammar.start.to_string(),
            abstract_classes,
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Nonterminals (* indicates start symbol):")?;
        for nt in &self.nonterminals {
            let mark = if *nt == self.start { '*' } else { ' ' };
            writeln!(f, " {}<{}>", mark, nt)?;
        }
        writeln!(f)?;
        writeln!(f, "Abstract classes:")?;
        for class in &self.abstract_classes {
            writeln!(f, "  {}", class)?;
        }
        Ok(())
    }
}

pub struct Compiler {
    flags: Flags,
    queue: SourceQueue,
}

impl Compiler {
    pub fn new(flags: Flags, sources: impl IntoIterator<Item = Source>) -> Self {
        Compiler {
            flags,
            queue: SourceQueue::new(sources),
        }
    }

    /// Flags as they stand, including any set by `!` lines.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Prints `msg` when the debug level reaches `level`. The message is only
    /// built if it will be shown.
    pub(crate) fn log<F: FnOnce() -> String>(&self, level: u32, msg: F) {
        if self.flags.debug() >= level {
            eprintln!(">>> {}", msg());
        }
    }

    pub(crate) fn next_line(&mut self) -> Result<Option<Location>> {
        let line = self.queue.next_line()?;
        if let Some(loc) = &line {
            self.log(2, || format!("{:>4} [{}] {}", loc.line_no, loc.source, loc.text));
        }
        Ok(line)
    }

    pub(crate) fn enqueue(&mut self, source: Source) {
        self.log(1, || format!("queued {}", source.name()));
        self.queue.enqueue(source);
    }

    /// Runs every enabled stage over the queued sources.
    pub fn run(&mut self) -> Result<Output> {
        let registry = self.lexical()?;
        let mut units = Vec::new();
        if self.flags.is_set(flags::TOKEN) {
            units.push(stubs::token_unit(&registry, self.flags.is_set(flags::PATTERN)));
        }
        if !self.flags.is_set(flags::PARSER) {
            return Ok(Output {
                summary: None,
                units,
                note: None,
            });
        }

        let builder = self.rules(&registry)?;
        if builder.is_empty() {
            return Ok(Output {
                summary: None,
                units,
                note: Some("No grammar rules".to_owned()),
            });
        }
        let grammar = builder.finish()?;
        let analysis = analyze(&grammar)?;
        self.log_analysis(&grammar, &analysis);
        if self.flags.is_set(flags::LL1) {
            analysis.check(&grammar)?;
        }

        let mut set = stubs::stubs(&grammar, &analysis).map_err(Error::global)?;
        if self.flags.is_set(flags::SEMANTICS) {
            self.semantics(&mut set)?;
        }

        let runtime = self.flags.runtime().map_err(Error::global)?;
        let target = Target::new(runtime).map_err(Error::global)?;
        units.push(stubs::start_unit(&grammar));
        units.extend(stubs::class_units(&set).map_err(Error::global)?);
        units.push(stubs::mod_unit(&set, &target).map_err(Error::global)?);

        Ok(Output {
            summary: Some(Summary::new(&grammar)),
            units,
            note: None,
        })
    }

    fn lexical(&mut self) -> Result<LexicalRegistry> {
        self.log(1, || "lexical section".to_owned());
        let mut registry = LexicalRegistry::new();
        while let Some(loc) = self.next_line()? {
            if parser::is_section_end(&loc.text) {
                break;
            }
            let patterns = self.flags.is_set(flags::PATTERN);
            match parser::lexical_line(&loc.text, patterns).map_err(|e| Error::at(&loc, e))? {
                LexicalLine::Blank => {}
                LexicalLine::Flag(spec) => {
                    self.flags.apply(&spec).map_err(|e| Error::at(&loc, e))?;
                    self.log(1, || format!("flag {}", spec));
                }
                LexicalLine::Decl(decl) => {
                    self.log(1, || {
                        format!(
                            "{} {} {}",
                            decl.kind,
                            decl.name,
                            decl.pattern.as_deref().unwrap_or("")
                        )
                    });
                    registry.declare(decl, &loc)?;
                }
            }
        }
        registry.finish()?;
        Ok(registry)
    }

    fn rules(&mut self, registry: &LexicalRegistry) -> Result<GrammarBuilder> {
        self.log(1, || "grammar section".to_owned());
        let mut builder = GrammarBuilder::new(registry);
        while let Some(loc) = self.next_line()? {
            if parser::is_section_end(&loc.text) {
                break;
            }
            let text = parser::strip_comment(&loc.text).trim();
            if text.is_empty() {
                continue;
            }
            self.log(1, || format!("rule {}", text));
            builder.compile_line(text, &loc)?;
        }
        Ok(builder)
    }

    fn log_analysis(&self, grammar: &Grammar, analysis: &Analysis) {
        self.log(1, || {
            let mut text = String::from("first sets:");
            for (nt, set) in &analysis.first {
                text.push_str(&format!("\n    <{}> {}", nt, set));
            }
            text
        });
        self.log(1, || {
            let mut text = String::from("follow sets:");
            for (nt, set) in &analysis.follow {
                text.push_str(&format!("\n    <{}> {}", nt, terminals(set)));
            }
            text
        });
        self.log(1, || {
            let mut text = String::from("rule selectors:");
            for (rule, set) in grammar.rules.iter().zip(&analysis.rule_selectors) {
                text.push_str(&format!("\n    {} {}", rule, terminals(set)));
            }
            text
        });
    }
}

fn terminals(set: &TerminalSet) -> String {
    let names: Vec<_> = set.iter().map(String::as_str).collect();
    format!("{{{}}}", names.join(" "))
}
