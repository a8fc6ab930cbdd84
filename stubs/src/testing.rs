use grammar::parser::{lexical_line, LexicalLine};
use grammar::{analyze, Analysis, Grammar, GrammarBuilder, LexicalRegistry, Location};

pub fn registry(lines: &[&str]) -> LexicalRegistry {
    let mut registry = LexicalRegistry::new();
    for (idx, line) in lines.iter().enumerate() {
        if let LexicalLine::Decl(decl) = lexical_line(line, true).unwrap() {
            registry
                .declare(decl, &Location::new("lex", idx + 1, *line))
                .unwrap();
        }
    }
    registry
}

/// Compiles a grammar over the given token names and analyzes it.
pub fn compile(tokens: &[&str], lines: &[&str], check: bool) -> (Grammar, Analysis) {
    let decls: Vec<String> = tokens.iter().map(|t| format!("token {} 'x'", t)).collect();
    let decls: Vec<&str> = decls.iter().map(String::as_str).collect();
    let mut builder = GrammarBuilder::new(&registry(&decls));
    for (idx, line) in lines.iter().enumerate() {
        builder
            .compile_line(line, &Location::new("grammar", idx + 1, *line))
            .unwrap();
    }
    let grammar = builder.finish().unwrap();
    let analysis = analyze(&grammar).unwrap();
    if check {
        analysis.check(&grammar).unwrap();
    }
    (grammar, analysis)
}
