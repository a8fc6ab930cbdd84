//! Parse plans: what each class's parse routine does, independent of how it
//! is rendered.

use grammar::{Analysis, Field, Grammar, Symbol};

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Step {
    /// Match a terminal and drop it.
    Skip(String),
    /// Match a terminal and keep the token.
    Token { field: String, terminal: String },
    /// Parse a class and keep the result.
    Parse { field: String, class: String },
}

/// One arm of an abstract class's dispatch.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Case {
    pub class: String,
    pub terminals: Vec<String>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Plan {
    /// Pick a derived class by the current terminal.
    Dispatch(Vec<Case>),
    Sequence(Vec<Step>),
    /// Repeat the body while the current terminal is in `selector`, or, with
    /// a separator, as long as a separator follows each occurrence.
    Loop {
        body: Vec<Step>,
        selector: Vec<String>,
        separator: Option<String>,
    },
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ClassPlan {
    pub class: String,
    /// Left-hand side used for tracing. Empty for abstract classes.
    pub lhs: String,
    /// The declaring rule, for concrete classes.
    pub rule: Option<String>,
    pub base: Option<String>,
    pub fields: Vec<Field>,
    pub plan: Plan,
}

/// Plans for every abstract and concrete class, in name order.
pub fn class_plans(grammar: &Grammar, analysis: &Analysis) -> Vec<ClassPlan> {
    let classes = &grammar.classes;
    let mut plans: Vec<ClassPlan> = classes
        .abstract_classes()
        .map(|base| abstract_plan(base, grammar, analysis))
        .collect();
    plans.extend(
        classes
            .concrete_classes()
            .filter_map(|class| concrete_plan(class, grammar, analysis)),
    );
    plans.sort_by(|a, b| a.class.cmp(&b.class));
    plans
}

fn abstract_plan(base: &str, grammar: &Grammar, analysis: &Analysis) -> ClassPlan {
    let mut claimed: Vec<&str> = Vec::new();
    let mut cases = Vec::new();
    for class in grammar.classes.derived(base) {
        let mut terminals = Vec::new();
        for terminal in analysis.class_selector(class).into_iter().flatten() {
            // Only reachable with the LL(1) check off: the first class wins.
            if claimed.contains(&terminal.as_str()) {
                continue;
            }
            claimed.push(terminal);
            terminals.push(terminal.clone());
        }
        cases.push(Case {
            class: class.clone(),
            terminals,
        });
    }
    ClassPlan {
        class: base.to_owned(),
        lhs: String::new(),
        rule: None,
        base: None,
        fields: Vec::new(),
        plan: Plan::Dispatch(cases),
    }
}

fn concrete_plan(class: &str, grammar: &Grammar, analysis: &Analysis) -> Option<ClassPlan> {
    let classes = &grammar.classes;
    let record = classes.record(class)?;
    let repetition = classes.repetition(class);
    let suffix = if repetition.is_some() { "List" } else { "" };

    let mut rhs = Vec::with_capacity(record.items.len());
    let mut body = Vec::with_capacity(record.items.len());
    for item in &record.items {
        rhs.push(item.to_string());
        let step = match (&item.symbol, &item.field) {
            (Symbol::Terminal(t), None) => Step::Skip(t.clone()),
            (Symbol::Terminal(t), Some(field)) => Step::Token {
                field: format!("{}{}", field, suffix),
                terminal: t.clone(),
            },
            (Symbol::Nonterminal(nt), field) => Step::Parse {
                field: format!("{}{}", field.as_deref().unwrap_or(nt.name()), suffix),
                class: nt.class_name(),
            },
        };
        body.push(step);
    }

    let (op, plan) = match repetition {
        None => ("::=", Plan::Sequence(body)),
        Some(separator) => {
            if let Some(sep) = separator {
                rhs.push(format!("+{}", sep));
            }
            let selector = analysis
                .class_selector(class)
                .into_iter()
                .flatten()
                .cloned()
                .collect();
            (
                "**=",
                Plan::Loop {
                    body,
                    selector,
                    separator: separator.map(str::to_owned),
                },
            )
        }
    };
    let mut rule = format!("{} {}", record.lhs, op);
    for item in rhs {
        rule.push(' ');
        rule.push_str(&item);
    }

    Some(ClassPlan {
        class: class.to_owned(),
        lhs: record.lhs.clone(),
        rule: Some(rule),
        base: classes.base_of(class).map(str::to_owned),
        fields: classes.fields(class),
        plan,
    })
}
