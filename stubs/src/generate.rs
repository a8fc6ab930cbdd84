//! Rust rendering of parse plans and the fixed units around them.
//!
//! Generated code expects the runtime module to provide `Scan` (with `cur`,
//! `expect` and `lno`), `Token`, `Trace` (with `nonterm`) and `ParseError`
//! (with `new`).

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::process::{Command, Stdio};

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};

use grammar::{Analysis, Field, FieldType, Grammar, LexicalRegistry};

use crate::error::{Result, StubError};
use crate::plan::{class_plans, ClassPlan, Plan, Step};
use crate::stub::Stub;
use crate::StubSet;

/// Names of the units that are not class stubs.
const TOKEN_UNIT: &str = "token";
const START_UNIT: &str = "start";
const MOD_UNIT: &str = "mod";

/// Where generated code finds its runtime support.
#[derive(Clone)]
pub struct Target {
    runtime: syn::Path,
}

impl Target {
    pub fn new(runtime: &str) -> Result<Target> {
        let runtime = syn::parse_str::<syn::Path>(runtime)
            .map_err(|_| StubError::Runtime(runtime.to_owned()))?;
        Ok(Target { runtime })
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub file: String,
    pub text: String,
}

/// Formats Rust source with `rustfmt`, returning it unchanged if `rustfmt`
/// is missing or rejects it.
pub fn format_rust(code: &str) -> String {
    let child = Command::new("rustfmt")
        .arg("--edition")
        .arg("2018")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(child) => child,
        Err(_) => return code.to_owned(),
    };
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(code.as_bytes()).is_ok(),
        None => false,
    };
    if !written {
        let _ = child.kill();
        let _ = child.wait();
        return code.to_owned();
    }
    match child.wait_with_output() {
        Ok(output) if output.status.success() => {
            String::from_utf8(output.stdout).unwrap_or_else(|_| code.to_owned())
        }
        _ => code.to_owned(),
    }
}

/// Identifier for a class; `$` is not legal in Rust identifiers.
pub fn class_ident(class: &str) -> Ident {
    Ident::new(&class.replace('$', "_"), Span::call_site())
}

/// Spells `name` as an identifier, falling back to a raw identifier for
/// keywords. Keywords that cannot be raw give `None`.
fn rust_ident(name: &str) -> Option<Ident> {
    match syn::parse_str::<Ident>(name) {
        Ok(ident) => Some(ident),
        Err(_) if matches!(name, "self" | "super" | "crate" | "Self" | "_") => None,
        Err(_) => Some(format_ident!("r#{}", name)),
    }
}

fn field_ident(class: &str, field: &str) -> Result<Ident> {
    rust_ident(field).ok_or_else(|| StubError::FieldName {
        class: class.to_owned(),
        field: field.to_owned(),
    })
}

fn val(terminal: &str) -> Ident {
    format_ident!("{}", terminal)
}

/// Snake-case file stem of a class: `AddExp` becomes `add_exp`.
pub fn file_stem(class: &str) -> String {
    let mut stem = String::with_capacity(class.len() + 4);
    for (idx, c) in class.replace('$', "_").chars().enumerate() {
        if c.is_ascii_uppercase() {
            if idx > 0 && !stem.ends_with('_') {
                stem.push('_');
            }
            stem.push(c.to_ascii_lowercase());
        } else {
            stem.push(c);
        }
    }
    stem
}

fn field_type(field: &Field) -> TokenStream {
    let inner = match &field.ty {
        FieldType::Token => quote! { Token },
        FieldType::Class(class) => {
            let class = class_ident(class);
            if field.repeated {
                quote! { #class }
            } else {
                quote! { Box<#class> }
            }
        }
    };
    if field.repeated {
        quote! { Vec<#inner> }
    } else {
        inner
    }
}

fn step(class: &str, step: &Step, repeated: bool) -> Result<TokenStream> {
    Ok(match step {
        Step::Skip(terminal) => {
            let terminal = val(terminal);
            quote! { scan_.expect(Val::#terminal, trace_)?; }
        }
        Step::Token { field, terminal } => {
            let field = field_ident(class, field)?;
            let terminal = val(terminal);
            if repeated {
                quote! { #field.push(scan_.expect(Val::#terminal, trace_)?); }
            } else {
                quote! { let #field = scan_.expect(Val::#terminal, trace_)?; }
            }
        }
        Step::Parse { field, class: target } => {
            let field = field_ident(class, field)?;
            let target = class_ident(target);
            if repeated {
                quote! { #field.push(#target::parse(scan_, trace_)?); }
            } else {
                quote! { let #field = Box::new(#target::parse(scan_, trace_)?); }
            }
        }
    })
}

fn concrete_items(plan: &ClassPlan) -> Result<TokenStream> {
    let name = class_ident(&plan.class);
    let lhs = &plan.lhs;
    let fields = plan
        .fields
        .iter()
        .map(|f| field_ident(&plan.class, &f.name))
        .collect::<Result<Vec<_>>>()?;
    let types: Vec<_> = plan.fields.iter().map(field_type).collect();

    let body = match &plan.plan {
        Plan::Sequence(steps) => {
            let steps = steps
                .iter()
                .map(|s| step(&plan.class, s, false))
                .collect::<Result<Vec<_>>>()?;
            quote! { #( #steps )* }
        }
        Plan::Loop {
            body,
            selector,
            separator,
        } => {
            let steps = body
                .iter()
                .map(|s| step(&plan.class, s, true))
                .collect::<Result<Vec<_>>>()?;
            let selector: Vec<_> = selector.iter().map(|t| val(t)).collect();
            let repeat = if selector.is_empty() {
                quote! {}
            } else {
                match separator {
                    None => quote! {
                        loop {
                            match scan_.cur()?.val {
                                #( Val::#selector )|* => { #( #steps )* }
                                _ => break,
                            }
                        }
                    },
                    Some(sep) => {
                        let sep = val(sep);
                        quote! {
                            match scan_.cur()?.val {
                                #( Val::#selector )|* => loop {
                                    #( #steps )*
                                    if scan_.cur()?.val != Val::#sep {
                                        break;
                                    }
                                    scan_.expect(Val::#sep, trace_)?;
                                },
                                _ => {}
                            }
                        }
                    }
                }
            };
            quote! {
                #( let mut #fields = Vec::new(); )*
                #repeat
            }
        }
        Plan::Dispatch(_) => quote! {},
    };

    Ok(quote! {
        #[derive(Debug)]
        pub struct #name {
            #( pub #fields: #types, )*
        }

        impl #name {
            pub fn new(#( #fields: #types ),*) -> Self {
                #name { #( #fields ),* }
            }

            pub fn parse(scan_: &mut Scan, trace_: Option<&Trace>) -> Result<#name, ParseError> {
                let trace_ = trace_.map(|t| t.nonterm(#lhs, scan_.lno()));
                let trace_ = trace_.as_ref();
                #body
                Ok(#name::new(#( #fields ),*))
            }
        }
    })
}

fn abstract_items(plan: &ClassPlan) -> TokenStream {
    let name = class_ident(&plan.class);
    let cases = match &plan.plan {
        Plan::Dispatch(cases) => cases.as_slice(),
        _ => &[],
    };
    let variants: Vec<_> = cases.iter().map(|c| class_ident(&c.class)).collect();
    let arms: Vec<_> = cases
        .iter()
        .filter(|c| !c.terminals.is_empty())
        .map(|c| {
            let class = class_ident(&c.class);
            let terminals: Vec<_> = c.terminals.iter().map(|t| val(t)).collect();
            quote! {
                #( Val::#terminals )|* => Ok(#name::#class(#class::parse(scan_, trace_)?)),
            }
        })
        .collect();
    let message = format!("{} cannot begin with {{}}", plan.class);

    quote! {
        #[derive(Debug)]
        pub enum #name {
            #( #variants(#variants), )*
        }

        impl #name {
            pub fn parse(scan_: &mut Scan, trace_: Option<&Trace>) -> Result<#name, ParseError> {
                match scan_.cur()?.val {
                    #( #arms )*
                    val => Err(ParseError::new(format!(#message, val.name()))),
                }
            }
        }

        #(
            impl From<#variants> for #name {
                fn from(node: #variants) -> Self {
                    #name::#variants(node)
                }
            }
        )*
    }
}

/// Lays out a class unit around its generated items.
fn class_stub(plan: &ClassPlan) -> Result<Stub> {
    let items = match plan.plan {
        Plan::Dispatch(_) => abstract_items(plan),
        _ => concrete_items(plan)?,
    };
    let name = class_ident(&plan.class);

    let mut stub = Stub::new(&plan.class);
    stub.push_text("use super::*;\n");
    stub.reserve_slot(Some("import"));
    let mut text = String::from("\n");
    if let Some(rule) = &plan.rule {
        text.push_str(&format!("// {}\n", rule));
    }
    text.push_str(&format_rust(&items.to_string()));
    stub.push_text(text);
    stub.reserve_slot(Some("top"));
    stub.push_text(format!("\nimpl {} {{\n", name));
    stub.reserve_slot(None);
    stub.push_text("}\n");
    Ok(stub)
}

/// Generates a stub for every class of the grammar.
pub fn stubs(grammar: &Grammar, analysis: &Analysis) -> Result<StubSet> {
    let mut stubs = StubSet::new();
    for plan in class_plans(grammar, analysis) {
        let stub = class_stub(&plan)?;
        stubs.insert(plan.class, stub);
    }
    Ok(stubs)
}

/// The terminal enumeration. With `patterns` the unit also carries each
/// token's pattern and the skip table.
pub fn token_unit(registry: &LexicalRegistry, patterns: bool) -> Unit {
    let names: Vec<_> = registry.tokens().map(|s| val(&s.name)).collect();
    let strings: Vec<_> = registry.tokens().map(|s| s.name.as_str()).collect();
    let pattern_items = if patterns {
        let pats: Vec<_> = registry
            .tokens()
            .map(|s| s.pattern.as_deref().unwrap_or(""))
            .collect();
        let skip_names: Vec<_> = registry.skips().map(|s| s.name.as_str()).collect();
        let skip_pats: Vec<_> = registry
            .skips()
            .map(|s| s.pattern.as_deref().unwrap_or(""))
            .collect();
        (
            quote! {
                pub fn pattern(self) -> &'static str {
                    match self {
                        #( Val::#names => #pats, )*
                    }
                }
            },
            quote! {
                pub const SKIPS: &[(&str, &str)] = &[ #( (#skip_names, #skip_pats), )* ];
            },
        )
    } else {
        (quote! {}, quote! {})
    };
    let (pattern_fn, skips) = pattern_items;

    let tokens = quote! {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Val {
            #( #names, )*
        }

        impl Val {
            pub const ALL: &'static [Val] = &[ #( Val::#names, )* ];

            pub fn name(self) -> &'static str {
                match self {
                    #( Val::#names => #strings, )*
                }
            }

            #pattern_fn
        }

        #skips
    };
    Unit {
        file: format!("{}.rs", TOKEN_UNIT),
        text: format_rust(&tokens.to_string()),
    }
}

pub fn start_unit(grammar: &Grammar) -> Unit {
    let start = class_ident(&grammar.start_class());
    let tokens = quote! {
        use super::*;

        pub type Start = #start;
    };
    Unit {
        file: format!("{}.rs", START_UNIT),
        text: format_rust(&tokens.to_string()),
    }
}

/// Module names of the class units, keyed by class.
fn modules(stubs: &StubSet) -> Result<BTreeMap<&str, String>> {
    let mut taken = BTreeSet::new();
    let mut modules = BTreeMap::new();
    for class in stubs.keys() {
        let stem = file_stem(class);
        if rust_ident(&stem).is_none() {
            return Err(StubError::ModuleName(class.clone()));
        }
        if [TOKEN_UNIT, START_UNIT, MOD_UNIT].contains(&stem.as_str())
            || taken.contains(&stem)
        {
            return Err(StubError::FileClash {
                class: class.clone(),
                file: format!("{}.rs", stem),
            });
        }
        taken.insert(stem.clone());
        modules.insert(class.as_str(), stem);
    }
    Ok(modules)
}

/// Renders every class stub to its own unit.
pub fn class_units(stubs: &StubSet) -> Result<Vec<Unit>> {
    let modules = modules(stubs)?;
    Ok(stubs
        .iter()
        .filter_map(|(class, stub)| {
            let stem = modules.get(class.as_str())?;
            Some(Unit {
                file: format!("{}.rs", stem),
                text: stub.render(),
            })
        })
        .collect())
}

/// The module index tying the units together.
pub fn mod_unit(stubs: &StubSet, target: &Target) -> Result<Unit> {
    let runtime = &target.runtime;
    let modules = modules(stubs)?;
    let mods: Vec<_> = modules.values().filter_map(|m| rust_ident(m)).collect();
    let token_mod = format_ident!("{}", TOKEN_UNIT);
    let start_mod = format_ident!("{}", START_UNIT);

    let tokens = quote! {
        pub use #runtime::{ParseError, Scan, Token, Trace};

        mod #token_mod;
        pub use #token_mod::*;

        mod #start_mod;
        pub use #start_mod::Start;

        #(
            mod #mods;
            pub use #mods::*;
        )*
    };
    let text = format!(
        "#![allow(non_snake_case)]\n\n{}",
        format_rust(&tokens.to_string())
    );
    Ok(Unit {
        file: format!("{}.rs", MOD_UNIT),
        text,
    })
}
