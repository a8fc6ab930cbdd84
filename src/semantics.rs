//! The semantic section: `Class[:modifier]` headers with fenced code blocks,
//! and `include` lines that queue more input.

use grammar::parser::{self, Fence, SemanticLine};
use grammar::{Error, Location, Result};
use stubs::{Entry, StubSet};

use crate::driver::Compiler;
use crate::source::Source;

impl Compiler {
    /// Reads entries to the end of input and splices each into `set`.
    pub(crate) fn semantics(&mut self, set: &mut StubSet) -> Result<()> {
        self.log(1, || "semantic section".to_owned());
        while let Some(loc) = self.next_line()? {
            match parser::semantic_line(&loc.text).map_err(|e| Error::at(&loc, e))? {
                SemanticLine::Blank => {}
                SemanticLine::Include(names) => {
                    for name in names {
                        self.enqueue(Source::from_arg(&name));
                    }
                }
                SemanticLine::Header { class, modifier } => {
                    let code = self.code_block(&loc)?;
                    let entry = Entry {
                        class,
                        modifier,
                        code,
                    };
                    self.log(1, || format!("splice {}", entry.slot()));
                    stubs::apply(set, entry).map_err(|e| Error::at(&loc, e))?;
                }
            }
        }
        Ok(())
    }

    /// The fenced block after a header, without its fence lines.
    fn code_block(&mut self, header: &Location) -> Result<String> {
        let fence = loop {
            let loc = self
                .next_line()?
                .ok_or_else(|| Error::at(header, "premature end of file"))?;
            if parser::is_filler(&loc.text) {
                continue;
            }
            match Fence::open(&loc.text) {
                Some(fence) => break fence,
                None => return Err(Error::at(&loc, "expecting a code segment")),
            }
        };
        let mut code = Vec::new();
        loop {
            let loc = self
                .next_line()?
                .ok_or_else(|| Error::at(header, "premature end of file"))?;
            if fence.closes(&loc.text) {
                break;
            }
            code.push(loc.text);
        }
        Ok(code.join("\n"))
    }
}
