//! Plain-text outline: one line per entity, indented by nesting depth.
//!
//! ```text
//! module py_doxy: Documentation for package using doxy comment syntax.
//!   class PyClass: Brief documentation for a python class.
//!     constructor __init__(self): Constructor documentation.
//!     member _memVar: a member variable
//! ```

use crate::dump::Dumper;
use crate::model::{Entity, SourceUnit};
use anyhow::Result;

pub struct OutlineDumper;

impl Dumper for OutlineDumper {
    fn dump(&self, unit: &SourceUnit) -> Result<String> {
        let mut out = String::new();
        write_entity(&mut out, unit.module(), 0);

        if !unit.orphans().is_empty() {
            out.push_str("\norphans:\n");
            for block in unit.orphans() {
                out.push_str(&format!("  line {}: {}\n", block.line, block.brief));
            }
        }
        if !unit.diagnostics().is_empty() {
            out.push_str("\ndiagnostics:\n");
            for diag in unit.diagnostics() {
                out.push_str(&format!("  {}\n", diag));
            }
        }
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "txt"
    }
}

fn write_entity(out: &mut String, entity: &Entity, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(entity.kind().as_str());
    out.push(' ');
    out.push_str(entity.name());
    if let Some(sig) = entity.signature() {
        out.push_str(sig);
    } else if !entity.bases().is_empty() {
        out.push_str(&format!("({})", entity.bases().join(", ")));
    }
    if let Some(brief) = entity.brief().filter(|b| !b.is_empty()) {
        out.push_str(": ");
        out.push_str(brief);
    }
    out.push('\n');

    for child in entity.children().iter().chain(entity.members()) {
        write_entity(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ScanOptions;
    use crate::parser::parse_source;

    #[test]
    fn nested_outline() {
        let input = "\
## A shape.
class Square(Shape):
    sides = 4

    def __init__(self, size):
        self.size = size

def area(sq):
    \"\"\"Compute the area.\"\"\"
";
        let unit = parse_source("geo", input, &ScanOptions::default());
        let text = OutlineDumper.dump(&unit).unwrap();
        assert_eq!(
            text,
            "\
module geo
  class Square(Shape): A shape.
    classvar sides
    constructor __init__(self, size)
    member size
  function area(sq): Compute the area.
"
        );
    }

    #[test]
    fn orphans_and_diagnostics_are_listed() {
        let unit = parse_source("m", "## Lost.\nX = 1\n", &ScanOptions::default());
        let text = OutlineDumper.dump(&unit).unwrap();
        assert!(text.contains("\norphans:\n  line 1: Lost.\n"));
        assert!(text.contains("\ndiagnostics:\n  line 1: orphaned documentation block\n"));
    }
}
