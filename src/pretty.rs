//! Re-indentation of the generator's flat token stream.
//!
//! The engine emits a program as space-separated tokens on a single line.
//! [`pretty_print`] turns that into one statement per line with tab
//! indentation, looking only at the token text.

/// Tokens that attach to the previous token without a space.
const GLUED: [&str; 5] = ["(", ")", "]", ",", "!"];

fn indentation(level: isize) -> String {
    "\t".repeat(level.max(0) as usize)
}

/// Re-indent `program`.
///
/// `{` opens a level and ends the line, `}` closes one on its own line and a
/// standalone `;` ends the line. Nothing else is changed, so unbalanced input
/// still produces output, clamped at indentation zero.
pub fn pretty_print(program: &str) -> String {
    let mut out = String::with_capacity(program.len() + program.len() / 4);
    let mut level: isize = 0;
    let mut at_line_start = true;
    let mut last = "";

    for word in program.split_whitespace() {
        match word {
            "{" => {
                level += 1;
                out.push_str(if at_line_start { "{\n" } else { " {\n" });
                out.push_str(&indentation(level));
                at_line_start = true;
            }
            "}" => {
                level -= 1;
                let indent = indentation(level);
                out.push('\n');
                out.push_str(&indent);
                out.push_str("}\n");
                out.push_str(&indent);
                at_line_start = true;
            }
            ";" => {
                out.push_str(";\n");
                out.push_str(&indentation(level));
                at_line_start = true;
            }
            _ if GLUED.contains(&word) || last == "(" || last == "[" => {
                out.push_str(word);
                at_line_start = false;
            }
            _ => {
                if !at_line_start {
                    out.push(' ');
                }
                out.push_str(word);
                at_line_start = false;
            }
        }
        last = word;
    }
    out
}
