//! text layout of rendered bodies
//!
//! Rendering happens in two steps. First every body is flattened into [Line]s; within one
//! body, each run of consecutive single-line attributes pads its keys to the widest key of
//! the run so the `=` signs line up. Multi-line attributes and blocks end a run. Nested
//! bodies are laid out on their own.
//!
//! Then the lines are joined. Consecutive lines that carry a trailing comment start the
//! comment in a common column, regardless of how deep the lines are nested.
use crate::body::{Block, Body, Expr, Structure};

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    depth: usize,
    text: String,
    comment: Option<String>,
}

impl Line {
    fn new(depth: usize, text: impl Into<String>) -> Self {
        Self {
            depth,
            text: text.into(),
            comment: None,
        }
    }

    fn with_comment(mut self, comment: Option<&str>) -> Self {
        self.comment = comment.map(str::to_string);
        self
    }

    /// Width without the comment
    fn width(&self) -> usize {
        self.depth * INDENT.len() + self.text.chars().count()
    }
}

pub(crate) fn body_lines(body: &Body, depth: usize, lines: &mut Vec<Line>) {
    let mut run = Vec::new();

    for structure in body {
        match structure {
            Structure::Attribute(attribute) => {
                let (first, rest) = expr_lines(&attribute.expr, depth);
                if rest.is_empty() {
                    run.push((attribute.key.as_str(), first, attribute.comment.as_deref()));
                    continue;
                }

                flush_run(&mut run, depth, lines);
                lines.push(
                    Line::new(depth, format!("{} = {first}", attribute.key))
                        .with_comment(attribute.comment.as_deref()),
                );
                lines.extend(rest);
            }
            Structure::Block(block) => {
                flush_run(&mut run, depth, lines);
                block_lines(block, depth, lines);
            }
        }
    }

    flush_run(&mut run, depth, lines);
}

fn flush_run(run: &mut Vec<(&str, String, Option<&str>)>, depth: usize, lines: &mut Vec<Line>) {
    let width = run
        .iter()
        .map(|(key, ..)| key.chars().count())
        .max()
        .unwrap_or(0);

    for (key, value, comment) in run.drain(..) {
        lines.push(Line::new(depth, format!("{key:<width$} = {value}")).with_comment(comment));
    }
}

pub(crate) fn block_lines(block: &Block, depth: usize, lines: &mut Vec<Line>) {
    let mut header = block.ident.clone();
    for label in &block.labels {
        header.push(' ');
        header.push_str(label);
    }

    if block.body.is_empty() {
        lines.push(Line::new(depth, format!("{header} {{}}")).with_comment(block.comment.as_deref()));
        return;
    }

    lines.push(Line::new(depth, format!("{header} {{")).with_comment(block.comment.as_deref()));
    body_lines(&block.body, depth + 1, lines);
    lines.push(Line::new(depth, "}"));
}

/// Lays out an expression that starts on a line at `depth`
///
/// Returns the text for the starting line and all further lines.
fn expr_lines(expr: &Expr, depth: usize) -> (String, Vec<Line>) {
    match expr {
        Expr::Raw(text) => (text.clone(), Vec::new()),
        Expr::Call { function, arg } => {
            let (first, mut rest) = expr_lines(arg, depth);
            match rest.last_mut() {
                Some(last) => {
                    last.text.push(')');
                    (format!("{function}({first}"), rest)
                }
                None => (format!("{function}({first})"), rest),
            }
        }
        Expr::Array(elements) if expr.is_simple() => {
            let elements: Vec<String> = elements
                .iter()
                .map(|element| expr_lines(element, depth).0)
                .collect();
            (format!("[{}]", elements.join(", ")), Vec::new())
        }
        Expr::Array(elements) => {
            let mut rest = Vec::new();
            for element in elements {
                let (first, element_rest) = expr_lines(element, depth + 1);
                rest.push(Line::new(depth + 1, first));
                rest.extend(element_rest);
                if let Some(last) = rest.last_mut() {
                    last.text.push(',');
                }
            }
            rest.push(Line::new(depth, "]"));
            ("[".to_string(), rest)
        }
        Expr::Object(body) if body.is_empty() => ("{}".to_string(), Vec::new()),
        Expr::Object(body) => {
            let mut rest = Vec::new();
            body_lines(body, depth + 1, &mut rest);
            rest.push(Line::new(depth, "}"));
            ("{".to_string(), rest)
        }
    }
}

/// Joins lines, aligning comments of consecutive commented lines
pub(crate) fn join(lines: &[Line]) -> String {
    let mut out = String::new();
    let mut index = 0;

    while index < lines.len() {
        let chain = lines[index..]
            .iter()
            .take_while(|line| line.comment.is_some())
            .count()
            .max(1);
        let chain = &lines[index..index + chain];
        let column = chain.iter().map(Line::width).max().unwrap_or(0);

        for line in chain {
            if index > 0 {
                out.push('\n');
            }
            index += 1;

            for _ in 0..line.depth {
                out.push_str(INDENT);
            }
            out.push_str(&line.text);

            if let Some(comment) = &line.comment {
                let padding = column - line.width() + 1;
                out.extend(std::iter::repeat(' ').take(padding));
                out.push_str(comment);
            }
        }
    }

    out
}

impl std::fmt::Display for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lines = Vec::new();
        body_lines(self, 0, &mut lines);
        f.write_str(&join(&lines))
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lines = Vec::new();
        block_lines(self, 0, &mut lines);
        f.write_str(&join(&lines))
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (first, rest) = expr_lines(self, 0);
        let mut lines = vec![Line::new(0, first)];
        lines.extend(rest);
        f.write_str(&join(&lines))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::body::Attribute;
    use pretty_assertions::assert_eq;

    fn attr(name: &str, expr: Expr) -> Structure {
        Attribute::new(name, expr).into()
    }

    fn object(structures: impl IntoIterator<Item = Structure>) -> Expr {
        Expr::Object(structures.into_iter().collect())
    }

    #[test]
    fn aligns_runs_of_simple_attributes() {
        let body: Body = [
            attr("value", Expr::raw("1")),
            attr("list", Expr::Array(vec![Expr::raw("2"), Expr::raw("3")])),
        ]
        .into_iter()
        .collect();

        assert_eq!(body.to_string(), "value = 1\nlist  = [2, 3]");
    }

    #[test]
    fn complex_values_and_blocks_break_runs() {
        let body: Body = [
            attr("provider", Expr::raw("aws")),
            attr("name", Expr::raw(r#""x""#)),
            attr("tags", object([attr("Owner", Expr::raw(r#""me""#))])),
            attr("a", Expr::raw("1")),
            Block::new("nested", [attr("long_name", Expr::raw("2"))].into_iter().collect()).into(),
            attr("bb", Expr::raw("3")),
        ]
        .into_iter()
        .collect();

        let expected = r#"
provider = aws
name     = "x"
tags = {
  Owner = "me"
}
a = 1
nested {
  long_name = 2
}
bb = 3"#;
        assert_eq!(body.to_string(), expected.trim_start());
    }

    #[test]
    fn multi_line_arrays_use_trailing_commas() {
        let expr = Expr::Array(vec![
            object([attr("a", Expr::raw("1"))]),
            Expr::raw("2"),
        ]);

        assert_eq!(expr.to_string(), "[\n  {\n    a = 1\n  },\n  2,\n]");
    }

    #[test]
    fn call_closes_after_last_line() {
        let inline = Expr::call("jsonencode", Expr::Array(vec![Expr::raw("1")]));
        assert_eq!(inline.to_string(), "jsonencode([1])");

        let multi = Expr::call("jsonencode", object([attr("a", Expr::raw("1"))]));
        assert_eq!(multi.to_string(), "jsonencode({\n  a = 1\n})");
    }

    #[test]
    fn empty_blocks_and_objects_stay_on_one_line() {
        let body: Body = [
            Block::new("empty", Body::new()).with_comment("# sensitive").into(),
            attr("object", Expr::Object(Body::new())),
        ]
        .into_iter()
        .collect();

        assert_eq!(body.to_string(), "empty {} # sensitive\nobject = {}");
    }

    #[test]
    fn comments_align_across_depths() {
        let nested: Body = [Attribute::new("nested_value", Expr::null())
            .with_comment("# OPTIONAL string")
            .into()]
        .into_iter()
        .collect();
        let body: Body = [
            Attribute::new("value", Expr::null())
                .with_comment("# OPTIONAL string")
                .into(),
            Block::new("list_block", nested)
                .with_comment("# OPTIONAL block")
                .into(),
        ]
        .into_iter()
        .collect();
        let block = Block::new("resource", body).with_quoted_label("t");

        let expected = r#"
resource "t" {
  value = null          # OPTIONAL string
  list_block {          # OPTIONAL block
    nested_value = null # OPTIONAL string
  }
}"#;
        assert_eq!(block.to_string(), expected.trim_start());
    }
}
