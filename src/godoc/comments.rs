//! Comment groups and their association with declarations.
//!
//! tree-sitter reports comments as free-floating `comment` nodes. Go's
//! tooling instead groups adjacent comments and hangs them off the
//! declaration they precede (doc comments) or the spec/field they follow on
//! the same line (line comments). `CommentIndex` rebuilds that view from the
//! flat list of comment nodes.

/// A single comment token.
#[derive(Debug, Clone)]
struct Comment {
    start_byte: usize,
    end_byte: usize,
    start_row: usize,
    end_row: usize,
    text: String,
    /// No code precedes the comment on its first line.
    standalone: bool,
}

/// A run of standalone comments on consecutive lines.
#[derive(Debug, Clone)]
struct Group {
    first: usize,
    last: usize,
    end_row: usize,
    end_byte: usize,
}

/// All comments of one file, grouped the way Go groups them.
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    comments: Vec<Comment>,
    groups: Vec<Group>,
}

impl CommentIndex {
    /// Collect every comment node under `root`.
    pub fn build(root: tree_sitter::Node, source: &[u8]) -> Self {
        let mut nodes = Vec::new();
        collect_comments(root, &mut nodes);
        nodes.sort_by_key(|n| n.start_byte());

        let mut comments: Vec<Comment> = Vec::with_capacity(nodes.len());
        for node in nodes {
            let start_byte = node.start_byte();
            let standalone = only_comments_before(source, start_byte, &comments);
            comments.push(Comment {
                start_byte,
                end_byte: node.end_byte(),
                start_row: node.start_position().row,
                end_row: node.end_position().row,
                text: node.utf8_text(source).unwrap_or("").to_string(),
                standalone,
            });
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut open = false;
        for (i, c) in comments.iter().enumerate() {
            if !c.standalone {
                open = false;
                continue;
            }
            if open {
                if let Some(g) = groups.last_mut() {
                    if c.start_row <= g.end_row + 1 {
                        g.last = i;
                        g.end_row = c.end_row;
                        g.end_byte = c.end_byte;
                        continue;
                    }
                }
            }
            groups.push(Group {
                first: i,
                last: i,
                end_row: c.end_row,
                end_byte: c.end_byte,
            });
            open = true;
        }

        Self { comments, groups }
    }

    /// Number of comment tokens in the file.
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Doc comment of a node: the group whose last line is directly above it.
    pub fn doc_for(&self, node: tree_sitter::Node) -> String {
        let row = node.start_position().row;
        if row == 0 {
            return String::new();
        }
        self.groups
            .iter()
            .find(|g| g.end_row + 1 == row && g.end_byte <= node.start_byte())
            .map(|g| {
                let texts: Vec<&str> = self.comments[g.first..=g.last]
                    .iter()
                    .map(|c| c.text.as_str())
                    .collect();
                comment_text(&texts)
            })
            .unwrap_or_default()
    }

    /// Line comment of a node: comments starting after it on its last line.
    pub fn line_comment_for(&self, node: tree_sitter::Node) -> String {
        let row = node.end_position().row;
        let end = node.end_byte();
        let texts: Vec<&str> = self
            .comments
            .iter()
            .filter(|c| !c.standalone && c.start_row == row && c.start_byte >= end)
            .map(|c| c.text.as_str())
            .collect();
        comment_text(&texts)
    }
}

fn collect_comments<'a>(node: tree_sitter::Node<'a>, out: &mut Vec<tree_sitter::Node<'a>>) {
    if node.kind() == "comment" {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_comments(child, out);
    }
}

/// Whether everything between the start of the line and `start` is
/// whitespace or part of an earlier comment.
fn only_comments_before(source: &[u8], start: usize, earlier: &[Comment]) -> bool {
    let line_start = source[..start]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);

    // Comments are sorted and disjoint: skip to the first one still open at
    // the line start, then advance through them in order.
    let mut next = earlier.partition_point(|c| c.end_byte <= line_start);
    let mut pos = line_start;
    while pos < start {
        if let Some(c) = earlier.get(next).filter(|c| c.start_byte <= pos) {
            pos = pos.max(c.end_byte);
            next += 1;
            continue;
        }
        if !source[pos].is_ascii_whitespace() {
            return false;
        }
        pos += 1;
    }
    true
}

/// Normalize raw comment tokens into documentation text.
///
/// Comment markers are removed, directive lines (`//go:generate`,
/// `//nolint:...`, `//line`, `//export`, `//extern`) are dropped, trailing
/// whitespace is stripped, leading and trailing blank lines are removed and
/// runs of blank lines collapse into one. Non-empty results end in a newline.
pub fn comment_text(raw: &[&str]) -> String {
    let mut lines: Vec<String> = Vec::new();

    for c in raw {
        if let Some(rest) = c.strip_prefix("//") {
            let text = match rest.strip_prefix(' ') {
                Some(t) => t,
                None if is_directive(rest) => continue,
                None => rest,
            };
            lines.push(text.to_string());
        } else if let Some(rest) = c.strip_prefix("/*") {
            let body = rest.strip_suffix("*/").unwrap_or(rest);
            lines.extend(body.split('\n').map(str::to_string));
        } else {
            lines.push(c.to_string());
        }
    }

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in &lines {
        let line = line.trim_end();
        if line.is_empty() {
            // Skip leading blanks and collapse runs.
            if out.last().map_or(true, |l| l.is_empty()) {
                continue;
            }
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    if out.is_empty() {
        return String::new();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// `//line`, `//extern`, `//export` or `[a-z0-9]+:[a-z0-9]` (e.g. `go:embed`).
fn is_directive(c: &str) -> bool {
    if c.starts_with("line ") || c.starts_with("extern ") || c.starts_with("export ") {
        return true;
    }
    let Some(colon) = c.find(':') else {
        return false;
    };
    if colon == 0 || colon + 1 >= c.len() {
        return false;
    }
    let is_word = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    c.as_bytes()[..colon].iter().all(|&b| is_word(b)) && is_word(c.as_bytes()[colon + 1])
}
