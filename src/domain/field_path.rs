use std::fmt;

use serde_json::Value;

/// Single step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parsed field path (`customers[0].name`, `metadata.totalCount`).
///
/// Bracket indexes are normalized to dotted numeric segments, so
/// `a.b[0].c` and `a.b.0.c` parse to the same path, and `[0].id` is the
/// same path as `.0.id` (key `""` first). Parsing never fails:
/// every string is a path, and paths that cannot exist simply never
/// resolve.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn parse(input: &str) -> Self {
        // `[n]` becomes `.n`; empty segments stay as the key "".
        let normalized = input.replace('[', ".").replace(']', "");
        let segments = normalized.split('.').map(segment_from_literal).collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walks `root` one segment at a time; `None` when any step fails.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Resolves `path` against `root`. `Some(&Value::Null)` means the field
/// exists and holds `null`.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    FieldPath::parse(path).resolve(root)
}

impl fmt::Display for FieldPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                formatter.write_str(".")?;
            }
            match segment {
                PathSegment::Key(key) => formatter.write_str(key)?,
                PathSegment::Index(index) => write!(formatter, "{index}")?,
            }
        }
        Ok(())
    }
}

fn segment_from_literal(literal: &str) -> PathSegment {
    if !literal.is_empty() && literal.bytes().all(|byte| byte.is_ascii_digit()) {
        // Saturates on overflow; no sequence is that long, so it never resolves.
        PathSegment::Index(literal.parse::<usize>().unwrap_or(usize::MAX))
    } else {
        PathSegment::Key(literal.to_string())
    }
}
