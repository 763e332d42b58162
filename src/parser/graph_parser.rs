use crate::config::ParserConfig;
use crate::error::{ExtractorError, Result};
use crate::tool::GraphHandle;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;

/// One exportable log found in a result bundle graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDescriptor {
    pub id: String,
    pub kind: String,
    pub name: Option<String>,
    pub size: Option<u64>,
}

impl LogDescriptor {
    pub fn new<S: Into<String>>(id: S, kind: S) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: None,
            size: None,
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// File name the log is exported under.
    pub fn file_name(&self) -> String {
        match self.name {
            Some(ref name) => sanitize_filename(name),
            None => format!("{}.txt", sanitize_filename(&self.id)),
        }
    }
}

pub trait GraphParser {
    /// Finds the log-bearing nodes of a graph, in document order. A graph
    /// without logs yields an empty list.
    fn parse_logs(&self, graph: &GraphHandle) -> Result<Vec<LogDescriptor>>;
}

/// Parses the indented text form of a result bundle graph.
///
/// ```text
/// * ActionsInvocationRecord
///   - Id: 0~Xy12
///   * ActivityLogSection
///     - Id: 0~Ab34
///     - Name: action.log
///     - Size: 2048
/// ```
pub struct TextGraphParser {
    log_kinds: Vec<String>,
    name_patterns: Vec<Regex>,
}

impl TextGraphParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let name_patterns = config
            .name_patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            log_kinds: config.log_kinds.clone(),
            name_patterns,
        })
    }

    pub fn parse_str(&self, text: &str) -> Result<Vec<LogDescriptor>> {
        let mut nodes: Vec<GraphNode> = Vec::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();

            if line.is_empty() {
                continue;
            }

            if let Some(kind) = line.strip_prefix("* ") {
                nodes.push(GraphNode::new(kind.trim(), line_number));
                continue;
            }

            if let Some(property) = line.strip_prefix("- ") {
                let node = nodes
                    .last_mut()
                    .ok_or_else(|| parse_error(line_number, "property outside of any node"))?;
                let (key, value) = property
                    .split_once(':')
                    .ok_or_else(|| parse_error(line_number, "property is missing ':'"))?;
                node.set(key.trim(), value.trim(), line_number)?;
                continue;
            }

            return Err(parse_error(
                line_number,
                &format!("unrecognized line {:?}", line),
            ));
        }

        nodes
            .into_iter()
            .filter(|node| self.is_log(node))
            .map(GraphNode::into_descriptor)
            .collect()
    }

    fn is_log(&self, node: &GraphNode) -> bool {
        if self.log_kinds.iter().any(|kind| kind == &node.kind) {
            return true;
        }

        node.name
            .as_deref()
            .is_some_and(|name| self.name_patterns.iter().any(|p| p.is_match(name)))
    }
}

impl GraphParser for TextGraphParser {
    fn parse_logs(&self, graph: &GraphHandle) -> Result<Vec<LogDescriptor>> {
        let text = fs::read_to_string(graph.path()).map_err(|e| ExtractorError::Parse {
            message: format!("cannot read {}: {}", graph.path().display(), e),
        })?;

        self.parse_str(&text)
    }
}

struct GraphNode {
    kind: String,
    line: usize,
    id: Option<String>,
    name: Option<String>,
    size: Option<u64>,
}

impl GraphNode {
    fn new(kind: &str, line: usize) -> Self {
        Self {
            kind: kind.to_string(),
            line,
            id: None,
            name: None,
            size: None,
        }
    }

    fn set(&mut self, key: &str, value: &str, line_number: usize) -> Result<()> {
        let value = (!value.is_empty()).then(|| value.to_string());

        match key {
            "Id" => self.id = value,
            "Name" => self.name = value,
            "Size" => {
                self.size = value
                    .map(|v| {
                        v.parse::<u64>().map_err(|_| {
                            parse_error(line_number, &format!("invalid Size {:?}", v))
                        })
                    })
                    .transpose()?;
            }
            _ => {}
        }

        Ok(())
    }

    fn into_descriptor(self) -> Result<LogDescriptor> {
        let id = self.id.ok_or_else(|| {
            parse_error(self.line, &format!("{} node has no Id", self.kind))
        })?;

        Ok(LogDescriptor {
            id,
            kind: self.kind,
            name: self.name,
            size: self.size,
        })
    }
}

fn parse_error(line_number: usize, message: &str) -> ExtractorError {
    ExtractorError::Parse {
        message: format!("line {}: {}", line_number, message),
    }
}

fn sanitize_filename(name: &str) -> String {
    let mut sanitized = String::new();

    for ch in name.chars() {
        match ch {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => sanitized.push('_'),
            c if c.is_control() => sanitized.push('_'),
            c => sanitized.push(c),
        }
    }

    let sanitized = sanitized.trim_end_matches(&['.', ' '][..]);

    if sanitized.is_empty() {
        "unnamed_log".to_string()
    } else {
        sanitized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SAMPLE_GRAPH: &str = "\
* ActionsInvocationRecord
  - Id: 0~root
  - Size: 512
  - Refs: 2
  * ActivityLogSection
    - Id: 0~build:log
    - Size: 2048
    - Refs: 0
  * CASTree
    - Id: 0~tree
    * raw
      - Id: 0~stdout
      - Name: StandardOutputAndStandardError-com.example.app.txt
    * raw
      - Id: 0~screenshot
      - Name: screenshot.png
    * raw
      - Id: 0~session
      - Name: Session-2024.LOG
";

    fn parser() -> TextGraphParser {
        TextGraphParser::new(&ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_finds_logs_in_document_order() {
        let logs = parser().parse_str(SAMPLE_GRAPH).unwrap();

        let ids: Vec<&str> = logs.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["0~build:log", "0~stdout", "0~session"]);
        assert_eq!(logs[0].kind, "ActivityLogSection");
        assert_eq!(logs[0].size, Some(2048));
        assert_eq!(
            logs[1].name.as_deref(),
            Some("StandardOutputAndStandardError-com.example.app.txt")
        );
    }

    #[test]
    fn test_empty_graph_has_no_logs() {
        assert!(parser().parse_str("").unwrap().is_empty());
        assert!(parser().parse_str("* CASTree\n  - Id: 0~x\n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_graphs() {
        let cases = [
            "- Id: 0~orphan",
            "* raw\n  garbage",
            "* raw\n  - Id 0~nocolon",
            "* ActivityLogSection\n  - Id: 0~a\n  - Size: big",
            "* ActivityLogSection\n  - Size: 10",
        ];

        for graph in &cases {
            let result = parser().parse_str(graph);
            assert!(
                matches!(result, Err(ExtractorError::Parse { .. })),
                "Should reject: {:?}",
                graph
            );
        }
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parser().parse_str("* raw\n\n  ???").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_custom_log_kinds() {
        let config = ParserConfig {
            log_kinds: vec!["raw".to_string()],
            name_patterns: Vec::new(),
        };
        let parser = TextGraphParser::new(&config).unwrap();

        let logs = parser.parse_str(SAMPLE_GRAPH).unwrap();
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|l| l.kind == "raw"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = ParserConfig {
            log_kinds: Vec::new(),
            name_patterns: vec!["(".to_string()],
        };
        assert!(matches!(
            TextGraphParser::new(&config),
            Err(ExtractorError::Config { .. })
        ));
    }

    #[test]
    fn test_parse_logs_from_graph_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.txt");
        fs::write(&path, SAMPLE_GRAPH).unwrap();

        let logs = parser().parse_logs(&GraphHandle::new(path)).unwrap();
        assert_eq!(logs.len(), 3);
    }

    #[test]
    fn test_unreadable_graph_file() {
        let handle = GraphHandle::new(PathBuf::from("/nonexistent/graph.txt"));
        assert!(matches!(
            parser().parse_logs(&handle),
            Err(ExtractorError::Parse { .. })
        ));
    }

    #[test]
    fn test_descriptor_file_names() {
        let named = LogDescriptor::new("0~a", "raw").with_name("Build/Log: 1.txt");
        assert_eq!(named.file_name(), "Build_Log_ 1.txt");

        let unnamed = LogDescriptor::new("0~abc:def", "ActivityLogSection");
        assert_eq!(unnamed.file_name(), "0~abc_def.txt");

        let dots = LogDescriptor::new("0~a", "raw").with_name("..");
        assert_eq!(dots.file_name(), "unnamed_log");
    }
}
