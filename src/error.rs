/// A position in the input or output stream.
///
/// Lines and columns are 0-based internally; `Display` renders them 1-based
/// for diagnostics.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Mark {
    /// The position index, in characters from the start of the stream.
    pub index: u64,
    /// The position line.
    pub line: u64,
    /// The position column.
    pub column: u64,
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("invalid byte order mark")]
    InvalidBom,
    #[error("invalid UTF-8 octet sequence at offset {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("invalid UTF-16 code unit sequence ({encoding})")]
    InvalidUtf16 { encoding: &'static str },
    #[error("invalid UTF-32 code unit {value:#x} at offset {offset}")]
    InvalidUtf32 { offset: usize, value: u32 },
    #[error("input is not aligned on a {encoding} code unit boundary")]
    UnalignedInput { encoding: &'static str },
    #[error("control characters are not allowed: {value:#x} at {mark}")]
    ControlCharacter { mark: Mark, value: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("{problem_mark}: {problem} {context} ({context_mark})")]
    Problem {
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
        problem_mark: Mark,
    },
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("no more tokens")]
    UnexpectedEof,
    #[error("{mark}: {problem}")]
    Problem { problem: &'static str, mark: Mark },
    #[error("{mark}: {problem} {context} ({context_mark})")]
    ProblemWithContext {
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
        mark: Mark,
    },
    #[error(transparent)]
    Scanner(#[from] ScannerError),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("invalid implicit resolver pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("{mark}: cannot construct {tag}: {problem}")]
pub struct ConstructorError {
    pub tag: String,
    pub problem: String,
    pub mark: Mark,
}

#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    #[error("{mark}: {problem}")]
    Problem { problem: &'static str, mark: Mark },
    #[error("{mark}: {problem} {context} ({context_mark})")]
    ProblemWithContext {
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
        mark: Mark,
    },
    #[error(transparent)]
    Constructor(#[from] ConstructorError),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    #[error("{0}")]
    Problem(&'static str),
    #[error(transparent)]
    Writer(#[from] WriterError),
}

#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    #[error("no representer registered for user value {type_name}")]
    UnrepresentableValue { type_name: &'static str },
    #[error(transparent)]
    Emitter(#[from] EmitterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_display_one_based() {
        let mark = Mark {
            index: 10,
            line: 2,
            column: 4,
        };
        assert_eq!(mark.to_string(), "line 3, column 5");
    }

    #[test]
    fn scanner_error_renders_context_and_problem() {
        let err = ScannerError::Problem {
            context: "while scanning a simple key",
            context_mark: Mark::default(),
            problem: "could not find expected ':'",
            problem_mark: Mark {
                index: 12,
                line: 1,
                column: 0,
            },
        };
        let rendered = err.to_string();
        assert!(rendered.contains("could not find expected ':'"));
        assert!(rendered.contains("while scanning a simple key"));
    }
}
