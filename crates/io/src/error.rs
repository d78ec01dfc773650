use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    /// Malformed markup reported by the tokenizer.
    #[error("XML parse error: {0}")]
    Parse(String),
    /// Closing tag without a matching open element.
    #[error("unexpected closing tag </{0}>")]
    UnbalancedTag(String),
    /// Input ended while elements were still open.
    #[error("unclosed element <{0}>")]
    Unclosed(String),
    /// A document must contain exactly one root element.
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element")]
    MultipleRoots,
    #[error("XML write error: {0}")]
    Write(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
