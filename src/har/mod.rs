pub mod parser;
pub mod source;

pub use parser::{Har, exchanges, parse_file, parse_str};
pub use source::{FileTranscriptSource, TranscriptSource};
