pub mod normalize;
pub mod shell;
pub mod tokenize;
pub mod types;

pub use normalize::normalize;
pub use shell::{has_output_redirection, is_compound, parse};
pub use tokenize::{
    base_command, basename, effective_command, is_transparent_wrapper, tokenize, ungroup,
};
pub use types::{NormalizedCommand, Operator, ParsedPipeline, Redirection, ShellSegment};
