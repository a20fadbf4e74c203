//! Line parser for jobsh.
//!
//! Turns one line of input into a [`PipelineSpec`]: an ordered list of
//! stages (each an argument vector), optional redirections that apply to
//! the pipeline as a whole, and a background flag.
//!
//! The grammar is deliberately small. Tokens are separated by whitespace
//! and four operators are recognized only as standalone tokens:
//!
//! ```text
//! <  file     input redirection (feeds the first stage)
//! >  file     output redirection, truncate (receives the last stage)
//! >> file     output redirection, append
//! |           stage separator
//! ```
//!
//! A trailing `&` marks the whole line as a background job. There is no
//! quoting, no expansion and no globbing.

use thiserror::Error;

/// Default upper bound on the number of stages in one pipeline.
pub const DEFAULT_MAX_STAGES: usize = 16;

/// Errors that reject a whole input line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("too many pipeline stages (max {max})")]
    TooManyStages { max: usize },
    #[error("syntax error: empty command in pipeline")]
    EmptyStage,
}

/// Output redirection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRedirect<'a> {
    /// Destination path, as typed.
    pub path: &'a str,
    /// `>>` appends, `>` truncates.
    pub append: bool,
}

/// The parsed view of one input line.
///
/// Borrows every word from the line it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec<'a> {
    /// Pipeline stages, each a non-empty argument vector.
    pub stages: Vec<Vec<&'a str>>,
    /// Input redirection source.
    pub input: Option<&'a str>,
    /// Output redirection destination.
    pub output: Option<OutputRedirect<'a>>,
    /// Whether the line ended in `&`.
    pub background: bool,
}

impl<'a> PipelineSpec<'a> {
    /// Whether this line has more than one stage.
    pub fn is_pipeline(&self) -> bool {
        self.stages.len() > 1
    }

    /// The program name of the first stage.
    pub fn program(&self) -> &'a str {
        // Non-empty stages are guaranteed by `parse`.
        self.stages[0][0]
    }
}

/// Split a trailing `&` off the line.
///
/// Returns the remaining text (trailing whitespace trimmed) and whether a
/// background marker was found. The marker may be glued to the last word.
fn strip_background(line: &str) -> (&str, bool) {
    let trimmed = line.trim();
    match trimmed.strip_suffix('&') {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    }
}

fn is_operator(token: &str) -> bool {
    matches!(token, "<" | ">" | ">>" | "|")
}

/// Parse one line of input.
///
/// Returns `Ok(None)` for a blank line (or a line that is just `&`).
/// A redirection operator without a following word (end of line, or
/// another operator) leaves that redirection unset.
pub fn parse(line: &str, max_stages: usize) -> Result<Option<PipelineSpec<'_>>, ParseError> {
    let (body, background) = strip_background(line);
    if body.is_empty() {
        return Ok(None);
    }

    let mut stages: Vec<Vec<&str>> = vec![Vec::new()];
    let mut input = None;
    let mut output = None;

    let mut tokens = body.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        match token {
            "<" => {
                if let Some(path) = tokens.next_if(|t| !is_operator(t)) {
                    input = Some(path);
                }
            }
            ">" | ">>" => {
                if let Some(path) = tokens.next_if(|t| !is_operator(t)) {
                    output = Some(OutputRedirect {
                        path,
                        append: token == ">>",
                    });
                }
            }
            "|" => {
                if stages.len() == max_stages {
                    return Err(ParseError::TooManyStages { max: max_stages });
                }
                stages.push(Vec::new());
            }
            word => {
                if let Some(stage) = stages.last_mut() {
                    stage.push(word);
                }
            }
        }
    }

    if stages.iter().any(Vec::is_empty) {
        return Err(ParseError::EmptyStage);
    }

    Ok(Some(PipelineSpec {
        stages,
        input,
        output,
        background,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> PipelineSpec<'_> {
        parse(line, DEFAULT_MAX_STAGES)
            .expect("line should parse")
            .expect("line should not be blank")
    }

    #[test]
    fn strip_background_handles_glued_marker() {
        assert_eq!(strip_background("sleep 5&"), ("sleep 5", true));
        assert_eq!(strip_background("sleep 5   &  "), ("sleep 5", true));
        assert_eq!(strip_background("sleep 5"), ("sleep 5", false));
    }

    #[test]
    fn program_is_first_word() {
        let spec = parse_ok("grep -n foo | wc -l");
        assert_eq!(spec.program(), "grep");
        assert!(spec.is_pipeline());
    }

    #[test]
    fn stage_limit_is_inclusive() {
        assert!(parse("a | b | c", 3).unwrap().is_some());
        assert_eq!(
            parse("a | b | c | d", 3),
            Err(ParseError::TooManyStages { max: 3 })
        );
    }

    #[test]
    fn words_borrow_from_the_line() {
        let line = String::from("cat notes.txt");
        let spec = parse_ok(&line);
        let word = spec.stages[0][1];
        let offset = word.as_ptr() as usize - line.as_ptr() as usize;
        assert_eq!(&line[offset..offset + word.len()], "notes.txt");
    }
}
