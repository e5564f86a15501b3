//! User interaction operations (version selection prompt).

use anyhow::Result;

use super::RealRuntime;

use std::io::{self, BufRead, Write};

/// Core, testable implementation that reads from any BufRead and writes to any Write.
///
/// Prints every candidate with its 1-based index, then the prompt. An empty
/// answer, `q`, or anything that is not a listed index cancels.
pub(crate) fn choose_with_io<R: BufRead, W: Write>(
    prompt: &str,
    candidates: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<Option<String>> {
    for (index, candidate) in candidates.iter().enumerate() {
        writeln!(output, "{}. {}", index + 1, candidate)?;
    }
    write!(output, "{}: ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let answer = line.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
        return Ok(None);
    }

    Ok(answer
        .parse::<usize>()
        .ok()
        .and_then(|choice| choice.checked_sub(1))
        .and_then(|index| candidates.get(index))
        .cloned())
}

impl RealRuntime {
    pub(crate) fn choose_impl(&self, prompt: &str, candidates: &[String]) -> Result<Option<String>> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut stdin_lock = stdin.lock();
        choose_with_io(prompt, candidates, &mut stdin_lock, &mut stdout)
    }
}
