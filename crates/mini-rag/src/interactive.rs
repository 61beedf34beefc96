//! Line-oriented question loop over any reader/writer pair.

use std::io::{self, BufRead, Write};

use crate::composer::format_ranked;
use crate::rag_engine::RagEngine;

pub const PROMPT: &str = "\nAsk a question (or type 'exit'): ";

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub k: usize,
    /// Also print each answer as JSON.
    pub json: bool,
}

/// `exit` or `quit`, any case, surrounding whitespace ignored.
pub fn is_exit_command(line: &str) -> bool {
    let cmd = line.trim().to_lowercase();
    cmd == "exit" || cmd == "quit"
}

/// Prompt, read, answer, repeat until an exit command or end of input.
/// Per-query failures are reported and the loop continues. Returns the
/// number of queries answered.
pub fn run_session<R: BufRead, W: Write>(
    engine: &RagEngine,
    options: SessionOptions,
    mut input: R,
    output: &mut W,
) -> io::Result<usize> {
    let mut answered = 0;
    let mut line = String::new();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        if is_exit_command(&line) {
            break;
        }

        let query = line.trim_end_matches(['\r', '\n']);
        if answer_query(engine, options, query, output)? {
            answered += 1;
        }
    }

    Ok(answered)
}

/// Answer one query. Returns `Ok(false)` when retrieval failed and the
/// error was printed instead.
pub fn answer_query<W: Write>(
    engine: &RagEngine,
    options: SessionOptions,
    query: &str,
    output: &mut W,
) -> io::Result<bool> {
    let answer = match engine.answer(query, options.k) {
        Ok(answer) => answer,
        Err(e) => {
            tracing::error!(query = query, error = %e, "Query failed");
            writeln!(output, "\n[Error] {}", e)?;
            return Ok(false);
        }
    };

    writeln!(output, "\n[Retrieved documents]")?;
    for line in format_ranked(&answer.retrieved) {
        writeln!(output, "{}", line)?;
    }

    writeln!(output, "\n[Answer]")?;
    writeln!(output, "{}", answer.text)?;

    if options.json {
        let json = serde_json::to_string_pretty(&answer)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(output, "{}", json)?;
    }

    Ok(true)
}
