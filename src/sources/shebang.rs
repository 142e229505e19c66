use std::fs::File;
use std::io::Read;
use std::path::Path;

const SNIFF_LEN: usize = 256;

/// Interpreter named by the file's `#!` line, if any.
pub fn interpreter(path: &Path) -> Option<String> {
    let mut buf = [0u8; SNIFF_LEN];
    let mut file = File::open(path).ok()?;
    let n = file.read(&mut buf).ok()?;
    parse_interpreter(&buf[..n])
}

pub fn parse_interpreter(head: &[u8]) -> Option<String> {
    let rest = head.strip_prefix(b"#!")?;
    let line = rest.split(|&b| b == b'\n').next()?;
    let line = std::str::from_utf8(line).ok()?;

    let mut tokens = line.split_whitespace();
    let program = basename(tokens.next()?);
    if program != "env" {
        return Some(program.to_string());
    }
    // `env -S python3 -u` and friends
    tokens
        .find(|t| !t.starts_with('-') && !t.contains('='))
        .map(|t| basename(t).to_string())
}

fn basename(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}

pub fn icon_for_interpreter(interpreter: &str) -> &'static str {
    match interpreter {
        "sh" | "bash" | "zsh" | "dash" | "ksh" | "fish" => "utilities-terminal",
        "perl" => "text-x-perl",
        "ruby" => "text-x-ruby",
        "node" => "text-x-javascript",
        i if i.starts_with("python") => "text-x-python",
        _ => "text-x-script",
    }
}
