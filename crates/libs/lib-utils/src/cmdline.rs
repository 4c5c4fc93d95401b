/// Splits a command line into its program and arguments on runs of whitespace.
///
/// No quoting or escaping is understood: `echo "a b"` yields the arguments
/// `"a` and `b"`. Returns `None` when the line holds no program.
pub fn split_command_line(line: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = line.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}
