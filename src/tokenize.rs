use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Plain,
    Single,
    Double,
}

/// Tokenizes shell input into a vector of strings.
///
/// Handles single quotes, double quotes and backslash escapes. A quoted span
/// that directly follows another quoted span (no whitespace in between) is
/// merged into the same token, so `foo'bar'"baz"` is one word. `''` and `""`
/// standing alone produce an empty token.
///
/// Unterminated quotes and a trailing backslash are not errors: whatever was
/// collected up to the end of input is kept.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut mode = Mode::Plain;
    // Set when the previous character closed a quoted span.
    let mut after_quote = false;
    let mut chars = input.chars().peekable();

    // Continues the last emitted token instead of starting a new one.
    let reopen = |tokens: &mut Vec<String>, current: &mut String, after_quote: &mut bool| {
        if *after_quote
            && current.is_empty()
            && let Some(last) = tokens.pop()
        {
            *current = last;
        }
        *after_quote = false;
    };

    while let Some(c) = chars.next() {
        match (c, mode) {
            ('\\', Mode::Plain) => match chars.next() {
                // line continuation
                Some('\n') => {}
                Some(next) => {
                    reopen(&mut tokens, &mut current, &mut after_quote);
                    current.push(next);
                }
                None => {}
            },
            ('\\', Mode::Double) => match chars.peek() {
                Some('\n') => {
                    chars.next();
                }
                Some(&next @ ('\\' | '"' | '$')) => {
                    chars.next();
                    current.push(next);
                }
                _ => current.push('\\'),
            },
            ('\'', Mode::Single) | ('"', Mode::Double) => {
                tokens.push(mem::take(&mut current));
                mode = Mode::Plain;
                after_quote = true;
            }
            ('\'', Mode::Plain) => {
                reopen(&mut tokens, &mut current, &mut after_quote);
                mode = Mode::Single;
            }
            ('"', Mode::Plain) => {
                reopen(&mut tokens, &mut current, &mut after_quote);
                mode = Mode::Double;
            }
            (c, Mode::Plain) if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(mem::take(&mut current));
                }
                after_quote = false;
            }
            (c, Mode::Plain) => {
                reopen(&mut tokens, &mut current, &mut after_quote);
                current.push(c);
            }
            (c, _) => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tracing::trace!(?tokens, "tokenized");
    tokens
}
