//! Expression trace rendering.
//!
//! The trace is postfix with the most recent operand last, so rendering walks it
//! backwards: each operator consumes the sub-expressions before it, the first one
//! consumed being its left operand.

use super::Token;

impl Token {
    /// Single-character trace form.
    pub fn as_char(self) -> char {
        match self {
            Token::Arg(slot) => char::from(b'0' + slot),
            Token::Not => '~',
            Token::And => '&',
            Token::Or => '|',
            Token::Xor => '^',
            Token::True => 'T',
            Token::False => 'F',
        }
    }
}

/// Compact postfix form, e.g. `10&~`.
pub fn trace_string(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.as_char()).collect()
}

/// Render `tokens` as a fully parenthesized infix expression.
///
/// Returns `None` if the trace is not a single well-formed expression or refers
/// to an argument slot `arg_name` does not know.
pub fn render_infix<'a, F>(tokens: &[Token], arg_name: F) -> Option<String>
where
    F: Fn(u8) -> Option<&'a str>,
{
    let mut out = String::new();
    let rest = render_from(tokens, tokens.len(), &arg_name, &mut out)?;
    (rest == 0).then_some(out)
}

/// Render the expression ending just before `end`; returns where it started.
fn render_from<'a, F>(tokens: &[Token], end: usize, arg_name: &F, out: &mut String) -> Option<usize>
where
    F: Fn(u8) -> Option<&'a str>,
{
    let cursor = end.checked_sub(1)?;
    match tokens[cursor] {
        Token::False => {
            out.push_str("1'b0");
            Some(cursor)
        }
        Token::True => {
            out.push_str("1'b1");
            Some(cursor)
        }
        Token::Arg(slot) => {
            out.push_str(arg_name(slot)?);
            Some(cursor)
        }
        Token::Not => {
            out.push('~');
            render_from(tokens, cursor, arg_name, out)
        }
        op @ (Token::And | Token::Or | Token::Xor) => {
            out.push('(');
            let cursor = render_from(tokens, cursor, arg_name, out)?;
            out.push(' ');
            out.push(op.as_char());
            out.push(' ');
            let cursor = render_from(tokens, cursor, arg_name, out)?;
            out.push(')');
            Some(cursor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(slot: u8) -> Option<&'static str> {
        ["a", "b", "c", "d"].get(slot as usize).copied()
    }

    #[test]
    fn test_render_single_tokens() {
        assert_eq!(render_infix(&[Token::True], names).as_deref(), Some("1'b1"));
        assert_eq!(render_infix(&[Token::False], names).as_deref(), Some("1'b0"));
        assert_eq!(render_infix(&[Token::Arg(2)], names).as_deref(), Some("c"));
    }

    #[test]
    fn test_render_nested() {
        // b a & ~  ->  ~(a & b)
        let tokens = [Token::Arg(1), Token::Arg(0), Token::And, Token::Not];
        assert_eq!(trace_string(&tokens), "10&~");
        assert_eq!(render_infix(&tokens, names).as_deref(), Some("~(a & b)"));

        // c (b a |) ^  ->  ((a | b) ^ c)
        let tokens = [Token::Arg(2), Token::Arg(1), Token::Arg(0), Token::Or, Token::Xor];
        assert_eq!(render_infix(&tokens, names).as_deref(), Some("((a | b) ^ c)"));
    }

    #[test]
    fn test_render_rejects_malformed_traces() {
        assert_eq!(render_infix(&[], names), None);
        assert_eq!(render_infix(&[Token::Arg(0), Token::And], names), None);
        // Two expressions with no operator joining them.
        assert_eq!(render_infix(&[Token::Arg(0), Token::Arg(1)], names), None);
        assert_eq!(render_infix(&[Token::Arg(3)], |_| None), None);
    }
}
