use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Splits `key = value, ...` attribute arguments into pairs.
///
/// String values are returned without their quotes. Entries without a value
/// are returned with an empty one.
pub fn parse_args(attr: TokenStream) -> Vec<(String, String)> {
    let mut args = Vec::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut seen_eq = false;

    for token in attr {
        match token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                push_arg(&mut args, &mut key, &mut value);
                seen_eq = false;
            }
            TokenTree::Punct(p) if p.as_char() == '=' && !seen_eq => seen_eq = true,
            other if seen_eq => value.push_str(&other.to_string()),
            other => key.push_str(&other.to_string()),
        }
    }

    push_arg(&mut args, &mut key, &mut value);
    args
}

fn push_arg(args: &mut Vec<(String, String)>, key: &mut String, value: &mut String) {
    if key.is_empty() {
        return;
    }

    let raw = std::mem::take(value);
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map(str::to_owned)
        .unwrap_or(raw);

    args.push((std::mem::take(key), unquoted));
}

/// Returns the index of the function body, the last brace-delimited group.
pub fn body_position(tokens: &[TokenTree]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Returns the source of the group at `pos`, without its delimiters.
pub fn group_source(tokens: &[TokenTree], pos: usize) -> String {
    match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        other => other.to_string(),
    }
}

/// Replaces the function body at `pos` with `source`.
///
/// Returns a `compile_error!` when `source` does not tokenize.
pub fn replace_body(mut tokens: Vec<TokenTree>, pos: usize, source: &str) -> TokenStream {
    let stream = match source.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => return compile_error(&format!("failed to expand function body: {err}")),
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    tokens.into_iter().collect()
}

pub fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
