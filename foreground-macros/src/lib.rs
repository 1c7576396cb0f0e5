mod utils;

use proc_macro::{TokenStream, TokenTree};

/// Default time a `#[foreground::test]` body may take on the host thread.
const DEFAULT_TEST_TIMEOUT_MS: u64 = 5_000;

/// Turns `fn main` into a host application.
///
/// The calling thread becomes the platform host thread, the body runs on it
/// as the first task, and `main` returns once `foreground::exit()` stops the
/// loop. Accepts an optional `name = "..."` for the host thread name.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let tokens: Vec<TokenTree> = item.into_iter().collect();

    let mut builder = String::from("::foreground::HostLoopBuilder::new()");

    for (key, value) in utils::parse_args(attr) {
        match key.as_str() {
            "name" => builder.push_str(&format!(".name({value:?})")),
            other => {
                return utils::compile_error(&format!(
                    "unknown `foreground::main` argument `{other}`, expected `name`"
                ));
            }
        }
    }

    let Some(pos) = utils::body_position(&tokens) else {
        return utils::compile_error("`foreground::main` must be applied to a function");
    };

    let body = utils::group_source(&tokens, pos);

    let new_body = format!(
        "{builder}
            .run_current(move || {{ {body} }})
            .expect(\"failed to start the foreground platform host\");"
    );

    utils::replace_body(tokens, pos, &new_body)
}

/// Runs a test body on a freshly spawned host loop thread.
///
/// The test fails if the body panics or does not complete within
/// `timeout_ms` (five seconds by default).
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let tokens: Vec<TokenTree> = item.into_iter().collect();

    let mut timeout_ms = DEFAULT_TEST_TIMEOUT_MS;

    for (key, value) in utils::parse_args(attr) {
        match (key.as_str(), value.replace('_', "").parse::<u64>()) {
            ("timeout_ms", Ok(ms)) => timeout_ms = ms,
            ("timeout_ms", Err(_)) => {
                return utils::compile_error("`timeout_ms` expects an integer literal");
            }
            (other, _) => {
                return utils::compile_error(&format!(
                    "unknown `foreground::test` argument `{other}`, expected `timeout_ms`"
                ));
            }
        }
    }

    let Some(pos) = utils::body_position(&tokens) else {
        return utils::compile_error("`foreground::test` must be applied to a function");
    };

    let body = utils::group_source(&tokens, pos);

    let new_body = format!(
        "let host = ::foreground::HostLoop::spawn()
            .expect(\"failed to spawn the test host loop\");
        host.handle()
            .invoke_and_wait(
                ::std::time::Duration::from_millis({timeout_ms}),
                move || {{ {body} }},
            )
            .expect(\"test body did not complete on the host thread\");"
    );

    let expanded = utils::replace_body(tokens, pos, &new_body);

    let mut result: TokenStream = "#[::core::prelude::v1::test]".parse().unwrap_or_default();
    result.extend(expanded);
    result
}
