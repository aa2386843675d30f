// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::parser::{AngleDepth, TrackArgs, compact, error, parse_track_args, split_commas};
use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// One parameter of the annotated function.
struct Param {
    /// How the parameter is written in the label.
    rendered: String,
    /// Binding to capture when `args` is on; `None` for receivers and patterns.
    binding: Option<String>,
}

fn parse_param(tokens: &[TokenTree]) -> Param {
    // Split on the first top-level single `:`.
    let mut angle = AngleDepth::default();
    let mut colon = None;
    for (i, token) in tokens.iter().enumerate() {
        if let TokenTree::Punct(p) = token {
            let next_is_colon =
                matches!(tokens.get(i + 1), Some(TokenTree::Punct(n)) if n.as_char() == ':');
            let prev_is_colon =
                i > 0 && matches!(&tokens[i - 1], TokenTree::Punct(n) if n.as_char() == ':');
            if p.as_char() == ':' && angle.is_top() && !next_is_colon && !prev_is_colon {
                colon = Some(i);
                break;
            }
        }
        angle.feed(token);
    }

    let pattern = &tokens[..colon.unwrap_or(tokens.len())];
    let is_receiver = pattern
        .iter()
        .any(|t| matches!(t, TokenTree::Ident(i) if i.to_string() == "self"));
    let binding = match pattern {
        [TokenTree::Ident(name)] => Some(name.to_string()),
        [TokenTree::Ident(m), TokenTree::Ident(name)] if m.to_string() == "mut" => {
            Some(name.to_string())
        }
        _ => None,
    }
    .filter(|name| !is_receiver && name != "_");

    let rendered = match colon {
        Some(i) if !is_receiver => {
            let name = binding.clone().unwrap_or_else(|| compact(pattern));
            format!("{name}: {}", compact(&tokens[i + 1..]))
        }
        _ => compact(tokens),
    };
    Param { rendered, binding }
}

struct Signature {
    name: String,
    params: Vec<Param>,
    body_idx: usize,
}

fn parse_signature(tokens: &[TokenTree]) -> Result<Signature, TokenStream> {
    let mut fn_idx = None;
    for (i, token) in tokens.iter().enumerate() {
        if let TokenTree::Ident(ident) = token {
            match ident.to_string().as_str() {
                "async" => return Err(error("#[track] does not support `async fn`")),
                "fn" => {
                    fn_idx = Some(i);
                    break;
                }
                _ => {}
            }
        }
    }
    let fn_idx = fn_idx.ok_or_else(|| error("#[track] can only be applied to functions"))?;
    let name = match tokens.get(fn_idx + 1) {
        Some(TokenTree::Ident(name)) => name.to_string(),
        _ => return Err(error("#[track] can only be applied to functions")),
    };

    // The parameter list is the first parenthesised group outside the generics.
    let mut angle = AngleDepth::default();
    let mut params = None;
    for token in tokens.iter().skip(fn_idx + 2) {
        if let TokenTree::Group(g) = token {
            if g.delimiter() == Delimiter::Parenthesis && angle.is_top() {
                params = Some(g.stream());
                break;
            }
        }
        angle.feed(token);
    }
    let params = params.ok_or_else(|| error("#[track]: could not find the parameter list"))?;

    let body_idx = match tokens.last() {
        Some(TokenTree::Group(g)) if g.delimiter() == Delimiter::Brace => tokens.len() - 1,
        _ => return Err(error("#[track] requires a function with a body")),
    };

    Ok(Signature {
        name,
        params: split_commas(params).iter().map(|p| parse_param(p)).collect(),
        body_idx,
    })
}

fn args_capture(params: &[Param]) -> String {
    let writes: String = params
        .iter()
        .filter_map(|p| p.binding.as_ref())
        .map(|name| format!("__tracewise_args.write_arg({name:?}, &{name});"))
        .collect();
    format!(
        "{{ let mut __tracewise_args = ::tracewise::hidden::ArgsFormatter::new(); \
         {writes} ::core::option::Option::Some(__tracewise_args.finish()) }}"
    )
}

/// Implementation of the `#[track]` attribute macro.
///
/// Opens a guard from `::tracewise::hidden::track_fn` at the top of the body;
/// arguments are captured before the original body can move them.
pub fn track_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args: TrackArgs = match parse_track_args(attr) {
        Ok(args) => args,
        Err(err) => return err,
    };
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();
    let signature = match parse_signature(&tokens) {
        Ok(signature) => signature,
        Err(err) => return err,
    };

    let rendered: Vec<&str> = signature.params.iter().map(|p| p.rendered.as_str()).collect();
    let label = format!("{}({})", signature.name, rendered.join(", "));
    let tracker_id = match &args.id {
        Some(id) => format!("{id:?}"),
        None => format!("concat!(module_path!(), \"::\", {:?})", signature.name),
    };
    let captured = if args.args {
        args_capture(&signature.params)
    } else {
        "::core::option::Option::None".to_string()
    };

    let original_body = match &tokens[signature.body_idx] {
        TokenTree::Group(g) => g.stream(),
        _ => return error("#[track] requires a function with a body"),
    };

    let new_body_src = format!(
        r#"{{
            let __tracewise_guard = ::tracewise::hidden::track_fn(
                &({tracer}),
                {label:?},
                {tracker_id},
                {captured},
                {threshold}u64,
                {unit},
                {enabled},
            );
            {{ {original_body} }}
        }}"#,
        tracer = args.tracer,
        threshold = args.threshold,
        unit = args.unit.path(),
        enabled = args.enabled,
    );

    let new_body: TokenStream = new_body_src.parse().unwrap();
    let new_body_group = match new_body.into_iter().next() {
        Some(TokenTree::Group(g)) => g,
        _ => return error("#[track]: failed to build the wrapped body"),
    };
    let span = match &tokens[signature.body_idx] {
        TokenTree::Group(g) => g.span(),
        _ => new_body_group.span(),
    };
    let mut wrapped = Group::new(Delimiter::Brace, new_body_group.stream());
    wrapped.set_span(span);

    tokens[signature.body_idx] = TokenTree::Group(wrapped);
    tokens.into_iter().collect()
}
