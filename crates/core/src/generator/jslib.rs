//! jslib glue: one `mergeInto` function per API.
//!
//! Arguments arrive from C# as emscripten values (UTF-8 pointers, numbers)
//! and are converted before calling `window.AppsInToss`. Results travel back
//! through `SendMessage` to `AITCore`.

use sdkgen_common::ParsedApi;

use crate::collector::Marshal;

use super::prepare::{PreparedApi, PreparedParam, Shape, Subscription};
use super::utils::{bridge_path, js_string};

/// Event target for event-definition classes that name no namespace.
pub const DEFAULT_EVENT_NAMESPACE: &str = "appsInTossEvent";

const FAILURE: &str = "{ success: false, data: '', error: (error && error.message) || String(error) }";

/// The glue function of one API.
pub fn function(prepared: &PreparedApi<'_>) -> String {
    let api = prepared.api;
    let symbol = api.native_symbol();
    let names: Vec<&str> = prepared.params.iter().map(|p| p.name.as_str()).collect();
    let prologue = prologue(&prepared.params);

    match &prepared.shape {
        Shape::Async { result, discriminated } => {
            let data = if result == "void" {
                "''".to_string()
            } else if *discriminated {
                "JSON.stringify(typeof result === 'string'\n                ? { _type: 'error', _errorCode: result, _successJson: null }\n                : { _type: 'success', _successJson: JSON.stringify(result), _errorCode: null })".to_string()
            } else {
                "JSON.stringify(result === undefined ? null : result)".to_string()
            };
            format!(
                r"    {symbol}: function({params}) {{
        var callback = UTF8ToString(callbackId);
        var typeNameStr = UTF8ToString(typeName);
        var send = function(response) {{
            SendMessage('AITCore', 'OnAITCallback', JSON.stringify({{
                CallbackId: callback,
                TypeName: typeNameStr,
                Result: JSON.stringify(response)
            }}));
        }};
        var resolve = function(result) {{
            send({{ success: true, data: {data}, error: '' }});
        }};
        var reject = function(error) {{
            send({FAILURE});
        }};
{prologue}
        try {{
            var result = {call};
            if (result && typeof result.then === 'function') {{
                result.then(resolve).catch(reject);
            }} else {{
                resolve(result);
            }}
        }} catch (error) {{
            reject(error);
        }}
    }}",
                params = with_trailing(&names, &["callbackId", "typeName"]),
                call = call(prepared),
            )
        }
        Shape::Subscription { payload, call: form } => {
            let data = if payload.is_some() {
                "JSON.stringify(data === undefined ? null : data)"
            } else {
                "''"
            };
            let target = match form {
                Subscription::Event { event_name } => {
                    let namespace = api.namespace.as_deref().unwrap_or(DEFAULT_EVENT_NAMESPACE);
                    format!(
                        "{}({}, {{ onEvent: onEvent, onError: onError }})",
                        bridge_path(Some(namespace), "addEventListener"),
                        js_string(event_name)
                    )
                }
                Subscription::Direct | Subscription::ArgsObject => call(prepared),
            };
            format!(
                r"    {symbol}: function({params}) {{
        var subId = UTF8ToString(subscriptionId);
        var typeNameStr = UTF8ToString(typeName);
        var send = function(response) {{
            SendMessage('AITCore', 'OnAITEventCallback', JSON.stringify({{
                CallbackId: subId,
                TypeName: typeNameStr,
                Result: JSON.stringify(response)
            }}));
        }};
        var onEvent = function(data) {{
            send({{ success: true, data: {data}, error: '' }});
        }};
        var onError = function(error) {{
            send({FAILURE});
        }};
{prologue}
        try {{
            var unsubscribe = {target};
            window.__AIT_SUBSCRIPTIONS = window.__AIT_SUBSCRIPTIONS || {{}};
            window.__AIT_SUBSCRIPTIONS[subId] = unsubscribe;
        }} catch (error) {{
            onError(error);
        }}
    }}",
                params = with_trailing(&names, &["subscriptionId", "typeName"]),
            )
        }
        Shape::Action => format!(
            r"    {symbol}: function({params}) {{
{prologue}
        try {{
            {call};
        }} catch (error) {{
            console.error({label}, error);
        }}
    }}",
            params = names.join(", "),
            call = call(prepared),
            label = failure_label(api),
        ),
        Shape::Accessor { marshal, .. } => {
            let conversion = match marshal {
                Marshal::Double => "            return Number(result);".to_string(),
                Marshal::Bool => "            return result ? 1 : 0;".to_string(),
                _ => {
                    let text = if matches!(marshal, Marshal::String) {
                        "String(result)"
                    } else {
                        "JSON.stringify(result)"
                    };
                    format!(
                        r"            if (result === null || result === undefined) {{
                return 0;
            }}
            var text = {text};
            var size = lengthBytesUTF8(text) + 1;
            var buffer = _malloc(size);
            stringToUTF8(text, buffer, size);
            return buffer;"
                    )
                }
            };
            format!(
                r"    {symbol}: function({params}) {{
{prologue}
        try {{
            var result = {call};
{conversion}
        }} catch (error) {{
            console.error({label}, error);
            return 0;
        }}
    }}",
                params = names.join(", "),
                call = call(prepared),
                label = failure_label(api),
            )
        }
    }
}

/// Releases the handler stored by a subscription glue function.
pub fn unsubscribe_function() -> String {
    r"    __AITUnsubscribe_Internal: function(subscriptionId) {
        var subId = UTF8ToString(subscriptionId);
        var subscriptions = window.__AIT_SUBSCRIPTIONS || {};
        var unsubscribe = subscriptions[subId];
        if (typeof unsubscribe === 'function') {
            try {
                unsubscribe();
            } catch (error) {
                console.error('[AppsInToss] Failed to unsubscribe ' + subId, error);
            }
        }
        delete subscriptions[subId];
    }"
    .to_string()
}

fn failure_label(api: &ParsedApi) -> String {
    js_string(&format!("[AppsInToss] {} failed:", api.name))
}

fn with_trailing(items: &[&str], trailing: &[&str]) -> String {
    items
        .iter()
        .chain(trailing)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Local holding the converted value of a parameter.
fn local(param: &PreparedParam) -> String {
    format!("{}Value", param.name)
}

/// Converts every parameter into a local; JSON `null` for an omitted
/// optional argument becomes `undefined`.
fn prologue(params: &[PreparedParam]) -> String {
    let mut lines = Vec::new();
    for param in params {
        let conversion = match param.marshal {
            Marshal::String => format!("UTF8ToString({})", param.name),
            Marshal::Bool => format!("!!{}", param.name),
            Marshal::Double => param.name.clone(),
            _ => format!("JSON.parse(UTF8ToString({}))", param.name),
        };
        let local = local(param);
        lines.push(format!("        var {local} = {conversion};"));
        if param.optional {
            lines.push(format!("        if ({local} === null) {local} = undefined;"));
        }
    }
    lines.join("\n")
}

/// The bridge call with arguments in declaration order.
fn call(prepared: &PreparedApi<'_>) -> String {
    let api = prepared.api;
    let path = bridge_path(api.namespace.as_deref(), &api.original_name);
    let args: Vec<String> = match &prepared.shape {
        Shape::Subscription {
            call: Subscription::ArgsObject,
            ..
        } => {
            let mut members = vec!["onEvent: onEvent".to_string(), "onError: onError".to_string()];
            if let Some(options) = prepared.param("options") {
                members.push(format!("options: {}", local(options)));
            }
            vec![format!("{{ {} }}", members.join(", "))]
        }
        _ => {
            let mut args: Vec<String> = api
                .parameters
                .iter()
                .map(|p| match p.name.as_str() {
                    "onEvent" | "onError" if matches!(prepared.shape, Shape::Subscription { .. }) => p.name.clone(),
                    name => prepared.param(name).map_or_else(|| "undefined".to_string(), local),
                })
                .collect();
            while args.last().is_some_and(|a| a == "undefined") {
                args.pop();
            }
            args
        }
    };
    format!("{path}({})", args.join(", "))
}
