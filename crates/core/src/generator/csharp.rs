//! C# emission: API methods, `DllImport` declarations, nested types and
//! the `AITCore` routing tables.

use std::collections::BTreeSet;

use crate::collector::{GenerationContext, Marshal, NestedKind, NestedType};

use super::docs::{DocBlock, obsolete_message, xml_safe};
use super::prepare::{PreparedApi, PreparedParam, Shape};
use super::utils::escape_csharp_string;

const WEBGL_ONLY: &str = "#if UNITY_WEBGL && !UNITY_EDITOR";
const DLL_IMPORT: &str = "        [System.Runtime.InteropServices.DllImport(\"__Internal\")]";

// =============================================================================
// Methods
// =============================================================================

/// The public method of one API followed by its `extern` declaration.
pub fn method(prepared: &PreparedApi<'_>) -> String {
    let api = prepared.api;
    let name = &api.pascal_name;
    let symbol = api.native_symbol();

    let mut lines = vec![documentation(prepared)];
    lines.push("        [Preserve]".to_string());
    lines.push(format!("        [APICategory(\"{}\")]", escape_csharp_string(&api.category)));
    if let Some(message) = &api.deprecated {
        if message.trim().is_empty() {
            lines.push("        [Obsolete]".to_string());
        } else {
            lines.push(format!("        [Obsolete(\"{}\")]", obsolete_message(message)));
        }
    }

    let args: Vec<String> = prepared.params.iter().map(PreparedParam::extern_argument).collect();
    let extern_params: Vec<String> = prepared
        .params
        .iter()
        .map(|p| format!("{} {}", p.extern_type(), p.name))
        .collect();

    let (signature, body, mock, extern_decl) = match &prepared.shape {
        Shape::Async { result, .. } => {
            let signature = if result == "void" {
                format!("public static async Task {name}({})", signature_params(&prepared.params))
            } else {
                format!("public static async Task<{result}> {name}({})", signature_params(&prepared.params))
            };
            let (body, mock) = async_body(name, &symbol, result, &args);
            let extern_decl = format!(
                "private static extern void {symbol}({});",
                with_trailing(&extern_params, &["string callbackId", "string typeName"])
            );
            (signature, body, mock, extern_decl)
        }
        Shape::Subscription { payload, .. } => {
            let handler = payload
                .as_ref()
                .map_or_else(|| "Action".to_string(), |t| format!("Action<{t}>"));
            let signature = format!(
                "public static Action {name}({})",
                subscription_params(&prepared.params, &handler)
            );
            let (register, type_name) = match payload {
                Some(t) => (format!("RegisterSubscriptionCallback<{t}>"), t.as_str()),
                None => ("RegisterVoidSubscriptionCallback".to_string(), "void"),
            };
            let call_args = with_trailing(&args, &["subscriptionId", &format!("\"{type_name}\"")]);
            let body = vec![
                format!("            string subscriptionId = AITCore.Instance.{register}("),
                "                onEvent,".to_string(),
                "                onError".to_string(),
                "            );".to_string(),
                format!("            {symbol}({call_args});"),
                "            return () => AITCore.Instance.Unsubscribe(subscriptionId);".to_string(),
            ];
            let mock = vec![
                format!("            UnityEngine.Debug.Log($\"[AIT Mock] {name} subscribed\");"),
                format!("            return () => UnityEngine.Debug.Log($\"[AIT Mock] {name} unsubscribed\");"),
            ];
            let extern_decl = format!(
                "private static extern void {symbol}({});",
                with_trailing(&extern_params, &["string subscriptionId", "string typeName"])
            );
            (signature, body, mock, extern_decl)
        }
        Shape::Action => {
            let signature = format!("public static void {name}({})", signature_params(&prepared.params));
            let body = vec![format!("            {symbol}({});", args.join(", "))];
            let mock = vec![format!("            UnityEngine.Debug.Log($\"[AIT Mock] {name} called\");")];
            let extern_decl = format!("private static extern void {symbol}({});", extern_params.join(", "));
            (signature, body, mock, extern_decl)
        }
        Shape::Accessor { result, marshal } => {
            let signature = format!("public static {result} {name}({})", signature_params(&prepared.params));
            let call = format!("{symbol}({})", args.join(", "));
            let (value, extern_return) = match marshal {
                Marshal::Double => (call, "double"),
                Marshal::Bool => (call, "bool"),
                Marshal::String => (call, "string"),
                _ => (format!("AITJsonSettings.Deserialize<{result}>({call})"), "string"),
            };
            let body = vec![format!("            return {value};")];
            let mock = vec![
                format!("            UnityEngine.Debug.Log($\"[AIT Mock] {name} called\");"),
                format!("            return default({result});"),
            ];
            let extern_decl = format!(
                "private static extern {extern_return} {symbol}({});",
                extern_params.join(", ")
            );
            (signature, body, mock, extern_decl)
        }
    };

    lines.push(format!("        {signature}"));
    lines.push("        {".to_string());
    lines.push(WEBGL_ONLY.to_string());
    lines.extend(body);
    lines.push("#else".to_string());
    lines.push("            // Unity Editor mock implementation".to_string());
    lines.extend(mock);
    lines.push("#endif".to_string());
    lines.push("        }".to_string());
    lines.push(String::new());
    lines.push(WEBGL_ONLY.to_string());
    lines.push(DLL_IMPORT.to_string());
    lines.push(format!("        {extern_decl}"));
    lines.push("#endif".to_string());
    lines.join("\n")
}

fn async_body(name: &str, symbol: &str, result: &str, args: &[String]) -> (Vec<String>, Vec<String>) {
    let (completion, resolve, type_name) = if result == "void" {
        ("object", "null", "void")
    } else {
        (result, "result", result)
    };
    let call_args = with_trailing(args, &["callbackId", &format!("\"{type_name}\"")]);
    let mut body = vec![
        format!("            var tcs = new TaskCompletionSource<{completion}>();"),
        format!("            string callbackId = AITCore.Instance.RegisterCallback<{completion}>("),
        format!("                result => tcs.TrySetResult({resolve}),"),
        "                error => tcs.TrySetException(error)".to_string(),
        "            );".to_string(),
        format!("            {symbol}({call_args});"),
    ];
    let mut mock = vec![
        format!("            UnityEngine.Debug.Log($\"[AIT Mock] {name} called\");"),
        "            await Task.CompletedTask;".to_string(),
    ];
    if result == "void" {
        body.push("            await tcs.Task;".to_string());
    } else {
        body.push("            return await tcs.Task;".to_string());
        mock.push(format!("            return default({result});"));
    }
    (body, mock)
}

fn with_trailing(items: &[String], trailing: &[&str]) -> String {
    items
        .iter()
        .map(String::as_str)
        .chain(trailing.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parameter(param: &PreparedParam) -> String {
    if param.optional {
        format!("{} {} = null", param.cs_type, param.name)
    } else {
        format!("{} {}", param.cs_type, param.name)
    }
}

fn signature_params(params: &[PreparedParam]) -> String {
    params.iter().map(parameter).collect::<Vec<_>>().join(", ")
}

/// Required parameters, the event handler, optional parameters, the error handler.
fn subscription_params(params: &[PreparedParam], handler: &str) -> String {
    let required = params.iter().filter(|p| !p.optional).map(parameter);
    let optional = params.iter().filter(|p| p.optional).map(parameter);
    required
        .chain(std::iter::once(format!("{handler} onEvent")))
        .chain(optional)
        .chain(std::iter::once("Action<AITException> onError = null".to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn documentation(prepared: &PreparedApi<'_>) -> String {
    let api = prepared.api;
    let mut doc = DocBlock::new(8);
    let summary = api
        .description
        .clone()
        .unwrap_or_else(|| format!("Calls {}.", api.name));
    doc.summary(&summary);
    for param in &prepared.params {
        if let Some(description) = &param.description {
            doc.param(&param.name, description);
        }
    }
    match &prepared.shape {
        Shape::Subscription { .. } => {
            doc.param("onEvent", "Invoked each time the event fires")
                .param("onError", "Invoked when the subscription fails (optional)")
                .returns("Action to call for unsubscribing from the event");
        }
        Shape::Async { result, .. } | Shape::Accessor { result, .. } if result != "void" => {
            if let Some(returns) = &api.return_description {
                doc.returns(returns);
            }
        }
        _ => {}
    }
    for example in &api.examples {
        doc.example(example);
    }
    if matches!(prepared.shape, Shape::Async { .. }) {
        doc.raw("<exception cref=\"AITException\">Thrown when the API call fails</exception>");
    }
    doc.render()
}

// =============================================================================
// Nested types
// =============================================================================

/// Declaration of a nested type at namespace level.
pub fn nested_type(ty: &NestedType, ctx: &GenerationContext) -> String {
    let mut doc = DocBlock::new(4);
    match &ty.kind {
        NestedKind::Class { fields } => {
            doc.summary(ty.description.as_deref().unwrap_or(&ty.name));
            let mut lines = vec![doc.render()];
            lines.push("    [Serializable]".to_string());
            lines.push("    [Preserve]".to_string());
            lines.push(format!("    public class {}", ty.name));
            lines.push("    {".to_string());
            for field in fields {
                if let Some(description) = &field.description {
                    lines.push(format!("        /// <summary>{}</summary>", xml_safe(description)));
                }
                lines.push("        [Preserve]".to_string());
                let json_name = escape_csharp_string(&field.json_name);
                if field.ignore {
                    lines.push("        [JsonIgnore]".to_string());
                } else if field.optional {
                    lines.push(format!(
                        "        [JsonProperty(\"{json_name}\", NullValueHandling = NullValueHandling.Ignore)]"
                    ));
                } else {
                    lines.push(format!("        [JsonProperty(\"{json_name}\")]"));
                }
                let field_type = if field.optional && ctx.is_value_type(&field.ty) {
                    format!("{}?", field.ty)
                } else {
                    field.ty.clone()
                };
                let marker = if field.optional { " // optional" } else { "" };
                lines.push(format!("        public {field_type} {};{marker}", field.name));
            }
            lines.push("    }".to_string());
            lines.join("\n")
        }
        NestedKind::Enum { members } => {
            doc.summary(ty.description.as_deref().unwrap_or(&ty.name));
            let mut lines = vec![doc.render()];
            lines.push(format!("    public enum {}", ty.name));
            lines.push("    {".to_string());
            for member in members {
                lines.push(format!(
                    "        [EnumMember(Value = \"{}\")]",
                    escape_csharp_string(&member.value)
                ));
                lines.push(format!("        {},", member.name));
            }
            lines.push("    }".to_string());
            lines.join("\n")
        }
        NestedKind::Result { success, error_code } => {
            doc.summary(&format!(
                "Either a {success} payload or a {error_code} value. Check IsSuccess before reading."
            ));
            result_class(&doc.render(), &ty.name, success, error_code)
        }
    }
}

fn result_class(doc: &str, name: &str, success: &str, error: &str) -> String {
    format!(
        r#"{doc}
    [Serializable]
    [Preserve]
    public class {name}
    {{
        [Preserve]
        [JsonProperty("_type")]
        public string _type;

        [Preserve]
        [JsonProperty("_successJson")]
        public string _successData;

        [Preserve]
        [JsonProperty("_errorCode")]
        public {error}? _errorCode;

        /// <summary>Whether the call returned a payload</summary>
        public bool IsSuccess => _type == "success";

        /// <summary>Whether the call returned an error code</summary>
        public bool IsError => _type == "error";

        /// <summary>The payload, or default when the call returned an error code</summary>
        public {success} GetSuccess()
        {{
            return IsSuccess ? AITJsonSettings.Deserialize<{success}>(_successData) : default({success});
        }}

        /// <summary>The error code, or null when the call succeeded</summary>
        public {error}? GetErrorCode()
        {{
            return IsError ? _errorCode : null;
        }}

        /// <summary>Invoke the handler matching the outcome</summary>
        public void Match(Action<{success}> onSuccess, Action<{error}> onError)
        {{
            if (IsSuccess)
            {{
                onSuccess?.Invoke(GetSuccess());
            }}
            else if (_errorCode.HasValue)
            {{
                onError?.Invoke(_errorCode.Value);
            }}
        }}

        /// <summary>Map the outcome to a value</summary>
        public T Match<T>(Func<{success}, T> onSuccess, Func<{error}, T> onError)
        {{
            if (IsSuccess)
            {{
                return onSuccess(GetSuccess());
            }}
            return _errorCode.HasValue ? onError(_errorCode.Value) : default(T);
        }}

        /// <summary>Run an action when the call returned a payload</summary>
        public {name} OnSuccess(Action<{success}> action)
        {{
            if (IsSuccess) action?.Invoke(GetSuccess());
            return this;
        }}

        /// <summary>Run an action when the call returned an error code</summary>
        public {name} OnError(Action<{error}> action)
        {{
            if (IsError && _errorCode.HasValue) action?.Invoke(_errorCode.Value);
            return this;
        }}
    }}"#
    )
}

// =============================================================================
// AITCore routing
// =============================================================================

/// `RouteCallback` cases, one per awaited result type plus `void`.
pub fn callback_routes(result_types: &BTreeSet<String>) -> String {
    let mut out: String = result_types
        .iter()
        .filter(|t| *t != "void")
        .enumerate()
        .map(|(i, ty)| {
            format!(
                r#"                case "{ty}":
                    if (apiResponse.success)
                    {{
                        if (TryGetCallback<{ty}>(callbackId, out var callback{i}) && callback{i} != null)
                        {{
                            var data{i} = AITJsonSettings.Deserialize<{ty}>(apiResponse.data);
                            callback{i}(data{i});
                        }}
                    }}
                    else
                    {{
                        if (TryGetErrorCallback(callbackId, out var errorCallback{i}) && errorCallback{i} != null)
                        {{
                            errorCallback{i}(new AITException("{ty}", apiResponse.error));
                        }}
                    }}
                    break;
"#
            )
        })
        .collect();
    out.push_str(
        r#"                case "void":
                    if (apiResponse.success)
                    {
                        if (TryGetCallback<object>(callbackId, out var voidCallback) && voidCallback != null)
                        {
                            voidCallback(null);
                        }
                    }
                    else
                    {
                        if (TryGetErrorCallback(callbackId, out var voidErrorCallback) && voidErrorCallback != null)
                        {
                            voidErrorCallback(new AITException("void", apiResponse.error));
                        }
                    }
                    break;"#,
    );
    out
}

/// `RouteSubscriptionCallback` cases, one per event payload type.
pub fn subscription_routes(payload_types: &BTreeSet<String>) -> String {
    payload_types
        .iter()
        .map(|ty| {
            format!(
                "                    case \"{ty}\":\n                        (rawCallback as Action<{ty}>)?.Invoke(AITJsonSettings.Deserialize<{ty}>(apiResponse.data));\n                        break;"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
