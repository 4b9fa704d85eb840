//! Callback-shape classification.
//!
//! Decides how results travel back to C# for one API, purely from the
//! structure of its parameters and return type.

use sdkgen_common::{ParsedApi, ParsedParameter, ParsedType, TypeKind};

/// How the outcome of an API call reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackShape {
    /// The call settles exactly once (a promise).
    SingleResolution,
    /// The call delivers `onEvent` payloads until unsubscribed.
    EventSubscription,
    /// Nothing is awaited; the value (if any) is returned synchronously.
    FireAndForget,
}

/// Where the `onEvent`/`onError` handlers of a callback-based API live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPattern<'a> {
    /// The handlers are top-level parameters.
    Direct,
    /// The handlers are members of a single arguments object.
    ArgsObject {
        /// The arguments object parameter.
        args: &'a ParsedParameter,
    },
}

/// Classify an API.
pub fn classify_callback(api: &ParsedApi) -> CallbackShape {
    if api.event.is_some() || callback_pattern(&api.parameters).is_some() {
        CallbackShape::EventSubscription
    } else if api.return_type.is_promise() {
        CallbackShape::SingleResolution
    } else {
        CallbackShape::FireAndForget
    }
}

/// Detect function-valued `onEvent` handlers among the parameters.
pub fn callback_pattern(params: &[ParsedParameter]) -> Option<CallbackPattern<'_>> {
    if params.iter().any(|p| p.name == "onEvent" && p.ty.is_function()) {
        return Some(CallbackPattern::Direct);
    }
    match params {
        [args] if args.ty.property("onEvent").is_some_and(|p| p.ty.is_function()) => {
            Some(CallbackPattern::ArgsObject { args })
        }
        _ => None,
    }
}

/// The type delivered to subscribers, `None` for payload-less events.
pub fn subscription_payload(api: &ParsedApi) -> Option<&ParsedType> {
    if let Some(event) = &api.event {
        return event.data.as_ref();
    }
    let handler = match callback_pattern(&api.parameters)? {
        CallbackPattern::Direct => &api.parameters.iter().find(|p| p.name == "onEvent")?.ty,
        CallbackPattern::ArgsObject { args } => &args.ty.property("onEvent")?.ty,
    };
    match &handler.kind {
        TypeKind::Function { params, .. } => params.first().map(|p| &p.ty).filter(|t| !t.is_void()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sdkgen_common::{EventInfo, ParsedProperty};

    fn api(parameters: Vec<ParsedParameter>, return_type: ParsedType) -> ParsedApi {
        ParsedApi {
            name: "sample".to_string(),
            pascal_name: "Sample".to_string(),
            original_name: "sample".to_string(),
            category: "Other".to_string(),
            file: "sample.d.ts".to_string(),
            namespace: None,
            description: None,
            return_description: None,
            examples: Vec::new(),
            parameters,
            is_async: return_type.is_promise(),
            return_type,
            has_permission: false,
            deprecated: None,
            event: None,
        }
    }

    fn param(name: &str, ty: ParsedType) -> ParsedParameter {
        ParsedParameter {
            name: name.to_string(),
            ty,
            optional: false,
            description: None,
        }
    }

    fn handler(payload: ParsedType) -> ParsedType {
        ParsedType {
            name: "function".to_string(),
            raw: "(data) => void".to_string(),
            nullable: false,
            kind: TypeKind::Function {
                params: vec![param("data", payload)],
                returns: Box::new(ParsedType::primitive("void")),
            },
        }
    }

    fn promise(inner: ParsedType) -> ParsedType {
        ParsedType {
            name: "Promise".to_string(),
            raw: format!("Promise<{}>", inner.raw),
            nullable: false,
            kind: TypeKind::Promise {
                resolved: Box::new(inner),
            },
        }
    }

    #[test]
    fn test_promise_is_single_resolution() {
        let api = api(Vec::new(), promise(ParsedType::primitive("string")));
        assert_eq!(classify_callback(&api), CallbackShape::SingleResolution);
    }

    #[test]
    fn test_plain_return_is_fire_and_forget() {
        let api = api(
            vec![param("text", ParsedType::primitive("string"))],
            ParsedType::primitive("void"),
        );
        assert_eq!(classify_callback(&api), CallbackShape::FireAndForget);
        let getter = api_with_return(ParsedType::primitive("string"));
        assert_eq!(classify_callback(&getter), CallbackShape::FireAndForget);
    }

    fn api_with_return(ty: ParsedType) -> ParsedApi {
        api(Vec::new(), ty)
    }

    #[test]
    fn test_direct_handlers_subscribe() {
        let api = api(
            vec![
                param("onEvent", handler(ParsedType::primitive("string"))),
                param("onError", handler(ParsedType::primitive("Error"))),
            ],
            ParsedType::primitive("function"),
        );
        assert_eq!(classify_callback(&api), CallbackShape::EventSubscription);
        assert_eq!(callback_pattern(&api.parameters), Some(CallbackPattern::Direct));
        assert_eq!(subscription_payload(&api).unwrap().name, "string");
    }

    #[test]
    fn test_args_object_handlers_subscribe() {
        let args = ParsedType::object(
            "object",
            "{ onEvent; options }",
            vec![
                ParsedProperty {
                    name: "onEvent".to_string(),
                    ty: handler(ParsedType::object("Location", "Location", Vec::new())),
                    optional: false,
                    description: None,
                },
                ParsedProperty {
                    name: "options".to_string(),
                    ty: ParsedType::object("object", "{}", Vec::new()),
                    optional: false,
                    description: None,
                },
            ],
        );
        // A promise return does not override the handler shape
        let api = api(vec![param("params", args)], promise(ParsedType::primitive("void")));
        assert_eq!(classify_callback(&api), CallbackShape::EventSubscription);
        assert!(matches!(
            callback_pattern(&api.parameters),
            Some(CallbackPattern::ArgsObject { .. })
        ));
        assert_eq!(subscription_payload(&api).unwrap().name, "Location");
    }

    #[test]
    fn test_non_function_on_event_is_ignored() {
        let api = api(
            vec![param("onEvent", ParsedType::primitive("string"))],
            ParsedType::primitive("void"),
        );
        assert_eq!(classify_callback(&api), CallbackShape::FireAndForget);
    }

    #[test]
    fn test_event_api_payload() {
        let mut event_api = api(Vec::new(), ParsedType::primitive("function"));
        event_api.event = Some(EventInfo {
            event_name: "backEvent".to_string(),
            data: None,
        });
        assert_eq!(classify_callback(&event_api), CallbackShape::EventSubscription);
        assert!(subscription_payload(&event_api).is_none());
    }
}
