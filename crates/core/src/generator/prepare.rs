//! Per-API preparation shared by the C# and jslib emitters.
//!
//! Resolves every C# type through the [`GenerationContext`], escapes
//! parameter names, picks the marshaling of each value and the method shape.

use sdkgen_common::{ParsedApi, ParsedParameter, to_pascal_case};

use crate::collector::{
    CallbackPattern, CallbackShape, GenerationContext, Marshal, Owner, callback_pattern, classify_callback,
    identifier, subscription_payload,
};

use super::utils::escape_csharp_identifier;

/// One C# parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedParam {
    /// C# identifier.
    pub name: String,
    /// Name in the declaration, used for argument order and docs.
    pub source_name: String,
    /// C# type.
    pub cs_type: String,
    pub optional: bool,
    /// `Json` unless the value crosses the boundary as-is.
    pub marshal: Marshal,
    pub description: Option<String>,
}

impl PreparedParam {
    /// Type of the matching `extern` parameter.
    pub fn extern_type(&self) -> &str {
        match self.marshal {
            Marshal::Double => "double",
            Marshal::Bool => "bool",
            _ => "string",
        }
    }

    /// Expression passing this parameter to the `extern`.
    pub fn extern_argument(&self) -> String {
        match self.marshal {
            Marshal::String | Marshal::Double | Marshal::Bool => self.name.clone(),
            _ => format!("AITJsonSettings.Serialize({})", self.name),
        }
    }
}

/// How handlers reach the bridge for a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// `<namespace>.addEventListener(event, { onEvent, onError })`.
    Event {
        /// Event key.
        event_name: String,
    },
    /// Handlers are positional arguments.
    Direct,
    /// Handlers are members of a single arguments object.
    ArgsObject,
}

/// Generated method shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `async Task<T>` through the callback registry.
    Async {
        /// Resolved C# type, `void` for `Task`.
        result: String,
        /// Result is a success-or-error-code wrapper.
        discriminated: bool,
    },
    /// Returns an `Action` that unsubscribes.
    Subscription {
        /// Payload type, `None` for payload-less events.
        payload: Option<String>,
        /// Bridge call form.
        call: Subscription,
    },
    /// `void` call, nothing awaited.
    Action,
    /// Synchronous value returned by the `extern`.
    Accessor {
        /// C# type.
        result: String,
        /// Boundary encoding of the value.
        marshal: Marshal,
    },
}

/// Everything the emitters need about one API.
#[derive(Debug, Clone)]
pub struct PreparedApi<'a> {
    pub api: &'a ParsedApi,
    /// C# parameters, required before optional.
    pub params: Vec<PreparedParam>,
    pub shape: Shape,
}

impl PreparedApi<'_> {
    /// Prepared parameter for a declared parameter name.
    pub fn param(&self, source_name: &str) -> Option<&PreparedParam> {
        self.params.iter().find(|p| p.source_name == source_name)
    }
}

/// Prepare `api`, registering its types in `ctx` under `owner`.
pub fn prepare<'a>(api: &'a ParsedApi, ctx: &mut GenerationContext, owner: &Owner) -> PreparedApi<'a> {
    let pascal = &api.pascal_name;
    let shape = classify_callback(api);

    let params = match (shape, callback_pattern(&api.parameters)) {
        (CallbackShape::EventSubscription, Some(CallbackPattern::ArgsObject { args })) => args
            .ty
            .property("options")
            .map(|options| ParsedParameter {
                name: "options".to_string(),
                ty: options.ty.clone(),
                optional: options.optional,
                description: options.description.clone(),
            })
            .map(|options| prepare_params(std::slice::from_ref(&options), pascal, ctx, owner))
            .unwrap_or_default(),
        (CallbackShape::EventSubscription, _) => {
            let kept: Vec<ParsedParameter> = api
                .parameters
                .iter()
                .filter(|p| p.name != "onEvent" && p.name != "onError")
                .cloned()
                .collect();
            prepare_params(&kept, pascal, ctx, owner)
        }
        _ => prepare_params(&api.parameters, pascal, ctx, owner),
    };

    let shape = match shape {
        CallbackShape::SingleResolution => Shape::Async {
            result: ctx.return_type(pascal, &api.return_type, owner),
            discriminated: api.return_type.unwrap_promise().discriminated().is_some(),
        },
        CallbackShape::EventSubscription => {
            let payload = subscription_payload(api)
                .map(|ty| ctx.csharp_type(ty, &format!("{pascal}Event"), owner))
                .filter(|t| t != "void");
            let call = match (&api.event, callback_pattern(&api.parameters)) {
                (Some(event), _) => Subscription::Event {
                    event_name: event.event_name.clone(),
                },
                (None, Some(CallbackPattern::ArgsObject { .. })) => Subscription::ArgsObject,
                (None, _) => Subscription::Direct,
            };
            Shape::Subscription { payload, call }
        }
        CallbackShape::FireAndForget => {
            let result = ctx.return_type(pascal, &api.return_type, owner);
            if result == "void" {
                Shape::Action
            } else {
                let marshal = ctx.marshal(&result);
                Shape::Accessor { result, marshal }
            }
        }
    };

    PreparedApi { api, params, shape }
}

fn prepare_params(
    params: &[ParsedParameter],
    api_pascal: &str,
    ctx: &mut GenerationContext,
    owner: &Owner,
) -> Vec<PreparedParam> {
    let mut prepared: Vec<PreparedParam> = params
        .iter()
        .filter(|p| !p.ty.is_void() || p.ty.name == "any")
        .map(|p| {
            let hint = format!("{api_pascal}{}", to_pascal_case(&identifier(&p.name)));
            let mut cs_type = ctx.csharp_type(&p.ty, &hint, owner);
            let direct = matches!(ctx.marshal(&cs_type), Marshal::String | Marshal::Double | Marshal::Bool);
            let marshal = if direct && !p.optional {
                ctx.marshal(&cs_type)
            } else {
                Marshal::Json
            };
            if p.optional && ctx.is_value_type(&cs_type) && !cs_type.ends_with('?') {
                cs_type.push('?');
            }
            PreparedParam {
                name: escape_csharp_identifier(&p.name),
                source_name: p.name.clone(),
                cs_type,
                optional: p.optional,
                marshal,
                description: p.description.clone(),
            }
        })
        .collect();
    // Optional parameters must follow required ones in C#
    prepared.sort_by_key(|p| p.optional);
    prepared
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use sdkgen_common::{ParsedProperty, ParsedType, TypeKind};

    fn api(parameters: Vec<ParsedParameter>, return_type: ParsedType) -> ParsedApi {
        ParsedApi {
            name: "saveItem".to_string(),
            pascal_name: "SaveItem".to_string(),
            original_name: "saveItem".to_string(),
            category: "Storage".to_string(),
            file: "storage.d.ts".to_string(),
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

    fn param(name: &str, ty: ParsedType, optional: bool) -> ParsedParameter {
        ParsedParameter {
            name: name.to_string(),
            ty,
            optional,
            description: None,
        }
    }

    fn owner() -> Owner {
        Owner::Category("Storage".to_string())
    }

    #[test]
    fn test_params_are_escaped_sorted_and_marshaled() {
        let api = api(
            vec![
                param("ttl", ParsedType::primitive("number"), true),
                param("params", ParsedType::primitive("string"), false),
                param("nothing", ParsedType::primitive("void"), false),
                param(
                    "meta",
                    ParsedType::object(
                        "object",
                        "{ tag: string }",
                        vec![ParsedProperty {
                            name: "tag".to_string(),
                            ty: ParsedType::primitive("string"),
                            optional: false,
                            description: None,
                        }],
                    ),
                    false,
                ),
            ],
            ParsedType::primitive("void"),
        );
        let mut ctx = GenerationContext::default();
        let prepared = prepare(&api, &mut ctx, &owner());
        let names: Vec<&str> = prepared.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["paramsParam", "meta", "ttl"]);
        assert_eq!(prepared.params[0].marshal, Marshal::String);
        assert_eq!(prepared.params[1].cs_type, "SaveItemMeta");
        assert_eq!(prepared.params[1].extern_argument(), "AITJsonSettings.Serialize(meta)");
        assert_eq!(prepared.params[2].cs_type, "double?");
        assert_eq!(prepared.params[2].marshal, Marshal::Json);
        assert_eq!(prepared.shape, Shape::Action);
        assert_eq!(prepared.param("params").unwrap().name, "paramsParam");
    }

    #[test]
    fn test_sync_value_is_accessor() {
        let api = api(Vec::new(), ParsedType::primitive("string"));
        let mut ctx = GenerationContext::default();
        let prepared = prepare(&api, &mut ctx, &owner());
        assert_eq!(
            prepared.shape,
            Shape::Accessor {
                result: "string".to_string(),
                marshal: Marshal::String
            }
        );
    }

    #[test]
    fn test_args_object_subscription_exposes_options_only() {
        let handler = ParsedType {
            name: "function".to_string(),
            raw: "(location: Location) => void".to_string(),
            nullable: false,
            kind: TypeKind::Function {
                params: vec![param("location", ParsedType::object("Location", "Location", Vec::new()), false)],
                returns: Box::new(ParsedType::primitive("void")),
            },
        };
        let args = ParsedType::object(
            "object",
            "{ onEvent; options }",
            vec![
                ParsedProperty {
                    name: "onEvent".to_string(),
                    ty: handler,
                    optional: false,
                    description: None,
                },
                ParsedProperty {
                    name: "options".to_string(),
                    ty: ParsedType::object(
                        "object",
                        "{ interval: number }",
                        vec![ParsedProperty {
                            name: "interval".to_string(),
                            ty: ParsedType::primitive("number"),
                            optional: false,
                            description: None,
                        }],
                    ),
                    optional: false,
                    description: None,
                },
            ],
        );
        let mut api = api(vec![param("args", args, false)], ParsedType::primitive("function"));
        api.pascal_name = "StartUpdateLocation".to_string();
        let mut ctx = GenerationContext::default();
        let prepared = prepare(&api, &mut ctx, &owner());
        assert_eq!(prepared.params.len(), 1);
        assert_eq!(prepared.params[0].name, "options");
        assert_eq!(prepared.params[0].cs_type, "StartUpdateLocationOptions");
        let Shape::Subscription { payload, call } = &prepared.shape else {
            panic!("expected subscription");
        };
        assert_eq!(payload.as_deref(), Some("Location"));
        assert_eq!(*call, Subscription::ArgsObject);
    }
}
