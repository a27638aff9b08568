use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod node_meta;
use node_meta::{parse_node_info, parse_params, parse_ports, ParamField, PortField};

/// Derives `NodeParams` for a typed property record and registers its
/// definition with the node catalog.
///
/// ```ignore
/// #[derive(NodeType, Debug, Clone, Default, Serialize, Deserialize)]
/// #[node_type(id = "View Stages/Limit", label = "Limit", category = "transform")]
/// pub struct Limit {
///     #[input(port_type = "view")]
///     #[serde(skip)]
///     _input: (),
///
///     #[param(required, min = 1.0, max = 1000000.0)]
///     pub count: u64,
/// }
/// ```
#[proc_macro_derive(NodeType, attributes(node_type, param, input, output))]
pub fn derive_node_type(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.write_errors().into(),
    }
}

fn expand(input: &DeriveInput) -> darling::Result<proc_macro2::TokenStream> {
    let node_info = parse_node_info(input)?;
    let fields = parse_params(input)?;
    let (inputs, outputs) = parse_ports(input)?;

    let struct_name = &input.ident;
    let type_id = &node_info.id;
    let label = &node_info.label;
    let description = node_info.description.clone().unwrap_or_default();
    let color = node_info
        .color
        .clone()
        .unwrap_or_else(|| "#6B7280".to_string());
    let category = category_variant(&node_info.category)
        .map_err(|e| e.with_span(&input.ident))?;

    let params = fields
        .iter()
        .map(param_tokens)
        .collect::<darling::Result<Vec<_>>>()?;

    let input_ports = inputs.iter().map(port_tokens);
    let output_ports = outputs.iter().map(port_tokens);

    let lower = struct_name.to_string().to_lowercase();
    let mod_name = syn::Ident::new(&format!("__node_type_registration_{}", lower), struct_name.span());
    let factory_fn_name = syn::Ident::new(&format!("definition_{}", lower), struct_name.span());

    Ok(quote! {
        impl crate::catalog::NodeParams for #struct_name {
            const TYPE_ID: &'static str = #type_id;

            #[allow(unused_mut, unused_variables)]
            fn definition() -> crate::catalog::NodeTypeDefinition {
                let defaults = ::serde_json::to_value(<Self as ::core::default::Default>::default())
                    .unwrap_or(::serde_json::Value::Null);
                let mut parameter_schema = ::std::collections::BTreeMap::new();
                #(#params)*

                crate::catalog::NodeTypeDefinition {
                    type_id: #type_id.to_string(),
                    label: #label.to_string(),
                    category: crate::catalog::Category::#category,
                    description: #description.to_string(),
                    color: #color.to_string(),
                    input_ports: vec![#(#input_ports),*],
                    output_ports: vec![#(#output_ports),*],
                    parameter_schema,
                }
            }
        }

        #[doc(hidden)]
        mod #mod_name {
            use super::*;

            fn #factory_fn_name() -> crate::catalog::NodeTypeDefinition {
                <#struct_name as crate::catalog::NodeParams>::definition()
            }

            ::inventory::submit! {
                crate::catalog::NodeTypeRegistration(#factory_fn_name)
            }
        }
    })
}

fn param_tokens(field: &ParamField) -> darling::Result<proc_macro2::TokenStream> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| darling::Error::custom("parameters must be named fields"))?;
    let name = ident.to_string().trim_start_matches("r#").to_string();
    let label = field.label.clone().unwrap_or_else(|| title_case(&name));

    let kind = match &field.kind {
        Some(kind) => kind_variant(kind).map_err(|e| e.with_span(ident))?,
        None => infer_kind(&field.ty).map_err(|e| e.with_span(&field.ty))?,
    };

    let values: Vec<String> = field
        .values
        .as_deref()
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let bounds = match (field.min, field.max) {
        (Some(min), Some(max)) => quote! {
            Some(crate::catalog::NumericBounds { min: #min, max: #max })
        },
        (None, None) => quote! { None },
        _ => {
            return Err(darling::Error::custom("`min` and `max` must be given together").with_span(ident));
        }
    };

    let required = field.required.is_present();
    let dynamic = field.dynamic.is_present();

    Ok(quote! {
        parameter_schema.insert(
            #name.to_string(),
            crate::catalog::ParameterSpec {
                kind: crate::catalog::ParamKind::#kind,
                label: #label.to_string(),
                default_value: defaults.get(#name).cloned().unwrap_or(::serde_json::Value::Null),
                required: #required,
                enumeration_values: vec![#(#values.to_string()),*],
                numeric_bounds: #bounds,
                is_dynamic: #dynamic,
            },
        );
    })
}

fn port_tokens(port: &PortField) -> proc_macro2::TokenStream {
    let field_name = port
        .ident
        .as_ref()
        .map(|i| i.to_string().trim_start_matches('_').to_string())
        .unwrap_or_default();
    let name = port.name.clone().unwrap_or(field_name);
    let port_type = port.port_type.as_deref().unwrap_or("view");

    quote! {
        crate::catalog::PortSpec {
            name: #name.to_string(),
            port_type: #port_type.to_string(),
        }
    }
}

fn category_variant(category: &str) -> darling::Result<syn::Ident> {
    let variant = match category {
        "source" => "Source",
        "transform" => "Transform",
        "analysis" => "Analysis",
        "model" => "Model",
        "evaluation" => "Evaluation",
        "output" => "Output",
        other => return Err(darling::Error::unknown_value(other)),
    };
    Ok(syn::Ident::new(variant, Span::call_site()))
}

fn kind_variant(kind: &str) -> darling::Result<syn::Ident> {
    let variant = match kind {
        "string" => "String",
        "integer" => "Integer",
        "float" => "Float",
        "boolean" => "Boolean",
        "enumeration" => "Enumeration",
        "list" => "ListOfString",
        other => return Err(darling::Error::unknown_value(other)),
    };
    Ok(syn::Ident::new(variant, Span::call_site()))
}

fn infer_kind(ty: &syn::Type) -> darling::Result<syn::Ident> {
    let type_str = quote!(#ty).to_string();

    let variant = if type_str.contains("Vec") {
        "ListOfString"
    } else if type_str.contains("bool") {
        "Boolean"
    } else if type_str.contains("f64") || type_str.contains("f32") {
        "Float"
    } else if type_str.contains("u32") || type_str.contains("i32")
        || type_str.contains("u64") || type_str.contains("i64")
        || type_str.contains("usize") || type_str.contains("isize") {
        "Integer"
    } else if type_str.contains("String") || type_str.contains("str") {
        "String"
    } else {
        return Err(darling::Error::custom(format!(
            "cannot infer parameter kind for `{}`, add `kind = \"...\"`",
            type_str
        )));
    };
    Ok(syn::Ident::new(variant, Span::call_site()))
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
