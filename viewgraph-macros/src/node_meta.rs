use darling::util::Flag;
use darling::{FromAttributes, FromField};
use syn::{DeriveInput, Fields};

/// Parsed attributes from #[node_type(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(node_type))]
pub struct NodeTypeArgs {
    pub id: String,
    pub label: String,
    pub category: String,

    #[darling(default)]
    pub description: Option<String>,

    #[darling(default)]
    pub color: Option<String>,
}

/// Parsed attributes from #[param(...)]
#[derive(Debug, FromField)]
#[darling(attributes(param))]
pub struct ParamField {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    #[darling(default)]
    pub label: Option<String>,

    /// Overrides the kind inferred from the field type
    #[darling(default)]
    pub kind: Option<String>,

    /// Comma separated static choices
    #[darling(default)]
    pub values: Option<String>,

    #[darling(default)]
    pub required: Flag,

    #[darling(default)]
    pub dynamic: Flag,

    #[darling(default)]
    pub min: Option<f64>,

    #[darling(default)]
    pub max: Option<f64>,
}

/// Parse inputs/outputs from #[input(...)] / #[output(...)]
#[derive(Debug, FromField)]
#[darling(attributes(input, output))]
pub struct PortField {
    pub ident: Option<syn::Ident>,

    #[darling(default)]
    pub name: Option<String>,

    #[darling(default)]
    pub port_type: Option<String>,
}

pub fn parse_node_info(input: &DeriveInput) -> darling::Result<NodeTypeArgs> {
    NodeTypeArgs::from_attributes(&input.attrs)
}

fn named_fields(input: &DeriveInput) -> Option<&syn::punctuated::Punctuated<syn::Field, syn::token::Comma>> {
    match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Some(&fields.named),
            _ => None,
        },
        _ => None,
    }
}

pub fn parse_params(input: &DeriveInput) -> darling::Result<Vec<ParamField>> {
    let Some(fields) = named_fields(input) else {
        return Ok(Vec::new());
    };

    let mut errors = darling::Error::accumulator();
    let params = fields
        .iter()
        .filter(|f| f.attrs.iter().any(|attr| attr.path().is_ident("param")))
        .map(strip_bare_param)
        .filter_map(|f| errors.handle(ParamField::from_field(&f)))
        .collect();
    errors.finish_with(params)
}

/// A bare `#[param]` carries no arguments; drop it so darling only sees lists.
fn strip_bare_param(field: &syn::Field) -> syn::Field {
    let mut field = field.clone();
    field
        .attrs
        .retain(|attr| !(attr.path().is_ident("param") && matches!(attr.meta, syn::Meta::Path(_))));
    field
}

pub fn parse_ports(input: &DeriveInput) -> darling::Result<(Vec<PortField>, Vec<PortField>)> {
    let Some(fields) = named_fields(input) else {
        return Ok((Vec::new(), Vec::new()));
    };

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for field in fields.iter() {
        if field.attrs.iter().any(|attr| attr.path().is_ident("input")) {
            inputs.push(PortField::from_field(field)?);
        }

        if field.attrs.iter().any(|attr| attr.path().is_ident("output")) {
            outputs.push(PortField::from_field(field)?);
        }
    }

    Ok((inputs, outputs))
}
