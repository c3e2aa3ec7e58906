//! Expansion of `#[gpt_function]`.

use proc_macro2::{Literal as TokenLiteral, Span, TokenStream};
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute, Error, Expr, ExprLit, ExprUnary, FnArg, GenericArgument, Ident, ItemFn, Lit,
    LitStr, Meta, Pat, PathArguments, Result, ReturnType, Signature, Token, Type, TypePath, UnOp,
    ext::IdentExt,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

const MAX_NAME_LEN: usize = 64;

const UNSUPPORTED_WRAPPERS: &[&str] = &[
    "Vec", "VecDeque", "HashMap", "BTreeMap", "HashSet", "BTreeSet", "Box", "Rc", "Arc", "Cow",
    "Result",
];

/// Arguments accepted by the attribute: `name = "..."` and `description = "..."`.
pub struct FunctionArguments {
    name: Option<LitStr>,
    description: Option<LitStr>,
}

impl Parse for FunctionArguments {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut arguments = Self {
            name: None,
            description: None,
        };

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;

            match key.to_string().as_str() {
                "name" => arguments.name = Some(value),
                "description" => arguments.description = Some(value),
                other => {
                    return Err(Error::new(
                        key.span(),
                        format!("unknown argument `{other}`, expected `name` or `description`"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            } else if !input.is_empty() {
                return Err(input.error("expected `,`"));
            }
        }

        Ok(arguments)
    }
}

/// How a parameter is decoded from model-provided arguments.
#[derive(Debug, PartialEq, Eq)]
enum ParamKind {
    /// `&str`, decoded as `String` and passed by reference.
    Str,
    /// Any owned type implementing `SchemaType`.
    Owned,
}

#[derive(Debug, PartialEq)]
enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl ToTokens for LiteralValue {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let expanded = match self {
            Self::Str(value) => quote! {
                ::gptfunction::Literal::String(::std::string::String::from(#value))
            },
            Self::Int(value) => {
                let magnitude = TokenLiteral::u64_unsuffixed(value.unsigned_abs());
                let sign = (*value < 0).then(|| quote!(-));
                quote!(::gptfunction::Literal::Integer(#sign #magnitude))
            }
            Self::Float(value) => {
                let magnitude = TokenLiteral::f64_unsuffixed(value.abs());
                let sign = (value.is_sign_negative()).then(|| quote!(-));
                quote!(::gptfunction::Literal::Float(#sign #magnitude))
            }
        };
        tokens.extend(expanded);
    }
}

struct Parameter {
    ident: Ident,
    name: String,
    ty: Type,
    kind: ParamKind,
    literals: Option<Vec<LiteralValue>>,
    description: Option<String>,
}

impl Parameter {
    fn decode_type(&self) -> TokenStream {
        match self.kind {
            ParamKind::Str => quote!(::std::string::String),
            ParamKind::Owned => self.ty.to_token_stream(),
        }
    }

    fn binding(&self) -> Ident {
        format_ident!("__gpt_{}", self.ident.unraw())
    }

    fn spec(&self) -> TokenStream {
        let name = &self.name;
        let decode_type = self.decode_type();
        let literals = self
            .literals
            .as_ref()
            .map(|values| quote!(.literals([#(#values),*])));
        let description = self
            .description
            .as_ref()
            .map(|description| quote!(.describe(#description)));

        quote! {
            ::gptfunction::ParamSpec::of::<#decode_type>(#name) #literals #description
        }
    }

    fn call_argument(&self) -> TokenStream {
        let binding = self.binding();
        match self.kind {
            ParamKind::Str => quote!(&#binding),
            ParamKind::Owned => quote!(#binding),
        }
    }
}

pub fn expand(arguments: FunctionArguments, mut function: ItemFn) -> Result<TokenStream> {
    check_signature(&function.sig)?;

    let name = match &arguments.name {
        Some(literal) => literal.value(),
        None => function.sig.ident.unraw().to_string(),
    };
    let name_span = arguments
        .name
        .as_ref()
        .map_or_else(|| function.sig.ident.span(), LitStr::span);
    validate_name(&name, name_span)?;

    let parameters = analyze(&mut function.sig)?;
    let docs = doc_expressions(&function.attrs);

    let ident = &function.sig.ident;
    let visibility = &function.vis;
    let output = &function.sig.output;
    let module_doc = format!("Calling schema support for `{name}`, generated by `#[gpt_function]`.");

    let doc_call = (!docs.is_empty()).then(|| {
        let joined = join_docs(&docs);
        quote!(.doc(::core::concat!(#joined)))
    });
    let description_call = arguments
        .description
        .as_ref()
        .map(|description| quote!(.description(#description)));

    let specs: Vec<TokenStream> = parameters.iter().map(Parameter::spec).collect();
    let pointer_types: Vec<&Type> = parameters.iter().map(|parameter| &parameter.ty).collect();
    let bindings: Vec<Ident> = parameters.iter().map(Parameter::binding).collect();
    let decode_types: Vec<TokenStream> = parameters.iter().map(Parameter::decode_type).collect();
    let names: Vec<&str> = parameters.iter().map(|parameter| parameter.name.as_str()).collect();
    let call_arguments: Vec<TokenStream> = parameters.iter().map(Parameter::call_argument).collect();
    let call = quote!(super::#ident(#(#call_arguments),*));
    let render = if returns_result(output) {
        quote!(::gptfunction::render_result(#call, NAME))
    } else {
        quote!(::gptfunction::render_output(&#call, NAME))
    };

    Ok(quote! {
        #function

        #[doc = #module_doc]
        #visibility mod #ident {
            #![allow(unused_imports)]

            use super::*;

            /// Name used in the calling schema.
            pub const NAME: &str = #name;

            /// Builder describing the function's signature and documentation.
            pub fn builder() -> ::gptfunction::CallableBuilder {
                ::gptfunction::CallableBuilder::new(NAME)
                    #doc_call
                    #description_call
                    #(.param_spec(#specs))*
            }

            /// Builds the function's descriptor.
            ///
            /// # Errors
            ///
            /// Returns a `SchemaError` when a parameter type is malformed.
            pub fn descriptor() -> ::gptfunction::Result<::gptfunction::CallableDescriptor> {
                builder().build()
            }

            /// Wraps the function together with its descriptor.
            ///
            /// # Errors
            ///
            /// Returns a `SchemaError` when a parameter type is malformed.
            pub fn wrap() -> ::gptfunction::Result<
                ::gptfunction::GptFunction<fn(#(#pointer_types),*) #output>,
            > {
                ::gptfunction::wrap(super::#ident as fn(#(#pointer_types),*) #output, builder())
            }

            /// Builds a type-erased tool that decodes JSON arguments and calls the function.
            ///
            /// # Errors
            ///
            /// Returns a `SchemaError` when a parameter type is malformed.
            pub fn tool() -> ::gptfunction::Result<::gptfunction::FunctionTool> {
                let descriptor = descriptor()?;
                ::core::result::Result::Ok(::gptfunction::FunctionTool::new(
                    descriptor,
                    |__arguments: &::gptfunction::Arguments<'_>| {
                        #(let #bindings: #decode_types = __arguments.get(#names)?;)*
                        #render
                    },
                ))
            }
        }
    })
}

/// Whether the declared return type is a `Result`, by its last path segment.
fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => is_result(ty),
    }
}

fn is_result(ty: &Type) -> bool {
    match ty {
        Type::Paren(inner) => is_result(&inner.elem),
        Type::Group(inner) => is_result(&inner.elem),
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result"),
        _ => false,
    }
}

fn check_signature(signature: &Signature) -> Result<()> {
    if let Some(token) = &signature.asyncness {
        return Err(Error::new_spanned(token, "`#[gpt_function]` does not support async functions"));
    }
    if let Some(token) = &signature.unsafety {
        return Err(Error::new_spanned(token, "`#[gpt_function]` does not support unsafe functions"));
    }
    if let Some(abi) = &signature.abi {
        return Err(Error::new_spanned(abi, "`#[gpt_function]` does not support extern functions"));
    }
    if !signature.generics.params.is_empty() || signature.generics.where_clause.is_some() {
        return Err(Error::new_spanned(
            &signature.generics,
            "`#[gpt_function]` does not support generic functions",
        ));
    }
    if let Some(variadic) = &signature.variadic {
        return Err(Error::new_spanned(variadic, "`#[gpt_function]` does not support variadic functions"));
    }
    if let ReturnType::Type(_, ty) = &signature.output {
        if matches!(**ty, Type::ImplTrait(_)) {
            return Err(Error::new_spanned(ty, "`#[gpt_function]` does not support `impl Trait` return types"));
        }
    }
    Ok(())
}

fn validate_name(name: &str, span: Span) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(Error::new(span, format!("function name must be 1 to {MAX_NAME_LEN} characters")));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(Error::new(
            span,
            "function name must contain only ASCII letters, digits, underscore, or dash",
        ));
    }
    Ok(())
}

/// Collects the parameters and strips the attributes this macro consumes.
fn analyze(signature: &mut Signature) -> Result<Vec<Parameter>> {
    let mut parameters = Vec::with_capacity(signature.inputs.len());

    for input in &mut signature.inputs {
        let typed = match input {
            FnArg::Receiver(receiver) => {
                return Err(Error::new_spanned(
                    receiver,
                    "`#[gpt_function]` does not support methods; wrap a free function",
                ));
            }
            FnArg::Typed(typed) => typed,
        };

        let Pat::Ident(pattern) = &*typed.pat else {
            return Err(Error::new_spanned(&typed.pat, "parameters must be plain identifiers"));
        };
        if pattern.by_ref.is_some() || pattern.subpat.is_some() {
            return Err(Error::new_spanned(&typed.pat, "parameters must be plain identifiers"));
        }

        let ident = pattern.ident.clone();
        let kind = classify(&typed.ty)?;
        let (literals, description) = take_parameter_attributes(&mut typed.attrs)?;

        parameters.push(Parameter {
            name: ident.unraw().to_string(),
            ident,
            ty: (*typed.ty).clone(),
            kind,
            literals,
            description,
        });
    }

    Ok(parameters)
}

fn classify(ty: &Type) -> Result<ParamKind> {
    match ty {
        Type::Paren(inner) => classify(&inner.elem),
        Type::Group(inner) => classify(&inner.elem),
        Type::Reference(reference) if reference.mutability.is_none() && is_str(&reference.elem) => {
            Ok(ParamKind::Str)
        }
        Type::Reference(_) => Err(unsupported(ty, "references other than `&str` are not supported")),
        Type::Path(path) if path.qself.is_none() => classify_path(ty, path),
        _ => Err(unsupported(
            ty,
            "tuples, arrays, slices, trait objects and `impl Trait` are not supported",
        )),
    }
}

fn classify_path(ty: &Type, path: &TypePath) -> Result<ParamKind> {
    let Some(last) = path.path.segments.last() else {
        return Err(unsupported(ty, "empty type path"));
    };

    let ident = last.ident.to_string();
    if ident == "bool" {
        return Err(unsupported(ty, "booleans are not supported; use a literal set or an enum"));
    }
    if UNSUPPORTED_WRAPPERS.contains(&ident.as_str()) {
        return Err(unsupported(ty, "collections and smart pointers are not supported"));
    }

    if ident == "Option" {
        let inner = single_type_argument(&last.arguments)
            .ok_or_else(|| unsupported(ty, "`Option` needs exactly one type argument"))?;
        if option_inner(inner).is_some() {
            return Err(unsupported(ty, "nested `Option` is not supported"));
        }
        return match classify(inner)? {
            ParamKind::Owned => Ok(ParamKind::Owned),
            ParamKind::Str => Err(unsupported(ty, "use `Option<String>` instead of `Option<&str>`")),
        };
    }

    if !matches!(last.arguments, PathArguments::None) {
        return Err(unsupported(ty, "generic types are not supported"));
    }

    Ok(ParamKind::Owned)
}

fn is_str(ty: &Type) -> bool {
    matches!(ty, Type::Path(path) if path.qself.is_none() && path.path.is_ident("str"))
}

fn single_type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(bracketed) = arguments else {
        return None;
    };
    if bracketed.args.len() != 1 {
        return None;
    }
    match bracketed.args.first() {
        Some(GenericArgument::Type(ty)) => Some(ty),
        _ => None,
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    single_type_argument(&last.arguments)
}

fn unsupported(ty: &Type, reason: &str) -> Error {
    Error::new_spanned(
        ty,
        format!("unsupported parameter type `{}`: {reason}", ty.to_token_stream()),
    )
}

type ParameterAttributes = (Option<Vec<LiteralValue>>, Option<String>);

/// Removes `#[literal(..)]` and doc comments from a parameter.
fn take_parameter_attributes(attributes: &mut Vec<Attribute>) -> Result<ParameterAttributes> {
    let mut literals = None;
    let mut docs = Vec::new();
    let mut kept = Vec::with_capacity(attributes.len());

    for attribute in attributes.drain(..) {
        if attribute.path().is_ident("literal") {
            if literals.is_some() {
                return Err(Error::new_spanned(&attribute, "duplicate `#[literal]` attribute"));
            }
            let values = attribute.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)?;
            if values.is_empty() {
                return Err(Error::new_spanned(&attribute, "`#[literal]` needs at least one value"));
            }
            literals = Some(values.iter().map(literal_value).collect::<Result<Vec<_>>>()?);
        } else if attribute.path().is_ident("doc") {
            if let Some(Expr::Lit(ExprLit {
                lit: Lit::Str(text), ..
            })) = doc_expression(&attribute)
            {
                docs.push(text.value().trim().to_owned());
            }
        } else {
            kept.push(attribute);
        }
    }

    *attributes = kept;
    let description = (!docs.is_empty()).then(|| docs.join("\n"));
    Ok((literals, description))
}

fn literal_value(expr: &Expr) -> Result<LiteralValue> {
    let invalid = || Error::new_spanned(expr, "literal values must be string, integer or float literals");

    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Str(text) => Ok(LiteralValue::Str(text.value())),
            Lit::Int(integer) => Ok(LiteralValue::Int(integer.base10_parse()?)),
            Lit::Float(float) => {
                let value: f64 = float.base10_parse()?;
                if value.is_finite() {
                    Ok(LiteralValue::Float(value))
                } else {
                    Err(Error::new_spanned(float, "float literal is out of range"))
                }
            }
            _ => Err(invalid()),
        },
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => match literal_value(inner)? {
            LiteralValue::Int(value) => Ok(LiteralValue::Int(-value)),
            LiteralValue::Float(value) => Ok(LiteralValue::Float(-value)),
            LiteralValue::Str(_) => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn doc_expression(attribute: &Attribute) -> Option<&Expr> {
    match &attribute.meta {
        Meta::NameValue(meta) if attribute.path().is_ident("doc") => Some(&meta.value),
        _ => None,
    }
}

fn doc_expressions(attributes: &[Attribute]) -> Vec<&Expr> {
    attributes.iter().filter_map(doc_expression).collect()
}

/// Interleaves doc line expressions with newlines for `concat!`.
fn join_docs(docs: &[&Expr]) -> TokenStream {
    let mut joined = TokenStream::new();
    for (index, doc) in docs.iter().enumerate() {
        if index > 0 {
            joined.extend(quote!("\n",));
        }
        joined.extend(quote!(#doc,));
    }
    joined
}
