use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let calmform = calmform_path();
    let mut names = Vec::new();
    let mut record_builders = Vec::new();
    let mut readers = Vec::new();

    for field in &named_fields {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let field_name = field_ident.to_string();
        let attrs = match FieldAttrs::parse(field) {
            Ok(attrs) => attrs,
            Err(error) => return error.to_compile_error().into(),
        };

        let mut setters = Vec::new();
        if attrs.required {
            setters.push(quote!(record.required = true;));
        }
        if let Some(message) = attrs.required_error {
            setters.push(quote!(record.required_error = Some(#message.to_string());));
        }
        if let Some(source) = attrs.depends_on {
            setters.push(quote!(record.depends_on = Some(#source.to_string());));
        }
        if let Some((pattern, message)) = attrs.validator {
            setters.push(quote! {
                record.validator = Some(#calmform::form::FieldValidator::new(#pattern, #message)?);
            });
        }

        record_builders.push(quote! {
            {
                #[allow(unused_mut)]
                let mut record = #calmform::form::FieldRecord::new(
                    #calmform::form::FieldType::to_field_value(&self.#field_ident),
                );
                #(#setters)*
                fields.insert(#field_name, record);
            }
        });
        readers.push(quote! {
            #field_ident: #calmform::form::__private::read_field(fields, #field_name)?,
        });
        names.push(field_name);
    }

    quote! {
        impl #calmform::form::FormModel for #model_ident {
            fn field_names() -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn to_fields(&self) -> #calmform::form::FormResult<#calmform::form::FieldSet> {
                let mut fields = #calmform::form::FieldSet::new();
                #(#record_builders)*
                Ok(fields)
            }

            fn from_fields(
                fields: &#calmform::form::FieldSet,
            ) -> #calmform::form::FormResult<Self> {
                Ok(Self {
                    #(#readers)*
                })
            }
        }
    }
    .into()
}

#[derive(Default)]
struct FieldAttrs {
    required: bool,
    required_error: Option<LitStr>,
    depends_on: Option<LitStr>,
    validator: Option<(LitStr, LitStr)>,
}

impl FieldAttrs {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut attrs = Self::default();
        let mut pattern = None;
        let mut message = None;

        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("form")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("required") {
                    attrs.required = true;
                } else if meta.path.is_ident("required_error") {
                    attrs.required_error = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("depends_on") {
                    attrs.depends_on = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("pattern") {
                    pattern = Some(meta.value()?.parse::<LitStr>()?);
                } else if meta.path.is_ident("message") {
                    message = Some(meta.value()?.parse::<LitStr>()?);
                } else {
                    return Err(meta.error("unsupported form attribute"));
                }
                Ok(())
            })?;
        }

        attrs.validator = match (pattern, message) {
            (Some(pattern), Some(message)) => Some((pattern, message)),
            (None, None) => None,
            (Some(pattern), None) => {
                return Err(syn::Error::new_spanned(
                    pattern,
                    "`pattern` requires a `message`",
                ));
            }
            (None, Some(message)) => {
                return Err(syn::Error::new_spanned(
                    message,
                    "`message` requires a `pattern`",
                ));
            }
        };
        Ok(attrs)
    }
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::calmform),
    }
}
