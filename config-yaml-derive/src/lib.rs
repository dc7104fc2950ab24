//! `#[derive(YamlStruct)]`: a hand-rolled token-tree walk rather than a
//! `syn`-based derive, matching the teacher's original approach. Reads
//! `#[field(default = "...")]` attributes and emits a `FromYaml` impl that
//! pulls each field out of a `YamlValue::Map` by name.

extern crate proc_macro;
use proc_macro::{Delimiter, TokenStream, TokenTree};

#[proc_macro_derive(YamlStruct, attributes(field))]
pub fn derive_yaml_struct(input: TokenStream) -> TokenStream {
    let tokens: Vec<TokenTree> = input.into_iter().collect();
    let mut struct_name = String::new();
    let mut fields = Vec::new();
    let mut pending_default = None;

    for i in 0..tokens.len() {
        if let TokenTree::Ident(ref ident) = tokens[i] {
            if ident.to_string() == "struct" {
                if let Some(TokenTree::Ident(name)) = tokens.get(i + 1) {
                    struct_name = name.to_string();
                }
            }
        }

        if let TokenTree::Group(ref group) = tokens[i] {
            if group.delimiter() == Delimiter::Brace {
                let inner: Vec<TokenTree> = group.stream().into_iter().collect();
                for j in 0..inner.len() {
                    if let TokenTree::Punct(ref p) = inner[j] {
                        if p.as_char() == '#' {
                            if let Some(TokenTree::Group(g)) = inner.get(j + 1) {
                                if g.delimiter() == Delimiter::Bracket {
                                    let attr_tokens: Vec<TokenTree> =
                                        g.stream().into_iter().collect();
                                    if attr_tokens.len() >= 2 {
                                        if let TokenTree::Ident(ref attr_ident) = attr_tokens[0] {
                                            if attr_ident.to_string() == "field" {
                                                if let TokenTree::Group(ref attr_group) =
                                                    attr_tokens[1]
                                                {
                                                    if attr_group.delimiter()
                                                        == Delimiter::Parenthesis
                                                    {
                                                        let attr_inner: Vec<TokenTree> =
                                                            attr_group.stream().into_iter().collect();
                                                        for k in 0..attr_inner.len() {
                                                            if let TokenTree::Ident(
                                                                ref key_ident,
                                                            ) = attr_inner[k]
                                                            {
                                                                if key_ident.to_string()
                                                                    == "default"
                                                                {
                                                                    if let Some(
                                                                        TokenTree::Punct(
                                                                            ref eq_punct,
                                                                        ),
                                                                    ) = attr_inner.get(k + 1)
                                                                    {
                                                                        if eq_punct.as_char()
                                                                            == '='
                                                                        {
                                                                            if let Some(
                                                                                TokenTree::Literal(
                                                                                    ref lit,
                                                                                ),
                                                                            ) = attr_inner
                                                                                .get(k + 2)
                                                                            {
                                                                                pending_default =
                                                                                    Some(
                                                                                        lit.to_string(
                                                                                        ),
                                                                                    );
                                                                            }
                                                                        }
                                                                    }
                                                                }
                                                            }
                                                        }
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                            continue;
                        }
                    }

                    if let TokenTree::Punct(ref p) = inner[j] {
                        if p.as_char() == ':' && j > 0 {
                            if let TokenTree::Ident(ref field_ident) = inner[j - 1] {
                                let field_name = field_ident.to_string();
                                if field_name != "pub" && field_name != "crate" {
                                    let mut is_option = false;
                                    let mut k = j + 1;
                                    while k < inner.len() {
                                        let token_str = inner[k].to_string();
                                        if token_str == "," {
                                            break;
                                        }
                                        if token_str == "Option" {
                                            is_option = true;
                                            break;
                                        }
                                        k += 1;
                                    }
                                    fields.push((field_name, is_option, pending_default.take()));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    let mut generated = format!(
        "impl config_yaml::FromYaml for {name} {{
            fn from_yaml(value: &config_yaml::YamlValue) -> std::result::Result<Self, config_yaml::YamlError> {{
                if let config_yaml::YamlValue::Map(m) = value {{
                    std::result::Result::Ok(Self {{",
        name = struct_name
    );
    for (field, is_option, default_value) in fields {
        if is_option {
            generated.push_str(&format!(
                "{field}: match m.get(\"{field}\") {{
                        std::option::Option::Some(v) => std::option::Option::Some(config_yaml::FromYaml::from_yaml(v)?),
                        std::option::Option::None => std::option::Option::None,
                    }},",
                field = field
            ));
        } else if let Some(def) = default_value {
            let clean_def = def.trim_matches('"').replace('\\', "\\\\").replace('"', "\\\"");
            generated.push_str(&format!(
                "{field}: match m.get(\"{field}\") {{
                        std::option::Option::Some(v) => config_yaml::FromYaml::from_yaml(v)?,
                        std::option::Option::None => {{
                            let mut p = config_yaml::Parser::new(\"{clean_def}\")?;
                            let default_yaml = p.parse()?;
                            config_yaml::FromYaml::from_yaml(&default_yaml)?
                        }}
                    }},",
                field = field,
                clean_def = clean_def
            ));
        } else {
            generated.push_str(&format!(
                "{field}: config_yaml::FromYaml::from_yaml(m.get(\"{field}\").ok_or_else(|| \
                    config_yaml::YamlError::from(std::format!(\"missing required field: {field}\")))?)?,",
                field = field
            ));
        }
    }

    generated.push_str(
        "}) } else { std::result::Result::Err(config_yaml::YamlError::from(std::string::String::from(\"expected a map\"))) } } }",
    );

    generated.parse().expect("generated FromYaml impl was not valid Rust")
}
