//! Contract-description JSON reader.
//!
//! This module owns no type grammar of its own: it only re-renders the
//! JSON `{type, components}` shape into the textual parameter-list form
//! `param.rs` already parses, then hands the whole thing to
//! [`parse_signature`].

use crate::error::AbiError;
use crate::param::{parse_signature, ItemKind, Signature};
use serde_json::Value as Json;

/// Parses one contract-description item (as produced by `solc --abi` or
/// equivalent) into a [`Signature`].
pub fn signature_from_json(item: &Json) -> Result<Signature, AbiError> {
    let item_type = item.get("type").and_then(Json::as_str).unwrap_or("function");
    let kind = item_kind(item_type)?;
    let name = item.get("name").and_then(Json::as_str).unwrap_or("").to_string();

    let inputs = item.get("inputs").and_then(Json::as_array).cloned().unwrap_or_default();
    let mut text = format!("{name}{}", render_param_list(&inputs)?);

    if kind == ItemKind::Function {
        if let Some(outputs) = item.get("outputs").and_then(Json::as_array) {
            text.push_str(" returns ");
            text.push_str(&render_param_list(outputs)?);
        }
    }
    if kind == ItemKind::Event && item.get("anonymous").and_then(Json::as_bool).unwrap_or(false) {
        text.push_str(" anonymous");
    }

    parse_signature(kind, &text).map_err(AbiError::from)
}

fn item_kind(item_type: &str) -> Result<ItemKind, AbiError> {
    match item_type {
        "function" => Ok(ItemKind::Function),
        "event" => Ok(ItemKind::Event),
        "error" => Ok(ItemKind::Error),
        "constructor" => Ok(ItemKind::Constructor),
        "fallback" => Ok(ItemKind::Fallback),
        "receive" => Ok(ItemKind::Receive),
        other => Err(AbiError::Json(format!("unknown item type '{other}'"))),
    }
}

fn render_param_list(items: &[Json]) -> Result<String, AbiError> {
    let parts = items.iter().map(render_param_entry).collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", parts.join(", ")))
}

/// Renders one JSON parameter/component object as a fragment of the
/// textual parameter-list grammar: `<type>[ indexed][ name]`. A `tuple`
/// (or `tuple[]`, `tuple[3]`, ...) type is expanded from its
/// `components` array into the grammar's parenthesised tuple form.
fn render_param_entry(item: &Json) -> Result<String, AbiError> {
    let raw_type = item
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| AbiError::Json("parameter object missing 'type'".to_string()))?;

    let type_text = if let Some(array_suffix) = raw_type.strip_prefix("tuple") {
        let components = item
            .get("components")
            .and_then(Json::as_array)
            .ok_or_else(|| AbiError::Json(format!("tuple type '{raw_type}' missing 'components'")))?;
        let inner = components.iter().map(render_param_entry).collect::<Result<Vec<_>, _>>()?.join(", ");
        format!("({inner}){array_suffix}")
    } else {
        raw_type.to_string()
    };

    let mut text = type_text;
    if item.get("indexed").and_then(Json::as_bool).unwrap_or(false) {
        text.push_str(" indexed");
    }
    if let Some(name) = item.get("name").and_then(Json::as_str) {
        if !name.is_empty() {
            text.push(' ');
            text.push_str(name);
        }
    }
    Ok(text)
}
