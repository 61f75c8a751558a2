//! The parameter tree: [`Param`] nodes, parsing of parenthesised parameter
//! lists, and [`Signature`] nodes for functions/events/errors.

use crate::error::{GrammarError, ParamError};
use crate::grammar::{extract_balanced, split_top_level, ArrayLength, ParamType};

/// A single parameter descriptor: position among siblings, optional name,
/// canonical type, `indexed` flag (events only) and, when the base type is
/// a tuple, the child component nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub position: usize,
    pub name: String,
    pub abi_type: ParamType,
    pub indexed: bool,
    pub components: Vec<Param>,
}

impl Param {
    /// Builds a `Param`, checking `components` against the tuple arity
    /// `abi_type` declares (through any number of array wrappers): a type
    /// with no tuple underneath it must come with zero components, and a
    /// tuple-bearing one must come with exactly as many as it declares.
    /// Supplying an inconsistent list here is a programmer error and is
    /// rejected rather than silently accepted.
    pub fn new(
        position: usize,
        name: String,
        abi_type: ParamType,
        indexed: bool,
        components: Vec<Param>,
    ) -> Result<Param, ParamError> {
        let declared = abi_type.tuple_arity(true).unwrap_or(0);
        if components.len() != declared {
            return Err(ParamError::InconsistentComponents { declared, given: components.len() });
        }
        Ok(Param { position, name, abi_type, indexed, components })
    }

    pub fn is_array(&self) -> bool {
        self.abi_type.is_array()
    }

    pub fn is_tuple(&self) -> bool {
        self.abi_type.is_tuple(true)
    }

    pub fn is_dynamic(&self) -> bool {
        self.abi_type.is_dynamic()
    }

    /// Array dimensions, outer-first.
    pub fn array_dims(&self) -> Vec<ArrayLength> {
        let mut dims = self.abi_type.array_dims();
        dims.reverse();
        dims
    }

    /// Canonical inputs-signature-style rendering of this node's type:
    /// no whitespace, no name, no `indexed` marker.
    pub fn canonical_type(&self) -> String {
        self.abi_type.canonical()
    }

    /// A synthetic node describing one element of this array, with array
    /// suffix unwrapped one level and tuple components (if any) carried
    /// through unchanged, since they describe the eventual tuple base
    /// however many array levels still wrap it. Used when recursing into
    /// array members during validation, encoding and decoding.
    pub fn element(&self, position: usize) -> Param {
        let inner = self
            .abi_type
            .array_inner()
            .expect("element() called on a non-array parameter")
            .clone();
        Param { position, name: String::new(), abi_type: inner, indexed: false, components: self.components.clone() }
    }

    /// Pretty rendering including name and, when set, the `indexed`
    /// marker; used for diagnostics and round-tripping human-authored
    /// signatures.
    pub fn pretty(&self) -> String {
        let base = if !self.components.is_empty() {
            format!(
                "({})",
                self.components.iter().map(Param::pretty).collect::<Vec<_>>().join(", ")
            )
        } else {
            self.abi_type.array_base().canonical()
        };
        let suffix: String = self
            .abi_type
            .array_dims()
            .iter()
            .map(|d| match d {
                ArrayLength::Fixed(n) => format!("[{n}]"),
                ArrayLength::Dynamic => "[]".to_string(),
            })
            .collect();
        let indexed = if self.indexed { " indexed" } else { "" };
        let name = if self.name.is_empty() { String::new() } else { format!(" {}", self.name) };
        format!("{base}{suffix}{indexed}{name}")
    }
}

/// Parses a parenthesised parameter list such as
/// `(string name, (uint256 value, bool valid) ticket)` or an
/// event-flavoured one like `(bytes32 indexed uid, address to)`. Accepts
/// redundant whitespace anywhere.
pub fn parse_parameters(text: &str) -> Result<Vec<Param>, ParamError> {
    let trimmed = text.trim();
    if !trimmed.starts_with('(') || !trimmed.ends_with(')') {
        return Err(ParamError::NotAParameterList(text.to_string()));
    }
    let inside = &trimmed[1..trimmed.len() - 1];
    parse_param_list_items(inside)
}

fn parse_param_list_items(inside: &str) -> Result<Vec<Param>, ParamError> {
    let items = split_top_level(inside)?;
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| parse_param_item(position, item))
        .collect()
}

fn parse_param_item(position: usize, raw: &str) -> Result<Param, ParamError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ParamError::UnexpectedToken("<empty parameter>".to_string()));
    }

    let (components, base_canonical, mut rest): (Vec<Param>, String, &str) = if s.starts_with('(') {
        let (inside, rest) = extract_balanced(s, '(', ')')?;
        let comps = parse_param_list_items(inside)?;
        let canonical = format!(
            "({})",
            comps.iter().map(|c| c.abi_type.canonical()).collect::<Vec<_>>().join(",")
        );
        (comps, canonical, rest)
    } else {
        let ident_end = s.find(|c: char| c == '[' || c.is_whitespace()).unwrap_or(s.len());
        let (ident, rest) = s.split_at(ident_end);
        if ident.is_empty() {
            return Err(ParamError::UnexpectedToken(s.to_string()));
        }
        (Vec::new(), ident.to_string(), rest)
    };

    let mut dims_suffix = String::new();
    loop {
        let trimmed_rest = rest.trim_start();
        if let Some(after_bracket) = trimmed_rest.strip_prefix('[') {
            let close = after_bracket
                .find(']')
                .ok_or_else(|| GrammarError::UnbalancedDelimiters(s.to_string()))?;
            let (dim, remainder) = after_bracket.split_at(close);
            dims_suffix.push('[');
            dims_suffix.push_str(dim);
            dims_suffix.push(']');
            rest = &remainder[1..];
        } else {
            rest = trimmed_rest;
            break;
        }
    }

    let type_text = format!("{base_canonical}{dims_suffix}");
    let abi_type = ParamType::parse(&type_text)?;

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let (indexed, name) = match tokens.as_slice() {
        [] => (false, String::new()),
        ["indexed"] => (true, String::new()),
        ["indexed", name] => (true, (*name).to_string()),
        [name] => (false, (*name).to_string()),
        _ => return Err(ParamError::UnexpectedToken(rest.to_string())),
    };

    Param::new(position, name, abi_type, indexed, components)
}

/// The kind of ABI item a [`Signature`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Function,
    Event,
    Error,
    Constructor,
    Fallback,
    Receive,
}

/// A function, event, error or constructor signature: name, input
/// parameters, optional output parameters (functions only) and the
/// anonymous flag (events only).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    pub kind: ItemKind,
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Option<Vec<Param>>,
    pub anonymous: bool,
}

impl Signature {
    /// `<name>` concatenated with the canonical textual rendering of the
    /// input list.
    pub fn canonical_inputs(&self) -> String {
        canonical_inputs(&self.name, &self.inputs)
    }

    /// The canonical textual rendering of the output list, enclosed in
    /// parentheses even when empty; `None` for non-function items.
    pub fn canonical_outputs(&self) -> Option<String> {
        self.outputs.as_ref().map(|outputs| canonical_outputs(outputs))
    }
}

/// `<name>(<canonical input types>)`.
pub fn canonical_inputs(name: &str, inputs: &[Param]) -> String {
    let types = inputs.iter().map(|p| p.abi_type.canonical()).collect::<Vec<_>>().join(",");
    format!("{name}({types})")
}

/// `(<canonical output types>)`, parentheses present even for an empty
/// list.
pub fn canonical_outputs(outputs: &[Param]) -> String {
    let types = outputs.iter().map(|p| p.abi_type.canonical()).collect::<Vec<_>>().join(",");
    format!("({types})")
}

/// Parses a signature of the form `name(inputs)[ returns (outputs)][ anonymous]`.
pub fn parse_signature(kind: ItemKind, text: &str) -> Result<Signature, ParamError> {
    let text = text.trim();
    let open = text.find('(').ok_or_else(|| ParamError::NotAParameterList(text.to_string()))?;
    let name = text[..open].trim().to_string();
    let (inside, mut rest) = extract_balanced(&text[open..], '(', ')')?;
    let inputs = parse_param_list_items(inside)?;

    let mut outputs = None;
    rest = rest.trim_start();
    if let Some(after_returns) = rest.strip_prefix("returns") {
        let after_returns = after_returns.trim_start();
        if !after_returns.starts_with('(') {
            return Err(ParamError::UnexpectedToken(rest.to_string()));
        }
        let (out_inside, out_rest) = extract_balanced(after_returns, '(', ')')?;
        outputs = Some(parse_param_list_items(out_inside)?);
        rest = out_rest.trim_start();
    }

    let mut anonymous = false;
    if !rest.is_empty() {
        if rest == "anonymous" {
            anonymous = true;
        } else {
            return Err(ParamError::UnexpectedToken(rest.to_string()));
        }
    }

    validate_signature(kind, &inputs, &outputs, anonymous)?;
    Ok(Signature { kind, name, inputs, outputs, anonymous })
}

fn validate_signature(
    kind: ItemKind,
    inputs: &[Param],
    outputs: &Option<Vec<Param>>,
    anonymous: bool,
) -> Result<(), ParamError> {
    let any_indexed = inputs.iter().any(|p| p.indexed);
    if kind != ItemKind::Event && any_indexed {
        return Err(ParamError::IndexedOnNonEvent);
    }
    if kind != ItemKind::Function && outputs.is_some() {
        return Err(ParamError::UnexpectedToken("returns".to_string()));
    }
    if let Some(outs) = outputs {
        if outs.iter().any(|p| p.indexed) {
            return Err(ParamError::IndexedOnNonEvent);
        }
    }
    if kind != ItemKind::Event && anonymous {
        return Err(ParamError::UnexpectedToken("anonymous".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_list() {
        let params = parse_parameters("(uint256 amount, bool ok)").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].abi_type, ParamType::Uint(256));
        assert_eq!(params[0].name, "amount");
        assert_eq!(params[1].abi_type, ParamType::Bool);
    }

    #[test]
    fn parses_nested_tuple_with_names() {
        let params =
            parse_parameters("(string name, (uint256 value, bool valid) ticket)").unwrap();
        assert_eq!(params.len(), 2);
        assert!(params[1].is_tuple());
        assert_eq!(params[1].components.len(), 2);
        assert_eq!(params[1].components[0].name, "value");
        assert_eq!(params[1].canonical_type(), "(uint256,bool)");
    }

    #[test]
    fn parses_event_indexed() {
        let params = parse_parameters("(bytes32 indexed uid, address to)").unwrap();
        assert!(params[0].indexed);
        assert!(!params[1].indexed);
        assert_eq!(params[0].name, "uid");
    }

    #[test]
    fn empty_parameter_list() {
        let params = parse_parameters("()").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn parses_array_of_tuples() {
        let params = parse_parameters("((uint256 a, bool b)[] xs)").unwrap();
        assert_eq!(params[0].abi_type, ParamType::Array(Box::new(ParamType::Tuple(vec![ParamType::Uint(256), ParamType::Bool]))));
        assert_eq!(params[0].components.len(), 2);
    }

    #[test]
    fn rejects_inconsistent_components() {
        let err = Param::new(0, "x".to_string(), ParamType::Tuple(vec![ParamType::Bool, ParamType::Bool]), false, vec![])
            .unwrap_err();
        assert_eq!(err, ParamError::InconsistentComponents { declared: 2, given: 0 });

        let bogus_component = parse_parameters("(bool b)").unwrap().remove(0);
        let err = Param::new(0, "x".to_string(), ParamType::Uint(256), false, vec![bogus_component]).unwrap_err();
        assert_eq!(err, ParamError::InconsistentComponents { declared: 0, given: 1 });
    }

    #[test]
    fn signature_round_trip() {
        let sig = parse_signature(
            ItemKind::Function,
            "transfer(address to, uint256 amount) returns (bool)",
        )
        .unwrap();
        assert_eq!(sig.canonical_inputs(), "transfer(address,uint256)");
        assert_eq!(sig.canonical_outputs().unwrap(), "(bool)");
    }

    #[test]
    fn event_signature_with_indexed_and_anonymous() {
        let sig = parse_signature(
            ItemKind::Event,
            "Transfer(address indexed from, address indexed to, uint256 value) anonymous",
        )
        .unwrap();
        assert!(sig.anonymous);
        assert!(sig.inputs[0].indexed);
        assert_eq!(sig.canonical_inputs(), "Transfer(address,address,uint256)");
    }

    #[test]
    fn rejects_indexed_on_function() {
        let err = parse_signature(ItemKind::Function, "foo(uint256 indexed a)").unwrap_err();
        assert_eq!(err, ParamError::IndexedOnNonEvent);
    }
}
