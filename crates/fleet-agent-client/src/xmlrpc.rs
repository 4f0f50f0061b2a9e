// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal XML-RPC request encoding and lenient response decoding.
//!
//! We do not pull in a general-purpose XML-RPC crate: the agent
//! implementations encountered in the wild vary in whitespace and member
//! ordering, so the decoder deliberately scans for the shapes we care
//! about rather than parsing a strict DOM. This is the contract, not a
//! shortcut — a stricter parser has repeatedly broken on real agents.

use crate::error::TransportError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// One positional argument of an XML-RPC call.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    #[allow(dead_code)]
    Double(f64),
    Bool(bool),
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Value {
    fn to_xml(&self) -> String {
        match self {
            Value::Str(s) => format!("<value><string>{}</string></value>", escape_xml(s)),
            Value::Int(n) => format!("<value><int>{n}</int></value>"),
            Value::Double(n) => format!("<value><double>{n}</double></value>"),
            Value::Bool(b) => format!("<value><boolean>{}</boolean></value>", if *b { 1 } else { 0 }),
        }
    }
}

/// Build a `<methodCall>` body for `method` with positional `params`.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut body = String::new();
    body.push_str("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    body.push_str(method);
    body.push_str("</methodName><params>");
    for p in params {
        body.push_str("<param>");
        body.push_str(&p.to_xml());
        body.push_str("</param>");
    }
    body.push_str("</params></methodCall>");
    body
}

static FAULT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<fault>.*?</fault>").expect("constant regex is valid"));
static FAULT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<name>\s*faultCode\s*</name>\s*<value>\s*(?:<int>)?\s*(-?\d+)").expect("constant regex is valid"));
static FAULT_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<name>\s*faultString\s*</name>\s*<value>\s*(?:<string>)?\s*(.*?)\s*(?:</string>)?\s*</value>")
        .expect("constant regex is valid")
});

/// Top-level response classification: either the single `<param><value>`
/// body (returned raw for the caller to parse further) or a fault.
pub enum RpcResponse {
    Success(String),
    Fault { code: i64, message: String },
}

/// Scan a response body for a fault block first, falling back to the
/// success shape. Malformed bodies become a descriptive [`TransportError`].
pub fn parse_response(xml: &str) -> Result<RpcResponse, TransportError> {
    if let Some(fault_block) = FAULT_BLOCK.find(xml) {
        let block = fault_block.as_str();
        let code = FAULT_CODE
            .captures(block)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .ok_or_else(|| TransportError::Xml("fault missing faultCode".into()))?;
        let message = FAULT_STRING
            .captures(block)
            .and_then(|c| c.get(1))
            .map(|m| unescape_xml(m.as_str()))
            .unwrap_or_default();
        return Ok(RpcResponse::Fault { code, message });
    }
    if xml.contains("<methodResponse>") {
        return Ok(RpcResponse::Success(xml.to_string()));
    }
    Err(TransportError::Xml("not a methodResponse".into()))
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

static STRUCT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<struct>(.*?)</struct>").expect("constant regex is valid"));
static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<member>\s*<name>([a-zA-Z0-9_]+)</name>\s*<value>\s*(?:<(\w+)>)?(.*?)(?:</\w+>)?\s*</value>\s*</member>",
    )
    .expect("constant regex is valid")
});

/// Scan every `<member>` of the first `<struct>` block found, returning
/// `name -> raw text value`. Missing members are simply absent from the
/// map; callers supply their own defaults.
pub fn parse_struct_members(xml: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(block) = STRUCT_BLOCK.captures(xml) else {
        return out;
    };
    let inner = &block[1];
    for caps in MEMBER.captures_iter(inner) {
        let name = caps[1].to_string();
        let value = unescape_xml(caps[3].trim());
        out.insert(name, value);
    }
    out
}

/// Scan every `<struct>` block inside an `<array>` (the shape
/// `getAllProcessInfo` returns), each parsed the same way as
/// [`parse_struct_members`].
pub fn parse_array_of_structs(xml: &str) -> Vec<HashMap<String, String>> {
    STRUCT_BLOCK
        .captures_iter(xml)
        .map(|caps| {
            let mut map = HashMap::new();
            for member in MEMBER.captures_iter(&caps[1]) {
                map.insert(member[1].to_string(), unescape_xml(member[3].trim()));
            }
            map
        })
        .collect()
}

/// Parse the three-element array response of `tailProcess{Stdout,Stderr}Log`:
/// `[bytes, nextOffset, overflow]`.
pub fn parse_tail_response(xml: &str) -> Result<(String, i64, bool), TransportError> {
    static VALUES: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<value>\s*(?:<string>)?(.*?)(?:</string>)?\s*</value>")
            .expect("constant regex is valid")
    });
    let values: Vec<String> = VALUES
        .captures_iter(xml)
        .map(|c| unescape_xml(c[1].trim()))
        .collect();
    if values.len() < 3 {
        return Err(TransportError::Xml(format!(
            "expected 3 values in tail response, got {}",
            values.len()
        )));
    }
    let bytes = values[0].clone();
    let next_offset: i64 = values[1]
        .trim_start_matches("<int>")
        .trim_end_matches("</int>")
        .parse()
        .map_err(|_| TransportError::Xml("non-integer offset in tail response".into()))?;
    let overflow = values[2].contains('1');
    Ok((bytes, next_offset, overflow))
}

#[cfg(test)]
#[path = "xmlrpc_tests.rs"]
mod tests;
