use swc_core::ecma::atoms::JsWord;
use crate::{ObfuscateError, StructuralError};
use crate::obfuscate::rename::names::NameRegistry;
use super::encoding::{ALPHABET, Encoding};
use super::rotation::Rotation;

/// Globals the runtime block calls. Generated names never take them.
pub const GLOBALS_USED: &[&str] = &["parseInt", "decodeURIComponent", "String", "undefined"];

/// Returns the pool array, memoized after the first call.
const ARRAY_FUNCTION: &str = "
function {arrayFn}() {
    var {values} = {literal};
    {arrayFn} = function () {
        return {values};
    };
    return {arrayFn}();
}
";

/// Returns the entry at `index - shift`, decoded.
const ACCESSOR: &str = "
function {accessor}({index}) {
    var {values} = {arrayFn}();
    {accessor} = function ({index}) {
        {index} = {index} - {shift};
        var {value} = {values}[{index}];
        {decode}
        return {value};
    };
    return {accessor}({index});
}
";

/// Installs the decoders on the accessor once, then decodes `{value}` through a
/// cache keyed by the encoded entry, which stays valid while the array rotates.
const DECODE: &str = "
if ({accessor}.{initialized} === undefined) {
    {accessor}.{atob} = function ({input}) {
        var {chars} = '{alphabet}', {output} = '';
        for (var {counter} = 0, {bits}, {buffer}, {position} = 0; {buffer} = {input}.charAt({position}++); ~{buffer} && ({bits} = {counter} % 4 ? {bits} * 64 + {buffer} : {buffer}, {counter}++ % 4) ? {output} += String.fromCharCode(255 & {bits} >> (-2 * {counter} & 6)) : 0) {
            {buffer} = {chars}.indexOf({buffer});
        }
        return {output};
    };
    {accessor}.{utf8} = function ({bytes}) {
        var {escaped} = '';
        for (var {position} = 0; {position} < {bytes}.length; {position}++) {
            {escaped} += '%' + ('00' + {bytes}.charCodeAt({position}).toString(16)).slice(-2);
        }
        return decodeURIComponent({escaped});
    };
    {rc4Function}
    {accessor}.{cache} = {};
    {accessor}.{initialized} = !![];
}
var {cached} = {accessor}.{cache}[{value}];
if ({cached} === undefined) {
    {cached} = {decodeExpr};
    {accessor}.{cache}[{value}] = {cached};
}
{value} = {cached};
";

/// RC4 over a byte string with an ASCII key.
const RC4: &str = "
{accessor}.{rc4} = function ({data}, {key}) {
    var {state} = [], {second} = 0, {swap}, {result} = '';
    for (var {first} = 0; {first} < 256; {first}++) {
        {state}[{first}] = {first};
    }
    for ({first} = 0; {first} < 256; {first}++) {
        {second} = ({second} + {state}[{first}] + {key}.charCodeAt({first} % {key}.length)) % 256;
        {swap} = {state}[{first}];
        {state}[{first}] = {state}[{second}];
        {state}[{second}] = {swap};
    }
    {first} = 0;
    {second} = 0;
    for (var {offset} = 0; {offset} < {data}.length; {offset}++) {
        {first} = ({first} + 1) % 256;
        {second} = ({second} + {state}[{first}]) % 256;
        {swap} = {state}[{first}];
        {state}[{first}] = {state}[{second}];
        {state}[{second}] = {swap};
        {result} += String.fromCharCode({data}.charCodeAt({offset}) ^ {state}[({state}[{first}] + {state}[{second}]) % 256]);
    }
    return {result};
};
";

/// Rotates the array left until the checksum over the marker entries
/// equals the control value.
const COMPARATOR: &str = "
(function ({getArray}, {control}) {
    var {rotated} = {getArray}();
    while (!![]) {
        try {
            var {probe} = {checksum};
            if ({probe} === {control}) break;
            else {rotated}['push']({rotated}['shift']());
        } catch ({error}) {
            {rotated}['push']({rotated}['shift']());
        }
    }
}({arrayFn}, {controlValue}));
";

/// Placeholders that receive a fresh name each.
const LOCALS: &[&str] = &[
    "values", "index", "value", "initialized", "atob", "input", "chars", "output", "counter",
    "bits", "buffer", "position", "utf8", "bytes", "escaped", "cache", "cached", "rc4", "data",
    "key", "state", "second", "swap", "result", "first", "offset", "getArray", "control",
    "rotated", "probe", "error"
];

/// Everything the runtime block is rendered from.
#[derive(Debug)]
pub struct Runtime<'a> {
    pub array_fn: &'a JsWord,
    pub accessor: &'a JsWord,
    pub shift: usize,
    pub encoding: &'a Encoding,
    pub rotation: Option<&'a Rotation>
}

/// Replaces every `{name}` placeholder.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |code, (name, value)| {
        code.replace(&format!("{{{}}}", name), value)
    })
}

/// Renders the runtime block as JavaScript.
/// `entries` are the encoded values in emitted (rotated) order.
pub fn render(runtime: &Runtime, entries: &[String], names: &mut NameRegistry) -> Result<String, ObfuscateError> {
    let mut code = String::new();
    code.push_str(ARRAY_FUNCTION);
    code.push_str(ACCESSOR);
    if runtime.rotation.is_some() {
        code.push_str(COMPARATOR);
    }

    // Snippets go in first so that their placeholders are filled with the rest
    let decode = match runtime.encoding {
        Encoding::None => String::new(),
        Encoding::Base64 => fill(DECODE, &[
            ("rc4Function", String::new()),
            ("decodeExpr", String::from("{accessor}.{utf8}({accessor}.{atob}({value}))"))
        ]),
        Encoding::Rc4 { key } => fill(DECODE, &[
            ("rc4Function", String::from(RC4)),
            ("decodeExpr", format!("{{accessor}}.{{utf8}}({{accessor}}.{{rc4}}({{accessor}}.{{atob}}({{value}}), '{}'))", key))
        ])
    };
    code = fill(&code, &[("decode", decode)]);

    let mut values: Vec<(&str, String)> = vec![
        ("arrayFn", runtime.array_fn.to_string()),
        ("accessor", runtime.accessor.to_string()),
        ("shift", runtime.shift.to_string()),
        ("alphabet", String::from(ALPHABET))
    ];
    if let Some(rotation) = runtime.rotation {
        values.push(("checksum", checksum(rotation, runtime)));
        values.push(("controlValue", rotation.control.to_string()));
    }
    for local in LOCALS {
        values.push((*local, names.fresh()?.to_string()));
    }
    code = fill(&code, &values);

    // Entries last, their text is never scanned for placeholders
    let literal = entries.iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| StructuralError::Template(e.to_string()))?;
    code = fill(&code, &[("literal", format!("[{}]", literal.join(", ")))]);

    Ok(code)
}

/// `parseInt(acc(i)) / d + -parseInt(acc(j)) / e + ...`
fn checksum(rotation: &Rotation, runtime: &Runtime) -> String {
    rotation.markers.iter()
        .map(|marker| format!(
            "{}parseInt({}({})) / {}",
            if marker.negative { "-" } else { "" },
            runtime.accessor,
            marker.index + runtime.shift,
            marker.divisor
        ))
        .collect::<Vec<String>>()
        .join(" + ")
}
