use crate::table::Table;
use crate::value::Value;
use std::cmp::Ordering;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Register every native operation. Builtins are lenient in the original's
/// style: a bad argument produces a sentinel (null, 0, false, or an empty
/// aggregate) rather than an error.
pub fn register(table: &mut Table) {
    PROCESS_START.get_or_init(Instant::now);

    // Core
    table.set("str", Value::Builtin(bi_str));
    table.set("toString", Value::Builtin(bi_str));
    table.set("len", Value::Builtin(bi_len));
    table.set("push", Value::Builtin(bi_push));
    table.set("pop", Value::Builtin(bi_pop));
    table.set("range", Value::Builtin(bi_range));
    table.set("int", Value::Builtin(bi_int));
    table.set("float", Value::Builtin(bi_float));
    table.set("number", Value::Builtin(bi_number));
    table.set("input", Value::Builtin(bi_input));
    table.set("split", Value::Builtin(bi_split));
    table.set("join", Value::Builtin(bi_join));
    table.set("slice", Value::Builtin(bi_slice));
    table.set("keys", Value::Builtin(bi_keys));
    table.set("values", Value::Builtin(bi_values));
    table.set("has", Value::Builtin(bi_has));
    table.set("delete", Value::Builtin(bi_delete));

    // map/filter/reduce run in the evaluator because they call back into
    // user code; these registrations catch the unresolvable-argument case.
    table.set("map", Value::Builtin(bi_null));
    table.set("filter", Value::Builtin(bi_null));
    table.set("reduce", Value::Builtin(bi_null));

    // Math
    table.set("abs", Value::Builtin(bi_abs));
    table.set("floor", Value::Builtin(bi_floor));
    table.set("ceil", Value::Builtin(bi_ceil));
    table.set("round", Value::Builtin(bi_round));
    table.set("min", Value::Builtin(bi_min));
    table.set("max", Value::Builtin(bi_max));
    table.set("pow", Value::Builtin(bi_pow));
    table.set("sqrt", Value::Builtin(bi_sqrt));

    // Type introspection
    table.set("type", Value::Builtin(bi_type));

    // String methods
    table.set("__method_upper", Value::Builtin(bi_method_upper));
    table.set("__method_lower", Value::Builtin(bi_method_lower));
    table.set("__method_trim", Value::Builtin(bi_method_trim));
    table.set("__method_contains", Value::Builtin(bi_method_contains));
    table.set("__method_replace", Value::Builtin(bi_method_replace));
    table.set("__method_indexOf", Value::Builtin(bi_method_index_of));

    // Array methods
    table.set("__method_includes", Value::Builtin(bi_method_includes));
    table.set("__method_flat", Value::Builtin(bi_method_flat));
    table.set("__method_concat", Value::Builtin(bi_method_concat));
    table.set("__method_push", Value::Builtin(bi_push));
    table.set("__method_pop", Value::Builtin(bi_pop));
    table.set("__method_length", Value::Builtin(bi_method_length));

    // Object methods
    table.set("__method_keys", Value::Builtin(bi_keys));
    table.set("__method_values", Value::Builtin(bi_values));
    table.set("__method_has", Value::Builtin(bi_has));

    // File I/O
    table.set("readFile", Value::Builtin(bi_read_file));
    table.set("writeFile", Value::Builtin(bi_write_file));
    table.set("appendFile", Value::Builtin(bi_append_file));

    // HTTP compatibility stubs
    table.set("httpGet", Value::Builtin(bi_http_stub));
    table.set("httpPost", Value::Builtin(bi_http_stub));

    // Serialization
    table.set("jsonParse", Value::Builtin(bi_json_parse));
    table.set("jsonStringify", Value::Builtin(bi_json_stringify));
    table.set("parse", Value::Builtin(bi_json_parse));
    table.set("stringify", Value::Builtin(bi_json_stringify));

    // Time
    table.set("time", Value::Builtin(bi_time));
    table.set("clock", Value::Builtin(bi_clock));

    // Sort/reverse
    table.set("sort", Value::Builtin(bi_sort));
    table.set("reverse", Value::Builtin(bi_reverse));

    // Process
    table.set("exit", Value::Builtin(bi_exit));
}

// ---- helpers ----

fn bi_null(_args: &[Value]) -> Result<Value, String> {
    Ok(Value::Null)
}

fn number_arg(args: &[Value], i: usize) -> Option<f64> {
    args.get(i).and_then(Value::as_number)
}

fn string_arg<'a>(args: &'a [Value], i: usize) -> Option<&'a str> {
    match args.get(i) {
        Some(Value::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Parse the leading numeric prefix of a string, strtod-style. Anything
/// unparseable reads as 0.
fn parse_number_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start {
        return 0.0;
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Clamp a start/end pair with negative-from-end semantics.
fn slice_bounds(len: usize, start: f64, end: Option<f64>) -> (usize, usize) {
    let len = len as i64;
    let mut start = start as i64;
    let mut end = end.map(|e| e as i64).unwrap_or(len);
    if start < 0 {
        start += len;
    }
    if end < 0 {
        end += len;
    }
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    (start, end.max(start))
}

// ---- core ----

fn bi_str(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(value) => Ok(Value::Str(value.to_string())),
        None => Ok(Value::Str(String::new())),
    }
}

fn bi_len(args: &[Value]) -> Result<Value, String> {
    let count = match args.first() {
        Some(Value::Str(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.borrow().len(),
        Some(Value::Object(table)) => table.borrow().len(),
        _ => 0,
    };
    Ok(Value::Int(count as i64))
}

fn bi_push(args: &[Value]) -> Result<Value, String> {
    if let (Some(Value::Array(items)), Some(value)) = (args.first(), args.get(1)) {
        items.borrow_mut().push(value.clone());
    }
    Ok(Value::Null)
}

fn bi_pop(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(Value::Array(items)) => Ok(items.borrow_mut().pop().unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

fn bi_range(args: &[Value]) -> Result<Value, String> {
    let (start, end) = match (number_arg(args, 0), number_arg(args, 1)) {
        (Some(a), Some(b)) => (a as i64, b as i64),
        (Some(a), None) => (0, a as i64),
        _ => return Ok(Value::array(Vec::new())),
    };

    let mut items = Vec::new();
    let mut i = start;
    while i < end {
        items.push(Value::Int(i));
        i += 1;
    }
    Ok(Value::array(items))
}

fn bi_int(args: &[Value]) -> Result<Value, String> {
    let n = match args.first() {
        Some(Value::Int(n)) => return Ok(Value::Int(*n)),
        Some(Value::Double(n)) => *n,
        Some(Value::Str(s)) => parse_number_prefix(s),
        Some(Value::Bool(b)) => return Ok(Value::Int(if *b { 1 } else { 0 })),
        _ => 0.0,
    };
    Ok(Value::Int(n.trunc() as i64))
}

fn bi_float(args: &[Value]) -> Result<Value, String> {
    let n = match args.first() {
        Some(Value::Int(n)) => *n as f64,
        Some(Value::Double(n)) => *n,
        Some(Value::Str(s)) => parse_number_prefix(s),
        _ => 0.0,
    };
    Ok(Value::Double(n))
}

fn bi_number(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(Value::Int(n)) => Ok(Value::Int(*n)),
        Some(Value::Double(n)) => Ok(Value::Double(*n)),
        Some(Value::Str(s)) => Ok(Value::Double(parse_number_prefix(s))),
        Some(Value::Bool(b)) => Ok(Value::Int(if *b { 1 } else { 0 })),
        _ => Ok(Value::Int(0)),
    }
}

fn bi_input(args: &[Value]) -> Result<Value, String> {
    if let Some(prompt) = string_arg(args, 0) {
        print!("{}", prompt);
        std::io::stdout().flush().ok();
    }

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(_) => {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(Value::Str(line))
        }
        Err(_) => Ok(Value::Str(String::new())),
    }
}

// ---- strings ----

fn bi_split(args: &[Value]) -> Result<Value, String> {
    let (s, delim) = match (string_arg(args, 0), string_arg(args, 1)) {
        (Some(s), Some(d)) => (s, d),
        _ => return Ok(Value::array(Vec::new())),
    };

    let parts: Vec<Value> = if delim.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(delim).map(|p| Value::Str(p.to_string())).collect()
    };
    Ok(Value::array(parts))
}

fn bi_join(args: &[Value]) -> Result<Value, String> {
    let (items, sep) = match (args.first(), string_arg(args, 1)) {
        (Some(Value::Array(items)), Some(sep)) => (items, sep),
        _ => return Ok(Value::Str(String::new())),
    };

    let rendered: Vec<String> = items.borrow().iter().map(|v| v.to_string()).collect();
    Ok(Value::Str(rendered.join(sep)))
}

fn bi_slice(args: &[Value]) -> Result<Value, String> {
    let start = match number_arg(args, 1) {
        Some(n) => n,
        None => return Ok(Value::Null),
    };
    let end = number_arg(args, 2);

    match args.first() {
        Some(Value::Str(s)) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), start, end);
            Ok(Value::Str(chars[start..end].iter().collect()))
        }
        Some(Value::Array(items)) => {
            let items = items.borrow();
            let (start, end) = slice_bounds(items.len(), start, end);
            Ok(Value::array(items[start..end].to_vec()))
        }
        _ => Ok(Value::Null),
    }
}

// ---- objects ----

fn bi_keys(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(Value::Object(table)) => Ok(table.borrow().keys_value()),
        _ => Ok(Value::array(Vec::new())),
    }
}

fn bi_values(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(Value::Object(table)) => Ok(table.borrow().values_value()),
        _ => Ok(Value::array(Vec::new())),
    }
}

fn bi_has(args: &[Value]) -> Result<Value, String> {
    match (args.first(), string_arg(args, 1)) {
        (Some(Value::Object(table)), Some(key)) => Ok(Value::Bool(table.borrow().has(key))),
        _ => Ok(Value::Bool(false)),
    }
}

fn bi_delete(args: &[Value]) -> Result<Value, String> {
    if let (Some(Value::Object(table)), Some(key)) = (args.first(), string_arg(args, 1)) {
        table.borrow_mut().delete(key);
    }
    Ok(Value::Null)
}

// ---- math ----

/// Integer-valued results come back as integers so they compose with
/// indexing and integer arithmetic.
fn int_or_double(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= 9e15 {
        Value::Int(n as i64)
    } else {
        Value::Double(n)
    }
}

fn bi_abs(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(Value::Int(n)) => Ok(Value::Int(n.wrapping_abs())),
        Some(Value::Double(n)) => Ok(Value::Double(n.abs())),
        _ => Ok(Value::Int(0)),
    }
}

fn bi_floor(args: &[Value]) -> Result<Value, String> {
    Ok(int_or_double(number_arg(args, 0).unwrap_or(0.0).floor()))
}

fn bi_ceil(args: &[Value]) -> Result<Value, String> {
    Ok(int_or_double(number_arg(args, 0).unwrap_or(0.0).ceil()))
}

fn bi_round(args: &[Value]) -> Result<Value, String> {
    Ok(int_or_double(number_arg(args, 0).unwrap_or(0.0).round()))
}

fn bi_sqrt(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Double(number_arg(args, 0).unwrap_or(0.0).sqrt()))
}

fn bi_min(args: &[Value]) -> Result<Value, String> {
    match (args.first(), args.get(1)) {
        (Some(Value::Int(a)), Some(Value::Int(b))) => Ok(Value::Int(*a.min(b))),
        _ => match (number_arg(args, 0), number_arg(args, 1)) {
            (Some(a), Some(b)) => Ok(Value::Double(a.min(b))),
            _ => Ok(Value::Int(0)),
        },
    }
}

fn bi_max(args: &[Value]) -> Result<Value, String> {
    match (args.first(), args.get(1)) {
        (Some(Value::Int(a)), Some(Value::Int(b))) => Ok(Value::Int(*a.max(b))),
        _ => match (number_arg(args, 0), number_arg(args, 1)) {
            (Some(a), Some(b)) => Ok(Value::Double(a.max(b))),
            _ => Ok(Value::Int(0)),
        },
    }
}

fn bi_pow(args: &[Value]) -> Result<Value, String> {
    match (number_arg(args, 0), number_arg(args, 1)) {
        (Some(a), Some(b)) => Ok(int_or_double(a.powf(b))),
        _ => Ok(Value::Int(0)),
    }
}

fn bi_type(args: &[Value]) -> Result<Value, String> {
    let name = match args.first() {
        Some(value) => value.type_name(),
        None => "null",
    };
    Ok(Value::Str(name.to_string()))
}

// ---- string methods (receiver is the first argument) ----

fn bi_method_upper(args: &[Value]) -> Result<Value, String> {
    match string_arg(args, 0) {
        Some(s) => Ok(Value::Str(s.to_uppercase())),
        None => Ok(Value::Str(String::new())),
    }
}

fn bi_method_lower(args: &[Value]) -> Result<Value, String> {
    match string_arg(args, 0) {
        Some(s) => Ok(Value::Str(s.to_lowercase())),
        None => Ok(Value::Str(String::new())),
    }
}

fn bi_method_trim(args: &[Value]) -> Result<Value, String> {
    match string_arg(args, 0) {
        Some(s) => Ok(Value::Str(s.trim().to_string())),
        None => Ok(Value::Str(String::new())),
    }
}

fn bi_method_contains(args: &[Value]) -> Result<Value, String> {
    match (string_arg(args, 0), string_arg(args, 1)) {
        (Some(s), Some(needle)) => Ok(Value::Bool(s.contains(needle))),
        _ => Ok(Value::Bool(false)),
    }
}

fn bi_method_replace(args: &[Value]) -> Result<Value, String> {
    match (string_arg(args, 0), string_arg(args, 1), string_arg(args, 2)) {
        (Some(s), Some(old), Some(new)) => {
            if old.is_empty() {
                Ok(Value::Str(s.to_string()))
            } else {
                Ok(Value::Str(s.replace(old, new)))
            }
        }
        (Some(s), _, _) => Ok(Value::Str(s.to_string())),
        _ => Ok(Value::Str(String::new())),
    }
}

/// indexOf works on both strings (substring search, char position) and
/// arrays (element search).
fn bi_method_index_of(args: &[Value]) -> Result<Value, String> {
    if let (Some(s), Some(needle)) = (string_arg(args, 0), string_arg(args, 1)) {
        return Ok(match s.find(needle) {
            Some(byte_pos) => Value::Int(s[..byte_pos].chars().count() as i64),
            None => Value::Int(-1),
        });
    }

    if let (Some(Value::Array(items)), Some(needle)) = (args.first(), args.get(1)) {
        let pos = items.borrow().iter().position(|item| item == needle);
        return Ok(Value::Int(pos.map(|p| p as i64).unwrap_or(-1)));
    }

    Ok(Value::Int(-1))
}

// ---- array methods ----

fn bi_method_includes(args: &[Value]) -> Result<Value, String> {
    match (args.first(), args.get(1)) {
        (Some(Value::Array(items)), Some(needle)) => {
            Ok(Value::Bool(items.borrow().iter().any(|item| item == needle)))
        }
        _ => Ok(Value::Bool(false)),
    }
}

fn bi_method_flat(args: &[Value]) -> Result<Value, String> {
    let items = match args.first() {
        Some(Value::Array(items)) => items,
        _ => return Ok(Value::array(Vec::new())),
    };

    let mut flattened = Vec::new();
    for item in items.borrow().iter() {
        match item {
            Value::Array(inner) => flattened.extend(inner.borrow().iter().cloned()),
            other => flattened.push(other.clone()),
        }
    }
    Ok(Value::array(flattened))
}

fn bi_method_concat(args: &[Value]) -> Result<Value, String> {
    match (args.first(), args.get(1)) {
        (Some(Value::Array(a)), Some(Value::Array(b))) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::array(items))
        }
        (Some(Value::Array(a)), _) => Ok(Value::array(a.borrow().clone())),
        _ => Ok(Value::array(Vec::new())),
    }
}

fn bi_method_length(args: &[Value]) -> Result<Value, String> {
    let count = match args.first() {
        Some(Value::Str(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.borrow().len(),
        _ => 0,
    };
    Ok(Value::Int(count as i64))
}

// ---- file I/O ----

fn bi_read_file(args: &[Value]) -> Result<Value, String> {
    match string_arg(args, 0) {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(content) => Ok(Value::Str(content)),
            Err(_) => Ok(Value::Null),
        },
        None => Ok(Value::Null),
    }
}

fn bi_write_file(args: &[Value]) -> Result<Value, String> {
    match (string_arg(args, 0), string_arg(args, 1)) {
        (Some(path), Some(content)) => {
            Ok(Value::Bool(std::fs::write(path, content).is_ok()))
        }
        _ => Ok(Value::Bool(false)),
    }
}

fn bi_append_file(args: &[Value]) -> Result<Value, String> {
    let (path, content) = match (string_arg(args, 0), string_arg(args, 1)) {
        (Some(path), Some(content)) => (path, content),
        _ => return Ok(Value::Bool(false)),
    };

    let result = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .and_then(|mut file| file.write_all(content.as_bytes()));
    Ok(Value::Bool(result.is_ok()))
}

fn bi_http_stub(_args: &[Value]) -> Result<Value, String> {
    eprintln!("http support is not available");
    Ok(Value::Null)
}

// ---- serialization ----

fn bi_json_stringify(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(value) => Ok(Value::Str(json_stringify(value))),
        None => Ok(Value::Str("null".to_string())),
    }
}

fn bi_json_parse(args: &[Value]) -> Result<Value, String> {
    match string_arg(args, 0) {
        Some(s) => Ok(json_parse(s).unwrap_or(Value::Null)),
        None => Ok(Value::Null),
    }
}

fn json_stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(_) | Value::Double(_) => value.to_string(),
        Value::Str(s) => json_quote(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.borrow().iter().map(json_stringify).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(table) => {
            let parts: Vec<String> = table
                .borrow()
                .iter()
                .map(|(key, v)| format!("{}: {}", json_quote(key), json_stringify(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        // Functions have no serialized form.
        Value::Function(_) | Value::Builtin(_) => "null".to_string(),
    }
}

fn json_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn json_parse(source: &str) -> Option<Value> {
    let mut reader = JsonReader {
        chars: source.chars().collect(),
        pos: 0,
    };
    let value = reader.parse_value()?;
    reader.skip_whitespace();
    if reader.pos == reader.chars.len() {
        Some(value)
    } else {
        None
    }
}

/// Minimal JSON-like reader producing interpreter values: null, booleans,
/// numbers, strings, arrays, and string-keyed objects.
struct JsonReader {
    chars: Vec<char>,
    pos: usize,
}

impl JsonReader {
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        let end = self.pos + word.len();
        if end <= self.chars.len() && self.chars[self.pos..end].iter().collect::<String>() == word
        {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn parse_value(&mut self) -> Option<Value> {
        self.skip_whitespace();
        match self.peek()? {
            'n' => self.eat_word("null").then_some(Value::Null),
            't' => self.eat_word("true").then_some(Value::Bool(true)),
            'f' => self.eat_word("false").then_some(Value::Bool(false)),
            '"' => self.parse_string().map(Value::Str),
            '[' => self.parse_array(),
            '{' => self.parse_object(),
            c if c == '-' || c.is_ascii_digit() => self.parse_number(),
            _ => None,
        }
    }

    fn parse_string(&mut self) -> Option<String> {
        if !self.eat('"') {
            return None;
        }
        let mut out = String::new();
        loop {
            match self.peek()? {
                '"' => {
                    self.pos += 1;
                    return Some(out);
                }
                '\\' => {
                    self.pos += 1;
                    let escaped = self.peek()?;
                    self.pos += 1;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '/' => out.push('/'),
                        other => out.push(other),
                    }
                }
                c => {
                    self.pos += 1;
                    out.push(c);
                }
            }
        }
    }

    fn parse_number(&mut self) -> Option<Value> {
        let start = self.pos;
        let mut integral = true;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') {
            integral = false;
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            integral = false;
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        if integral {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Value::Int(n));
            }
        }
        text.parse::<f64>().ok().map(Value::Double)
    }

    fn parse_array(&mut self) -> Option<Value> {
        self.eat('[');
        self.skip_whitespace();
        let mut items = Vec::new();

        if self.eat(']') {
            return Some(Value::array(items));
        }
        loop {
            items.push(self.parse_value()?);
            self.skip_whitespace();
            if self.eat(']') {
                return Some(Value::array(items));
            }
            if !self.eat(',') {
                return None;
            }
        }
    }

    fn parse_object(&mut self) -> Option<Value> {
        self.eat('{');
        self.skip_whitespace();
        let mut table = Table::new();

        if self.eat('}') {
            return Some(Value::object(table));
        }
        loop {
            self.skip_whitespace();
            let key = self.parse_string()?;
            self.skip_whitespace();
            if !self.eat(':') {
                return None;
            }
            let value = self.parse_value()?;
            table.set(&key, value);
            self.skip_whitespace();
            if self.eat('}') {
                return Some(Value::object(table));
            }
            if !self.eat(',') {
                return None;
            }
        }
    }
}

// ---- time and process ----

fn bi_time(_args: &[Value]) -> Result<Value, String> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Ok(Value::Double(seconds))
}

fn bi_clock(_args: &[Value]) -> Result<Value, String> {
    let start = PROCESS_START.get_or_init(Instant::now);
    Ok(Value::Double(start.elapsed().as_secs_f64()))
}

fn bi_exit(args: &[Value]) -> Result<Value, String> {
    let code = number_arg(args, 0).unwrap_or(0.0) as i32;
    std::process::exit(code);
}

// ---- sort/reverse ----

fn bi_sort(args: &[Value]) -> Result<Value, String> {
    let items = match args.first() {
        Some(Value::Array(items)) => items,
        _ => return Ok(Value::array(Vec::new())),
    };

    let mut sorted = items.borrow().clone();
    sorted.sort_by(compare_values);
    Ok(Value::array(sorted))
}

/// Total order over mixed values: numbers first, then strings, then
/// everything else in stable position. Keeps sort from panicking on
/// mixed-type arrays.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Int(_) | Value::Double(_) => 0,
            Value::Str(_) => 1,
            _ => 2,
        }
    }

    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => match (a, b) {
            (Value::Str(x), Value::Str(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

fn bi_reverse(args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(Value::Array(items)) => {
            let mut reversed = items.borrow().clone();
            reversed.reverse();
            Ok(Value::array(reversed))
        }
        _ => Ok(Value::array(Vec::new())),
    }
}
