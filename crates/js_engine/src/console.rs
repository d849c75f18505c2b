//! Console API implementation.
//!
//! The console functions registered here do not print anything themselves:
//! they format their arguments and hand the line to the thread's current
//! [`OutputSink`](crate::sink::OutputSink).

use crate::sink;
use boa_engine::{
    js_string, object::ObjectInitializer, property::Attribute, Context, JsArgs, JsResult, JsValue,
    NativeFunction,
};
use std::fmt;

/// Console log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// All levels, in the order the console exposes them.
    pub const ALL: [LogLevel; 4] = [LogLevel::Log, LogLevel::Warn, LogLevel::Error, LogLevel::Info];

    /// Lowercase tag used on the wire and as the console method name.
    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a wire tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "log" => Some(LogLevel::Log),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Uppercase label used in `[LEVEL]` prefixes.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Log => "LOG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Register the console API on the global object.
pub fn register_console(context: &mut Context) -> JsResult<()> {
    let console = ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(console_log), js_string!("log"), 0)
        .function(NativeFunction::from_fn_ptr(console_info), js_string!("info"), 0)
        .function(NativeFunction::from_fn_ptr(console_warn), js_string!("warn"), 0)
        .function(NativeFunction::from_fn_ptr(console_error), js_string!("error"), 0)
        .function(NativeFunction::from_fn_ptr(console_debug), js_string!("debug"), 0)
        .function(NativeFunction::from_fn_ptr(console_assert), js_string!("assert"), 0)
        .build();

    context.register_global_property(js_string!("console"), console, Attribute::all())
}

/// Format arguments for console output: one rendering per argument, joined
/// by single spaces.
pub fn format_args(args: &[JsValue], context: &mut Context) -> String {
    args.iter()
        .map(|arg| format_arg(arg, context))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render one console argument.
///
/// Objects (and `null`) go through `JSON.stringify`; when that throws or
/// produces nothing the value is string-coerced instead. Everything else is
/// string-coerced directly.
pub fn format_arg(value: &JsValue, context: &mut Context) -> String {
    let is_object = matches!(value, JsValue::Null)
        || value.as_object().is_some_and(|obj| !obj.is_callable());

    if is_object {
        if let Ok(Some(json)) = json_stringify(value, context) {
            return json;
        }
    }

    coerce_to_string(value, context)
}

/// Call the realm's `JSON.stringify` on a value.
///
/// Returns `Ok(None)` when the result is `undefined`.
pub fn json_stringify(value: &JsValue, context: &mut Context) -> JsResult<Option<String>> {
    let json = context.global_object().get(js_string!("JSON"), context)?;
    let Some(json) = json.as_object() else {
        return Ok(None);
    };

    let stringify = json.get(js_string!("stringify"), context)?;
    let Some(stringify) = stringify.as_callable() else {
        return Ok(None);
    };

    let result = stringify.call(&JsValue::undefined(), &[value.clone()], context)?;
    Ok(result.as_string().map(|s| s.to_std_string_escaped()))
}

/// `String(value)`, falling back to an inspector rendering when coercion
/// throws (symbols, objects without a usable `toString`).
pub fn coerce_to_string(value: &JsValue, context: &mut Context) -> String {
    if let JsValue::Symbol(_) = value {
        return format_value(value, context, 0);
    }

    match value.to_string(context) {
        Ok(s) => s.to_std_string_escaped(),
        Err(_) => format_value(value, context, 0),
    }
}

/// Inspector-style rendering of a single value.
fn format_value(value: &JsValue, context: &mut Context, depth: usize) -> String {
    if depth > 3 {
        return "[...]".to_string();
    }

    match value {
        JsValue::Undefined => "undefined".to_string(),
        JsValue::Null => "null".to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::Integer(i) => i.to_string(),
        JsValue::Rational(r) => {
            if r.is_nan() {
                "NaN".to_string()
            } else if r.is_infinite() {
                if *r > 0.0 {
                    "Infinity".to_string()
                } else {
                    "-Infinity".to_string()
                }
            } else {
                r.to_string()
            }
        }
        JsValue::String(s) => s.to_std_string_escaped(),
        JsValue::Symbol(s) => format!(
            "Symbol({})",
            s.description()
                .map(|d| d.to_std_string_escaped())
                .unwrap_or_default()
        ),
        JsValue::BigInt(b) => format!("{}n", b),
        JsValue::Object(obj) => {
            if obj.is_array() {
                let length = obj
                    .get(js_string!("length"), context)
                    .ok()
                    .and_then(|v| v.to_length(context).ok())
                    .unwrap_or(0);

                let mut items = Vec::new();
                for i in 0..length.min(10) {
                    if let Ok(item) = obj.get(i as u32, context) {
                        items.push(format_value(&item, context, depth + 1));
                    }
                }

                if length > 10 {
                    items.push(format!("... {} more items", length - 10));
                }

                format!("[{}]", items.join(", "))
            } else if obj.is_callable() {
                let name = obj
                    .get(js_string!("name"), context)
                    .ok()
                    .and_then(|v| v.as_string().map(|s| s.to_std_string_escaped()))
                    .unwrap_or_default();

                if name.is_empty() {
                    "[Function (anonymous)]".to_string()
                } else {
                    format!("[Function: {}]", name)
                }
            } else {
                "[object Object]".to_string()
            }
        }
    }
}

fn write_console(level: LogLevel, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let message = format_args(args, context);
    sink::emit(level, &message);
    Ok(JsValue::undefined())
}

/// console.log()
fn console_log(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    write_console(LogLevel::Log, args, context)
}

/// console.info()
fn console_info(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    write_console(LogLevel::Info, args, context)
}

/// console.warn()
fn console_warn(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    write_console(LogLevel::Warn, args, context)
}

/// console.error()
fn console_error(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    write_console(LogLevel::Error, args, context)
}

/// console.debug(), an alias of log.
fn console_debug(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    write_console(LogLevel::Log, args, context)
}

/// console.assert()
fn console_assert(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    if args.get_or_undefined(0).to_boolean() {
        return Ok(JsValue::undefined());
    }

    let message = if args.len() > 1 {
        format!("Assertion failed: {}", format_args(&args[1..], context))
    } else {
        "Assertion failed".to_string()
    };
    sink::emit(LogLevel::Error, &message);
    Ok(JsValue::undefined())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_engine::Source;

    fn eval(context: &mut Context, source: &str) -> JsValue {
        context.eval(Source::from_bytes(source.as_bytes())).unwrap()
    }

    #[test]
    fn test_format_primitive() {
        let mut context = Context::default();

        assert_eq!(format_arg(&JsValue::undefined(), &mut context), "undefined");
        assert_eq!(format_arg(&JsValue::null(), &mut context), "null");
        assert_eq!(format_arg(&JsValue::from(true), &mut context), "true");
        assert_eq!(format_arg(&JsValue::from(42), &mut context), "42");
    }

    #[test]
    fn test_format_object_as_json() {
        let mut context = Context::default();
        let value = eval(&mut context, "({a: 1})");
        assert_eq!(format_arg(&value, &mut context), r#"{"a":1}"#);

        let array = eval(&mut context, "[1, 'two', null]");
        assert_eq!(format_arg(&array, &mut context), r#"[1,"two",null]"#);
    }

    #[test]
    fn test_format_cyclic_object_falls_back() {
        let mut context = Context::default();
        let value = eval(&mut context, "var o = {}; o.self = o; o");
        assert_eq!(format_arg(&value, &mut context), "[object Object]");
    }

    #[test]
    fn test_format_without_prototype_uses_inspector() {
        let mut context = Context::default();
        let value = eval(&mut context, "var o = Object.create(null); o.self = o; o");
        assert_eq!(format_arg(&value, &mut context), "[object Object]");
    }

    #[test]
    fn test_format_args_joins_with_spaces() {
        let mut context = Context::default();
        let args = [
            JsValue::from(js_string!("sum")),
            JsValue::from(3),
            eval(&mut context, "({ok: true})"),
        ];
        assert_eq!(format_args(&args, &mut context), r#"sum 3 {"ok":true}"#);
    }

    #[test]
    fn test_level_tags() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_tag(level.tag()), Some(level));
        }
        assert_eq!(LogLevel::from_tag("debug"), None);
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
    }
}
