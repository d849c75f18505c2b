//! JavaScript engine wrapper.

use crate::console;
use boa_engine::{
    builtins::error::ErrorObject, js_string, property::Attribute, Context, JsError, JsString,
    JsValue, Source,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the position suffix Boa appends to syntax errors.
static POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"line (\d+), col(?:umn)? (\d+)").expect("position pattern is valid")
});

/// JavaScript engine: one Boa context with the console and window globals.
pub struct JsEngine {
    /// Boa context.
    context: Context,
    /// Script counter for identification.
    script_counter: u64,
}

impl JsEngine {
    /// Create a new JavaScript engine.
    pub fn new() -> Result<Self, JsEngineError> {
        let mut context = Context::default();
        Self::setup_globals(&mut context).map_err(|e| {
            let failure = ScriptFailure::from_error(&e, &mut context);
            JsEngineError::Setup(failure.message)
        })?;

        Ok(Self {
            context,
            script_counter: 0,
        })
    }

    /// Set up global browser APIs.
    fn setup_globals(context: &mut Context) -> boa_engine::JsResult<()> {
        console::register_console(context)?;

        // Window object (self-referential global)
        let window = context.global_object();
        context.register_global_property(js_string!("window"), window.clone(), Attribute::all())?;
        context.register_global_property(js_string!("self"), window.clone(), Attribute::all())?;
        context.register_global_property(js_string!("globalThis"), window, Attribute::all())?;
        Ok(())
    }

    /// Evaluate a script, returning the raw engine error on failure.
    pub fn evaluate(&mut self, source: &str) -> Result<JsValue, JsError> {
        self.script_counter += 1;
        tracing::trace!(script = self.script_counter, bytes = source.len(), "evaluating script");

        let source = Source::from_bytes(source.as_bytes());
        self.context.eval(source)
    }

    /// Execute a script and return the result.
    pub fn execute(&mut self, source: &str) -> Result<JsValue, JsEngineError> {
        self.evaluate(source).map_err(|e| {
            let failure = ScriptFailure::from_error(&e, &mut self.context);
            JsEngineError::Execution(failure.message)
        })
    }

    /// Call a function by name.
    pub fn call_function(&mut self, name: &str, args: &[JsValue]) -> Result<JsValue, JsEngineError> {
        let func = self.get_global(name)?;

        match func.as_callable() {
            Some(callable) => callable
                .call(&JsValue::undefined(), args, &mut self.context)
                .map_err(|e| self.execution_error(&e)),
            None => Err(JsEngineError::Execution(format!("{} is not a function", name))),
        }
    }

    /// Set a global variable.
    pub fn set_global(&mut self, name: &str, value: JsValue) -> Result<(), JsEngineError> {
        self.context
            .register_global_property(JsString::from(name), value, Attribute::all())
            .map_err(|e| self.execution_error(&e))
    }

    /// Get a global variable.
    pub fn get_global(&mut self, name: &str) -> Result<JsValue, JsEngineError> {
        let global = self.context.global_object();
        global
            .get(JsString::from(name), &mut self.context)
            .map_err(|e| self.execution_error(&e))
    }

    /// Process pending promise jobs.
    pub fn run_pending_jobs(&mut self) {
        self.context.run_jobs();
    }

    /// Number of scripts evaluated by this engine.
    pub fn scripts_evaluated(&self) -> u64 {
        self.script_counter
    }

    /// Describe an engine error the way the console reports it.
    pub fn describe(&mut self, error: &JsError) -> ScriptFailure {
        ScriptFailure::from_error(error, &mut self.context)
    }

    /// Get mutable access to the context.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    fn execution_error(&mut self, error: &JsError) -> JsEngineError {
        JsEngineError::Execution(ScriptFailure::from_error(error, &mut self.context).message)
    }
}

/// JavaScript engine error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JsEngineError {
    #[error("Setup error: {0}")]
    Setup(String),
    #[error("Execution error: {0}")]
    Execution(String),
}

/// A thrown value, reduced to what the console needs to report it.
#[derive(Debug, Clone)]
pub struct ScriptFailure {
    /// The error's `message`, or the string coercion of the thrown value.
    pub message: String,
    /// 1-based line of a syntax error, when the engine reports one.
    pub line: Option<u32>,
    /// 1-based column of a syntax error, when the engine reports one.
    pub column: Option<u32>,
    /// The thrown value itself.
    pub value: JsValue,
}

impl ScriptFailure {
    /// Convert an engine error into its opaque value and describe it.
    pub fn from_error(error: &JsError, context: &mut Context) -> Self {
        let value = error.to_opaque(context);
        let message = thrown_message(&value, context);
        let (line, column) = match POSITION.captures(&message) {
            Some(caps) => (
                caps.get(1).and_then(|m| m.as_str().parse().ok()),
                caps.get(2).and_then(|m| m.as_str().parse().ok()),
            ),
            None => (None, None),
        };

        Self {
            message,
            line,
            column,
            value,
        }
    }
}

/// Extract an Error's `message` property. Any other thrown value is
/// string-coerced.
fn thrown_message(value: &JsValue, context: &mut Context) -> String {
    if let Some(object) = value.as_object().filter(|object| object.is::<ErrorObject>()) {
        if let Ok(message) = object.get(js_string!("message"), context) {
            if let Some(message) = message.as_string() {
                return message.to_std_string_escaped();
            }
        }
    }

    console::coerce_to_string(value, context)
}
