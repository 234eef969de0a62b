// routekit-bindings — dynamic host surface for scripting runtimes
//
// Hosts see three constructors, `Options`, `Query` and `Engine`, taking
// loosely typed JSON arguments. Every constructor must be invoked as a
// construction; a plain call is rejected before anything else happens.

use routekit_core::{logging, Configuration, DatasetHandle, EngineSettings};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub use routekit_core::{Error as CoreError, ErrorKind};

/// How the host invoked a constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// `new Constructor(...)`
    Construct,
    /// `Constructor(...)`
    Call,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("Cannot call constructor as function, you need to use 'new' keyword")]
    ConstructorCalledAsFunction,

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl BindingError {
    /// Core error kind, if this came from the core.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            BindingError::ConstructorCalledAsFunction => None,
            BindingError::Core(e) => Some(e.kind()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BindingError>;

fn invalid(message: &str) -> BindingError {
    BindingError::Core(CoreError::InvalidArgument(message.to_string()))
}

fn require_construct(invocation: Invocation) -> Result<()> {
    match invocation {
        Invocation::Construct => Ok(()),
        Invocation::Call => Err(BindingError::ConstructorCalledAsFunction),
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// `new Options(profile, useSharedMemory?)`
#[derive(Debug, Clone)]
pub struct Options {
    handle: DatasetHandle,
}

impl Options {
    pub fn new(invocation: Invocation, args: &[Value]) -> Result<Self> {
        require_construct(invocation)?;
        logging::init();

        let profile = match args.first() {
            Some(Value::String(path)) => path,
            _ => return Err(invalid("dataset profile path must be a string")),
        };
        let use_shared_memory = match args.get(1) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(invalid("useSharedMemory must be a boolean")),
        };

        let handle = Configuration::load(profile, use_shared_memory)?;
        debug!("Options ready for {} (shared: {})", profile, use_shared_memory);
        Ok(Self { handle })
    }

    pub fn handle(&self) -> &DatasetHandle {
        &self.handle
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// `new Query({ coordinates, zoomLevel?, alternateRoute?, printInstructions?, hints?, checksum? })`
#[derive(Debug, Clone)]
pub struct Query {
    inner: routekit_core::Query,
}

impl Query {
    pub fn new(invocation: Invocation, args: &[Value]) -> Result<Self> {
        require_construct(invocation)?;

        let request = args
            .first()
            .filter(|v| v.is_object())
            .ok_or_else(|| invalid("query must be an object"))?;
        Ok(Self {
            inner: routekit_core::Query::from_json(request)?,
        })
    }

    pub fn inner(&self) -> &routekit_core::Query {
        &self.inner
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// `new Engine(options, settings?)`
#[derive(Clone)]
pub struct Engine {
    inner: Arc<routekit_core::Engine>,
}

impl Engine {
    pub fn new(invocation: Invocation, options: Option<&Options>, settings: Option<&Value>) -> Result<Self> {
        require_construct(invocation)?;
        logging::init();

        let options = options.ok_or_else(|| invalid("first argument must be an Options object"))?;
        let settings = match settings {
            None | Some(Value::Null) => EngineSettings::default(),
            Some(value @ Value::Object(_)) => {
                EngineSettings::from_json(&value.to_string()).map_err(CoreError::from)?
            }
            Some(_) => return Err(invalid("engine settings must be an object")),
        };

        let engine = routekit_core::Engine::with_settings(options.handle.clone(), settings)?;
        Ok(Self {
            inner: Arc::new(engine),
        })
    }

    /// `engine.run(query)`: blocking, returns the serialized result.
    pub fn run(&self, query: &Query) -> Result<String> {
        Ok(self.inner.run(&query.inner)?)
    }

    /// `engine.run(query, callback)`: returns immediately; the callback
    /// receives the serialized result or the execution error exactly once.
    pub fn run_with_callback<F>(&self, query: &Query, callback: F)
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        self.inner
            .run_with_callback(&query.inner, move |result| callback(result.map_err(BindingError::from)));
    }

    pub fn timestamp(&self) -> String {
        self.inner.timestamp().to_string()
    }

    pub fn checksum(&self) -> u32 {
        self.inner.checksum()
    }
}
